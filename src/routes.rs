//! Router assembly: CORS policy, every transport's endpoints, and the
//! graceful-shutdown broadcast.

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;
use crate::protocol::ServerMessage;
use crate::server::deliver;
use crate::transport::{http_sse, legacy, lobby_socket, signaling_ws};

pub fn build_router(cors_origins: &str, state: AppState) -> Router {
    let cors = build_cors(cors_origins);

    Router::new()
        .route("/ws", get(lobby_socket::lobby_socket_handler))
        .route("/ws/{code}", get(signaling_ws::signaling_handler))
        .route("/api/lobby/connect", post(http_sse::connect))
        .route("/api/lobby/disconnect", post(http_sse::disconnect_endpoint))
        .route("/api/lobby/create", post(http_sse::create))
        .route("/api/lobby/join", post(http_sse::join))
        .route("/api/lobby/leave", post(http_sse::leave))
        .route("/api/lobby/list", get(http_sse::list))
        .route("/api/lobby/broadcast", post(http_sse::broadcast))
        .route("/api/lobby/events", get(http_sse::events))
        .route("/session/host", post(legacy::host))
        .route("/session/join/{code}", post(legacy::join))
        .route("/session/update/{code}", post(legacy::update))
        .route("/session/players/{code}", post(legacy::players))
        .route("/session/close/{code}", post(legacy::close))
        .route("/health", get(legacy::health))
        .route("/rooms", get(legacy::rooms))
        .route("/lobbies", get(legacy::lobbies))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn build_cors(cors_origins: &str) -> CorsLayer {
    if cors_origins == "*" {
        return CorsLayer::permissive();
    }

    let origins: Vec<_> = cors_origins
        .split(',')
        .filter_map(|s| s.trim().parse::<axum::http::HeaderValue>().ok())
        .collect();

    if origins.is_empty() {
        tracing::warn!("No valid CORS origins configured, using permissive CORS");
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Broadcasts `server_shutdown` to every connected peer (both lobby-socket
/// and signaling-relay connections) before the process exits, applying a
/// short per-connection write deadline so one stalled peer cannot block
/// shutdown indefinitely.
pub async fn broadcast_shutdown(state: &AppState) {
    let deadline = std::time::Duration::from_millis(state.config.shutdown_write_deadline_ms);
    let event = ServerMessage::ServerShutdown;

    for (peer_id, _) in state.store.all_peer_transports() {
        let _ = tokio::time::timeout(deadline, deliver(state, peer_id, &event)).await;
    }

    let shutdown_value = serde_json::to_value(&crate::protocol::SignalingServerMessage::ServerShutdown)
        .unwrap_or_default();
    for sender in state.store.all_signaling_senders() {
        let _ = tokio::time::timeout(deadline, async { sender.send(shutdown_value.clone()) }).await;
    }

    state.store.clear_all();
}
