//! The HTTP request/response + server-sent-event transport: one REST
//! endpoint per command, and one long-lived event stream per peer that
//! carries everything the lobby socket would otherwise push unprompted.

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::response::sse::{Event, Sse};
use axum::response::IntoResponse;
use axum::Json;
use futures_util::stream::{self, Stream};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::mpsc;

use crate::app_state::AppState;
use crate::protocol::{ErrorCode, PeerId, ServerMessage};
use crate::server::{disconnect, lobby_router};
use crate::state::Transport;

#[derive(Debug, Deserialize)]
pub struct ConnectBody {
    #[serde(default)]
    pub client_id: Option<PeerId>,
}

pub async fn connect(
    State(state): State<AppState>,
    Json(body): Json<ConnectBody>,
) -> impl IntoResponse {
    let (tx, rx) = mpsc::unbounded_channel();

    let peer_id = match body.client_id {
        Some(id) if id > 0 => {
            if let Err(code) = state.store.register_peer_with_id(id, Transport::EventStream(tx)) {
                return Json(json!({"t": "error", "code": code, "message": code.description()}))
                    .into_response();
            }
            id
        }
        _ => state.store.register_peer(Transport::EventStream(tx)),
    };

    state.pending_streams.lock().expect("pending streams lock poisoned").insert(peer_id, rx);
    tracing::info!(%peer_id, "http peer connected");
    Json(json!({"peer_id": peer_id})).into_response()
}

#[derive(Debug, Deserialize)]
pub struct PeerBody {
    pub peer_id: PeerId,
}

pub async fn disconnect_endpoint(
    State(state): State<AppState>,
    Json(body): Json<PeerBody>,
) -> impl IntoResponse {
    state
        .pending_streams
        .lock()
        .expect("pending streams lock poisoned")
        .remove(&body.peer_id);
    disconnect::on_peer_disconnected(&state, body.peer_id).await;
    Json(json!({"ok": true}))
}

#[derive(Debug, Deserialize)]
pub struct CreateBody {
    pub peer_id: PeerId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub public: Option<bool>,
    #[serde(default)]
    pub player_limit: Option<u32>,
    #[serde(default)]
    pub player: Option<Value>,
}

pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<CreateBody>,
) -> impl IntoResponse {
    let reply = lobby_router::handle_create_lobby(
        &state,
        body.peer_id,
        body.name,
        body.public,
        body.player_limit,
        body.player,
    )
    .await;
    Json(reply)
}

#[derive(Debug, Deserialize)]
pub struct JoinBody {
    pub peer_id: PeerId,
    pub code: String,
    #[serde(default)]
    pub player: Option<Value>,
}

pub async fn join(State(state): State<AppState>, Json(body): Json<JoinBody>) -> impl IntoResponse {
    let reply = lobby_router::handle_join_lobby(&state, body.peer_id, &body.code, body.player)
        .await
        .unwrap_or_else(ServerMessage::error);
    Json(reply)
}

pub async fn leave(State(state): State<AppState>, Json(body): Json<PeerBody>) -> impl IntoResponse {
    let reply = lobby_router::handle_leave_lobby(&state, body.peer_id)
        .await
        .unwrap_or_else(ServerMessage::error);
    Json(reply)
}

pub async fn list(State(state): State<AppState>) -> impl IntoResponse {
    Json(lobby_router::handle_list_lobbies(&state).await)
}

#[derive(Debug, Deserialize)]
pub struct BroadcastBody {
    pub peer_id: PeerId,
    pub packet: String,
    #[serde(default = "default_target")]
    pub target: i64,
}

fn default_target() -> i64 {
    -1
}

pub async fn broadcast(
    State(state): State<AppState>,
    Json(body): Json<BroadcastBody>,
) -> impl IntoResponse {
    match lobby_router::handle_broadcast_packet(&state, body.peer_id, body.packet, body.target).await {
        Ok(delivered_to) => Json(json!({"delivered_to": delivered_to})).into_response(),
        Err(code) => Json(json!({"t": "error", "code": code, "message": code.description()}))
            .into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    pub peer_id: PeerId,
}

/// Drops a peer's entity-store registration when its event stream is
/// dropped, which happens whenever the underlying HTTP connection closes —
/// the disconnect signal for this transport.
struct StreamGuard {
    state: AppState,
    peer_id: PeerId,
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        let state = self.state.clone();
        let peer_id = self.peer_id;
        tokio::spawn(async move {
            disconnect::on_peer_disconnected(&state, peer_id).await;
        });
    }
}

pub async fn events(
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, (axum::http::StatusCode, &'static str)> {
    let rx = state
        .pending_streams
        .lock()
        .expect("pending streams lock poisoned")
        .remove(&query.peer_id)
        .ok_or((axum::http::StatusCode::NOT_FOUND, "unknown or already-opened peer_id"))?;

    let heartbeat_interval = Duration::from_secs(state.config.heartbeat_interval_secs);
    let guard = StreamGuard {
        state: state.clone(),
        peer_id: query.peer_id,
    };
    let welcome = ServerMessage::Welcome {
        your_id: query.peer_id,
    };

    let initial = stream::once(async move { Ok(to_event(&welcome)) });
    let rest = stream::unfold((rx, guard), move |(mut rx, guard)| async move {
        match tokio::time::timeout(heartbeat_interval, rx.recv()).await {
            Ok(Some(event)) => Some((Ok(to_event(&event)), (rx, guard))),
            Ok(None) => None,
            Err(_) => Some((Ok(Event::default().event("heartbeat").data("{}")), (rx, guard))),
        }
    });

    Ok(Sse::new(initial.chain(rest)))
}

fn to_event(message: &ServerMessage) -> Event {
    let (name, value) = match serde_json::to_value(message) {
        Ok(Value::Object(mut map)) => {
            let name = map
                .remove("t")
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_else(|| "message".to_string());
            (name, Value::Object(map))
        }
        _ => ("message".to_string(), json!({})),
    };
    Event::default().event(name).data(value.to_string())
}
