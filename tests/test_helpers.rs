//! Shared harness for spawning the real app (router + entity store) on an
//! ephemeral port for end-to-end transport tests.

use std::net::SocketAddr;

use lobby_signal_server::app_state::AppState;
use lobby_signal_server::config::Config;
use lobby_signal_server::routes::build_router;
use tokio::net::TcpListener;

/// Spawns the full router (lobby socket, HTTP+SSE, signaling relay, legacy
/// endpoints) on `127.0.0.1:0` and returns its address plus the shared state
/// so tests can also inspect the entity store directly.
#[allow(dead_code)]
pub async fn spawn_app() -> (SocketAddr, AppState) {
    let config = Config::default();
    let state = AppState::new(config);
    let router = build_router("*", state.clone());

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");

    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server crashed");
    });

    (addr, state)
}

#[allow(dead_code)]
pub fn ws_url(addr: SocketAddr, path: &str) -> String {
    format!("ws://{addr}{path}")
}

#[allow(dead_code)]
pub fn http_url(addr: SocketAddr, path: &str) -> String {
    format!("http://{addr}{path}")
}
