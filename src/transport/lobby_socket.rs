//! The lobby socket transport: full-duplex JSON command/event frames over a
//! persistent Axum WebSocket connection.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::app_state::AppState;
use crate::protocol::{ClientMessage, ServerMessage};
use crate::server::{deliver, disconnect, lobby_router};
use crate::state::Transport;

pub async fn lobby_socket_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
    let peer_id = state.store.register_peer(Transport::Socket(tx));

    let writer = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            if sink.send(message).await.is_err() {
                break;
            }
        }
    });

    deliver(&state, peer_id, &ServerMessage::Welcome { your_id: peer_id }).await;
    tracing::info!(%peer_id, "lobby socket connected");

    while let Some(frame) = stream.next().await {
        let Ok(message) = frame else {
            break;
        };
        match message {
            Message::Text(text) => {
                let reply = match ClientMessage::parse(&text) {
                    Ok(client_message) => lobby_router::dispatch(&state, peer_id, client_message).await,
                    Err(code) => ServerMessage::error(code),
                };
                deliver(&state, peer_id, &reply).await;
            }
            Message::Close(_) => break,
            Message::Ping(_) | Message::Pong(_) | Message::Binary(_) => {}
        }
    }

    disconnect::on_peer_disconnected(&state, peer_id).await;
    writer.abort();
    tracing::info!(%peer_id, "lobby socket disconnected");
}
