//! The per-room signaling relay: forwards opaque WebRTC offer/answer/ICE
//! envelopes between peers connected to the same room code.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::sync::mpsc;

use crate::app_state::AppState;
use crate::protocol::signaling::{extract_data_type, extract_to, stamp_from, SignalingServerMessage};

pub async fn signaling_handler(
    ws: WebSocketUpgrade,
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, code.to_uppercase()))
}

async fn handle_socket(socket: WebSocket, state: AppState, code: String) {
    if !state.store.room_exists(&code) {
        let (mut sink, _) = socket.split();
        let _ = sink.close().await;
        return;
    }

    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Value>();

    let Ok((my_id, existing_peers)) = state.store.signaling_join(&code, tx) else {
        let _ = sink.close().await;
        return;
    };

    let writer = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if sink
                .send(Message::Text(frame.to_string().into()))
                .await
                .is_err()
            {
                break;
            }
        }
    });

    if let Some(sender) = state.store.signaling_sender(&code, my_id) {
        let initialize = SignalingServerMessage::Initialize {
            id: my_id,
            peers: existing_peers.clone(),
        };
        let _ = sender.send(serde_json::to_value(&initialize).unwrap_or_default());
    }

    for (peer, sender) in state.store.signaling_all_senders(&code) {
        if peer == my_id {
            continue;
        }
        let _ = sender.send(serde_json::to_value(&SignalingServerMessage::NewConnection {
            peer_id: my_id,
        })
        .unwrap_or_default());
    }

    tracing::info!(room = %code, peer_id = %my_id, "signaling peer connected");

    while let Some(frame) = stream.next().await {
        let Ok(Message::Text(text)) = frame else {
            match frame {
                Ok(Message::Close(_)) | Err(_) => break,
                _ => continue,
            }
        };

        let Ok(value) = serde_json::from_str::<Value>(&text) else {
            continue;
        };

        match extract_data_type(&value) {
            Some("ready") | None => continue,
            Some(_) => {}
        }

        let Some(target) = extract_to(&value) else {
            continue;
        };

        if let Some(sender) = state.store.signaling_sender(&code, target) {
            let _ = sender.send(stamp_from(value, my_id));
        }
    }

    let remaining = state.store.signaling_leave(&code, my_id);
    for peer_id in remaining {
        if let Some(sender) = state.store.signaling_sender(&code, peer_id) {
            let _ = sender.send(
                serde_json::to_value(&SignalingServerMessage::PeerDisconnected { peer_id: my_id })
                    .unwrap_or_default(),
            );
        }
    }

    writer.abort();
    tracing::info!(room = %code, peer_id = %my_id, "signaling peer disconnected");
}
