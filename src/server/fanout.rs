//! Event fan-out: the single `deliver`/`broadcast` entry point every command
//! handler uses to push events to peers, regardless of which transport a
//! given peer is attached to.

use crate::app_state::AppState;
use crate::protocol::{PeerId, ServerMessage};
use crate::state::Transport;

/// Delivers `event` to `peer_id`'s active transport.
///
/// Returns `false` when the peer has no transport (mid-teardown) or when the
/// write failed, in which case the caller is expected to run the disconnect
/// routine for that peer.
pub async fn deliver(state: &AppState, peer_id: PeerId, event: &ServerMessage) -> bool {
    let Some(transport) = state.store.snapshot_transport(peer_id) else {
        return false;
    };

    match transport {
        Transport::Socket(tx) => match serde_json::to_string(event) {
            Ok(text) => tx
                .send(axum::extract::ws::Message::Text(text.into()))
                .is_ok(),
            Err(error) => {
                tracing::error!(%peer_id, %error, "failed to serialize server message");
                false
            }
        },
        Transport::EventStream(tx) => tx.send(event.clone()).is_ok(),
    }
}

/// Delivers `event` to every id in `peer_ids`. A peer whose delivery fails is
/// disconnected in a separate task so one dead peer never stalls fan-out to
/// the rest of the lobby.
pub async fn broadcast(state: &AppState, peer_ids: &[PeerId], event: &ServerMessage) {
    for &id in peer_ids {
        if !deliver(state, id, event).await {
            let state = state.clone();
            tokio::spawn(async move {
                super::disconnect::on_peer_disconnected(&state, id).await;
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use tokio::sync::mpsc::unbounded_channel;

    #[tokio::test]
    async fn deliver_to_missing_peer_returns_false() {
        let state = AppState::new(Config::default());
        assert!(!deliver(&state, 999, &ServerMessage::Pong).await);
    }

    #[tokio::test]
    async fn deliver_enqueues_on_event_stream() {
        let state = AppState::new(Config::default());
        let (tx, mut rx) = unbounded_channel();
        let id = state.store.register_peer(Transport::EventStream(tx));
        assert!(deliver(&state, id, &ServerMessage::Pong).await);
        let received = rx.recv().await.expect("event delivered");
        assert!(matches!(received, ServerMessage::Pong));
    }

    #[tokio::test]
    async fn broadcast_skips_nobody_when_list_is_empty() {
        let state = AppState::new(Config::default());
        broadcast(&state, &[], &ServerMessage::Pong).await;
    }
}
