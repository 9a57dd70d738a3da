//! The peer disconnect routine, shared by every transport: a lobby socket
//! closing, an HTTP event stream hanging up, or an explicit
//! `/api/lobby/disconnect` call all funnel through here.

use crate::app_state::AppState;
use crate::protocol::{CloseReason, PeerId, ServerMessage};
use crate::state::LeaveOutcome;

use super::fanout::broadcast;

/// Removes `peer_id` from the entity store and notifies its former lobby, if any.
/// Safe to call more than once for the same id: a peer that no longer exists
/// is a silent no-op.
pub async fn on_peer_disconnected(state: &AppState, peer_id: PeerId) {
    let (outcome, existed) = state.store.disconnect_peer(peer_id);
    if !existed {
        return;
    }

    match outcome {
        Some(LeaveOutcome::Closed { code, remaining }) => {
            tracing::info!(%peer_id, %code, "host disconnected; closing lobby");
            let event = ServerMessage::LobbyClosed {
                code,
                reason: CloseReason::HostDisconnected,
            };
            broadcast(state, &remaining, &event).await;
        }
        Some(LeaveOutcome::Left { code, remaining }) => {
            tracing::info!(%peer_id, %code, "peer disconnected");
            broadcast(state, &remaining, &ServerMessage::PeerLeft { id: peer_id }).await;
        }
        None => {
            tracing::debug!(%peer_id, "peer disconnected while not in a lobby");
        }
    }
}
