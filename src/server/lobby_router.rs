//! Command handlers shared by the lobby socket and HTTP+event-stream
//! transports. Each handler performs the state mutation, fans out any
//! resulting events to other affected peers, and returns the reply owed to
//! the caller.

use serde_json::Value;

use crate::app_state::AppState;
use crate::protocol::{ClientMessage, CloseReason, ErrorCode, PeerId, ServerMessage};
use crate::state::LeaveOutcome;

use super::fanout::broadcast;

pub async fn handle_create_lobby(
    state: &AppState,
    peer_id: PeerId,
    name: Option<String>,
    public: Option<bool>,
    player_limit: Option<u32>,
    player: Option<Value>,
) -> ServerMessage {
    state.store.set_peer_player(peer_id, player.clone());
    let (code, name) = state.store.create_lobby(
        peer_id,
        name,
        public.unwrap_or(true),
        player_limit.unwrap_or(0),
        player,
        &state.config.default_channel,
    );
    tracing::info!(%peer_id, %code, %name, "lobby created");
    ServerMessage::LobbyCreated {
        code,
        name,
        host_id: peer_id,
        your_id: peer_id,
    }
}

pub async fn handle_list_lobbies(state: &AppState) -> ServerMessage {
    ServerMessage::LobbyList {
        items: state.store.list_public_lobbies(),
    }
}

pub async fn handle_join_lobby(
    state: &AppState,
    peer_id: PeerId,
    code: &str,
    player: Option<Value>,
) -> Result<ServerMessage, ErrorCode> {
    let outcome = state.store.join_lobby(peer_id, code, player.clone())?;

    if !outcome.fan_out_to.is_empty() {
        let event = ServerMessage::PeerJoined {
            id: peer_id,
            player,
        };
        broadcast(state, &outcome.fan_out_to, &event).await;
    }

    tracing::info!(%peer_id, code = %outcome.code, "peer joined lobby");
    Ok(ServerMessage::LobbyJoined {
        code: outcome.code,
        name: outcome.name,
        host_id: outcome.host_id,
        your_id: peer_id,
        players: outcome.members,
    })
}

pub async fn handle_leave_lobby(
    state: &AppState,
    peer_id: PeerId,
) -> Result<ServerMessage, ErrorCode> {
    let outcome = state.store.leave_lobby(peer_id)?;
    match outcome {
        LeaveOutcome::Left { code, remaining } => {
            broadcast(state, &remaining, &ServerMessage::PeerLeft { id: peer_id }).await;
            tracing::info!(%peer_id, %code, "peer left lobby");
            Ok(ServerMessage::LobbyLeft { code })
        }
        LeaveOutcome::Closed { code, remaining } => {
            let event = ServerMessage::LobbyClosed {
                code: code.clone(),
                reason: CloseReason::HostLeft,
            };
            broadcast(state, &remaining, &event).await;
            tracing::info!(%peer_id, %code, "host left; lobby closed");
            Ok(ServerMessage::LobbyLeft { code })
        }
    }
}

pub fn handle_ping() -> ServerMessage {
    ServerMessage::Pong
}

/// `target < 0` means "every other member"; otherwise the literal peer id.
pub async fn handle_broadcast_packet(
    state: &AppState,
    peer_id: PeerId,
    packet: String,
    target: i64,
) -> Result<Vec<PeerId>, ErrorCode> {
    let (_code, members) = state.store.lobby_member_ids(peer_id)?;

    let targets: Vec<PeerId> = if target < 0 {
        members.into_iter().filter(|&id| id != peer_id).collect()
    } else {
        let target = target as PeerId;
        if members.contains(&target) && target != peer_id {
            vec![target]
        } else {
            return Err(ErrorCode::PeerNotFound);
        }
    };

    let event = ServerMessage::GamePacket {
        from: peer_id,
        packet,
    };
    broadcast(state, &targets, &event).await;
    Ok(targets)
}

/// Dispatches a parsed lobby-socket/event-stream command to its handler,
/// downgrading any domain error to an `error` envelope for direct reply to
/// the caller's own connection.
pub async fn dispatch(state: &AppState, peer_id: PeerId, message: ClientMessage) -> ServerMessage {
    let result = match message {
        ClientMessage::CreateLobby {
            name,
            public,
            player_limit,
            player,
        } => Ok(handle_create_lobby(state, peer_id, name, public, player_limit, player).await),
        ClientMessage::ListLobbies => Ok(handle_list_lobbies(state).await),
        ClientMessage::JoinLobby { code, player } => {
            handle_join_lobby(state, peer_id, &code, player).await
        }
        ClientMessage::LeaveLobby => handle_leave_lobby(state, peer_id).await,
        ClientMessage::Ping => Ok(handle_ping()),
    };

    result.unwrap_or_else(ServerMessage::error)
}
