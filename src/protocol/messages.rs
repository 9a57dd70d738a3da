//! Lobby-socket and HTTP event-stream message envelopes.
//!
//! Both transports share this protocol; only the delivery mechanism differs
//! (full-duplex socket frames vs. HTTP request/response + server-sent events).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error_codes::ErrorCode;

pub type PeerId = u64;

/// Messages accepted from clients, tagged by `t`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ClientMessage {
    CreateLobby {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        public: Option<bool>,
        #[serde(default)]
        player_limit: Option<u32>,
        #[serde(default)]
        player: Option<Value>,
    },
    ListLobbies,
    JoinLobby {
        code: String,
        #[serde(default)]
        player: Option<Value>,
    },
    LeaveLobby,
    Ping,
}

/// Reason a lobby was closed, carried in `lobby_closed` events.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    /// The host issued an explicit `leave_lobby`.
    HostLeft,
    /// The host's transport disconnected without an explicit leave.
    HostDisconnected,
    /// The host (or an operator acting on its behalf) closed the lobby via the legacy API.
    HostClosed,
    /// Generic closure, used by the legacy session endpoints.
    Closed,
}

/// A lobby member as seen by other members (`lobby_joined`/`lobby_created` payloads).
#[derive(Debug, Clone, Serialize)]
pub struct LobbyMember {
    pub id: PeerId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player: Option<Value>,
}

/// Summary of a public lobby, as returned by `list_lobbies`.
#[derive(Debug, Clone, Serialize)]
pub struct LobbyListItem {
    pub code: String,
    pub name: String,
    pub players: usize,
    pub public: bool,
    pub player_limit: u32,
}

/// Messages sent to clients, tagged by `t`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome {
        your_id: PeerId,
    },
    LobbyCreated {
        code: String,
        name: String,
        host_id: PeerId,
        your_id: PeerId,
    },
    LobbyList {
        items: Vec<LobbyListItem>,
    },
    LobbyJoined {
        code: String,
        name: String,
        host_id: PeerId,
        your_id: PeerId,
        players: Vec<LobbyMember>,
    },
    LobbyLeft {
        code: String,
    },
    PeerJoined {
        id: PeerId,
        #[serde(skip_serializing_if = "Option::is_none")]
        player: Option<Value>,
    },
    PeerLeft {
        id: PeerId,
    },
    LobbyClosed {
        code: String,
        reason: CloseReason,
    },
    /// Opaque application payload relayed via `/api/lobby/broadcast`; forwarded
    /// without interpretation to one or all other lobby members.
    GamePacket {
        from: PeerId,
        packet: String,
    },
    Pong,
    Error {
        code: ErrorCode,
        message: String,
    },
    ServerShutdown,
}

impl ServerMessage {
    pub fn error(code: ErrorCode) -> Self {
        Self::Error {
            message: code.description().to_string(),
            code,
        }
    }
}

const KNOWN_COMMANDS: &[&str] = &[
    "create_lobby",
    "list_lobbies",
    "join_lobby",
    "leave_lobby",
    "ping",
];

impl ClientMessage {
    /// Parses a raw lobby-socket/event-stream frame, distinguishing a
    /// malformed JSON body from a well-formed object naming an unrecognized
    /// command — the two conditions the wire protocol reports separately as
    /// `INVALID_JSON` and `UNKNOWN_COMMAND`.
    pub fn parse(text: &str) -> Result<Self, ErrorCode> {
        let value: Value = serde_json::from_str(text).map_err(|_| ErrorCode::InvalidJson)?;
        let command = value
            .get("t")
            .and_then(Value::as_str)
            .ok_or(ErrorCode::InvalidJson)?;

        if !KNOWN_COMMANDS.contains(&command) {
            return Err(ErrorCode::UnknownCommand);
        }

        serde_json::from_value(value).map_err(|_| ErrorCode::InvalidJson)
    }
}
