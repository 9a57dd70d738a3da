use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of error codes carried in the `error` envelope's `code` field
/// (lobby socket and HTTP transports) and in legacy session endpoint bodies.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    LobbyNotFound,
    LobbyClosed,
    LobbyFull,
    AlreadyInLobby,
    NotInLobby,
    UnknownCommand,
    InvalidJson,
    RoomNotFound,
    PeerNotFound,
    PeerIdInUse,
}

impl ErrorCode {
    /// Human-readable description, used in logs only — never sent to clients.
    pub fn description(&self) -> &'static str {
        match self {
            Self::LobbyNotFound => "No lobby exists with the given code or name.",
            Self::LobbyClosed => "The lobby is closed and no longer accepts new members.",
            Self::LobbyFull => "The lobby has reached its player limit.",
            Self::AlreadyInLobby => "The peer is already a member of a lobby.",
            Self::NotInLobby => "The peer is not currently a member of any lobby.",
            Self::UnknownCommand => "The message's command field did not match a known command.",
            Self::InvalidJson => "The message could not be parsed as a JSON object.",
            Self::RoomNotFound => "No signaling room exists with the given code.",
            Self::PeerNotFound => "No peer is connected with the given id.",
            Self::PeerIdInUse => "The requested client id is already in use by another peer.",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}
