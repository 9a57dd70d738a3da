//! Domain types held by the entity store.

use std::collections::BTreeMap;

use serde_json::Value;
use tokio::sync::mpsc;

use crate::protocol::{PeerId, RoomPeerId, ServerMessage};

/// A peer's exactly-one active delivery mechanism.
///
/// A peer is either attached to a persistent full-duplex socket (the lobby
/// socket transport) or to an HTTP event-stream outbox — never both, never
/// neither while the peer is registered.
pub enum Transport {
    Socket(mpsc::UnboundedSender<axum::extract::ws::Message>),
    EventStream(mpsc::UnboundedSender<ServerMessage>),
}

/// A connected client identity, unique for the lifetime of the process.
pub struct Peer {
    pub id: PeerId,
    pub player: Option<Value>,
    pub lobby_code: Option<String>,
    pub transport: Transport,
}

impl Peer {
    pub fn new(id: PeerId, transport: Transport) -> Self {
        Self {
            id,
            player: None,
            lobby_code: None,
            transport,
        }
    }
}

/// A named game lobby, identified by a 4-character code.
pub struct Lobby {
    pub code: String,
    pub name: String,
    pub host_id: PeerId,
    pub public: bool,
    /// 0 means unlimited.
    pub player_limit: u32,
    pub open: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    /// Insertion-ordered membership; order is preserved so `players` listings
    /// are stable across repeated reads.
    pub members: BTreeMap<PeerId, Option<Value>>,
}

impl Lobby {
    pub fn new(code: String, name: String, host_id: PeerId, public: bool, player_limit: u32) -> Self {
        let mut members = BTreeMap::new();
        members.insert(host_id, None);
        Self {
            code,
            name,
            host_id,
            public,
            player_limit,
            open: true,
            created_at: chrono::Utc::now(),
            members,
        }
    }

    pub fn is_full(&self) -> bool {
        self.player_limit != 0 && self.members.len() as u32 >= self.player_limit
    }

    pub fn player_count(&self) -> usize {
        self.members.len()
    }
}

/// A per-room signaling relay, paired with a lobby of the same code (or
/// standalone, when created via the legacy host endpoint).
pub struct SignalingRoom {
    pub code: String,
    pub name: String,
    pub public: bool,
    pub player_limit: u32,
    /// Advisory count, seeded to 1 for the creator and settable directly via
    /// the legacy `/session/players` endpoint. For a room paired with a
    /// lobby, the store also keeps it synced to the lobby's live membership
    /// on join/leave/disconnect; a standalone room's count is manual only.
    pub player_count: u32,
    pub channel: String,
    next_peer_id: RoomPeerId,
    pub connections: BTreeMap<RoomPeerId, mpsc::UnboundedSender<Value>>,
}

impl SignalingRoom {
    /// `start_id` is 2 when paired with a lobby (whose host already occupies
    /// room-local id 1 implicitly via the lobby socket), and 1 when standalone.
    pub fn new(code: String, name: String, public: bool, player_limit: u32, channel: String, start_id: RoomPeerId) -> Self {
        Self {
            code,
            name,
            public,
            player_limit,
            player_count: 1,
            channel,
            next_peer_id: start_id,
            connections: BTreeMap::new(),
        }
    }

    pub fn next_id(&mut self) -> RoomPeerId {
        let id = self.next_peer_id;
        self.next_peer_id += 1;
        id
    }

    pub fn peer_ids(&self) -> Vec<RoomPeerId> {
        self.connections.keys().copied().collect()
    }
}
