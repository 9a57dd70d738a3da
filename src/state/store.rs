//! The entity store: a single lock guarding peers, lobbies, signaling rooms,
//! and their secondary indexes.
//!
//! A single `std::sync::Mutex` is used in preference to a `dashmap`-per-field
//! layout (as used elsewhere in this codebase's connection bookkeeping)
//! because membership updates must be atomic across the peer map and the
//! lobby's member set at once — independently-locked maps cannot guarantee
//! that without a second coordination mechanism. The lock is held only across
//! pure in-memory operations, never across an `.await` point.

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::Value;
use tokio::sync::mpsc;

use crate::protocol::{ErrorCode, LobbyListItem, LobbyMember, PeerId, RoomPeerId};

use super::model::{Lobby, Peer, SignalingRoom, Transport};

struct Inner {
    next_peer_id: PeerId,
    peers: HashMap<PeerId, Peer>,
    lobbies: HashMap<String, Lobby>,
    rooms: HashMap<String, SignalingRoom>,
    /// lower-cased lobby/room name -> code, shared across both namespaces
    /// (mirrors the original's single `lobby_name_to_code` index).
    name_index: HashMap<String, String>,
}

impl Inner {
    fn code_taken(&self, code: &str) -> bool {
        self.lobbies.contains_key(code) || self.rooms.contains_key(code)
    }
}

/// Outcome of a successful `join_lobby`.
pub struct JoinOutcome {
    pub code: String,
    pub name: String,
    pub host_id: PeerId,
    pub members: Vec<LobbyMember>,
    /// Other members to fan `peer_joined` out to (empty when the joiner is
    /// the host rejoining its own lobby — a no-op, not a fresh join).
    pub fan_out_to: Vec<PeerId>,
    pub is_rejoin: bool,
}

/// Outcome of a successful `leave_lobby` (or the membership half of a disconnect).
pub enum LeaveOutcome {
    Left {
        code: String,
        remaining: Vec<PeerId>,
    },
    Closed {
        code: String,
        remaining: Vec<PeerId>,
    },
}

pub struct EntityStore {
    inner: Mutex<Inner>,
    alphabet: String,
    code_length: usize,
}

impl EntityStore {
    pub fn new(alphabet: String, code_length: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                next_peer_id: 1,
                peers: HashMap::new(),
                lobbies: HashMap::new(),
                rooms: HashMap::new(),
                name_index: HashMap::new(),
            }),
            alphabet,
            code_length,
        }
    }

    fn generate_code_locked(&self, inner: &Inner) -> String {
        crate::protocol::room_codes::generate_unique_code(&self.alphabet, self.code_length, |c| {
            inner.code_taken(c)
        })
    }

    // -- peers --------------------------------------------------------

    /// Allocates and reserves the next peer id, registering the peer immediately.
    pub fn register_peer(&self, transport: Transport) -> PeerId {
        let mut inner = self.inner.lock().expect("entity store lock poisoned");
        let id = inner.next_peer_id;
        inner.next_peer_id += 1;
        inner.peers.insert(id, Peer::new(id, transport));
        id
    }

    /// Registers a peer under a caller-supplied id (HTTP `connect` with `client_id`).
    /// Fails with `PeerIdInUse` if the id is already live.
    pub fn register_peer_with_id(
        &self,
        id: PeerId,
        transport: Transport,
    ) -> Result<(), ErrorCode> {
        let mut inner = self.inner.lock().expect("entity store lock poisoned");
        if inner.peers.contains_key(&id) {
            return Err(ErrorCode::PeerIdInUse);
        }
        if id >= inner.next_peer_id {
            inner.next_peer_id = id + 1;
        }
        inner.peers.insert(id, Peer::new(id, transport));
        Ok(())
    }

    pub fn peer_exists(&self, id: PeerId) -> bool {
        let inner = self.inner.lock().expect("entity store lock poisoned");
        inner.peers.contains_key(&id)
    }

    /// Clones the peer's current transport handle for delivery without holding
    /// the lock across the subsequent I/O.
    pub fn snapshot_transport(&self, id: PeerId) -> Option<Transport> {
        let inner = self.inner.lock().expect("entity store lock poisoned");
        inner.peers.get(&id).map(|p| p.transport.clone())
    }

    pub fn set_peer_player(&self, id: PeerId, player: Option<Value>) {
        let mut inner = self.inner.lock().expect("entity store lock poisoned");
        if let Some(peer) = inner.peers.get_mut(&id) {
            peer.player = player;
        }
    }

    // -- lobbies --------------------------------------------------------

    pub fn create_lobby(
        &self,
        host_id: PeerId,
        name: Option<String>,
        public: bool,
        player_limit: u32,
        host_player: Option<Value>,
        default_channel: &str,
    ) -> (String, String) {
        let mut inner = self.inner.lock().expect("entity store lock poisoned");
        let code = self.generate_code_locked(&inner);
        let name = name.unwrap_or_else(|| format!("Lobby-{code}"));

        let mut lobby = Lobby::new(code.clone(), name.clone(), host_id, public, player_limit);
        lobby.members.insert(host_id, host_player);

        inner.name_index.insert(name.to_lowercase(), code.clone());
        inner.lobbies.insert(code.clone(), lobby);

        // Room-local id 1 is implicitly the lobby socket connection of the host;
        // the signaling relay's own connections start allocating from 2.
        let room = SignalingRoom::new(
            code.clone(),
            name.clone(),
            public,
            player_limit,
            default_channel.to_string(),
            2,
        );
        inner.rooms.insert(code.clone(), room);

        if let Some(peer) = inner.peers.get_mut(&host_id) {
            peer.lobby_code = Some(code.clone());
        }

        (code, name)
    }

    /// Resolves a code (exact, case-insensitive) or a lobby name (case-insensitive)
    /// against the lobby namespace. The shared name index is filtered down to
    /// entries that currently back a lobby, since a room can register under
    /// the same index.
    fn resolve_lobby_code_locked(inner: &Inner, code_or_name: &str) -> Option<String> {
        let upper = code_or_name.to_uppercase();
        if inner.lobbies.contains_key(&upper) {
            return Some(upper);
        }
        let code = inner.name_index.get(&code_or_name.to_lowercase())?;
        inner.lobbies.contains_key(code).then(|| code.clone())
    }

    /// Resolves a code or a room name against the room namespace — the
    /// counterpart used by the legacy `/session/join` endpoint, which must
    /// find standalone rooms created by `/session/host` as well as the room
    /// paired with a lobby.
    fn resolve_room_code_locked(inner: &Inner, code_or_name: &str) -> Option<String> {
        let upper = code_or_name.to_uppercase();
        if inner.rooms.contains_key(&upper) {
            return Some(upper);
        }
        let code = inner.name_index.get(&code_or_name.to_lowercase())?;
        inner.rooms.contains_key(code).then(|| code.clone())
    }

    /// Resolves `peer_id`'s current lobby and returns its code and full member list.
    pub fn lobby_member_ids(&self, peer_id: PeerId) -> Result<(String, Vec<PeerId>), ErrorCode> {
        let inner = self.inner.lock().expect("entity store lock poisoned");
        let code = inner
            .peers
            .get(&peer_id)
            .and_then(|p| p.lobby_code.clone())
            .ok_or(ErrorCode::NotInLobby)?;
        let lobby = inner.lobbies.get(&code).ok_or(ErrorCode::LobbyNotFound)?;
        Ok((code, lobby.members.keys().copied().collect()))
    }

    pub fn find_lobby_code(&self, code_or_name: &str) -> Option<String> {
        let inner = self.inner.lock().expect("entity store lock poisoned");
        Self::resolve_lobby_code_locked(&inner, code_or_name)
    }

    /// Resolves a room code or room name, whether the room stands alone
    /// (`/session/host`) or is paired with a lobby.
    pub fn find_room_code(&self, code_or_name: &str) -> Option<String> {
        let inner = self.inner.lock().expect("entity store lock poisoned");
        Self::resolve_room_code_locked(&inner, code_or_name)
    }

    pub fn join_lobby(
        &self,
        peer_id: PeerId,
        code_or_name: &str,
        player: Option<Value>,
    ) -> Result<JoinOutcome, ErrorCode> {
        let mut inner = self.inner.lock().expect("entity store lock poisoned");

        let already_in = inner
            .peers
            .get(&peer_id)
            .and_then(|p| p.lobby_code.clone());

        let code = Self::resolve_lobby_code_locked(&inner, code_or_name)
            .ok_or(ErrorCode::LobbyNotFound)?;

        let is_rejoin = {
            let lobby = inner.lobbies.get(&code).ok_or(ErrorCode::LobbyNotFound)?;
            lobby.host_id == peer_id && lobby.members.contains_key(&peer_id)
        };

        if !is_rejoin && already_in.is_some() {
            return Err(ErrorCode::AlreadyInLobby);
        }

        let lobby = inner.lobbies.get_mut(&code).ok_or(ErrorCode::LobbyNotFound)?;
        if !is_rejoin {
            if !lobby.open {
                return Err(ErrorCode::LobbyClosed);
            }
            if lobby.is_full() {
                return Err(ErrorCode::LobbyFull);
            }
            lobby.members.insert(peer_id, player);
        }

        let members: Vec<LobbyMember> = lobby
            .members
            .iter()
            .map(|(id, player)| LobbyMember {
                id: *id,
                player: player.clone(),
            })
            .collect();
        let fan_out_to: Vec<PeerId> = if is_rejoin {
            Vec::new()
        } else {
            lobby.members.keys().copied().filter(|id| *id != peer_id).collect()
        };
        let host_id = lobby.host_id;
        let name = lobby.name.clone();
        let member_count = members.len() as u32;

        if let Some(peer) = inner.peers.get_mut(&peer_id) {
            peer.lobby_code = Some(code.clone());
        }
        if !is_rejoin {
            if let Some(room) = inner.rooms.get_mut(&code) {
                room.player_count = member_count;
            }
        }

        Ok(JoinOutcome {
            code,
            name,
            host_id,
            members,
            fan_out_to,
            is_rejoin,
        })
    }

    /// Removes `peer_id` from its current lobby (if any). Closes the lobby if
    /// the departing peer was its host.
    pub fn leave_lobby(&self, peer_id: PeerId) -> Result<LeaveOutcome, ErrorCode> {
        let mut inner = self.inner.lock().expect("entity store lock poisoned");

        let code = inner
            .peers
            .get(&peer_id)
            .and_then(|p| p.lobby_code.clone())
            .ok_or(ErrorCode::NotInLobby)?;

        let Some(lobby) = inner.lobbies.get(&code) else {
            if let Some(peer) = inner.peers.get_mut(&peer_id) {
                peer.lobby_code = None;
            }
            return Err(ErrorCode::LobbyNotFound);
        };

        if lobby.host_id == peer_id {
            let remaining: Vec<PeerId> = lobby
                .members
                .keys()
                .copied()
                .filter(|id| *id != peer_id)
                .collect();
            self.remove_lobby_locked(&mut inner, &code);
            Ok(LeaveOutcome::Closed { code, remaining })
        } else {
            let mut lobby = inner.lobbies.remove(&code).expect("checked above");
            lobby.members.remove(&peer_id);
            let remaining: Vec<PeerId> = lobby.members.keys().copied().collect();
            inner.lobbies.insert(code.clone(), lobby);
            if let Some(peer) = inner.peers.get_mut(&peer_id) {
                peer.lobby_code = None;
            }
            if let Some(room) = inner.rooms.get_mut(&code) {
                room.player_count = remaining.len() as u32;
            }
            Ok(LeaveOutcome::Left { code, remaining })
        }
    }

    fn remove_lobby_locked(&self, inner: &mut Inner, code: &str) {
        if let Some(lobby) = inner.lobbies.remove(code) {
            inner.name_index.remove(&lobby.name.to_lowercase());
            for id in lobby.members.keys() {
                if let Some(peer) = inner.peers.get_mut(id) {
                    peer.lobby_code = None;
                }
            }
        }
        inner.rooms.remove(code);
    }

    pub fn close_lobby(&self, code: &str) -> Vec<PeerId> {
        let mut inner = self.inner.lock().expect("entity store lock poisoned");
        let remaining = inner
            .lobbies
            .get(code)
            .map(|l| l.members.keys().copied().collect())
            .unwrap_or_default();
        self.remove_lobby_locked(&mut inner, code);
        remaining
    }

    pub fn list_public_lobbies(&self) -> Vec<LobbyListItem> {
        let inner = self.inner.lock().expect("entity store lock poisoned");
        inner
            .lobbies
            .values()
            .filter(|l| l.public && l.open)
            .map(|l| LobbyListItem {
                code: l.code.clone(),
                name: l.name.clone(),
                players: l.player_count(),
                public: l.public,
                player_limit: l.player_limit,
            })
            .collect()
    }

    /// Legacy `/lobbies` shape: every lobby regardless of visibility, paired
    /// with its signaling room's player count.
    pub fn list_all_rooms(&self) -> Vec<(String, String, u32, u32, bool, bool)> {
        let inner = self.inner.lock().expect("entity store lock poisoned");
        inner
            .rooms
            .values()
            .map(|r| {
                let open = inner.lobbies.get(&r.code).map(|l| l.open).unwrap_or(true);
                (
                    r.code.clone(),
                    r.name.clone(),
                    r.player_count,
                    r.player_limit,
                    r.public,
                    open,
                )
            })
            .collect()
    }

    /// Resolves the entity-store side effects of a peer's transport closing.
    /// Returns `Some` if the peer was in a lobby at the time.
    pub fn disconnect_peer(&self, peer_id: PeerId) -> (Option<LeaveOutcome>, bool) {
        let mut inner = self.inner.lock().expect("entity store lock poisoned");
        let code = inner.peers.get(&peer_id).and_then(|p| p.lobby_code.clone());
        let outcome = code.and_then(|code| {
            let is_host = inner.lobbies.get(&code)?.host_id == peer_id;
            if is_host {
                let remaining: Vec<PeerId> = inner
                    .lobbies
                    .get(&code)?
                    .members
                    .keys()
                    .copied()
                    .filter(|id| *id != peer_id)
                    .collect();
                self.remove_lobby_locked(&mut inner, &code);
                Some(LeaveOutcome::Closed { code, remaining })
            } else {
                let mut lobby = inner.lobbies.remove(&code)?;
                lobby.members.remove(&peer_id);
                let remaining: Vec<PeerId> = lobby.members.keys().copied().collect();
                inner.lobbies.insert(code.clone(), lobby);
                if let Some(room) = inner.rooms.get_mut(&code) {
                    room.player_count = remaining.len() as u32;
                }
                Some(LeaveOutcome::Left { code, remaining })
            }
        });
        let existed = inner.peers.remove(&peer_id).is_some();
        (outcome, existed)
    }

    // -- legacy/standalone signaling rooms -------------------------------

    /// Creates a signaling room with no paired lobby (legacy `/session/host`).
    /// In debug mode the fixed code [`crate::protocol::room_codes::DEBUG_CODE`]
    /// is used even if it collides with an existing entry, overwriting it.
    pub fn host_room(
        &self,
        name: Option<String>,
        public: bool,
        player_limit: u32,
        channel: String,
        is_debug: bool,
    ) -> String {
        let mut inner = self.inner.lock().expect("entity store lock poisoned");
        let code = if is_debug {
            crate::protocol::room_codes::DEBUG_CODE.to_string()
        } else {
            self.generate_code_locked(&inner)
        };
        let name = name.unwrap_or_else(|| format!("Lobby-{code}"));
        inner.name_index.insert(name.to_lowercase(), code.clone());
        let room = SignalingRoom::new(code.clone(), name, public, player_limit, channel, 1);
        inner.rooms.insert(code.clone(), room);
        code
    }

    pub fn room_exists(&self, code: &str) -> bool {
        let inner = self.inner.lock().expect("entity store lock poisoned");
        inner.rooms.contains_key(code)
    }

    pub fn update_room(
        &self,
        code: &str,
        name: Option<String>,
        public: Option<bool>,
        player_limit: Option<u32>,
    ) -> Result<(), ErrorCode> {
        let mut inner = self.inner.lock().expect("entity store lock poisoned");
        let room = inner.rooms.get_mut(code).ok_or(ErrorCode::RoomNotFound)?;
        if let Some(name) = name {
            room.name = name;
        }
        if let Some(public) = public {
            room.public = public;
        }
        if let Some(limit) = player_limit {
            room.player_limit = limit;
        }
        Ok(())
    }

    pub fn set_room_player_count(&self, code: &str, count: u32) -> Result<u32, ErrorCode> {
        let mut inner = self.inner.lock().expect("entity store lock poisoned");
        let room = inner.rooms.get_mut(code).ok_or(ErrorCode::RoomNotFound)?;
        room.player_count = count;
        Ok(room.player_count)
    }

    /// Tears down the room at `code` and, if a lobby is paired with it,
    /// removes that lobby too. Returns the paired lobby's member ids (minus
    /// its host) so the caller can fan `lobby_closed{reason: host_closed}`
    /// out to them; empty when the room had no paired lobby.
    pub fn close_room(&self, code: &str) -> Result<Vec<PeerId>, ErrorCode> {
        let mut inner = self.inner.lock().expect("entity store lock poisoned");
        let Some(room) = inner.rooms.remove(code) else {
            return Err(ErrorCode::RoomNotFound);
        };
        inner.name_index.remove(&room.name.to_lowercase());
        let remaining = inner
            .lobbies
            .get(code)
            .map(|l| l.members.keys().copied().filter(|id| *id != l.host_id).collect())
            .unwrap_or_default();
        self.remove_lobby_locked(&mut inner, code);
        Ok(remaining)
    }

    // -- signaling connections -------------------------------------------

    pub fn signaling_join(
        &self,
        code: &str,
        sender: mpsc::UnboundedSender<Value>,
    ) -> Result<(RoomPeerId, Vec<RoomPeerId>), ErrorCode> {
        let mut inner = self.inner.lock().expect("entity store lock poisoned");
        let room = inner.rooms.get_mut(code).ok_or(ErrorCode::RoomNotFound)?;
        let existing = room.peer_ids();
        let id = room.next_id();
        room.connections.insert(id, sender);
        Ok((id, existing))
    }

    pub fn signaling_peer_ids(&self, code: &str) -> Vec<RoomPeerId> {
        let inner = self.inner.lock().expect("entity store lock poisoned");
        inner
            .rooms
            .get(code)
            .map(|r| r.peer_ids())
            .unwrap_or_default()
    }

    pub fn signaling_sender(
        &self,
        code: &str,
        id: RoomPeerId,
    ) -> Option<mpsc::UnboundedSender<Value>> {
        let inner = self.inner.lock().expect("entity store lock poisoned");
        inner.rooms.get(code)?.connections.get(&id).cloned()
    }

    pub fn signaling_all_senders(&self, code: &str) -> Vec<(RoomPeerId, mpsc::UnboundedSender<Value>)> {
        let inner = self.inner.lock().expect("entity store lock poisoned");
        inner
            .rooms
            .get(code)
            .map(|r| r.connections.iter().map(|(k, v)| (*k, v.clone())).collect())
            .unwrap_or_default()
    }

    pub fn signaling_leave(&self, code: &str, id: RoomPeerId) -> Vec<RoomPeerId> {
        let mut inner = self.inner.lock().expect("entity store lock poisoned");
        if let Some(room) = inner.rooms.get_mut(code) {
            room.connections.remove(&id);
            room.peer_ids()
        } else {
            Vec::new()
        }
    }

    // -- shutdown / introspection -----------------------------------------

    pub fn all_peer_transports(&self) -> Vec<(PeerId, Transport)> {
        let inner = self.inner.lock().expect("entity store lock poisoned");
        inner
            .peers
            .iter()
            .map(|(id, peer)| (*id, peer.transport.clone()))
            .collect()
    }

    pub fn all_signaling_senders(&self) -> Vec<mpsc::UnboundedSender<Value>> {
        let inner = self.inner.lock().expect("entity store lock poisoned");
        inner
            .rooms
            .values()
            .flat_map(|r| r.connections.values().cloned())
            .collect()
    }

    pub fn counts(&self) -> (usize, usize, usize) {
        let inner = self.inner.lock().expect("entity store lock poisoned");
        (inner.rooms.len(), inner.lobbies.len(), inner.peers.len())
    }

    pub fn clear_all(&self) {
        let mut inner = self.inner.lock().expect("entity store lock poisoned");
        inner.peers.clear();
        inner.lobbies.clear();
        inner.rooms.clear();
        inner.name_index.clear();
    }
}

impl Clone for Transport {
    fn clone(&self) -> Self {
        match self {
            Self::Socket(tx) => Self::Socket(tx.clone()),
            Self::EventStream(tx) => Self::EventStream(tx.clone()),
        }
    }
}
