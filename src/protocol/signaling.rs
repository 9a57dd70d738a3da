//! Signaling relay envelopes.
//!
//! Offer/answer/ICE payloads are opaque to the server: it only reads the
//! `data_type` and `to` routing headers and stamps `from` before forwarding
//! the frame verbatim. Only the server-originated bookkeeping frames below
//! are strongly typed.

use serde::Serialize;

pub type RoomPeerId = u32;

/// Frames the server originates on the signaling relay, tagged by `data_type`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "data_type", rename_all = "snake_case")]
pub enum SignalingServerMessage {
    Initialize {
        id: RoomPeerId,
        peers: Vec<RoomPeerId>,
    },
    NewConnection {
        peer_id: RoomPeerId,
    },
    PeerDisconnected {
        peer_id: RoomPeerId,
    },
    ServerShutdown,
}

/// Extracts the `to` routing header from a raw client frame, if present and
/// numeric. Returns `None` for frames with no routing target (e.g. `ready`).
pub fn extract_to(frame: &serde_json::Value) -> Option<RoomPeerId> {
    frame.get("to")?.as_u64().map(|v| v as RoomPeerId)
}

/// Extracts the `data_type` discriminant from a raw client frame.
pub fn extract_data_type(frame: &serde_json::Value) -> Option<&str> {
    frame.get("data_type")?.as_str()
}

/// Stamps `from` onto a frame before forwarding it to its target.
pub fn stamp_from(mut frame: serde_json::Value, from: RoomPeerId) -> serde_json::Value {
    if let Some(obj) = frame.as_object_mut() {
        obj.insert("from".to_string(), serde_json::json!(from));
    }
    frame
}
