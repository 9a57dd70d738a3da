//! Wire protocol: message envelopes, error codes, and code generation.

pub mod error_codes;
pub mod messages;
pub mod room_codes;
pub mod signaling;

pub use error_codes::ErrorCode;
pub use messages::{ClientMessage, CloseReason, LobbyListItem, LobbyMember, PeerId, ServerMessage};
pub use signaling::{RoomPeerId, SignalingServerMessage};
