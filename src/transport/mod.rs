//! The three client-facing transports: the lobby socket, the HTTP +
//! event-stream surface, and the per-room signaling relay — plus the legacy
//! REST endpoints carried forward for backward compatibility.

pub mod http_sse;
pub mod legacy;
pub mod lobby_socket;
pub mod signaling_ws;
