//! The lobby/signaling state machine: command handlers, event fan-out, and
//! the shared peer disconnect routine.

pub mod disconnect;
pub mod fanout;
pub mod lobby_router;

pub use disconnect::on_peer_disconnected;
pub use fanout::{broadcast, deliver};
