//! Process-local domain state: the entity store and the types it holds.

pub mod model;
pub mod store;

pub use model::{Lobby, Peer, SignalingRoom, Transport};
pub use store::{EntityStore, JoinOutcome, LeaveOutcome};
