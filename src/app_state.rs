//! Shared application state, threaded through every transport via Axum's
//! `State` extractor.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use crate::config::Config;
use crate::protocol::{PeerId, ServerMessage};
use crate::state::EntityStore;

/// Event-stream receivers created by `/api/lobby/connect`, awaiting the
/// matching `/api/lobby/events` call that will drive them. A peer is
/// registered in the entity store (with its sending half as its transport)
/// before the receiving half is claimed here, so other peers can address it
/// even if the client is slow to open its stream.
pub type PendingStreams = Mutex<HashMap<PeerId, mpsc::UnboundedReceiver<ServerMessage>>>;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<EntityStore>,
    pub config: Arc<Config>,
    pub pending_streams: Arc<PendingStreams>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let store = Arc::new(EntityStore::new(
            config.room_code_alphabet.clone(),
            config.room_code_length,
        ));
        Self {
            store,
            config: Arc::new(config),
            pending_streams: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}
