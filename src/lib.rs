#![cfg_attr(not(test), deny(clippy::panic))]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! A lightweight, in-memory lobby and WebRTC signaling server for
//! peer-to-peer game networking.
//!
//! Clients create or join named lobbies over one of three transports — a
//! persistent full-duplex socket, an HTTP request/response + server-sent-event
//! surface, or the legacy `/session/*` REST endpoints — and exchange WebRTC
//! offer/answer/ICE envelopes with other lobby members over a per-room
//! signaling relay. The server never inspects those envelopes; it only
//! allocates identities and routes them.

pub mod app_state;
pub mod config;
pub mod logging;
pub mod protocol;
pub mod routes;
pub mod server;
pub mod state;
pub mod transport;

pub use app_state::AppState;
