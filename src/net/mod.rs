//! Multiplayer position relay
//!
//! Transport-agnostic: the client and server are plain state machines fed
//! decoded messages and returning messages to send. `hub` wraps the server
//! in a worker thread for transports that accept connections concurrently.

pub mod client;
pub mod hub;
pub mod messages;
pub mod server;

pub use client::{PeerEvent, PeerState, RelayClient, peer_color};
pub use hub::RelayHub;
pub use messages::{ClientMessage, Delta, PeerId, PeerPosition, Position, ServerMessage};
pub use server::{Envelope, Recipient, RelayServer};

/// Per-connection lifecycle; `Disconnected` is terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionPhase {
    Connecting,
    Active,
    Disconnected,
}
