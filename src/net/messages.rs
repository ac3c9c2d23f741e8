//! Relay message types and JSON wire codec.
//!
//! Every message travels as `{"event": "<name>", "data": <payload>}`.
//! Decoding is the validation boundary: anything that is not one of these
//! variants, or that carries a non-finite number, is rejected before the
//! relay sees it.

use std::collections::BTreeMap;
use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

/// Connection identifier assigned by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerId(pub u64);

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Absolute position on the wire
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<Vec2> for Position {
    fn from(v: Vec2) -> Self {
        Self { x: v.x, y: v.y }
    }
}

impl From<Position> for Vec2 {
    fn from(p: Position) -> Self {
        Vec2::new(p.x, p.y)
    }
}

/// Position change since the previous `move`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Delta {
    pub dx: f32,
    pub dy: f32,
}

impl Delta {
    pub fn is_finite(&self) -> bool {
        self.dx.is_finite() && self.dy.is_finite()
    }
}

impl From<Vec2> for Delta {
    fn from(v: Vec2) -> Self {
        Self { dx: v.x, dy: v.y }
    }
}

impl From<Delta> for Vec2 {
    fn from(d: Delta) -> Self {
        Vec2::new(d.dx, d.dy)
    }
}

/// A peer and where it is
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeerPosition {
    pub id: PeerId,
    pub x: f32,
    pub y: f32,
}

impl PeerPosition {
    pub fn new(id: PeerId, pos: Vec2) -> Self {
        Self { id, x: pos.x, y: pos.y }
    }

    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

/// Client → server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Register (or overwrite) this connection's position
    InitPosition(Position),
    /// Move by a delta; sent at most once per throttle window
    Move(Delta),
}

/// Server → client(s)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerMessage {
    /// Full roster, sent to a connection after it registers
    CurrentPlayers(BTreeMap<PeerId, Position>),
    /// A peer registered
    NewPlayer(PeerPosition),
    /// A peer's absolute position after a move
    PlayerMoved(PeerPosition),
    /// A peer left
    PlayerDisconnected(PeerId),
}

impl ClientMessage {
    /// Reject non-finite coordinates
    pub fn validate(&self) -> Result<(), ProtocolError> {
        match self {
            ClientMessage::InitPosition(p) if !p.is_finite() => {
                Err(ProtocolError::NonFinite { field: "initPosition" })
            }
            ClientMessage::Move(d) if !d.is_finite() => {
                Err(ProtocolError::NonFinite { field: "move" })
            }
            _ => Ok(()),
        }
    }

    pub fn decode(json: &str) -> Result<Self, ProtocolError> {
        let msg: ClientMessage = serde_json::from_str(json)?;
        msg.validate()?;
        Ok(msg)
    }

    pub fn encode(&self) -> Result<String, ProtocolError> {
        self.validate()?;
        Ok(serde_json::to_string(self)?)
    }
}

impl ServerMessage {
    /// Reject non-finite coordinates
    pub fn validate(&self) -> Result<(), ProtocolError> {
        let finite = match self {
            ServerMessage::CurrentPlayers(roster) => roster.values().all(Position::is_finite),
            ServerMessage::NewPlayer(p) | ServerMessage::PlayerMoved(p) => {
                p.x.is_finite() && p.y.is_finite()
            }
            ServerMessage::PlayerDisconnected(_) => true,
        };
        if finite {
            Ok(())
        } else {
            Err(ProtocolError::NonFinite { field: self.event_name() })
        }
    }

    pub fn decode(json: &str) -> Result<Self, ProtocolError> {
        let msg: ServerMessage = serde_json::from_str(json)?;
        msg.validate()?;
        Ok(msg)
    }

    pub fn encode(&self) -> Result<String, ProtocolError> {
        self.validate()?;
        Ok(serde_json::to_string(self)?)
    }

    /// Wire event name
    pub fn event_name(&self) -> &'static str {
        match self {
            ServerMessage::CurrentPlayers(_) => "currentPlayers",
            ServerMessage::NewPlayer(_) => "newPlayer",
            ServerMessage::PlayerMoved(_) => "playerMoved",
            ServerMessage::PlayerDisconnected(_) => "playerDisconnected",
        }
    }
}
