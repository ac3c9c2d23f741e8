//! Server side of the position relay
//!
//! Holds the roster (connection id → last known position) and turns each
//! inbound event into the envelopes the transport must deliver. The server
//! trusts client deltas: there is no speed cap or teleport check, only a
//! finiteness check so one bad message cannot corrupt a roster entry.
//!
//! `RelayServer` takes `&mut self` for every mutation, so callers on several
//! threads must serialise access; see [`super::hub`].

use std::collections::BTreeMap;

use glam::Vec2;

use super::ConnectionPhase;
use super::messages::{ClientMessage, PeerId, PeerPosition, Position, ServerMessage};
use crate::is_finite_vec;

/// Who an outbound message goes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    One(PeerId),
    AllExcept(PeerId),
    All,
}

/// An outbound message and its audience
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub to: Recipient,
    pub message: ServerMessage,
}

impl Envelope {
    fn new(to: Recipient, message: ServerMessage) -> Self {
        Self { to, message }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RelayServer {
    connections: BTreeMap<PeerId, ConnectionPhase>,
    roster: BTreeMap<PeerId, Vec2>,
    next_id: u64,
}

impl RelayServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept a new connection and assign it an id
    pub fn connect(&mut self) -> PeerId {
        self.next_id += 1;
        let id = PeerId(self.next_id);
        self.connections.insert(id, ConnectionPhase::Connecting);
        log::info!("Player connected: {}", id);
        id
    }

    pub fn phase(&self, id: PeerId) -> Option<ConnectionPhase> {
        self.connections.get(&id).copied()
    }

    pub fn position(&self, id: PeerId) -> Option<Vec2> {
        self.roster.get(&id).copied()
    }

    pub fn roster(&self) -> &BTreeMap<PeerId, Vec2> {
        &self.roster
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Connection ids an envelope should be delivered to
    pub fn recipients(&self, to: Recipient) -> Vec<PeerId> {
        match to {
            Recipient::One(id) => {
                if self.connections.contains_key(&id) {
                    vec![id]
                } else {
                    Vec::new()
                }
            }
            Recipient::AllExcept(skip) => self
                .connections
                .keys()
                .copied()
                .filter(|&id| id != skip)
                .collect(),
            Recipient::All => self.connections.keys().copied().collect(),
        }
    }

    fn snapshot(&self) -> ServerMessage {
        ServerMessage::CurrentPlayers(
            self.roster
                .iter()
                .map(|(&id, &pos)| (id, Position::from(pos)))
                .collect(),
        )
    }

    /// Apply one event from `from`
    pub fn handle(&mut self, from: PeerId, msg: ClientMessage) -> Vec<Envelope> {
        if self.connections.get(&from).is_none() {
            log::warn!("Message from unknown connection {}", from);
            return Vec::new();
        }
        if let Err(e) = msg.validate() {
            log::warn!("Rejected message from {}: {}", from, e);
            return Vec::new();
        }

        match msg {
            ClientMessage::InitPosition(p) => {
                let pos = Vec2::from(p);
                let existed = self.roster.insert(from, pos).is_some();
                self.connections.insert(from, ConnectionPhase::Active);

                let mut out = vec![Envelope::new(Recipient::One(from), self.snapshot())];
                if existed {
                    out.push(Envelope::new(
                        Recipient::All,
                        ServerMessage::PlayerMoved(PeerPosition::new(from, pos)),
                    ));
                } else {
                    log::info!("Player {} registered at ({:.0}, {:.0})", from, pos.x, pos.y);
                    out.push(Envelope::new(
                        Recipient::AllExcept(from),
                        ServerMessage::NewPlayer(PeerPosition::new(from, pos)),
                    ));
                }
                out
            }
            ClientMessage::Move(d) => {
                let Some(pos) = self.roster.get_mut(&from) else {
                    return Vec::new();
                };
                let moved = *pos + Vec2::from(d);
                if !is_finite_vec(moved) {
                    log::warn!("Move from {} overflows, ignoring", from);
                    return Vec::new();
                }
                *pos = moved;
                vec![Envelope::new(
                    Recipient::All,
                    ServerMessage::PlayerMoved(PeerPosition::new(from, moved)),
                )]
            }
        }
    }

    /// Decode a raw wire message and apply it; malformed input is dropped
    pub fn handle_json(&mut self, from: PeerId, json: &str) -> Vec<Envelope> {
        match ClientMessage::decode(json) {
            Ok(msg) => self.handle(from, msg),
            Err(e) => {
                log::warn!("Dropping message from {}: {}", from, e);
                Vec::new()
            }
        }
    }

    /// Transport reported the connection closed
    pub fn disconnect(&mut self, id: PeerId) -> Vec<Envelope> {
        if self.connections.remove(&id).is_none() {
            return Vec::new();
        }
        log::info!("Player disconnected: {}", id);
        if self.roster.remove(&id).is_some() {
            vec![Envelope::new(Recipient::All, ServerMessage::PlayerDisconnected(id))]
        } else {
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::messages::Delta;

    fn init(x: f32, y: f32) -> ClientMessage {
        ClientMessage::InitPosition(Position { x, y })
    }

    fn mv(dx: f32, dy: f32) -> ClientMessage {
        ClientMessage::Move(Delta { dx, dy })
    }

    #[test]
    fn test_init_replies_and_announces() {
        let mut server = RelayServer::new();
        let a = server.connect();
        let b = server.connect();
        assert_eq!(server.phase(a), Some(ConnectionPhase::Connecting));

        server.handle(a, init(10.0, 20.0));
        let out = server.handle(b, init(30.0, 40.0));

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].to, Recipient::One(b));
        match &out[0].message {
            ServerMessage::CurrentPlayers(roster) => {
                assert_eq!(roster.len(), 2);
                assert_eq!(roster[&a], Position { x: 10.0, y: 20.0 });
            }
            other => panic!("expected roster, got {:?}", other),
        }
        assert_eq!(out[1].to, Recipient::AllExcept(b));
        assert_eq!(
            out[1].message,
            ServerMessage::NewPlayer(PeerPosition::new(b, Vec2::new(30.0, 40.0)))
        );
        assert_eq!(server.recipients(out[1].to), vec![a]);
        assert_eq!(server.phase(b), Some(ConnectionPhase::Active));
    }

    #[test]
    fn test_reinit_overwrites_without_second_join() {
        let mut server = RelayServer::new();
        let a = server.connect();
        server.handle(a, init(0.0, 0.0));
        let out = server.handle(a, init(5.0, 5.0));
        assert!(out.iter().all(|e| !matches!(e.message, ServerMessage::NewPlayer(_))));
        assert_eq!(server.position(a), Some(Vec2::new(5.0, 5.0)));
        assert_eq!(server.roster().len(), 1);
    }

    #[test]
    fn test_move_applies_delta_and_echoes_to_all() {
        let mut server = RelayServer::new();
        let a = server.connect();
        server.handle(a, init(100.0, 100.0));
        let out = server.handle(a, mv(2.5, -1.0));
        assert_eq!(
            out,
            vec![Envelope::new(
                Recipient::All,
                ServerMessage::PlayerMoved(PeerPosition::new(a, Vec2::new(102.5, 99.0)))
            )]
        );
    }

    #[test]
    fn test_move_before_init_is_ignored() {
        let mut server = RelayServer::new();
        let a = server.connect();
        assert!(server.handle(a, mv(1.0, 1.0)).is_empty());
        assert!(server.position(a).is_none());
        assert!(server.handle(PeerId(999), mv(1.0, 1.0)).is_empty());
    }

    #[test]
    fn test_non_finite_move_is_rejected() {
        let mut server = RelayServer::new();
        let a = server.connect();
        server.handle(a, init(1.0, 1.0));
        assert!(server.handle(a, mv(f32::NAN, 0.0)).is_empty());
        assert!(server.handle(a, mv(0.0, f32::INFINITY)).is_empty());
        assert!(server.handle(a, mv(f32::MAX, 0.0)).len() == 1);
        // Second MAX would overflow to infinity
        assert!(server.handle(a, mv(f32::MAX, 0.0)).is_empty());
        assert!(server.position(a).unwrap().x.is_finite());
        assert!(server.handle_json(a, r#"{"event":"move","data":{"dx":1e300,"dy":0}}"#).is_empty());
    }

    #[test]
    fn test_disconnect_once() {
        let mut server = RelayServer::new();
        let a = server.connect();
        let b = server.connect();
        server.handle(a, init(0.0, 0.0));

        let out = server.disconnect(a);
        assert_eq!(out, vec![Envelope::new(Recipient::All, ServerMessage::PlayerDisconnected(a))]);
        assert_eq!(server.recipients(Recipient::All), vec![b]);
        assert!(server.disconnect(a).is_empty());
        assert!(server.handle(a, mv(1.0, 0.0)).is_empty());

        // Never registered: nobody was told it joined, nobody is told it left
        assert!(server.disconnect(b).is_empty());
        assert_eq!(server.connection_count(), 0);
    }
}
