//! Client side of the position relay
//!
//! The client never blocks the tick loop. Outbound messages are queued for
//! the transport to collect; inbound messages are queued by the transport
//! and applied in one batch per tick. Remote peers are only ever touched by
//! inbound messages, never by local simulation.

use std::collections::{BTreeMap, VecDeque};

use glam::Vec2;

use super::ConnectionPhase;
use super::messages::{ClientMessage, Delta, PeerId, Position, ServerMessage};
use crate::is_finite_vec;

/// A remote player as this client knows it
#[derive(Debug, Clone, PartialEq)]
pub struct PeerState {
    pub id: PeerId,
    pub position: Vec2,
    /// Display colour (0xRRGGBB), stable for the id
    pub color: u32,
}

impl PeerState {
    pub fn new(id: PeerId, position: Vec2) -> Self {
        Self {
            id,
            position,
            color: peer_color(id),
        }
    }
}

/// Colour for a peer, spread over a light-blue-ish band
pub fn peer_color(id: PeerId) -> u32 {
    // splitmix-style scramble so neighbouring ids look different
    let mut h = id.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
    h = (h ^ (h >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    h = (h ^ (h >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    h ^= h >> 31;
    0x8888ff + (h % 0x777777) as u32
}

/// Roster changes for the presentation layer
#[derive(Debug, Clone, PartialEq)]
pub enum PeerEvent {
    Joined(PeerState),
    Moved { id: PeerId, position: Vec2 },
    Left(PeerId),
}

/// Throttled position sender and remote roster
#[derive(Debug, Clone)]
pub struct RelayClient {
    phase: ConnectionPhase,
    self_id: Option<PeerId>,
    throttle_ms: f32,
    since_send_ms: f32,
    last_sent: Vec2,
    peers: BTreeMap<PeerId, PeerState>,
    outbox: VecDeque<ClientMessage>,
    inbox: VecDeque<ServerMessage>,
    /// Last position the server echoed for our own id
    last_echo: Option<Vec2>,
}

impl RelayClient {
    pub fn new(throttle_ms: f32) -> Self {
        Self {
            phase: ConnectionPhase::Connecting,
            self_id: None,
            throttle_ms,
            since_send_ms: 0.0,
            last_sent: Vec2::ZERO,
            peers: BTreeMap::new(),
            outbox: VecDeque::new(),
            inbox: VecDeque::new(),
            last_echo: None,
        }
    }

    pub fn phase(&self) -> ConnectionPhase {
        self.phase
    }

    pub fn self_id(&self) -> Option<PeerId> {
        self.self_id
    }

    pub fn peers(&self) -> impl Iterator<Item = &PeerState> {
        self.peers.values()
    }

    pub fn peer(&self, id: PeerId) -> Option<&PeerState> {
        self.peers.get(&id)
    }

    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    pub fn last_echo(&self) -> Option<Vec2> {
        self.last_echo
    }

    /// Transport is up: announce our position
    pub fn connected(&mut self, self_id: PeerId, position: Vec2) {
        if self.phase != ConnectionPhase::Connecting {
            return;
        }
        if !is_finite_vec(position) {
            log::warn!("Refusing to announce non-finite position {:?}", position);
            return;
        }
        self.self_id = Some(self_id);
        self.phase = ConnectionPhase::Active;
        self.last_sent = position;
        self.since_send_ms = 0.0;
        self.outbox.push_back(ClientMessage::InitPosition(Position::from(position)));
        log::info!("Relay connected as {}", self_id);
    }

    /// Transport dropped; nothing further is sent or applied
    pub fn disconnected(&mut self) -> Vec<PeerEvent> {
        if self.phase == ConnectionPhase::Disconnected {
            return Vec::new();
        }
        self.phase = ConnectionPhase::Disconnected;
        self.outbox.clear();
        self.inbox.clear();
        log::info!("Relay disconnected, dropping {} peers", self.peers.len());
        std::mem::take(&mut self.peers)
            .into_keys()
            .map(PeerEvent::Left)
            .collect()
    }

    /// Advance the send clock; queue a `move` when the window has elapsed
    /// and the craft has moved since the last send
    pub fn tick(&mut self, elapsed_ms: f32, position: Vec2) {
        if self.phase != ConnectionPhase::Active {
            return;
        }
        if elapsed_ms.is_finite() && elapsed_ms > 0.0 {
            self.since_send_ms += elapsed_ms;
        }
        if self.since_send_ms < self.throttle_ms {
            return;
        }

        let delta = position - self.last_sent;
        if !is_finite_vec(delta) || delta == Vec2::ZERO {
            return;
        }
        self.outbox.push_back(ClientMessage::Move(Delta::from(delta)));
        self.last_sent = position;
        self.since_send_ms = 0.0;
    }

    /// Messages for the transport to send, oldest first
    pub fn drain_outbound(&mut self) -> Vec<ClientMessage> {
        self.outbox.drain(..).collect()
    }

    /// Queue a message that arrived from the server
    pub fn push_inbound(&mut self, msg: ServerMessage) {
        if self.phase == ConnectionPhase::Disconnected {
            return;
        }
        self.inbox.push_back(msg);
    }

    /// Decode and queue a raw wire message; malformed input is dropped
    pub fn push_inbound_json(&mut self, json: &str) {
        match ServerMessage::decode(json) {
            Ok(msg) => self.push_inbound(msg),
            Err(e) => log::warn!("Dropping inbound message: {}", e),
        }
    }

    /// Apply every queued inbound message in arrival order
    pub fn drain_inbound(&mut self) -> Vec<PeerEvent> {
        let mut events = Vec::new();
        while let Some(msg) = self.inbox.pop_front() {
            self.apply(msg, &mut events);
        }
        events
    }

    fn is_self(&self, id: PeerId) -> bool {
        self.self_id == Some(id)
    }

    fn add_peer(&mut self, id: PeerId, position: Vec2, events: &mut Vec<PeerEvent>) {
        if self.is_self(id) || self.peers.contains_key(&id) || !is_finite_vec(position) {
            return;
        }
        let peer = PeerState::new(id, position);
        log::info!("Peer {} joined at ({:.0}, {:.0})", id, position.x, position.y);
        events.push(PeerEvent::Joined(peer.clone()));
        self.peers.insert(id, peer);
    }

    fn apply(&mut self, msg: ServerMessage, events: &mut Vec<PeerEvent>) {
        match msg {
            ServerMessage::CurrentPlayers(roster) => {
                for (id, pos) in roster {
                    self.add_peer(id, pos.into(), events);
                }
            }
            ServerMessage::NewPlayer(p) => self.add_peer(p.id, p.position(), events),
            ServerMessage::PlayerMoved(p) => {
                let position = p.position();
                if !is_finite_vec(position) {
                    return;
                }
                if self.is_self(p.id) {
                    self.last_echo = Some(position);
                } else if let Some(peer) = self.peers.get_mut(&p.id) {
                    peer.position = position;
                    events.push(PeerEvent::Moved { id: p.id, position });
                }
            }
            ServerMessage::PlayerDisconnected(id) => {
                if self.peers.remove(&id).is_some() {
                    log::info!("Peer {} left", id);
                    events.push(PeerEvent::Left(id));
                }
            }
        }
    }
}
