//! Relay hub: a `RelayServer` owned by one worker thread.
//!
//! Transports on any number of threads talk to the hub through a command
//! channel, so roster mutations are applied one at a time in the order the
//! hub receives them. Each connection registers a sink that receives encoded
//! JSON frames; a sink whose receiver has gone away counts as a disconnect.

use std::collections::BTreeMap;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use super::messages::PeerId;
use super::server::{Envelope, RelayServer};

enum HubCommand {
    Connect {
        sink: Sender<String>,
        reply: Sender<PeerId>,
    },
    Message {
        from: PeerId,
        json: String,
    },
    Disconnect {
        id: PeerId,
    },
    Shutdown,
}

/// Handle to the hub thread. Cloneable senders are not exposed; wrap the
/// hub in an `Arc` to share it between transport threads.
pub struct RelayHub {
    tx: Sender<HubCommand>,
    worker: Option<JoinHandle<RelayServer>>,
}

impl RelayHub {
    /// Start the worker thread
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::channel();
        let worker = thread::Builder::new()
            .name("relay-hub".into())
            .spawn(move || run(rx))
            .map_err(|e| log::error!("Failed to spawn relay hub: {}", e))
            .ok();
        Self { tx, worker }
    }

    /// Register a connection whose outbound frames go to `sink`
    pub fn connect(&self, sink: Sender<String>) -> Option<PeerId> {
        let (reply, answer) = mpsc::channel();
        self.tx.send(HubCommand::Connect { sink, reply }).ok()?;
        answer.recv().ok()
    }

    /// Forward a raw frame received from `from`
    pub fn send(&self, from: PeerId, json: impl Into<String>) -> bool {
        self.tx
            .send(HubCommand::Message {
                from,
                json: json.into(),
            })
            .is_ok()
    }

    /// Transport saw the connection close
    pub fn disconnect(&self, id: PeerId) -> bool {
        self.tx.send(HubCommand::Disconnect { id }).is_ok()
    }

    /// Stop the worker and hand back the final server state
    pub fn shutdown(mut self) -> Option<RelayServer> {
        let _ = self.tx.send(HubCommand::Shutdown);
        self.worker.take().and_then(|w| w.join().ok())
    }
}

impl Drop for RelayHub {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = self.tx.send(HubCommand::Shutdown);
            let _ = worker.join();
        }
    }
}

fn run(rx: Receiver<HubCommand>) -> RelayServer {
    let mut server = RelayServer::new();
    let mut sinks: BTreeMap<PeerId, Sender<String>> = BTreeMap::new();

    while let Ok(cmd) = rx.recv() {
        let envelopes = match cmd {
            HubCommand::Connect { sink, reply } => {
                let id = server.connect();
                sinks.insert(id, sink);
                if reply.send(id).is_err() {
                    // Caller gave up waiting; undo
                    sinks.remove(&id);
                    server.disconnect(id)
                } else {
                    Vec::new()
                }
            }
            HubCommand::Message { from, json } => server.handle_json(from, &json),
            HubCommand::Disconnect { id } => {
                sinks.remove(&id);
                server.disconnect(id)
            }
            HubCommand::Shutdown => break,
        };
        deliver(&mut server, &mut sinks, envelopes);
    }

    log::info!("Relay hub stopped with {} connections", server.connection_count());
    server
}

/// Send envelopes to their sinks; sinks that fail are disconnected, which
/// can produce further envelopes
fn deliver(
    server: &mut RelayServer,
    sinks: &mut BTreeMap<PeerId, Sender<String>>,
    mut pending: Vec<Envelope>,
) {
    while !pending.is_empty() {
        let mut dead = Vec::new();
        for envelope in pending.drain(..) {
            let json = match envelope.message.encode() {
                Ok(json) => json,
                Err(e) => {
                    log::warn!("Dropping outbound {}: {}", envelope.message.event_name(), e);
                    continue;
                }
            };
            for id in server.recipients(envelope.to) {
                let delivered = sinks.get(&id).is_some_and(|sink| sink.send(json.clone()).is_ok());
                if !delivered && !dead.contains(&id) {
                    dead.push(id);
                }
            }
        }
        for id in dead {
            sinks.remove(&id);
            pending.extend(server.disconnect(id));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::messages::ServerMessage;
    use std::time::Duration;

    fn recv(rx: &Receiver<String>) -> ServerMessage {
        let json = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        ServerMessage::decode(&json).unwrap()
    }

    #[test]
    fn test_two_connections_see_each_other() {
        let hub = RelayHub::spawn();
        let (a_tx, a_rx) = mpsc::channel();
        let (b_tx, b_rx) = mpsc::channel();
        let a = hub.connect(a_tx).unwrap();
        let b = hub.connect(b_tx).unwrap();

        hub.send(a, r#"{"event":"initPosition","data":{"x":1,"y":2}}"#);
        assert!(matches!(recv(&a_rx), ServerMessage::CurrentPlayers(_)));
        assert!(matches!(recv(&b_rx), ServerMessage::NewPlayer(p) if p.id == a));

        hub.send(a, r#"{"event":"move","data":{"dx":1,"dy":1}}"#);
        assert!(matches!(recv(&a_rx), ServerMessage::PlayerMoved(p) if p.x == 2.0 && p.y == 3.0));
        assert!(matches!(recv(&b_rx), ServerMessage::PlayerMoved(_)));

        hub.disconnect(a);
        assert_eq!(recv(&b_rx), ServerMessage::PlayerDisconnected(a));

        let server = hub.shutdown().unwrap();
        assert!(server.roster().is_empty());
        assert_eq!(server.phase(b), Some(crate::net::ConnectionPhase::Connecting));
    }

    #[test]
    fn test_dropped_sink_counts_as_disconnect() {
        let hub = RelayHub::spawn();
        let (a_tx, a_rx) = mpsc::channel();
        let (b_tx, b_rx) = mpsc::channel();
        let a = hub.connect(a_tx).unwrap();
        let b = hub.connect(b_tx).unwrap();
        hub.send(a, r#"{"event":"initPosition","data":{"x":0,"y":0}}"#);
        hub.send(b, r#"{"event":"initPosition","data":{"x":0,"y":0}}"#);
        recv(&a_rx); // roster
        recv(&a_rx); // b joined
        drop(b_rx);

        // Delivering b's echo fails, so b is dropped and a hears about it
        hub.send(b, r#"{"event":"move","data":{"dx":1,"dy":0}}"#);
        assert!(matches!(recv(&a_rx), ServerMessage::PlayerMoved(p) if p.id == b));
        assert_eq!(recv(&a_rx), ServerMessage::PlayerDisconnected(b));

        let server = hub.shutdown().unwrap();
        assert_eq!(server.connection_count(), 1);
    }
}
