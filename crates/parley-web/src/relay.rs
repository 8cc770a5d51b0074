//! Broadcast relay: fans a chat message out to every authenticated
//! connection.
//!
//! Membership and fan-out share one mutex, making the relay the single
//! serialization point for message order. Each peer gets an unbounded inbox;
//! a send failure (peer task already gone) is isolated and never surfaces to
//! the sender.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use tokio::sync::mpsc;

pub type ConnId = u64;

struct Peer {
    username: String,
    tx: mpsc::UnboundedSender<String>,
}

pub struct BroadcastRelay {
    peers: Mutex<HashMap<ConnId, Peer>>,
    next_id: AtomicU64,
    echo_to_sender: bool,
}

impl BroadcastRelay {
    pub fn new(echo_to_sender: bool) -> Self {
        Self {
            peers: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            echo_to_sender,
        }
    }

    /// Adds an authenticated connection to the session set and returns its
    /// id plus the inbox its task should drain.
    pub fn register(&self, username: &str) -> (ConnId, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        let mut peers = self.peers.lock().expect("relay lock poisoned");
        peers.insert(
            id,
            Peer {
                username: username.to_string(),
                tx,
            },
        );
        tracing::info!("{username} joined (connection {id}, {} online)", peers.len());

        (id, rx)
    }

    /// Removes a connection from the session set. Safe to call more than
    /// once; a second call is a no-op.
    pub fn deregister(&self, id: ConnId) {
        let mut peers = self.peers.lock().expect("relay lock poisoned");
        if let Some(peer) = peers.remove(&id) {
            tracing::info!(
                "{} left (connection {id}, {} online)",
                peer.username,
                peers.len()
            );
        }
    }

    /// Delivers `text` verbatim to every registered connection. The sender
    /// is included or skipped according to the echo policy.
    pub fn publish(&self, sender: ConnId, text: &str) {
        let peers = self.peers.lock().expect("relay lock poisoned");
        for (id, peer) in peers.iter() {
            if *id == sender && !self.echo_to_sender {
                continue;
            }
            if peer.tx.send(text.to_string()).is_err() {
                tracing::debug!("Dropped broadcast to closing connection {id}");
            }
        }
    }

    pub fn online(&self) -> usize {
        self.peers.lock().expect("relay lock poisoned").len()
    }
}
