//! Registry of connected pages and broadcast fan-out.
//!
//! Pages connect and disconnect independently of the worker's
//! lifetime, so the registry is enumerated fresh on every broadcast
//! rather than keeping a cached subscriber list. Each page owns an
//! unbounded channel: delivery to one page can never block or abort
//! delivery to another, and messages to a single page arrive in the
//! order they were broadcast.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tokio::sync::mpsc;

use crate::protocol::WorkerMessage;

/// Opaque identifier for one connected page.
pub type ClientId = u64;

/// Dynamic set of connected pages, addressed at broadcast time.
pub struct ClientRegistry {
    clients: DashMap<ClientId, mpsc::UnboundedSender<String>>,
    next_id: AtomicU64,
}

impl ClientRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            clients: DashMap::new(),
            next_id: AtomicU64::new(0),
        }
    }

    /// Registers a newly connected page.
    ///
    /// Returns the page's id and the receiving end of its message
    /// channel. The new page receives no historical broadcasts; it is
    /// expected to query the worker on becoming active.
    pub fn register(&self) -> (ClientId, mpsc::UnboundedReceiver<String>) {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::unbounded_channel();
        self.clients.insert(id, tx);
        (id, rx)
    }

    /// Removes a disconnected page.
    pub fn unregister(&self, id: ClientId) {
        self.clients.remove(&id);
    }

    /// Returns the number of currently connected pages.
    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Delivers `message` to every currently connected page.
    ///
    /// Each delivery is independent; pages whose channel has closed
    /// are pruned. Never blocks.
    pub fn notify_all(&self, message: &WorkerMessage) {
        let Ok(json) = serde_json::to_string(message) else {
            return;
        };

        let mut disconnected = Vec::new();
        for entry in self.clients.iter() {
            if entry.value().send(json.clone()).is_err() {
                disconnected.push(*entry.key());
            }
        }

        for id in disconnected {
            tracing::debug!(client = id, "pruning disconnected page");
            self.clients.remove(&id);
        }
    }
}

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::new()
    }
}
