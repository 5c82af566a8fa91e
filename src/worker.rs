//! The worker: lifecycle state machine and message handling.
//!
//! A worker instance owns the configuration store and the client
//! registry. Its state is volatile: everything is rebuilt from
//! defaults when the process restarts, so a fresh worker always
//! reports the default backend until a page updates it.

use std::sync::{Arc, PoisonError, RwLock};

use serde_json::Value;

use crate::config::ConfigStore;
use crate::protocol::{PageMessage, WorkerMessage, SERVER_UPDATE};
use crate::registry::ClientRegistry;

/// Lifecycle states. Termination is the process dying; it is not an
/// application-visible transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Interception not yet live; configuration at its default.
    Installing,
    /// Taking control of connections.
    Activating,
    /// Router and message handlers are live.
    Active,
}

/// A worker instance.
pub struct Worker {
    config: Arc<ConfigStore>,
    clients: Arc<ClientRegistry>,
    state: RwLock<WorkerState>,
}

impl Worker {
    /// Creates a worker in the `Installing` state with the default
    /// configuration.
    pub fn new() -> Self {
        tracing::info!("worker installing");
        Self {
            config: Arc::new(ConfigStore::new()),
            clients: Arc::new(ClientRegistry::new()),
            state: RwLock::new(WorkerState::Installing),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> WorkerState {
        *self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Marks the worker as taking control of connections.
    pub fn begin_activation(&self) {
        self.transition(WorkerState::Activating);
    }

    /// Marks the worker live. From here on requests are intercepted
    /// and messages handled until the process dies.
    pub fn activate(&self) {
        self.transition(WorkerState::Active);
    }

    fn transition(&self, next: WorkerState) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        tracing::info!(from = ?*state, to = ?next, "worker state change");
        *state = next;
    }

    /// Shared handle to the configuration store, for the router.
    pub fn config(&self) -> Arc<ConfigStore> {
        Arc::clone(&self.config)
    }

    /// The registry of connected pages.
    pub fn clients(&self) -> &ClientRegistry {
        &self.clients
    }

    /// Handles one raw message from a page.
    ///
    /// A `SERVER_UPDATE` with a usable `server` field updates the
    /// store; one without is a query. Either way the now-current
    /// value is broadcast to every connected page, not just the
    /// sender, so passive pages stay in sync. A `SERVER_UPDATE`
    /// whose `server` field is unusable drops the update portion
    /// silently and still broadcasts; anything else is ignored.
    pub fn handle_message(&self, raw: &str) {
        let update = match serde_json::from_str::<PageMessage>(raw) {
            Ok(PageMessage::ServerUpdate { server }) => server,
            Err(e) => {
                let recognized = serde_json::from_str::<Value>(raw)
                    .ok()
                    .and_then(|v| v.get("type").and_then(Value::as_str).map(String::from))
                    .is_some_and(|kind| kind == SERVER_UPDATE);
                if !recognized {
                    tracing::debug!(?e, "ignoring unrecognized message");
                    return;
                }
                tracing::debug!(?e, "malformed SERVER_UPDATE treated as query");
                None
            }
        };

        let current = match update {
            Some(server) => {
                let applied = self.config.set(server);
                tracing::info!(server = %applied, "backend address updated");
                applied
            }
            None => self.config.get(),
        };

        self.clients
            .notify_all(&WorkerMessage::ServerUpdate { server: current });
    }
}

impl Default for Worker {
    fn default() -> Self {
        Self::new()
    }
}
