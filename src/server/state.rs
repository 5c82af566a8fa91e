//! Shared application state for the serving layer.

use std::sync::Arc;

use crate::router::RequestRouter;
use crate::worker::Worker;

/// State shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    worker: Arc<Worker>,
    router: Arc<RequestRouter>,
}

impl AppState {
    /// Creates state for one worker instance and its router.
    pub fn new(worker: Arc<Worker>, router: Arc<RequestRouter>) -> Self {
        Self { worker, router }
    }

    /// The worker instance.
    pub fn worker(&self) -> &Arc<Worker> {
        &self.worker
    }

    /// The request router.
    pub fn router(&self) -> &RequestRouter {
        &self.router
    }
}
