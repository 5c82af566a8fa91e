//! Serving layer: the worker's network face.
//!
//! Exposes the page message channel on `/ws` and feeds every other
//! request through the request router, so pages talk to one address
//! and the worker decides where each request actually goes.

pub mod state;
pub mod ws;

use std::net::SocketAddr;
use std::sync::Arc;
use std::thread;

use axum::extract::{Request, State};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use reqwest::Url;
use tower_http::cors::{Any, CorsLayer};

use crate::router::RequestRouter;
use crate::server::state::AppState;
use crate::server::ws::ws_handler;
use crate::status::{self, StatusReporter};
use crate::worker::Worker;

/// Default port the worker listens on.
pub const DEFAULT_PORT: u16 = 8090;

/// Default origin the worker fronts for pass-through traffic.
pub const DEFAULT_ORIGIN: &str = "http://localhost:8080";

/// Starts the worker's server on a background thread.
///
/// Registration progress is reported through `reporter`: OK once the
/// listener is bound, ERROR if binding or serving fails. There is no
/// automatic retry.
pub fn start_server(
    worker: Arc<Worker>,
    origin: Url,
    port: u16,
    reporter: Arc<dyn StatusReporter>,
) -> thread::JoinHandle<()> {
    tracing::info!(port, "worker server starting");
    thread::spawn(move || {
        let rt = tokio::runtime::Runtime::new().expect("Failed to create Tokio runtime");
        rt.block_on(run_server(worker, origin, port, reporter));
    })
}

/// Runs the axum server.
async fn run_server(
    worker: Arc<Worker>,
    origin: Url,
    port: u16,
    reporter: Arc<dyn StatusReporter>,
) {
    worker.begin_activation();

    let router = Arc::new(RequestRouter::new(worker.config(), origin));
    let app = build_app(AppState::new(Arc::clone(&worker), router));

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(?e, %addr, "failed to bind worker listener");
            reporter.update(status::State::Error, "Worker registration failed");
            return;
        }
    };

    worker.activate();
    tracing::info!("worker listening on http://{}", addr);
    reporter.update(
        status::State::Ok,
        &format!("Worker registered on http://{addr}"),
    );

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(?e, "worker server exited");
        reporter.update(status::State::Error, "Worker stopped unexpectedly");
    }
}

/// Builds the axum application: the message channel plus the
/// interception fallback.
pub(crate) fn build_app(state: AppState) -> Router {
    // CORS layer for the pages
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ws", get(ws_handler))
        .fallback(intercept)
        .layer(cors)
        .with_state(state)
}

/// Every request that is not the message channel goes through the
/// router exactly once.
async fn intercept(State(state): State<AppState>, req: Request) -> Response {
    state.router().route(req).await
}
