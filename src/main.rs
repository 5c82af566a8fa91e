//! Reading-list proxy worker daemon.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use readlist_worker::server::{start_server, DEFAULT_ORIGIN, DEFAULT_PORT};
use readlist_worker::status::{LogReporter, State, StatusReporter};
use readlist_worker::worker::Worker;
use reqwest::Url;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("readlist_worker=info")),
        )
        .init();

    let reporter: Arc<dyn StatusReporter> = Arc::new(LogReporter);
    reporter.update(State::Working, "Registering worker");

    let origin_addr = std::env::var("READLIST_ORIGIN").ok();
    let port_raw = std::env::var("READLIST_PORT").ok();
    let origin = Url::parse(&origin_or_default(origin_addr.as_deref()))?;
    let port = port_or_default(port_raw.as_deref());

    let worker = Arc::new(Worker::new());
    let _server = start_server(Arc::clone(&worker), origin, port, Arc::clone(&reporter));

    // Shutdown signal
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_ctrlc = Arc::clone(&shutdown);
    ctrlc::set_handler(move || {
        tracing::info!("shutdown signal received");
        shutdown_ctrlc.store(true, Ordering::SeqCst);
    })?;

    while !shutdown.load(Ordering::Relaxed) {
        thread::sleep(Duration::from_millis(200));
    }

    // Worker state is volatile: exiting discards it, and the next
    // start comes back up at the default configuration.
    tracing::info!("worker exiting");
    Ok(())
}

/// Origin to front, from `READLIST_ORIGIN` if set.
fn origin_or_default(raw: Option<&str>) -> String {
    match raw {
        Some(origin) => origin.to_string(),
        None => DEFAULT_ORIGIN.to_string(),
    }
}

/// Listen port, from `READLIST_PORT` if it holds a valid port.
fn port_or_default(raw: Option<&str>) -> u16 {
    match raw {
        Some(value) => value.parse().unwrap_or_else(|e| {
            tracing::warn!(?e, value, "invalid READLIST_PORT, using default");
            DEFAULT_PORT
        }),
        None => DEFAULT_PORT,
    }
}
