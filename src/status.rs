//! Status reporting contract.
//!
//! The status widget itself lives outside this core; we only drive it
//! through the `update(state, message)` contract at registration and
//! lifecycle events.

use std::fmt;

/// Progress state shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Working,
    Ok,
    Error,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let glyph = match self {
            State::Working => "…",
            State::Ok => "✓",
            State::Error => "!",
        };
        f.write_str(glyph)
    }
}

/// Consumer of lifecycle progress updates.
pub trait StatusReporter: Send + Sync {
    fn update(&self, state: State, message: &str);
}

/// Reporter that writes status updates to the log.
pub struct LogReporter;

impl StatusReporter for LogReporter {
    fn update(&self, state: State, message: &str) {
        match state {
            State::Error => tracing::error!("{state} {message}"),
            _ => tracing::info!("{state} {message}"),
        }
    }
}

/// Reporter that records every update it receives, for tests.
#[cfg(test)]
#[derive(Default)]
pub struct RecordingReporter {
    updates: std::sync::Mutex<Vec<(State, String)>>,
}

#[cfg(test)]
impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything reported so far, in order.
    pub fn updates(&self) -> Vec<(State, String)> {
        self.updates.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl StatusReporter for RecordingReporter {
    fn update(&self, state: State, message: &str) {
        self.updates
            .lock()
            .unwrap()
            .push((state, message.to_string()));
    }
}
