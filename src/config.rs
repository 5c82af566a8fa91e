//! The configuration store: the single shared backend address.
//!
//! Holds the one mutable value the request router consults when
//! rewriting submissions. The value lives only as long as the worker
//! process; a restarted worker always comes back up at
//! [`DEFAULT_SERVER`].

use std::sync::{PoisonError, RwLock};

/// Backend address a fresh worker starts with.
pub const DEFAULT_SERVER: &str = "localhost:8081";

/// In-memory store for the current backend address.
///
/// Reads and writes are synchronous and non-blocking; concurrent
/// writes are last-write-wins with no versioning or conflict
/// detection.
pub struct ConfigStore {
    server: RwLock<String>,
}

impl ConfigStore {
    /// Creates a store initialized to [`DEFAULT_SERVER`].
    pub fn new() -> Self {
        Self {
            server: RwLock::new(DEFAULT_SERVER.to_string()),
        }
    }

    /// Returns the current backend address.
    pub fn get(&self) -> String {
        self.server
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replaces the backend address unconditionally and returns the
    /// now-current value.
    pub fn set(&self, server: impl Into<String>) -> String {
        let mut guard = self.server.write().unwrap_or_else(PoisonError::into_inner);
        *guard = server.into();
        guard.clone()
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_store_has_default() {
        let store = ConfigStore::new();
        assert_eq!(store.get(), DEFAULT_SERVER);
    }

    #[test]
    fn test_set_then_get() {
        let store = ConfigStore::new();
        let applied = store.set("api.example.com:9000");
        assert_eq!(applied, "api.example.com:9000");
        assert_eq!(store.get(), "api.example.com:9000");
    }

    #[test]
    fn test_set_is_last_write_wins() {
        let store = ConfigStore::new();
        store.set("first:1");
        store.set("second:2");
        assert_eq!(store.get(), "second:2");
    }

    #[test]
    fn test_concurrent_access() {
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(ConfigStore::new());
        let mut handles = vec![];

        for i in 0..10 {
            let store = Arc::clone(&store);
            handles.push(thread::spawn(move || {
                store.set(format!("server{}:8081", i));
            }));
        }

        for _ in 0..10 {
            let store = Arc::clone(&store);
            handles.push(thread::spawn(move || {
                let _ = store.get();
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        // Whichever write landed last, the store holds exactly one value.
        let value = store.get();
        assert!(value.starts_with("server"));
    }
}
