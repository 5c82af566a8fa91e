//! Proxy worker for the reading-list web app.
//!
//! A background daemon that fronts the app's origin: pages route
//! their requests through it and connect to its message channel. The
//! worker passes ordinary requests through untouched and rewrites
//! submissions to whichever backend is currently configured, keeping
//! every connected page informed of that address through broadcast
//! updates.

pub mod client;
pub mod config;
pub mod protocol;
pub mod registry;
pub mod router;
pub mod server;
pub mod status;
pub mod worker;
