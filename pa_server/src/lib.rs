//! HTTP server for the Pac-Man arcade backend.
//!
//! The binary in `main.rs` wires configuration, storage and the router
//! together; everything it uses lives here so the integration tests can build
//! the same router in-process.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
