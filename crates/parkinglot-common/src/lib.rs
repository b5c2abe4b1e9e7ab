//! Shared building blocks for the Ideas Parking Lot crates
//!
//! - [`config`]: layered application configuration with startup validation
//! - [`logging`]: tracing subscriber setup for the binaries

pub mod config;
pub mod logging;

pub use config::{AppConfig, ConfigurationError, FirebaseConfig};
