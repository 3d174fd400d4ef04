//! Tracing Setup
//!
//! Console tracing initialization shared by both run modes.
//!
//! # Configuration
//!
//! - `RUST_LOG`: standard `tracing_subscriber` filter directive
//!   (default: `info`)

use tracing_subscriber::EnvFilter;

/// Initialize console tracing.
///
/// # Panics
///
/// Panics if a global subscriber is already installed.
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .init();
}
