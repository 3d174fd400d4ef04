//! Infrastructure Layer
//!
//! Adapters binding the application ports to the outside world: the Binance
//! market-data feed, Postgres persistence, the HTTP query API, configuration,
//! and telemetry.

pub mod api;
pub mod binance;
pub mod config;
pub mod persistence;
pub mod telemetry;
