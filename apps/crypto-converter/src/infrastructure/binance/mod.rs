//! Binance Market Data Adapters
//!
//! Two upstream surfaces of the same exchange:
//!
//! - [`rest`]: the 24hr ticker snapshot endpoint, one request for every symbol
//! - [`stream`]: the all-market ticker WebSocket stream

pub mod messages;
pub mod rest;
pub mod stream;

pub use rest::BinanceRestClient;
pub use stream::{BinanceStreamClient, StreamError};
