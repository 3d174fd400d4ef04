//! Application layer - Port definitions and ingestion/query services.

pub mod ports;
pub mod services;
