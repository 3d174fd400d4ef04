#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::default_trait_access,
        clippy::items_after_statements,
        clippy::or_fun_call
    )
)]

//! Crypto Converter - Exchange Rate Service
//!
//! Ingests crypto exchange rates from Binance into a time-indexed quote
//! store and answers point-in-time currency conversion queries over HTTP.
//! One binary, two run modes: the consumer ingests, the API serves.
//!
//! # Layers (inside -> outside)
//!
//! - **Domain**: Quote types and decimal quantization
//!   - `quote`: [`Quote`], [`PriceTick`], banker's-rounding quantization
//!
//! - **Application**: Use cases and port definitions
//!   - `ports`: Interfaces for the quote store and upstream feed
//!   - `services`: Ingestion scheduler, the two consumer variants, and the
//!     conversion calculator
//!
//! - **Infrastructure**: Adapters and external integrations
//!   - `binance`: REST snapshot and WebSocket stream clients
//!   - `persistence`: Postgres and in-memory quote stores
//!   - `api`: Conversion query HTTP server
//!   - `config`: Environment-variable configuration
//!   - `telemetry`: Tracing setup
//!
//! # Data Flow
//!
//! ```text
//! Binance REST ──┐
//!                ├──► Consumer ──► Quote Store ──► Conversion API ──► Client
//! Binance WS  ──┘    (scheduler)   (Postgres)       (axum)
//! ```
//!
//! [`Quote`]: domain::quote::Quote
//! [`PriceTick`]: domain::quote::PriceTick

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

pub mod application;
pub mod domain;
pub mod infrastructure;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use application::services::{ConversionCalculator, IngestionScheduler, SchedulerConfig};
pub use infrastructure::api::{ApiServer, ApiState, create_router};
pub use infrastructure::config::{ConsumerMode, Settings};
pub use infrastructure::persistence::InMemoryQuoteStore;
