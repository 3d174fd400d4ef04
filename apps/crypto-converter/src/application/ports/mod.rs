//! Port Interfaces
//!
//! Contracts between the application services and the outside world,
//! following the Hexagonal Architecture pattern.
//!
//! ## Driven Ports (Outbound)
//!
//! - [`QuoteStore`]: time-indexed quote persistence
//! - [`SnapshotFeed`]: request/response price snapshot from the upstream feed
//!
//! ## Driver Ports (Inbound)
//!
//! - [`QuoteConsumer`]: the save/cleanup capability the ingestion scheduler
//!   drives, implemented by the snapshot and streaming consumer variants

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::quote::{PriceTick, Quote};

// =============================================================================
// Errors
// =============================================================================

/// Persistence-layer errors.
///
/// Ingestion callers treat any variant as a skip-and-retry-next-cycle
/// condition; the query path surfaces it as a 5xx response.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The storage backend is unreachable or rejected the operation.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// A stored row could not be decoded into a quote.
    #[error("stored row decode failed: {0}")]
    Decode(String),
}

/// Upstream feed errors. Logged and skipped by the ingestion loop, never
/// fatal to the process.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// The feed request or connection failed.
    #[error("feed request failed: {0}")]
    Unavailable(String),

    /// The feed answered with a non-success HTTP status.
    #[error("feed returned status {0}")]
    Status(u16),

    /// The feed response could not be decoded.
    #[error("feed response decode failed: {0}")]
    Decode(String),
}

/// Errors surfaced by a consumer's save or cleanup step.
#[derive(Debug, thiserror::Error)]
pub enum ConsumeError {
    /// Upstream feed failure.
    #[error(transparent)]
    Feed(#[from] FeedError),

    /// Storage failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

// =============================================================================
// Driven Ports
// =============================================================================

/// Time-indexed quote persistence.
///
/// Rows are keyed by `(observed_at, symbol)`; the store never mutates a row
/// in place - consumers only append via [`save`](Self::save) and delete via
/// [`cleanup`](Self::cleanup).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuoteStore: Send + Sync {
    /// Return the quote with the greatest `observed_at <= as_of` whose symbol
    /// equals `symbol` or `inverse_symbol`.
    ///
    /// Ties on `observed_at` break deterministically toward the
    /// lexicographically smaller symbol. No match is `Ok(None)`, not an
    /// error.
    async fn lookup(
        &self,
        symbol: &str,
        inverse_symbol: &str,
        as_of: DateTime<Utc>,
    ) -> Result<Option<Quote>, StoreError>;

    /// Persist a batch of quotes atomically: a concurrent
    /// [`lookup`](Self::lookup) never observes a partially applied batch.
    /// Duplicate `(observed_at, symbol)` keys within one batch are a caller
    /// error. An empty batch is a no-op.
    async fn save(&self, quotes: &[Quote]) -> Result<(), StoreError>;

    /// Delete every quote with `observed_at < older_than`. Idempotent; safe
    /// to call with no matching rows.
    async fn cleanup(&self, older_than: DateTime<Utc>) -> Result<(), StoreError>;
}

/// Request/response price snapshot from the upstream feed.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SnapshotFeed: Send + Sync {
    /// Fetch the full current price snapshot (one request, every symbol).
    async fn fetch_snapshot(&self) -> Result<Vec<PriceTick>, FeedError>;
}

// =============================================================================
// Driver Ports
// =============================================================================

/// The capability the ingestion scheduler drives on a fixed tick.
///
/// Implemented by the snapshot and streaming consumer variants; the scheduler
/// loop depends only on this interface.
#[async_trait]
pub trait QuoteConsumer: Send + Sync {
    /// Persist the consumer's current view of the market into the store.
    async fn consume(&self) -> Result<(), ConsumeError>;

    /// Delete stored quotes older than the retention horizon.
    async fn cleanup(&self, older_than: DateTime<Utc>) -> Result<(), ConsumeError>;
}
