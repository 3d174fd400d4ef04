//! Quote Persistence Adapters
//!
//! - [`postgres`]: the production [`QuoteStore`] backed by a Postgres table
//! - [`in_memory`]: a lock-protected in-process store with identical lookup
//!   semantics, used by integration tests
//!
//! [`QuoteStore`]: crate::application::ports::QuoteStore

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryQuoteStore;
pub use postgres::PostgresQuoteStore;
