//! Application Services
//!
//! - [`scheduler`]: the fixed-tick loop driving a consumer's save and cleanup
//! - [`snapshot`]: periodic full-snapshot consumer
//! - [`streaming`]: continuous stream consumer with a local accumulator
//! - [`converter`]: point-in-time conversion arithmetic over the quote store

pub mod converter;
pub mod scheduler;
pub mod snapshot;
pub mod streaming;

pub use converter::{Conversion, ConversionCalculator, ConversionError};
pub use scheduler::{IngestionScheduler, SchedulerConfig};
pub use snapshot::SnapshotConsumer;
pub use streaming::StreamingConsumer;
