//! Configuration
//!
//! Environment-variable configuration for both run modes.

pub mod settings;

pub use settings::{
    ApiSettings, ConfigError, ConsumerMode, ConsumerSettings, ConversionSettings,
    PostgresSettings, Settings,
};
