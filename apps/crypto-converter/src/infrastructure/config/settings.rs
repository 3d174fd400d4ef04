//! Service Configuration Settings
//!
//! Configuration types for both run modes, loaded from environment variables.
//! Every variable has a default; an unset variable falls back silently, a
//! present-but-unparseable one also falls back, and an unknown
//! `CONSUMER_MODE` is a startup error.

use chrono::TimeDelta;

/// Which ingestion consumer the consumer mode runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConsumerMode {
    /// Periodic full-snapshot REST consumer.
    #[default]
    Snapshot,
    /// Continuous WebSocket stream consumer.
    Streaming,
}

impl ConsumerMode {
    /// Parse a mode name. Unknown names are an error, not a silent default:
    /// running the wrong consumer for days is worse than failing at startup.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        match s.to_lowercase().as_str() {
            "snapshot" => Ok(Self::Snapshot),
            "streaming" => Ok(Self::Streaming),
            other => Err(ConfigError::UnknownConsumerMode(other.to_string())),
        }
    }

    /// Get the mode name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Snapshot => "snapshot",
            Self::Streaming => "streaming",
        }
    }
}

/// Postgres connection settings.
#[derive(Clone)]
pub struct PostgresSettings {
    /// Database host.
    pub host: String,
    /// Database port.
    pub port: u16,
    /// Database user.
    pub user: String,
    /// Database password.
    password: String,
    /// Database name.
    pub database: String,
    /// Connection pool size.
    pub max_connections: u32,
}

impl PostgresSettings {
    /// Build the connection URL.
    #[must_use]
    pub fn url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.database
        )
    }
}

impl std::fmt::Debug for PostgresSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("database", &self.database)
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

/// HTTP API settings.
#[derive(Debug, Clone)]
pub struct ApiSettings {
    /// Listen host.
    pub host: String,
    /// Listen port.
    pub port: u16,
    /// Runtime worker thread count.
    pub workers: usize,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8000,
            workers: 2,
        }
    }
}

/// Conversion arithmetic settings.
#[derive(Debug, Clone)]
pub struct ConversionSettings {
    /// Decimal places for converted amounts.
    pub amount_precision: u32,
    /// Maximum quote age accepted by a conversion.
    pub staleness: TimeDelta,
}

impl Default for ConversionSettings {
    fn default() -> Self {
        Self {
            amount_precision: 6,
            staleness: TimeDelta::seconds(60),
        }
    }
}

/// Ingestion consumer settings.
#[derive(Debug, Clone)]
pub struct ConsumerSettings {
    /// Which consumer variant to run.
    pub mode: ConsumerMode,
    /// Decimal places for stored rates.
    pub rate_precision: u32,
    /// Time between save steps.
    pub save_period: TimeDelta,
    /// Time between cleanup steps.
    pub cleanup_period: TimeDelta,
    /// Retention horizon for stored quotes.
    pub cleanup_retention: TimeDelta,
}

impl Default for ConsumerSettings {
    fn default() -> Self {
        Self {
            mode: ConsumerMode::Snapshot,
            rate_precision: 12,
            save_period: TimeDelta::seconds(30),
            cleanup_period: TimeDelta::seconds(600),
            cleanup_retention: TimeDelta::seconds(604_800),
        }
    }
}

/// Complete service configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Postgres connection settings.
    pub postgres: PostgresSettings,
    /// HTTP API settings.
    pub api: ApiSettings,
    /// Conversion arithmetic settings.
    pub conversion: ConversionSettings,
    /// Ingestion consumer settings.
    pub consumer: ConsumerSettings,
}

impl Settings {
    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if `CONSUMER_MODE` names an unknown consumer.
    pub fn from_env() -> Result<Self, ConfigError> {
        let postgres = PostgresSettings {
            host: parse_env_string("POSTGRES_HOST", "localhost"),
            port: parse_env_u16("POSTGRES_PORT", 5432),
            user: parse_env_string("POSTGRES_USER", "postgres"),
            password: parse_env_string("POSTGRES_PASSWORD", "postgres"),
            database: parse_env_string("POSTGRES_DB", "quotes"),
            max_connections: parse_env_u32("POSTGRES_MAX_CONNECTIONS", 5),
        };

        let api = ApiSettings {
            host: parse_env_string("HOST", &ApiSettings::default().host),
            port: parse_env_u16("SERVER_PORT", ApiSettings::default().port),
            workers: parse_env_usize("NUM_WORKERS", ApiSettings::default().workers),
        };

        let conversion = ConversionSettings {
            amount_precision: parse_env_u32(
                "AMOUNT_PRECISION",
                ConversionSettings::default().amount_precision,
            ),
            staleness: parse_env_timedelta_secs(
                "NO_OLDER_THAN_SECONDS",
                ConversionSettings::default().staleness,
            ),
        };

        let mode = match std::env::var("CONSUMER_MODE") {
            Ok(s) => ConsumerMode::parse(&s)?,
            Err(_) => ConsumerMode::default(),
        };

        let consumer = ConsumerSettings {
            mode,
            rate_precision: parse_env_u32(
                "CONVERSION_RATE_PRECISION",
                ConsumerSettings::default().rate_precision,
            ),
            save_period: parse_env_timedelta_secs(
                "SAVE_PERIOD_SECONDS",
                ConsumerSettings::default().save_period,
            ),
            cleanup_period: parse_env_timedelta_secs(
                "CLEANUP_PERIOD_SECONDS",
                ConsumerSettings::default().cleanup_period,
            ),
            cleanup_retention: parse_env_timedelta_secs(
                "CLEANUP_OLDER_THAN_SECONDS",
                ConsumerSettings::default().cleanup_retention,
            ),
        };

        Ok(Self {
            postgres,
            api,
            conversion,
            consumer,
        })
    }
}

/// Configuration error. Fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// `CONSUMER_MODE` names an unknown consumer.
    #[error("unknown consumer mode: {0} (expected 'snapshot' or 'streaming')")]
    UnknownConsumerMode(String),
}

fn parse_env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env_u16(key: &str, default: u16) -> u16 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_env_timedelta_secs(key: &str, default: TimeDelta) -> TimeDelta {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<i64>().ok())
        .map_or(default, TimeDelta::seconds)
}
