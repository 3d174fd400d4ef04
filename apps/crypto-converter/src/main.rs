//! Crypto Converter Binary
//!
//! Starts the exchange rate service in one of two run modes.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin crypto-converter -- api       # conversion query API
//! cargo run --bin crypto-converter -- consumer  # rate ingestion
//! ```
//!
//! # Environment Variables (all optional)
//!
//! - `POSTGRES_HOST` / `POSTGRES_PORT` / `POSTGRES_USER` /
//!   `POSTGRES_PASSWORD` / `POSTGRES_DB`: database connection
//!   (default: localhost:5432, postgres/postgres, quotes)
//! - `POSTGRES_MAX_CONNECTIONS`: pool size (default: 5)
//! - `HOST`: API listen host (default: localhost)
//! - `SERVER_PORT`: API listen port (default: 8000)
//! - `NUM_WORKERS`: runtime worker threads (default: 2)
//! - `AMOUNT_PRECISION`: converted amount decimal places (default: 6)
//! - `NO_OLDER_THAN_SECONDS`: conversion staleness window (default: 60)
//! - `CONSUMER_MODE`: "snapshot" | "streaming" (default: snapshot)
//! - `CONVERSION_RATE_PRECISION`: stored rate decimal places (default: 12)
//! - `SAVE_PERIOD_SECONDS`: time between save steps (default: 30)
//! - `CLEANUP_PERIOD_SECONDS`: time between cleanup steps (default: 600)
//! - `CLEANUP_OLDER_THAN_SECONDS`: retention horizon (default: 604800)
//! - `RUST_LOG`: log level (default: info)

use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crypto_converter::application::services::{
    ConversionCalculator, IngestionScheduler, SchedulerConfig, SnapshotConsumer, StreamingConsumer,
};
use crypto_converter::domain::quote::PriceTick;
use crypto_converter::infrastructure::api::{ApiServer, ApiState};
use crypto_converter::infrastructure::binance::{
    BinanceRestClient, BinanceStreamClient, rest, stream,
};
use crypto_converter::infrastructure::config::{ConsumerMode, Settings};
use crypto_converter::infrastructure::persistence::PostgresQuoteStore;
use crypto_converter::infrastructure::telemetry;

/// Capacity of the stream-to-accumulator tick channel.
const TICK_CHANNEL_CAPACITY: usize = 64;

/// Which service the process runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunMode {
    /// Conversion query API.
    Api,
    /// Rate ingestion consumer.
    Consumer,
}

impl RunMode {
    fn from_args() -> anyhow::Result<Self> {
        let arg = std::env::args().nth(1).unwrap_or_default();
        match arg.as_str() {
            "api" => Ok(Self::Api),
            "consumer" => Ok(Self::Consumer),
            other => anyhow::bail!("unknown run mode '{other}' (usage: crypto-converter <api|consumer>)"),
        }
    }
}

fn main() -> anyhow::Result<()> {
    load_dotenv();
    telemetry::init();

    let mode = RunMode::from_args()?;
    let settings = Settings::from_env().context("failed to load configuration")?;
    log_config(mode, &settings);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(settings.api.workers)
        .enable_all()
        .build()
        .context("failed to build runtime")?;

    runtime.block_on(run(mode, settings))
}

async fn run(mode: RunMode, settings: Settings) -> anyhow::Result<()> {
    let shutdown_token = CancellationToken::new();
    tokio::spawn(await_shutdown(shutdown_token.clone()));

    let store = Arc::new(
        PostgresQuoteStore::connect(&settings.postgres.url(), settings.postgres.max_connections)
            .await
            .context("failed to connect to the quote database")?,
    );

    match mode {
        RunMode::Api => run_api(settings, store, shutdown_token).await,
        RunMode::Consumer => run_consumer(settings, store, shutdown_token).await,
    }
}

/// Run the conversion query API until shutdown.
async fn run_api(
    settings: Settings,
    store: Arc<PostgresQuoteStore>,
    shutdown_token: CancellationToken,
) -> anyhow::Result<()> {
    let calculator = ConversionCalculator::new(
        store,
        settings.conversion.amount_precision,
        settings.conversion.staleness,
    );

    let state = Arc::new(ApiState { calculator });
    let server = ApiServer::new(
        settings.api.host,
        settings.api.port,
        state,
        shutdown_token,
    );
    server.run().await.context("conversion API failed")?;

    tracing::info!("Crypto converter stopped");
    Ok(())
}

/// Run the configured ingestion consumer until shutdown.
async fn run_consumer(
    settings: Settings,
    store: Arc<PostgresQuoteStore>,
    shutdown_token: CancellationToken,
) -> anyhow::Result<()> {
    let feed = Arc::new(
        BinanceRestClient::new(rest::SNAPSHOT_URL).context("failed to build snapshot client")?,
    );

    let scheduler_config = SchedulerConfig {
        save_period: settings.consumer.save_period,
        cleanup_period: settings.consumer.cleanup_period,
        cleanup_retention: settings.consumer.cleanup_retention,
        ..SchedulerConfig::default()
    };

    let scheduler = match settings.consumer.mode {
        ConsumerMode::Snapshot => {
            let consumer = Arc::new(SnapshotConsumer::new(
                feed,
                store,
                settings.consumer.rate_precision,
            ));
            IngestionScheduler::new(scheduler_config, consumer, shutdown_token.clone())
        }
        ConsumerMode::Streaming => {
            let consumer = Arc::new(StreamingConsumer::new(
                feed,
                store,
                settings.consumer.rate_precision,
            ));

            let (tick_tx, tick_rx) = mpsc::channel::<Vec<PriceTick>>(TICK_CHANNEL_CAPACITY);

            let stream_client =
                BinanceStreamClient::new(stream::STREAM_URL, tick_tx, shutdown_token.clone());
            let stream_shutdown = shutdown_token.clone();
            tokio::spawn(async move {
                if let Err(e) = stream_client.run().await {
                    tracing::error!(error = %e, "Ticker stream client error, shutting down");
                    stream_shutdown.cancel();
                }
            });

            tokio::spawn(
                Arc::clone(&consumer).run_listener(tick_rx, shutdown_token.clone()),
            );

            IngestionScheduler::new(scheduler_config, consumer, shutdown_token.clone())
        }
    };

    scheduler.run().await;

    tracing::info!("Crypto converter stopped");
    Ok(())
}

/// Load .env file from current directory or any ancestor directory.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Log the parsed configuration.
fn log_config(mode: RunMode, settings: &Settings) {
    tracing::info!(
        mode = ?mode,
        consumer_mode = settings.consumer.mode.as_str(),
        api_host = %settings.api.host,
        api_port = settings.api.port,
        workers = settings.api.workers,
        "Configuration loaded"
    );
    tracing::debug!(postgres = ?settings.postgres, "Database settings");
}

/// Wait for shutdown signal (SIGTERM or SIGINT).
#[allow(clippy::expect_used)]
async fn await_shutdown(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }

    shutdown_token.cancel();
}
