//! Ingestion Scheduler
//!
//! The fixed-tick loop shared by both consumer kinds. On every tick it
//! conditionally triggers the consumer's save step and a retention cleanup,
//! until the cancellation token is observed.
//!
//! Bookkeeping timestamps are updated *before* a step runs, so a slow step
//! does not cause the next tick to start an overlapping one. Both timestamps
//! are initialized to `now - period`, so the very first tick performs both
//! actions immediately. Step errors are logged and the cycle is skipped -
//! there is no retry beyond waiting for the next due tick.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeDelta, Utc};
use tokio_util::sync::CancellationToken;

use crate::application::ports::QuoteConsumer;

/// Scheduler cadence configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Interval between scheduler ticks.
    pub tick_interval: Duration,
    /// Minimum time between save steps.
    pub save_period: TimeDelta,
    /// Minimum time between cleanup steps.
    pub cleanup_period: TimeDelta,
    /// Retention horizon: cleanup deletes quotes older than
    /// `now - cleanup_retention`.
    pub cleanup_retention: TimeDelta,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(1),
            save_period: TimeDelta::seconds(30),
            cleanup_period: TimeDelta::seconds(600),
            cleanup_retention: TimeDelta::days(7),
        }
    }
}

/// Fixed-tick driver for one [`QuoteConsumer`].
pub struct IngestionScheduler {
    config: SchedulerConfig,
    consumer: Arc<dyn QuoteConsumer>,
    cancel: CancellationToken,
    last_save_at: chrono::DateTime<Utc>,
    last_cleanup_at: chrono::DateTime<Utc>,
}

impl IngestionScheduler {
    /// Create a scheduler whose first tick fires both steps immediately.
    #[must_use]
    pub fn new(
        config: SchedulerConfig,
        consumer: Arc<dyn QuoteConsumer>,
        cancel: CancellationToken,
    ) -> Self {
        let now = Utc::now();
        Self {
            last_save_at: now - config.save_period,
            last_cleanup_at: now - config.cleanup_period,
            config,
            consumer,
            cancel,
        }
    }

    /// Run the scheduler loop until cancelled.
    ///
    /// Cancellation is checked at the top of each tick and during the
    /// inter-tick sleep; in-flight work for the current tick is allowed to
    /// finish.
    pub async fn run(mut self) {
        tracing::info!(
            save_period_secs = self.config.save_period.num_seconds(),
            cleanup_period_secs = self.config.cleanup_period.num_seconds(),
            cleanup_retention_secs = self.config.cleanup_retention.num_seconds(),
            "Ingestion scheduler started"
        );

        loop {
            if self.cancel.is_cancelled() {
                break;
            }

            self.tick().await;

            tokio::select! {
                () = self.cancel.cancelled() => break,
                () = tokio::time::sleep(self.config.tick_interval) => {}
            }
        }

        tracing::info!("Ingestion scheduler stopped");
    }

    /// Run one tick: save and cleanup, each only if due, concurrently.
    async fn tick(&mut self) {
        let now = Utc::now();

        let save_due = now - self.last_save_at >= self.config.save_period;
        if save_due {
            self.last_save_at = now;
        }

        let cleanup_due = now - self.last_cleanup_at >= self.config.cleanup_period;
        if cleanup_due {
            self.last_cleanup_at = now;
        }

        let save_step = async {
            if save_due {
                if let Err(e) = self.consumer.consume().await {
                    tracing::warn!(error = %e, "Save step failed, skipping this cycle");
                }
            }
        };

        let cleanup_step = async {
            if cleanup_due {
                let horizon = now - self.config.cleanup_retention;
                tracing::info!(older_than = %horizon, "Cleanup started");
                if let Err(e) = self.consumer.cleanup(horizon).await {
                    tracing::warn!(error = %e, "Cleanup step failed, skipping this cycle");
                } else {
                    tracing::info!("Cleanup done");
                }
            }
        };

        tokio::join!(save_step, cleanup_step);
    }
}
