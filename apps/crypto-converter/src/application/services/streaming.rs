//! Streaming Consumer
//!
//! Holds a local accumulator of the best known current rate per symbol,
//! updated continuously by a background listener and flushed periodically by
//! the scheduler's save step. Decoupling the listener cadence (message by
//! message, unbounded rate) from the flush cadence (fixed period) bounds
//! write amplification to storage while keeping the served state as fresh as
//! the last flush.
//!
//! The accumulator is owned exclusively by this consumer: the listener is the
//! only writer, and the flush step only ever sees an atomic snapshot copy.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::application::ports::{ConsumeError, QuoteConsumer, QuoteStore, SnapshotFeed};
use crate::domain::quote::{PriceTick, Quote, quantize};

/// Latest observation for one symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
struct AccumulatedTick {
    rate: Decimal,
    event_time: DateTime<Utc>,
}

/// Best-known-current-rate map, last-write-wins per symbol. Not history.
#[derive(Debug, Default)]
struct Accumulator {
    entries: HashMap<String, AccumulatedTick>,
}

impl Accumulator {
    fn apply(&mut self, tick: PriceTick) {
        self.entries.insert(
            tick.symbol,
            AccumulatedTick {
                rate: tick.price,
                event_time: tick.observed_at,
            },
        );
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    /// Copy out every symbol's latest rate together with the single
    /// most-recent event time across the whole map. `None` when empty.
    fn snapshot(&self) -> Option<(Vec<(String, Decimal)>, DateTime<Utc>)> {
        let observed_at = self.entries.values().map(|e| e.event_time).max()?;
        let rates = self
            .entries
            .iter()
            .map(|(symbol, entry)| (symbol.clone(), entry.rate))
            .collect();
        Some((rates, observed_at))
    }
}

/// Continuous-stream ingestion consumer.
pub struct StreamingConsumer {
    feed: Arc<dyn SnapshotFeed>,
    store: Arc<dyn QuoteStore>,
    rate_precision: u32,
    accumulator: RwLock<Accumulator>,
    last_flushed_at: Mutex<Option<DateTime<Utc>>>,
}

impl StreamingConsumer {
    /// Create a new streaming consumer with an empty accumulator.
    #[must_use]
    pub fn new(feed: Arc<dyn SnapshotFeed>, store: Arc<dyn QuoteStore>, rate_precision: u32) -> Self {
        Self {
            feed,
            store,
            rate_precision,
            accumulator: RwLock::new(Accumulator::default()),
            last_flushed_at: Mutex::new(None),
        }
    }

    /// Run the listener: seed the accumulator from one snapshot fetch, then
    /// fold every inbound tick batch until cancelled or the channel closes.
    ///
    /// Runs once for the lifetime of this consumer, independently of the
    /// scheduler loop.
    pub async fn run_listener(
        self: Arc<Self>,
        mut ticks_rx: mpsc::Receiver<Vec<PriceTick>>,
        cancel: CancellationToken,
    ) {
        self.seed().await;

        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    tracing::info!("Stream listener cancelled");
                    break;
                }
                batch = ticks_rx.recv() => match batch {
                    Some(ticks) => {
                        tracing::debug!(count = ticks.len(), "Received ticker batch");
                        let mut accumulator = self.accumulator.write();
                        for tick in ticks {
                            accumulator.apply(tick);
                        }
                    }
                    None => {
                        tracing::info!("Stream channel closed, listener stopping");
                        break;
                    }
                }
            }
        }
    }

    /// Seed the accumulator with every known symbol's latest rate.
    ///
    /// A seed failure is tolerated: the stream still populates the map, the
    /// store just starts out missing symbols the stream has not mentioned yet.
    async fn seed(&self) {
        match self.feed.fetch_snapshot().await {
            Ok(ticks) => {
                let mut accumulator = self.accumulator.write();
                for tick in ticks {
                    accumulator.apply(tick);
                }
                tracing::info!(symbols = accumulator.len(), "Accumulator seeded from snapshot");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Seed snapshot failed, starting with empty accumulator");
            }
        }
    }

    /// Number of symbols currently accumulated.
    #[must_use]
    pub fn accumulated_symbols(&self) -> usize {
        self.accumulator.read().len()
    }
}

#[async_trait]
impl QuoteConsumer for StreamingConsumer {
    async fn consume(&self) -> Result<(), ConsumeError> {
        // Snapshot under the read lock, then release before any await. All
        // rows share the most-recent event time seen across the accumulator,
        // mirroring upstream snapshot semantics: symbols the feed has not
        // re-emitted are stamped later than their actual emission.
        let snapshot = self.accumulator.read().snapshot();

        let Some((rates, observed_at)) = snapshot else {
            tracing::debug!("Accumulator empty, nothing to save");
            return Ok(());
        };

        // Event times only move forward, so an unchanged maximum means no
        // tick arrived since the last flush; saving again would resubmit the
        // exact rows already persisted.
        if *self.last_flushed_at.lock() == Some(observed_at) {
            tracing::debug!("No new ticks since last flush, skipping save");
            return Ok(());
        }

        let quotes: Vec<Quote> = rates
            .into_iter()
            .filter_map(|(symbol, raw_rate)| {
                let rate = quantize(raw_rate, self.rate_precision);
                (rate > Decimal::ZERO).then(|| Quote::new(symbol, rate, observed_at))
            })
            .collect();

        tracing::info!(count = quotes.len(), "Saving quotes");
        self.store.save(&quotes).await?;
        *self.last_flushed_at.lock() = Some(observed_at);
        tracing::info!("Consuming done");

        Ok(())
    }

    async fn cleanup(&self, older_than: DateTime<Utc>) -> Result<(), ConsumeError> {
        self.store.cleanup(older_than).await?;
        Ok(())
    }
}
