//! Snapshot Consumer
//!
//! Periodically fetches the full price snapshot from the upstream feed and
//! writes it wholesale into the quote store. Carries no state between cycles;
//! a feed error skips the cycle with no partial save.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::application::ports::{ConsumeError, QuoteConsumer, QuoteStore, SnapshotFeed};
use crate::domain::quote::{Quote, quantize};

/// Full-snapshot ingestion consumer.
pub struct SnapshotConsumer {
    feed: Arc<dyn SnapshotFeed>,
    store: Arc<dyn QuoteStore>,
    rate_precision: u32,
}

impl SnapshotConsumer {
    /// Create a new snapshot consumer.
    #[must_use]
    pub fn new(feed: Arc<dyn SnapshotFeed>, store: Arc<dyn QuoteStore>, rate_precision: u32) -> Self {
        Self {
            feed,
            store,
            rate_precision,
        }
    }
}

#[async_trait]
impl QuoteConsumer for SnapshotConsumer {
    async fn consume(&self) -> Result<(), ConsumeError> {
        tracing::info!("Consuming snapshot");

        let ticks = self.feed.fetch_snapshot().await?;

        let quotes: Vec<Quote> = ticks
            .into_iter()
            .filter_map(|tick| {
                let rate = quantize(tick.price, self.rate_precision);
                // Non-positive rates violate the quote invariant and are dropped.
                (rate > Decimal::ZERO).then(|| Quote::new(tick.symbol, rate, tick.observed_at))
            })
            .collect();

        tracing::info!(count = quotes.len(), "Saving quotes");
        self.store.save(&quotes).await?;
        tracing::info!("Consuming done");

        Ok(())
    }

    async fn cleanup(&self, older_than: DateTime<Utc>) -> Result<(), ConsumeError> {
        self.store.cleanup(older_than).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{FeedError, MockQuoteStore, MockSnapshotFeed};
    use crate::domain::quote::PriceTick;
    use rust_decimal_macros::dec;

    fn tick(symbol: &str, price: Decimal) -> PriceTick {
        PriceTick {
            symbol: symbol.to_string(),
            price,
            observed_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn consume_quantizes_and_saves_the_whole_snapshot() {
        let mut feed = MockSnapshotFeed::new();
        feed.expect_fetch_snapshot()
            .times(1)
            .returning(|| Ok(vec![tick("BTCUSDT", dec!(10000)), tick("ETHUSDT", dec!(2500.5))]));

        let mut store = MockQuoteStore::new();
        store
            .expect_save()
            .times(1)
            .withf(|quotes: &[Quote]| {
                quotes.len() == 2
                    && quotes[0].symbol == "BTCUSDT"
                    && quotes[0].rate.to_string() == "10000.000000000000"
                    && quotes[1].rate.to_string() == "2500.500000000000"
            })
            .returning(|_| Ok(()));

        let consumer = SnapshotConsumer::new(Arc::new(feed), Arc::new(store), 12);
        consumer.consume().await.unwrap();
    }

    #[tokio::test]
    async fn consume_drops_non_positive_rates() {
        let mut feed = MockSnapshotFeed::new();
        feed.expect_fetch_snapshot()
            .times(1)
            .returning(|| Ok(vec![tick("DEADUSDT", dec!(0)), tick("BTCUSDT", dec!(1))]));

        let mut store = MockQuoteStore::new();
        store
            .expect_save()
            .times(1)
            .withf(|quotes: &[Quote]| quotes.len() == 1 && quotes[0].symbol == "BTCUSDT")
            .returning(|_| Ok(()));

        let consumer = SnapshotConsumer::new(Arc::new(feed), Arc::new(store), 12);
        consumer.consume().await.unwrap();
    }

    #[tokio::test]
    async fn feed_error_propagates_without_saving() {
        let mut feed = MockSnapshotFeed::new();
        feed.expect_fetch_snapshot()
            .times(1)
            .returning(|| Err(FeedError::Status(503)));

        let mut store = MockQuoteStore::new();
        store.expect_save().times(0);

        let consumer = SnapshotConsumer::new(Arc::new(feed), Arc::new(store), 12);
        let err = consumer.consume().await.unwrap_err();
        assert!(matches!(err, ConsumeError::Feed(FeedError::Status(503))));
    }

    #[tokio::test]
    async fn cleanup_delegates_to_the_store() {
        let feed = MockSnapshotFeed::new();
        let mut store = MockQuoteStore::new();
        store.expect_cleanup().times(1).returning(|_| Ok(()));

        let consumer = SnapshotConsumer::new(Arc::new(feed), Arc::new(store), 12);
        consumer.cleanup(Utc::now()).await.unwrap();
    }
}
