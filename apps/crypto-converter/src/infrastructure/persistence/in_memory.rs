//! In-Memory Quote Store
//!
//! A [`QuoteStore`] over a lock-protected vector, mirroring the Postgres
//! adapter's lookup semantics row for row. Used by integration tests and
//! local experiments; not suitable for production retention volumes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::application::ports::{QuoteStore, StoreError};
use crate::domain::quote::Quote;

/// In-process quote store with the same ordering semantics as Postgres.
#[derive(Debug, Default)]
pub struct InMemoryQuoteStore {
    quotes: RwLock<Vec<Quote>>,
}

impl InMemoryQuoteStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored quotes.
    pub async fn len(&self) -> usize {
        self.quotes.read().await.len()
    }

    /// Whether the store holds no quotes.
    pub async fn is_empty(&self) -> bool {
        self.quotes.read().await.is_empty()
    }
}

#[async_trait]
impl QuoteStore for InMemoryQuoteStore {
    async fn lookup(
        &self,
        symbol: &str,
        inverse_symbol: &str,
        as_of: DateTime<Utc>,
    ) -> Result<Option<Quote>, StoreError> {
        let quotes = self.quotes.read().await;

        // Greatest timestamp wins; ties go to the lexicographically smaller
        // symbol, matching the SQL `ORDER BY timestamp DESC, symbol` sort.
        let best = quotes
            .iter()
            .filter(|q| (q.symbol == symbol || q.symbol == inverse_symbol) && q.observed_at <= as_of)
            .max_by(|a, b| {
                a.observed_at
                    .cmp(&b.observed_at)
                    .then_with(|| b.symbol.cmp(&a.symbol))
            })
            .cloned();

        Ok(best)
    }

    async fn save(&self, quotes: &[Quote]) -> Result<(), StoreError> {
        if quotes.is_empty() {
            return Ok(());
        }
        self.quotes.write().await.extend_from_slice(quotes);
        Ok(())
    }

    async fn cleanup(&self, older_than: DateTime<Utc>) -> Result<(), StoreError> {
        self.quotes
            .write()
            .await
            .retain(|q| q.observed_at >= older_than);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use rust_decimal_macros::dec;

    fn quote(symbol: &str, rate: rust_decimal::Decimal, observed_at: DateTime<Utc>) -> Quote {
        Quote::new(symbol.to_string(), rate, observed_at)
    }

    #[tokio::test]
    async fn lookup_returns_the_freshest_quote_at_or_before_as_of() {
        let store = InMemoryQuoteStore::new();
        let now = Utc::now();

        store
            .save(&[
                quote("BTCUSDT", dec!(1), now - TimeDelta::seconds(30)),
                quote("BTCUSDT", dec!(2), now - TimeDelta::seconds(10)),
                quote("BTCUSDT", dec!(3), now + TimeDelta::seconds(10)),
            ])
            .await
            .unwrap();

        let found = store.lookup("BTCUSDT", "USDTBTC", now).await.unwrap().unwrap();
        assert_eq!(found.rate, dec!(2));
    }

    #[tokio::test]
    async fn lookup_boundary_is_inclusive() {
        let store = InMemoryQuoteStore::new();
        let at = Utc::now();

        store.save(&[quote("BTCUSDT", dec!(5), at)]).await.unwrap();

        let found = store.lookup("BTCUSDT", "USDTBTC", at).await.unwrap();
        assert_eq!(found.unwrap().rate, dec!(5));
    }

    #[tokio::test]
    async fn lookup_matches_either_direction() {
        let store = InMemoryQuoteStore::new();
        let now = Utc::now();

        store.save(&[quote("BTCUSDT", dec!(8000), now)]).await.unwrap();

        // Query phrased in the inverse direction still finds the stored row.
        let found = store.lookup("USDTBTC", "BTCUSDT", now).await.unwrap().unwrap();
        assert_eq!(found.symbol, "BTCUSDT");
    }

    #[tokio::test]
    async fn equal_timestamps_break_toward_the_smaller_symbol() {
        let store = InMemoryQuoteStore::new();
        let at = Utc::now();

        store
            .save(&[
                quote("USDTBTC", dec!(0.0001), at),
                quote("BTCUSDT", dec!(10000), at),
            ])
            .await
            .unwrap();

        let found = store.lookup("BTCUSDT", "USDTBTC", at).await.unwrap().unwrap();
        assert_eq!(found.symbol, "BTCUSDT");
    }

    #[tokio::test]
    async fn empty_store_returns_none() {
        let store = InMemoryQuoteStore::new();
        let found = store.lookup("BTCUSDT", "USDTBTC", Utc::now()).await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn cleanup_deletes_strictly_older_rows_and_is_idempotent() {
        let store = InMemoryQuoteStore::new();
        let horizon = Utc::now();

        store
            .save(&[
                quote("BTCUSDT", dec!(1), horizon - TimeDelta::seconds(1)),
                quote("ETHUSDT", dec!(2), horizon),
                quote("BNBUSDT", dec!(3), horizon + TimeDelta::seconds(1)),
            ])
            .await
            .unwrap();

        store.cleanup(horizon).await.unwrap();
        assert_eq!(store.len().await, 2);

        store.cleanup(horizon).await.unwrap();
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn empty_save_is_a_no_op() {
        let store = InMemoryQuoteStore::new();
        store.save(&[]).await.unwrap();
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn concurrent_lookup_never_observes_a_partial_batch() {
        use std::sync::Arc;

        let store = Arc::new(InMemoryQuoteStore::new());
        let at = Utc::now();
        let batch: Vec<Quote> = (0..1_000)
            .map(|i| quote(&format!("SYM{i:04}"), dec!(1), at))
            .collect();

        // Race repeated reads against the save: every observation must see
        // either none of the batch or all of it.
        let reader_store = Arc::clone(&store);
        let reader = tokio::spawn(async move {
            loop {
                let seen = reader_store.len().await;
                assert!(
                    seen == 0 || seen == 1_000,
                    "partial batch visible: {seen} rows"
                );

                // Visibility is monotonic: once any row of the batch is
                // visible, every row is. The save may land between the two
                // lookups, so only the some-then-none order is a violation.
                let early = reader_store
                    .lookup("SYM0000", "NONE", Utc::now())
                    .await
                    .unwrap();
                let late = reader_store
                    .lookup("SYM0999", "NONE", Utc::now())
                    .await
                    .unwrap();
                assert!(
                    early.is_none() || late.is_some(),
                    "partial batch visible across lookups"
                );

                if seen == 1_000 {
                    break;
                }
                tokio::task::yield_now().await;
            }
        });

        store.save(&batch).await.unwrap();
        reader.await.unwrap();
    }
}
