//! Postgres Quote Store
//!
//! [`QuoteStore`] adapter over a single append-only table:
//!
//! ```sql
//! CREATE TABLE quotes (
//!     timestamp TIMESTAMPTZ NOT NULL,
//!     symbol    VARCHAR(20) NOT NULL,
//!     quote     DECIMAL     NOT NULL,
//!     PRIMARY KEY (timestamp, symbol)
//! );
//! ```
//!
//! Lookups ride the primary-key index; batch saves run inside one transaction
//! so a concurrent reader never sees a partial snapshot.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, QueryBuilder, Row};

use crate::application::ports::{QuoteStore, StoreError};
use crate::domain::quote::Quote;

/// Rows per `INSERT` statement within the save transaction. Keeps each
/// statement well under the Postgres bind-parameter limit at three binds per
/// row.
const INSERT_CHUNK_SIZE: usize = 5_000;

const CREATE_TABLE_SQL: &str = "\
    CREATE TABLE IF NOT EXISTS quotes (
        timestamp TIMESTAMPTZ NOT NULL,
        symbol    VARCHAR(20) NOT NULL,
        quote     DECIMAL     NOT NULL,
        PRIMARY KEY (timestamp, symbol)
    )";

/// Production quote store backed by Postgres.
pub struct PostgresQuoteStore {
    pool: PgPool,
}

impl PostgresQuoteStore {
    /// Connect to the database and create the quotes table if missing.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let store = Self::with_pool(pool);
        store.ensure_schema().await?;

        tracing::info!(max_connections, "Connected to quote database");
        Ok(store)
    }

    /// Wrap an existing pool without touching the schema.
    #[must_use]
    pub const fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the quotes table if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(CREATE_TABLE_SQL)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl QuoteStore for PostgresQuoteStore {
    async fn lookup(
        &self,
        symbol: &str,
        inverse_symbol: &str,
        as_of: DateTime<Utc>,
    ) -> Result<Option<Quote>, StoreError> {
        let row = sqlx::query(
            "SELECT timestamp, symbol, quote
             FROM quotes
             WHERE (symbol = $1 OR symbol = $2) AND timestamp <= $3
             ORDER BY timestamp DESC, symbol
             LIMIT 1",
        )
        .bind(symbol)
        .bind(inverse_symbol)
        .bind(as_of)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        row.map(|row| {
            let observed_at: DateTime<Utc> = row
                .try_get("timestamp")
                .map_err(|e| StoreError::Decode(e.to_string()))?;
            let symbol: String = row
                .try_get("symbol")
                .map_err(|e| StoreError::Decode(e.to_string()))?;
            let rate: Decimal = row
                .try_get("quote")
                .map_err(|e| StoreError::Decode(e.to_string()))?;

            Ok(Quote::new(symbol, rate, observed_at))
        })
        .transpose()
    }

    async fn save(&self, quotes: &[Quote]) -> Result<(), StoreError> {
        if quotes.is_empty() {
            return Ok(());
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        for chunk in quotes.chunks(INSERT_CHUNK_SIZE) {
            let mut builder: QueryBuilder<Postgres> =
                QueryBuilder::new("INSERT INTO quotes (timestamp, symbol, quote) ");

            builder.push_values(chunk, |mut row, quote| {
                row.push_bind(quote.observed_at)
                    .push_bind(&quote.symbol)
                    .push_bind(quote.rate);
            });

            // A restart or an unchanged-accumulator flush can resubmit keys
            // that are already stored; the rate for a given key never
            // changes, so dropping the duplicate row is safe.
            builder.push(" ON CONFLICT (timestamp, symbol) DO NOTHING");

            builder
                .build()
                .execute(&mut *tx)
                .await
                .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        tracing::debug!(count = quotes.len(), "Quote batch saved");
        Ok(())
    }

    async fn cleanup(&self, older_than: DateTime<Utc>) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM quotes WHERE timestamp < $1")
            .bind(older_than)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        tracing::debug!(
            deleted = result.rows_affected(),
            older_than = %older_than,
            "Cleanup executed"
        );
        Ok(())
    }
}
