//! Conversion Calculator
//!
//! Point-in-time currency conversion over the quote store. Resolves the pair
//! in either stored direction (direct multiply, inverse divide), rejects
//! quotes older than the staleness window, and quantizes the result with
//! banker's rounding at a fixed amount precision.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use rust_decimal::Decimal;

use crate::application::ports::{QuoteStore, StoreError};
use crate::domain::quote::quantize;

/// Errors surfaced by [`ConversionCalculator::convert`].
///
/// The `NotFound` and `Outdated` messages are the client-facing response
/// detail strings and must stay stable.
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    /// The requested amount is negative.
    #[error("amount must be non-negative")]
    InvalidAmount,

    /// No stored quote covers the pair at the requested time.
    #[error("Quote not found")]
    NotFound,

    /// The freshest stored quote is older than the staleness window.
    #[error("Quote is outdated")]
    Outdated,

    /// Storage failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A successful conversion result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    /// Converted amount, quantized to the amount precision.
    pub amount: Decimal,
    /// The stored exchange rate the conversion used, as stored (the direct
    /// rate even when the inverse direction was applied).
    pub rate: Decimal,
}

/// Stateless conversion arithmetic over a [`QuoteStore`].
pub struct ConversionCalculator {
    store: Arc<dyn QuoteStore>,
    amount_precision: u32,
    staleness: TimeDelta,
}

impl ConversionCalculator {
    /// Create a calculator that rejects quotes older than `staleness` and
    /// quantizes converted amounts to `amount_precision` decimal places.
    #[must_use]
    pub fn new(store: Arc<dyn QuoteStore>, amount_precision: u32, staleness: TimeDelta) -> Self {
        Self {
            store,
            amount_precision,
            staleness,
        }
    }

    /// Convert `amount` units of `from` into `to` using the freshest stored
    /// quote at or before `as_of` (default: now).
    ///
    /// Looks up the concatenated pair in both directions: a stored `from+to`
    /// quote multiplies, a stored `to+from` quote divides.
    pub async fn convert(
        &self,
        amount: Decimal,
        from: &str,
        to: &str,
        as_of: Option<DateTime<Utc>>,
    ) -> Result<Conversion, ConversionError> {
        if amount < Decimal::ZERO {
            return Err(ConversionError::InvalidAmount);
        }

        let as_of = as_of.unwrap_or_else(Utc::now);
        let symbol = format!("{from}{to}");
        let inverse_symbol = format!("{to}{from}");

        let quote = self
            .store
            .lookup(&symbol, &inverse_symbol, as_of)
            .await?
            .ok_or(ConversionError::NotFound)?;

        if quote.observed_at < as_of - self.staleness {
            tracing::debug!(
                symbol = %quote.symbol,
                observed_at = %quote.observed_at,
                as_of = %as_of,
                "Freshest quote is outside the staleness window"
            );
            return Err(ConversionError::Outdated);
        }

        let amount = quantize(amount, self.amount_precision);
        let converted = if quote.symbol == symbol {
            amount * quote.rate
        } else {
            // Stored rates are positive by the save-path invariant, but a
            // zero divisor from legacy rows must not panic the query path.
            amount
                .checked_div(quote.rate)
                .ok_or(ConversionError::NotFound)?
        };

        Ok(Conversion {
            amount: quantize(converted, self.amount_precision),
            rate: quote.rate,
        })
    }
}
