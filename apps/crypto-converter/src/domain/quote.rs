//! Quote Types and Decimal Quantization
//!
//! A [`Quote`] is one observation of an exchange rate for a ticker symbol.
//! Symbols concatenate a base and quote currency code (e.g. `BTCUSDT`), so
//! many quotes exist per symbol, one per observation time; the composite key
//! is `(observed_at, symbol)`.
//!
//! All decimal values are quantized with [`quantize`] before they are stored
//! or returned: round-half-to-even at an exact scale, so `10000` quantized to
//! six places renders as `10000.000000`. This keeps API responses bit-exact
//! and reproducible.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// One persisted exchange-rate observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// Ticker symbol (base + quote currency code, e.g. `BTCUSDT`).
    pub symbol: String,
    /// Exchange rate, quantized to the configured rate precision. Always
    /// positive.
    pub rate: Decimal,
    /// Feed-reported observation time, not ingestion wall-clock time.
    pub observed_at: DateTime<Utc>,
}

impl Quote {
    /// Create a new quote.
    #[must_use]
    pub const fn new(symbol: String, rate: Decimal, observed_at: DateTime<Utc>) -> Self {
        Self {
            symbol,
            rate,
            observed_at,
        }
    }
}

/// One raw price observation delivered by the upstream feed, before
/// quantization. Produced by both the REST snapshot endpoint and the
/// ticker stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceTick {
    /// Ticker symbol.
    pub symbol: String,
    /// Raw price as reported by the feed.
    pub price: Decimal,
    /// Feed-reported observation time.
    pub observed_at: DateTime<Utc>,
}

/// Quantize a decimal to exactly `precision` fractional digits.
///
/// Rounds half-to-even, then pads with zeros so the scale is exact:
/// `quantize(1, 6)` renders as `1.000000`. The same function is used for
/// amount, rate, and result quantization so the arithmetic stays bit-exact
/// across the ingestion and query paths.
#[must_use]
pub fn quantize(value: Decimal, precision: u32) -> Decimal {
    let mut quantized =
        value.round_dp_with_strategy(precision, RoundingStrategy::MidpointNearestEven);
    quantized.rescale(precision);
    quantized
}
