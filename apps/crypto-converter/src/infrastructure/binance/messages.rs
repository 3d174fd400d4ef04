//! Binance Wire Messages
//!
//! Serde models for the two upstream payload shapes, plus conversion into the
//! domain [`PriceTick`]. Prices arrive as decimal strings and are parsed
//! losslessly; timestamps are epoch milliseconds.

use chrono::DateTime;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::domain::quote::PriceTick;

/// One element of the REST `/api/v3/ticker/24hr` response array.
#[derive(Debug, Clone, Deserialize)]
pub struct TickerSnapshotMessage {
    /// Trading pair symbol, e.g. `BTCUSDT`.
    #[serde(rename = "symbol")]
    pub symbol: String,

    /// Last traded price.
    #[serde(rename = "lastPrice")]
    pub last_price: Decimal,

    /// Statistics window close time, epoch milliseconds.
    #[serde(rename = "closeTime")]
    pub close_time: i64,
}

impl TickerSnapshotMessage {
    /// Convert into a domain tick. `None` when the close time is outside the
    /// representable timestamp range.
    pub fn into_tick(self) -> Option<PriceTick> {
        let observed_at = DateTime::from_timestamp_millis(self.close_time)?;
        Some(PriceTick {
            symbol: self.symbol,
            price: self.last_price,
            observed_at,
        })
    }
}

/// One element of the `!ticker@arr` WebSocket stream payload.
///
/// The stream uses single-letter field names; only the fields the accumulator
/// needs are modeled.
#[derive(Debug, Clone, Deserialize)]
pub struct TickerStreamMessage {
    /// Trading pair symbol.
    #[serde(rename = "s")]
    pub symbol: String,

    /// Last traded price.
    #[serde(rename = "c")]
    pub last_price: Decimal,

    /// Event time, epoch milliseconds.
    #[serde(rename = "E")]
    pub event_time: i64,
}

impl TickerStreamMessage {
    /// Convert into a domain tick. `None` when the event time is outside the
    /// representable timestamp range.
    pub fn into_tick(self) -> Option<PriceTick> {
        let observed_at = DateTime::from_timestamp_millis(self.event_time)?;
        Some(PriceTick {
            symbol: self.symbol,
            price: self.last_price,
            observed_at,
        })
    }
}
