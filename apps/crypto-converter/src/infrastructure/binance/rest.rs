//! Binance REST Snapshot Client
//!
//! [`SnapshotFeed`] adapter over the 24hr ticker endpoint. One unauthenticated
//! GET returns the full market; no pagination, no API key.

use std::time::Duration;

use async_trait::async_trait;

use crate::application::ports::{FeedError, SnapshotFeed};
use crate::domain::quote::PriceTick;
use crate::infrastructure::binance::messages::TickerSnapshotMessage;

/// Production snapshot endpoint.
pub const SNAPSHOT_URL: &str = "https://api.binance.com/api/v3/ticker/24hr";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for the Binance 24hr ticker snapshot.
pub struct BinanceRestClient {
    client: reqwest::Client,
    url: String,
}

impl BinanceRestClient {
    /// Create a client against an explicit endpoint URL. Production callers
    /// pass [`SNAPSHOT_URL`]; tests point this at a local mock server.
    pub fn new(url: impl Into<String>) -> Result<Self, FeedError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| FeedError::Unavailable(e.to_string()))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl SnapshotFeed for BinanceRestClient {
    async fn fetch_snapshot(&self) -> Result<Vec<PriceTick>, FeedError> {
        tracing::debug!(url = %self.url, "Fetching ticker snapshot");

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| FeedError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = %status, "Snapshot request rejected");
            return Err(FeedError::Status(status.as_u16()));
        }

        let messages: Vec<TickerSnapshotMessage> = response
            .json()
            .await
            .map_err(|e| FeedError::Decode(e.to_string()))?;

        let received = messages.len();
        let ticks: Vec<PriceTick> = messages
            .into_iter()
            .filter_map(TickerSnapshotMessage::into_tick)
            .collect();

        tracing::debug!(received, decoded = ticks.len(), "Ticker snapshot fetched");
        Ok(ticks)
    }
}
