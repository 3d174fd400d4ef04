//! Binance Ticker WebSocket Client
//!
//! Connects to the all-market ticker stream and forwards decoded tick batches
//! into an mpsc channel consumed by the streaming accumulator.
//!
//! # Stream URL
//!
//! - Production: `wss://stream.binance.com:9443/ws/!ticker@arr`
//!
//! # Protocol
//!
//! Each text frame is a JSON array of ticker objects, one per symbol that
//! changed in the last second. No authentication or subscribe handshake is
//! required; the stream starts emitting as soon as the socket is open.

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use crate::domain::quote::PriceTick;
use crate::infrastructure::binance::messages::TickerStreamMessage;

/// Production all-market ticker stream endpoint.
pub const STREAM_URL: &str = "wss://stream.binance.com:9443/ws/!ticker@arr";

// =============================================================================
// Error Type
// =============================================================================

/// Errors that can occur in the ticker stream client.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Connection closed by the server.
    #[error("connection closed")]
    ConnectionClosed,
}

// =============================================================================
// Stream Client
// =============================================================================

/// WebSocket client for the Binance all-market ticker stream.
pub struct BinanceStreamClient {
    url: String,
    tick_tx: mpsc::Sender<Vec<PriceTick>>,
    cancel: CancellationToken,
}

impl BinanceStreamClient {
    /// Create a new stream client. Production callers pass [`STREAM_URL`].
    #[must_use]
    pub fn new(
        url: impl Into<String>,
        tick_tx: mpsc::Sender<Vec<PriceTick>>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            url: url.into(),
            tick_tx,
            cancel,
        }
    }

    /// Connect and forward ticker batches until cancelled, the receiver is
    /// dropped, or the connection fails.
    pub async fn run(self) -> Result<(), StreamError> {
        tracing::info!(url = %self.url, "Connecting to ticker stream");

        let (ws_stream, _response) = tokio_tungstenite::connect_async(&self.url).await?;
        let (mut write, mut read) = ws_stream.split();

        tracing::info!("Ticker stream connected");

        loop {
            tokio::select! {
                () = self.cancel.cancelled() => {
                    tracing::info!("Ticker stream client cancelled");
                    return Ok(());
                }
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            if !self.forward_batch(&text).await {
                                tracing::info!("Tick receiver dropped, stream client stopping");
                                return Ok(());
                            }
                        }
                        Some(Ok(Message::Ping(data))) => {
                            write.send(Message::Pong(data)).await?;
                        }
                        Some(Ok(Message::Close(frame))) => {
                            tracing::warn!(frame = ?frame, "Server sent close frame");
                            return Err(StreamError::ConnectionClosed);
                        }
                        Some(Ok(_)) => {
                            // Ignore other message types
                        }
                        Some(Err(e)) => return Err(e.into()),
                        None => {
                            tracing::warn!("WebSocket stream ended");
                            return Err(StreamError::ConnectionClosed);
                        }
                    }
                }
            }
        }
    }

    /// Decode one text frame and send the batch downstream. Returns `false`
    /// when the receiver has been dropped. An undecodable frame is logged and
    /// skipped; the stream interleaves payloads this client does not model.
    async fn forward_batch(&self, text: &str) -> bool {
        let messages: Vec<TickerStreamMessage> = match serde_json::from_str(text) {
            Ok(messages) => messages,
            Err(e) => {
                tracing::warn!(error = %e, "Skipping undecodable stream frame");
                return true;
            }
        };

        let ticks: Vec<PriceTick> = messages
            .into_iter()
            .filter_map(TickerStreamMessage::into_tick)
            .collect();

        if ticks.is_empty() {
            return true;
        }

        tracing::trace!(count = ticks.len(), "Forwarding ticker batch");
        self.tick_tx.send(ticks).await.is_ok()
    }
}
