//! Ingestion integration tests.
//!
//! Runs the snapshot consumer against a mocked Binance endpoint and drives
//! the scheduler end to end with an in-memory quote store.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeDelta, Utc};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crypto_converter::application::ports::{QuoteConsumer, QuoteStore};
use crypto_converter::application::services::SnapshotConsumer;
use crypto_converter::infrastructure::binance::BinanceRestClient;
use crypto_converter::{IngestionScheduler, InMemoryQuoteStore, SchedulerConfig};

async fn mock_binance(quotes: serde_json::Value) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/ticker/24hr"))
        .respond_with(ResponseTemplate::new(200).set_body_json(quotes))
        .mount(&server)
        .await;
    server
}

fn snapshot_consumer(server: &MockServer, store: Arc<InMemoryQuoteStore>) -> SnapshotConsumer {
    let client =
        BinanceRestClient::new(format!("{}/api/v3/ticker/24hr", server.uri())).unwrap();
    SnapshotConsumer::new(Arc::new(client), store, 12)
}

#[tokio::test]
async fn snapshot_consumer_persists_a_fetched_snapshot() {
    let close_time = Utc::now().timestamp_millis();
    let server = mock_binance(serde_json::json!([
        {"symbol": "BTCUSDT", "lastPrice": "10000.00000000", "closeTime": close_time},
        {"symbol": "ETHUSDT", "lastPrice": "2500.50000000", "closeTime": close_time}
    ]))
    .await;

    let store = Arc::new(InMemoryQuoteStore::new());
    let consumer = snapshot_consumer(&server, Arc::clone(&store));

    consumer.consume().await.unwrap();

    let btc = store
        .lookup("BTCUSDT", "USDTBTC", Utc::now())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(btc.rate.to_string(), "10000.000000000000");
    assert_eq!(btc.observed_at.timestamp_millis(), close_time);
    assert_eq!(store.len().await, 2);
}

#[tokio::test]
async fn scheduler_drives_save_and_cleanup_through_the_consumer() {
    let close_time = Utc::now().timestamp_millis();
    let server = mock_binance(serde_json::json!([
        {"symbol": "BTCUSDT", "lastPrice": "10000.00000000", "closeTime": close_time}
    ]))
    .await;

    let store = Arc::new(InMemoryQuoteStore::new());

    // A stale row the first cleanup must remove.
    store
        .save(&[crypto_converter::domain::quote::Quote::new(
            "OLDUSDT".to_string(),
            rust_decimal_macros::dec!(1),
            Utc::now() - TimeDelta::days(30),
        )])
        .await
        .unwrap();

    let consumer = Arc::new(snapshot_consumer(&server, Arc::clone(&store)));
    let cancel = CancellationToken::new();
    let config = SchedulerConfig {
        tick_interval: Duration::from_millis(10),
        save_period: TimeDelta::seconds(60),
        cleanup_period: TimeDelta::seconds(60),
        cleanup_retention: TimeDelta::days(7),
    };

    let scheduler = IngestionScheduler::new(config, consumer, cancel.clone());
    let handle = tokio::spawn(scheduler.run());

    tokio::time::sleep(Duration::from_millis(100)).await;
    cancel.cancel();
    handle.await.unwrap();

    // The first tick saved the snapshot and removed the stale row.
    assert_eq!(store.len().await, 1);
    let btc = store
        .lookup("BTCUSDT", "USDTBTC", Utc::now())
        .await
        .unwrap();
    assert!(btc.is_some());
    let old = store
        .lookup("OLDUSDT", "USDTOLD", Utc::now())
        .await
        .unwrap();
    assert!(old.is_none());
}

#[tokio::test]
async fn feed_outage_leaves_the_store_untouched() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let store = Arc::new(InMemoryQuoteStore::new());
    let client = BinanceRestClient::new(server.uri()).unwrap();
    let consumer =
        SnapshotConsumer::new(Arc::new(client), Arc::clone(&store) as Arc<dyn QuoteStore>, 12);

    assert!(consumer.consume().await.is_err());
    assert!(store.is_empty().await);
}
