//! Conversion API integration tests.
//!
//! Exercises the full router against an in-memory quote store, asserting the
//! exact response bodies a client sees.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{TimeDelta, Utc};
use rust_decimal_macros::dec;
use tower::ServiceExt;

use crypto_converter::application::ports::QuoteStore;
use crypto_converter::domain::quote::Quote;
use crypto_converter::{ApiState, ConversionCalculator, InMemoryQuoteStore, create_router};

fn make_router(store: Arc<InMemoryQuoteStore>) -> axum::Router {
    let calculator = ConversionCalculator::new(store, 6, TimeDelta::seconds(60));
    create_router(Arc::new(ApiState { calculator }))
}

async fn get(router: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = router
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap();
    (status, body)
}

#[tokio::test]
async fn convert_with_a_direct_quote() {
    let store = Arc::new(InMemoryQuoteStore::new());
    store
        .save(&[Quote::new(
            "BTCUSDT".to_string(),
            dec!(10000.000000000000),
            Utc::now(),
        )])
        .await
        .unwrap();

    let (status, body) = get(
        make_router(store),
        "/convert?amount=1&from=BTC&to=USDT",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        serde_json::json!({
            "amount": "10000.000000",
            "conversion_rate": "10000.000000000000"
        })
    );
}

#[tokio::test]
async fn convert_with_an_inverse_quote() {
    let store = Arc::new(InMemoryQuoteStore::new());
    store
        .save(&[Quote::new(
            "BTCUSDT".to_string(),
            dec!(8000.000000000000),
            Utc::now(),
        )])
        .await
        .unwrap();

    let (status, body) = get(
        make_router(store),
        "/convert?amount=1&from=USDT&to=BTC",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["amount"], "0.000125");
}

#[tokio::test]
async fn missing_quote_returns_404_not_found() {
    let store = Arc::new(InMemoryQuoteStore::new());

    let (status, body) = get(
        make_router(store),
        "/convert?amount=1&from=BTC&to=USDT",
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, serde_json::json!({ "detail": "Quote not found" }));
}

#[tokio::test]
async fn stale_quote_returns_404_outdated() {
    let store = Arc::new(InMemoryQuoteStore::new());
    store
        .save(&[Quote::new(
            "BTCUSDT".to_string(),
            dec!(10000),
            Utc::now() - TimeDelta::seconds(61),
        )])
        .await
        .unwrap();

    let (status, body) = get(
        make_router(store),
        "/convert?amount=1&from=BTC&to=USDT",
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, serde_json::json!({ "detail": "Quote is outdated" }));
}

#[tokio::test]
async fn historical_timestamp_accepts_a_quote_fresh_at_that_time() {
    let store = Arc::new(InMemoryQuoteStore::new());
    let as_of = Utc::now() - TimeDelta::days(10);
    store
        .save(&[Quote::new(
            "BTCUSDT".to_string(),
            dec!(500.000000000000),
            as_of - TimeDelta::seconds(5),
        )])
        .await
        .unwrap();

    let uri = format!(
        "/convert?amount=2&from=BTC&to=USDT&timestamp={}",
        as_of.timestamp()
    );
    let (status, body) = get(make_router(store), &uri).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["amount"], "1000.000000");
}

#[tokio::test]
async fn negative_amount_returns_400() {
    let store = Arc::new(InMemoryQuoteStore::new());

    let (status, body) = get(
        make_router(store),
        "/convert?amount=-1&from=BTC&to=USDT",
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "amount must be non-negative");
}

#[tokio::test]
async fn missing_query_parameters_return_400() {
    let store = Arc::new(InMemoryQuoteStore::new());

    let router = make_router(store);
    let response = router
        .oneshot(
            Request::builder()
                .uri("/convert?amount=1&from=BTC")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn health_endpoint_responds_ok() {
    let store = Arc::new(InMemoryQuoteStore::new());
    let router = make_router(store);

    let response = router
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
