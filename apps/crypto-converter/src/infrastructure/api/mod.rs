//! Conversion Query API
//!
//! HTTP server for point-in-time currency conversion queries.
//!
//! # Endpoints
//!
//! - `GET /convert?amount=&from=&to=[&timestamp=]` - convert an amount using
//!   the freshest stored quote; `timestamp` is epoch seconds for historical
//!   conversions
//! - `GET /health` - liveness probe (simple OK)
//!
//! Errors are returned as `{"detail": "<message>"}` with the matching status
//! code.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::application::services::{ConversionCalculator, ConversionError};

// =============================================================================
// Request / Response Types
// =============================================================================

/// Query parameters for `GET /convert`.
#[derive(Debug, Deserialize)]
pub struct ConvertParams {
    /// Amount of the source currency to convert.
    pub amount: Decimal,
    /// Source currency ticker, e.g. `BTC`.
    pub from: String,
    /// Target currency ticker, e.g. `USDT`.
    pub to: String,
    /// Optional point in time, epoch seconds. Defaults to now.
    pub timestamp: Option<i64>,
}

/// Successful conversion response.
#[derive(Debug, Serialize)]
pub struct ConvertResponse {
    /// Converted amount, quantized to the amount precision.
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    /// The stored exchange rate used for the conversion.
    #[serde(with = "rust_decimal::serde::str")]
    pub conversion_rate: Decimal,
}

// =============================================================================
// Error Type
// =============================================================================

/// API-level error carrying the response status and detail message.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    fn bad_request(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            detail: detail.into(),
        }
    }
}

impl From<ConversionError> for ApiError {
    fn from(err: ConversionError) -> Self {
        let status = match err {
            ConversionError::InvalidAmount => StatusCode::BAD_REQUEST,
            ConversionError::NotFound | ConversionError::Outdated => StatusCode::NOT_FOUND,
            ConversionError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        // Storage details stay out of client responses.
        let detail = match &err {
            ConversionError::Store(e) => {
                tracing::error!(error = %e, "Conversion query hit a storage error");
                "Storage unavailable".to_string()
            }
            _ => err.to_string(),
        };
        Self { status, detail }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let body = Json(serde_json::json!({ "detail": self.detail }));
        (self.status, body).into_response()
    }
}

// =============================================================================
// Router and Handlers
// =============================================================================

/// Shared state for the conversion API.
pub struct ApiState {
    /// Calculator the convert handler delegates to.
    pub calculator: ConversionCalculator,
}

/// Create the API router with all routes configured.
pub fn create_router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/convert", get(convert_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

async fn convert_handler(
    State(state): State<Arc<ApiState>>,
    Query(params): Query<ConvertParams>,
) -> Result<Json<ConvertResponse>, ApiError> {
    let as_of = params
        .timestamp
        .map(|ts| {
            DateTime::<Utc>::from_timestamp(ts, 0)
                .ok_or_else(|| ApiError::bad_request("timestamp is out of range"))
        })
        .transpose()?;

    tracing::debug!(
        amount = %params.amount,
        from = %params.from,
        to = %params.to,
        as_of = ?as_of,
        "Conversion requested"
    );

    let conversion = state
        .calculator
        .convert(params.amount, &params.from, &params.to, as_of)
        .await?;

    Ok(Json(ConvertResponse {
        amount: conversion.amount,
        conversion_rate: conversion.rate,
    }))
}

async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

// =============================================================================
// Server
// =============================================================================

/// Conversion API server errors.
#[derive(Debug, thiserror::Error)]
pub enum ApiServerError {
    /// Failed to bind the listen address.
    #[error("failed to bind {0}: {1}")]
    BindFailed(String, String),

    /// Server error.
    #[error("server error: {0}")]
    ServerFailed(String),
}

/// Conversion API HTTP server.
pub struct ApiServer {
    host: String,
    port: u16,
    state: Arc<ApiState>,
    cancel: CancellationToken,
}

impl ApiServer {
    /// Create a new API server. `host` may be a hostname (e.g. `localhost`)
    /// or an IP literal; it is resolved at bind time.
    #[must_use]
    pub const fn new(
        host: String,
        port: u16,
        state: Arc<ApiState>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            host,
            port,
            state,
            cancel,
        }
    }

    /// Run the API server until cancelled.
    ///
    /// # Errors
    ///
    /// Returns `ApiServerError` if binding fails or the HTTP server
    /// encounters a fatal error while running.
    pub async fn run(self) -> Result<(), ApiServerError> {
        let app = create_router(self.state);

        // Bind through ToSocketAddrs so hostnames resolve, not just IP
        // literals.
        let listener = TcpListener::bind((self.host.as_str(), self.port))
            .await
            .map_err(|e| {
                ApiServerError::BindFailed(format!("{}:{}", self.host, self.port), e.to_string())
            })?;

        tracing::info!(host = %self.host, port = self.port, "Conversion API listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(self.cancel.cancelled_owned())
            .await
            .map_err(|e| ApiServerError::ServerFailed(e.to_string()))?;

        tracing::info!("Conversion API stopped");
        Ok(())
    }
}
