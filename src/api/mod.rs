//! HTTP API module for the RouterOS fleet service
//!
//! A thin surface over the core components.
//!
//! # Endpoints
//! - `GET /health` — health check
//! - `GET /metrics` — OpenMetrics exposition of the last collection cycle
//! - `GET /targets` — Prometheus HTTP service discovery
//! - `GET /status` — fleet sweep
//! - `GET /devices/{id}/test` — connectivity report
//! - `GET /devices/{id}/resources` — raw system resources
//! - `POST /devices/{id}/execute` — apply a template
//! - `POST /devices/{id}/scripts` — upload and run a script

pub mod handlers;
mod state;

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;
use std::sync::Arc;

use crate::error::{AppError, ConnectionError};
use crate::health::Prober;
use crate::routeros::Connector;

pub use state::AppState;

/// Creates the main Axum router with all endpoints
pub fn create_router<C, P>(state: Arc<AppState<C, P>>) -> Router
where
    C: Connector + 'static,
    P: Prober + 'static,
{
    Router::new()
        .route("/health", get(handlers::health_check::<C, P>))
        .route("/metrics", get(handlers::metrics_handler::<C, P>))
        .route("/targets", get(handlers::targets::<C, P>))
        .route("/status", get(handlers::status::<C, P>))
        .route("/devices/{id}/test", get(handlers::test_device::<C, P>))
        .route("/devices/{id}/resources", get(handlers::resources::<C, P>))
        .route("/devices/{id}/execute", post(handlers::execute::<C, P>))
        .route("/devices/{id}/scripts", post(handlers::run_script::<C, P>))
        .with_state(state)
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::DeviceNotFound(_) => StatusCode::NOT_FOUND,
            AppError::Connection(ConnectionError::Timeout { .. }) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Connection(ConnectionError::Auth { .. }) => StatusCode::UNAUTHORIZED,
            AppError::Connection(ConnectionError::Network { .. }) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Connection(ConnectionError::Dns { .. }) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::warn!("Request failed: {}", self);
        }
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}
