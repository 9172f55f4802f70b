use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::api::AppState;
use crate::health::Prober;
use crate::routeros::Connector;

const OPENMETRICS_CONTENT_TYPE: &str = "application/openmetrics-text; version=1.0.0; charset=utf-8";

/// GET /metrics
///
/// Encodes the registry of the last finished collection cycle.
pub async fn metrics_handler<C: Connector + 'static, P: Prober + 'static>(
    State(state): State<Arc<AppState<C, P>>>,
) -> Response {
    tracing::debug!("/metrics encode latest cycle");
    let encoded = state.metrics.read().await.encode_metrics();
    match encoded {
        Ok(metrics_text) => (
            StatusCode::OK,
            [("Content-Type", OPENMETRICS_CONTENT_TYPE)],
            metrics_text,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            e.into_response()
        }
    }
}
