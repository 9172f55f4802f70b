use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::AppState;
use crate::health::Prober;
use crate::routeros::Connector;

/// Liveness response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Devices known to the directory
    pub devices: usize,
}

/// GET /health
///
/// Reports that the service itself is up. Never touches a device.
pub async fn health_check<C: Connector + 'static, P: Prober + 'static>(
    State(state): State<Arc<AppState<C, P>>>,
) -> impl IntoResponse {
    let response = HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        devices: state.directory.list_devices().len(),
    };

    (StatusCode::OK, Json(response))
}
