// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::api::AppState;
use crate::error::AppError;
use crate::health::{ConnectivityReport, Prober};
use crate::operations::Outcome;
use crate::routeros::{Connector, Sentence};

/// Per-probe bound for the connectivity report
const REPORT_PROBE_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Deserialize)]
pub struct ExecuteRequest {
    pub template_name: String,
    #[serde(default)]
    /// Scalars of any JSON type; nested values fail the operation
    pub params: HashMap<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct ScriptRequest {
    pub source: String,
}

fn outcome_response(outcome: Outcome) -> Response {
    let status = if outcome.is_success() {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(outcome)).into_response()
}

/// GET /devices/{id}/test
pub async fn test_device<C: Connector + 'static, P: Prober + 'static>(
    State(state): State<Arc<AppState<C, P>>>,
    Path(id): Path<u32>,
) -> Result<Json<ConnectivityReport>, AppError> {
    let device = state.directory.get_device(id)?;
    let report = state
        .sweeper
        .connectivity_report(&device, REPORT_PROBE_TIMEOUT)
        .await;
    Ok(Json(report))
}

/// GET /devices/{id}/resources
pub async fn resources<C: Connector + 'static, P: Prober + 'static>(
    State(state): State<Arc<AppState<C, P>>>,
    Path(id): Path<u32>,
) -> Result<Json<Sentence>, AppError> {
    let device = state.directory.get_device(id)?;
    let resource = state.sweeper.resources(&device).await?;
    Ok(Json(resource))
}

/// POST /devices/{id}/execute
///
/// The outcome is handed to the audit sink before it is returned.
pub async fn execute<C: Connector + 'static, P: Prober + 'static>(
    State(state): State<Arc<AppState<C, P>>>,
    Path(id): Path<u32>,
    Json(request): Json<ExecuteRequest>,
) -> Result<Response, AppError> {
    let device = state.directory.get_device(id)?;
    let outcome = state
        .executor
        .execute(&device, &request.template_name, &request.params)
        .await;
    state.audit.record(device.id, &request.template_name, &outcome);
    Ok(outcome_response(outcome))
}

/// POST /devices/{id}/scripts
pub async fn run_script<C: Connector + 'static, P: Prober + 'static>(
    State(state): State<Arc<AppState<C, P>>>,
    Path(id): Path<u32>,
    Json(request): Json<ScriptRequest>,
) -> Result<Response, AppError> {
    let device = state.directory.get_device(id)?;
    let outcome = state.executor.run_script(&device, &request.source).await;
    state.audit.record(device.id, "script", &outcome);
    Ok(outcome_response(outcome))
}
