// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::api::AppState;
use crate::health::{HealthSnapshot, Prober};
use crate::routeros::Connector;

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    #[serde(default = "include_unreachable_default")]
    pub include_unreachable: bool,
}

fn include_unreachable_default() -> bool {
    true
}

/// One Prometheus HTTP service discovery group
#[derive(Debug, Serialize)]
pub struct TargetGroup {
    pub targets: Vec<String>,
    pub labels: BTreeMap<&'static str, String>,
}

/// GET /status
///
/// Sweeps every device; DOWN devices are listed unless
/// `include_unreachable=false`.
pub async fn status<C: Connector + 'static, P: Prober + 'static>(
    State(state): State<Arc<AppState<C, P>>>,
    Query(query): Query<StatusQuery>,
) -> Json<Vec<HealthSnapshot>> {
    let devices = state.directory.list_devices();
    let snapshots = state
        .sweeper
        .sweep(&devices, state.config.ping_timeout(), query.include_unreachable)
        .await;
    Json(snapshots)
}

/// GET /targets
pub async fn targets<C: Connector + 'static, P: Prober + 'static>(
    State(state): State<Arc<AppState<C, P>>>,
) -> Json<Vec<TargetGroup>> {
    let groups = state
        .directory
        .list_devices()
        .into_iter()
        .map(|device| TargetGroup {
            targets: vec![device.address.clone()],
            labels: BTreeMap::from([
                ("instance", device.address),
                ("hostname", device.name),
                ("device_id", device.id.to_string()),
            ]),
        })
        .collect();
    Json(groups)
}
