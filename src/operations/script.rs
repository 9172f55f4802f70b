// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Upload, run and remove a one-off script

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use super::procedures::{add, find};
use crate::error::{OperationError, RouterOsError};
use crate::routeros::{Session, attrs};

const SCRIPTS: &str = "/system/script";

/// Generates `netweaver_xxxxxxxx` names that do not repeat within a process
#[derive(Debug, Default)]
pub(super) struct ScriptNamer {
    counter: AtomicU64,
}

impl ScriptNamer {
    pub(super) fn next(&self) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let seq = self.counter.fetch_add(1, Ordering::Relaxed);
        let digest = md5::compute(format!("{nanos}:{seq}"));
        let hex = hex::encode(digest.0);
        format!("netweaver_{}", &hex[..8])
    }
}

/// Removes any script called `name`; failures are logged
async fn remove_named<S: Session>(session: &mut S, name: &str) -> Result<bool, RouterOsError> {
    let Some(existing) = find(session, SCRIPTS, &[("name", name)]).await? else {
        return Ok(false);
    };
    let id = existing
        .get(".id")
        .cloned()
        .unwrap_or_else(|| name.to_string());
    session
        .command(&format!("{SCRIPTS}/remove"), &attrs(&[(".id", id.as_str())]))
        .await?;
    Ok(true)
}

/// Uploads `source` as `name`, runs it, waits `settle`, then removes it
///
/// A failed run is reported in the detail rather than as an error; the
/// upload itself must succeed.
pub(super) async fn upload_and_run<S: Session>(
    session: &mut S,
    name: &str,
    source: &str,
    settle: Duration,
) -> Result<String, OperationError> {
    let fields = [("name", name), ("source", source)];
    if let Err(e) = add(session, SCRIPTS, &fields).await {
        tracing::debug!("Upload of {} failed ({}), replacing existing script", name, e);
        if !remove_named(session, name).await? {
            return Err(e.into());
        }
        add(session, SCRIPTS, &fields).await?;
    }

    tracing::info!("Running script {}", name);
    let detail = match session
        .command(&format!("{SCRIPTS}/run"), &attrs(&[(".id", name)]))
        .await
    {
        Ok(_) => format!("Script {name} executed successfully"),
        Err(e) => {
            tracing::warn!("Script {} failed to run: {}", name, e);
            format!("Script {name} uploaded but execution failed: {e}")
        }
    };

    tokio::time::sleep(settle).await;

    match remove_named(session, name).await {
        Ok(_) => tracing::debug!("Removed script {}", name),
        Err(e) => tracing::warn!("Failed to remove script {}: {}", name, e),
    }

    Ok(detail)
}
