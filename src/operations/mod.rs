// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Operation executor: applies catalog templates to a device
//!
//! Every call produces an [`Outcome`]; errors never cross this boundary.
//! The session opened for an operation is closed on every path.

mod procedures;
mod script;
mod template;

use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Device;
use crate::error::OperationError;
use crate::routeros::{ConnectionManager, Connector, RetryPolicy};

use procedures::Applied;
use script::ScriptNamer;

pub use template::Template;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OutcomeStatus {
    Success,
    Failed,
}

/// Result of one operation, returned to the caller for auditing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub status: OutcomeStatus,
    pub detail: String,
    /// Display name reported by the identity templates
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<String>,
}

impl Outcome {
    fn from_result(result: Result<Applied, OperationError>) -> Self {
        match result {
            Ok(applied) => Self {
                status: OutcomeStatus::Success,
                detail: applied.detail,
                identity: applied.identity,
            },
            Err(e) => Self {
                status: OutcomeStatus::Failed,
                detail: e.to_string(),
                identity: None,
            },
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Success
    }
}

pub struct OperationExecutor<C> {
    manager: Arc<ConnectionManager<C>>,
    policy: RetryPolicy,
    script_settle: Duration,
    names: ScriptNamer,
}

impl<C: Connector> OperationExecutor<C> {
    #[must_use]
    pub fn new(manager: Arc<ConnectionManager<C>>, policy: RetryPolicy, script_settle: Duration) -> Self {
        Self {
            manager,
            policy,
            script_settle,
            names: ScriptNamer::default(),
        }
    }

    /// Applies `template_name` with `params` to `device`
    ///
    /// Parameters are validated before a session is opened.
    pub async fn execute(
        &self,
        device: &Device,
        template_name: &str,
        params: &HashMap<String, Value>,
    ) -> Outcome {
        let result = match Template::parse(template_name, params) {
            Ok(template) => self.apply(device, &template).await,
            Err(e) => Err(e),
        };
        let outcome = Outcome::from_result(result);
        log_outcome(device, template_name, &outcome);
        outcome
    }

    async fn apply(&self, device: &Device, template: &Template) -> Result<Applied, OperationError> {
        let mut session = self.manager.open(device, &self.policy).await?;
        tracing::debug!("Applying {} to device '{}'", template.name(), device.name);
        let result = procedures::apply(&mut session, template).await;
        self.manager.close(device, session).await;
        result
    }

    /// Uploads `source` under a unique name, runs it and removes it again
    pub async fn run_script(&self, device: &Device, source: &str) -> Outcome {
        let result = self.upload_and_run(device, source).await;
        let outcome = Outcome::from_result(result.map(|detail| Applied {
            detail,
            identity: None,
        }));
        log_outcome(device, "script", &outcome);
        outcome
    }

    async fn upload_and_run(&self, device: &Device, source: &str) -> Result<String, OperationError> {
        if source.trim().is_empty() {
            return Err(OperationError::Parameter(
                "Script source cannot be empty".to_string(),
            ));
        }
        let name = self.names.next();
        let mut session = self.manager.open(device, &self.policy).await?;
        let result = script::upload_and_run(&mut session, &name, source, self.script_settle).await;
        self.manager.close(device, session).await;
        result
    }
}

fn log_outcome(device: &Device, operation: &str, outcome: &Outcome) {
    if outcome.is_success() {
        tracing::info!(
            "{} on device '{}' succeeded: {}",
            operation,
            device.name,
            outcome.detail
        );
    } else {
        tracing::warn!(
            "{} on device '{}' failed: {}",
            operation,
            device.name,
            outcome.detail
        );
    }
}
