// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Exposition and registry-level bookkeeping helpers

use prometheus_client::encoding::text::encode;

use super::MetricsRegistry;
use crate::error::AppError;

impl MetricsRegistry {
    /// Encodes the registry in OpenMetrics text format
    pub fn encode_metrics(&self) -> Result<String, AppError> {
        let mut buffer = String::new();
        encode(&mut buffer, &self.registry).map_err(|e| AppError::Metrics(e.to_string()))?;
        Ok(buffer)
    }

    pub fn record_collection_cycle_duration(&self, duration_secs: f64) {
        #[allow(clippy::cast_possible_truncation)]
        let millis = (duration_secs * 1000.0).round() as i64;
        self.collection_cycle_duration_milliseconds.set(millis);
    }
}
