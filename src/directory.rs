// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Collaborators around the core: where devices come from and where
//! operation outcomes go.

use crate::config::Device;
use crate::error::{AppError, Result};
use crate::operations::Outcome;

/// Source of device snapshots
pub trait DeviceDirectory: Send + Sync {
    fn list_devices(&self) -> Vec<Device>;

    /// # Errors
    ///
    /// [`AppError::DeviceNotFound`] for an unknown id.
    fn get_device(&self, id: u32) -> Result<Device>;
}

/// Persists operation outcomes
pub trait AuditSink: Send + Sync {
    fn record(&self, device_id: u32, template_name: &str, outcome: &Outcome);
}

/// Directory over the configured device list
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    devices: Vec<Device>,
}

impl StaticDirectory {
    #[must_use]
    pub fn new(devices: Vec<Device>) -> Self {
        Self { devices }
    }
}

impl DeviceDirectory for StaticDirectory {
    fn list_devices(&self) -> Vec<Device> {
        self.devices.clone()
    }

    fn get_device(&self, id: u32) -> Result<Device> {
        self.devices
            .iter()
            .find(|d| d.id == id)
            .cloned()
            .ok_or(AppError::DeviceNotFound(id))
    }
}

/// Writes outcomes to the `audit` tracing target
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, device_id: u32, template_name: &str, outcome: &Outcome) {
        tracing::info!(
            target: "audit",
            device_id,
            template_name,
            status = ?outcome.status,
            "{}",
            outcome.detail
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::device;

    #[test]
    fn test_static_directory_lookup() {
        let dir = StaticDirectory::new(vec![device(1, "10.0.0.1"), device(2, "10.0.0.2")]);

        assert_eq!(dir.list_devices().len(), 2);
        assert_eq!(dir.get_device(2).unwrap().address, "10.0.0.2");
        assert!(matches!(dir.get_device(9), Err(AppError::DeviceNotFound(9))));
    }
}
