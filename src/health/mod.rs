// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Fleet health sweeper
//!
//! Probes every device independently with bounded parallelism. A probe that
//! fails or hangs marks its device DOWN and never holds up the others.

mod probe;

use futures_util::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Device;
use crate::error::ConnectionError;
use crate::routeros::{ConnectionManager, Connector, RetryPolicy, Sentence, Session};

pub use probe::{ProbeResult, Prober, SystemProber};

/// Extra time a probe gets on top of its own timeout before it is abandoned
const PROBE_GRACE: Duration = Duration::from_secs(1);

const SNMP_PORT: u16 = 161;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DeviceStatus {
    Up,
    Down,
}

/// Per-device result of a sweep
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthSnapshot {
    pub id: u32,
    pub name: String,
    pub ip_address: String,
    pub status: DeviceStatus,
}

/// Ping, API port and SNMP port checks for one device
#[derive(Debug, Clone, Serialize)]
pub struct ConnectivityReport {
    pub device_id: u32,
    pub device_name: String,
    pub ip_address: String,
    pub ping: ProbeResult,
    pub api_port: ProbeResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snmp_port: Option<ProbeResult>,
    /// `healthy` when every probe succeeded, `unhealthy` otherwise
    pub overall_status: &'static str,
    /// `passed/total`
    pub success_rate: String,
}

pub struct HealthSweeper<P, C> {
    prober: P,
    manager: Arc<ConnectionManager<C>>,
    resources_policy: RetryPolicy,
    concurrency: usize,
}

impl<P: Prober, C: Connector> HealthSweeper<P, C> {
    #[must_use]
    pub fn new(
        prober: P,
        manager: Arc<ConnectionManager<C>>,
        resources_policy: RetryPolicy,
        concurrency: usize,
    ) -> Self {
        Self {
            prober,
            manager,
            resources_policy,
            concurrency: concurrency.max(1),
        }
    }

    /// Probes every device and returns snapshots ordered by device id
    ///
    /// DOWN devices are dropped from the result unless `include_unreachable`
    /// is set; they are still counted in the sweep log line.
    pub async fn sweep(
        &self,
        devices: &[Device],
        ping_timeout: Duration,
        include_unreachable: bool,
    ) -> Vec<HealthSnapshot> {
        let mut snapshots: Vec<HealthSnapshot> = stream::iter(devices.iter().cloned())
            .map(|device| self.probe_one(device, ping_timeout))
            .buffer_unordered(self.concurrency)
            .collect()
            .await;
        snapshots.sort_by_key(|s| s.id);

        let down = snapshots
            .iter()
            .filter(|s| s.status == DeviceStatus::Down)
            .count();
        tracing::info!(
            "Sweep finished: {} device(s), {} up, {} down",
            snapshots.len(),
            snapshots.len() - down,
            down
        );

        if !include_unreachable {
            snapshots.retain(|s| s.status == DeviceStatus::Up);
        }
        snapshots
    }

    async fn probe_one(&self, device: Device, ping_timeout: Duration) -> HealthSnapshot {
        let bound = ping_timeout + PROBE_GRACE;
        let up = match tokio::time::timeout(bound, self.prober.ping(&device.address, ping_timeout)).await
        {
            Ok(result) => {
                if !result.success {
                    tracing::debug!("Device '{}' is down: {}", device.name, result.reason);
                }
                result.success
            }
            Err(_) => {
                tracing::warn!(
                    "Probe of device '{}' did not finish within {:?}",
                    device.name,
                    bound
                );
                false
            }
        };

        HealthSnapshot {
            id: device.id,
            name: device.name,
            ip_address: device.address,
            status: if up { DeviceStatus::Up } else { DeviceStatus::Down },
        }
    }

    /// Runs ping, API port and (when a community is set) SNMP port probes
    pub async fn connectivity_report(&self, device: &Device, timeout: Duration) -> ConnectivityReport {
        let snmp = async {
            if device.snmp_community.is_empty() {
                None
            } else {
                Some(self.prober.check_port(&device.address, SNMP_PORT, timeout).await)
            }
        };
        let (ping, api_port, snmp_port) = tokio::join!(
            self.prober.ping(&device.address, timeout),
            self.prober.check_port(&device.address, device.api_port, timeout),
            snmp
        );

        let results = [Some(&ping), Some(&api_port), snmp_port.as_ref()];
        let total = results.iter().flatten().count();
        let passed = results.iter().flatten().filter(|r| r.success).count();

        ConnectivityReport {
            device_id: device.id,
            device_name: device.name.clone(),
            ip_address: device.address.clone(),
            ping,
            api_port,
            snmp_port,
            overall_status: if passed == total { "healthy" } else { "unhealthy" },
            success_rate: format!("{passed}/{total}"),
        }
    }

    /// Fetches the raw `/system/resource` map of one device
    ///
    /// # Errors
    ///
    /// A typed [`ConnectionError`] when the session cannot be opened or the
    /// read fails; an empty reply is reported as a network error.
    pub async fn resources(&self, device: &Device) -> Result<Sentence, ConnectionError> {
        let mut session = self.manager.open(device, &self.resources_policy).await?;
        let result = session.command("/system/resource/print", &[]).await;
        self.manager.close(device, session).await;

        let mut sentences = result.map_err(|e| {
            self.manager
                .classify_session_error(device, &self.resources_policy, &e)
        })?;
        if sentences.is_empty() {
            return Err(ConnectionError::Network {
                address: device.api_endpoint(),
                message: "empty /system/resource reply".to_string(),
                attempts: 1,
            });
        }
        Ok(sentences.swap_remove(0))
    }
}
