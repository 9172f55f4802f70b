// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Sequential per-device telemetry collection
//!
//! Devices are visited one at a time so that at most one session is open
//! against the fleet. A device that cannot be read yields a sample with
//! `reachable = false` and every numeric field absent.

use serde::Serialize;
use std::sync::Arc;

use crate::config::Device;
use crate::metrics::labels::DeviceLabels;
use crate::metrics::parsers::parse_uptime_to_seconds;
use crate::routeros::{
    ConnectionManager, Connector, RetryPolicy, Session, SystemResource, parse_system,
};

/// One device's normalized telemetry at a point in time
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricSample {
    pub device_id: u32,
    pub device_name: String,
    pub ip_address: String,
    pub reachable: bool,
    pub cpu_load_percent: Option<u64>,
    pub memory_total_bytes: Option<u64>,
    pub memory_free_bytes: Option<u64>,
    pub memory_used_bytes: Option<u64>,
    pub hdd_total_bytes: Option<u64>,
    pub hdd_free_bytes: Option<u64>,
    pub uptime_seconds: Option<u64>,
}

impl MetricSample {
    #[must_use]
    pub fn unreachable(device: &Device) -> Self {
        Self {
            device_id: device.id,
            device_name: device.name.clone(),
            ip_address: device.address.clone(),
            reachable: false,
            cpu_load_percent: None,
            memory_total_bytes: None,
            memory_free_bytes: None,
            memory_used_bytes: None,
            hdd_total_bytes: None,
            hdd_free_bytes: None,
            uptime_seconds: None,
        }
    }

    #[must_use]
    pub fn from_resource(device: &Device, resource: &SystemResource) -> Self {
        Self {
            reachable: true,
            cpu_load_percent: Some(resource.cpu_load),
            memory_total_bytes: Some(resource.total_memory),
            memory_free_bytes: Some(resource.free_memory),
            memory_used_bytes: Some(resource.total_memory.saturating_sub(resource.free_memory)),
            hdd_total_bytes: Some(resource.total_hdd_space),
            hdd_free_bytes: Some(resource.free_hdd_space),
            uptime_seconds: Some(parse_uptime_to_seconds(&resource.uptime)),
            ..Self::unreachable(device)
        }
    }

    #[must_use]
    pub fn labels(&self) -> DeviceLabels {
        DeviceLabels::new(self.device_id, &self.device_name, &self.ip_address)
    }
}

pub struct MetricsAggregator<C> {
    manager: Arc<ConnectionManager<C>>,
    policy: RetryPolicy,
}

impl<C: Connector> MetricsAggregator<C> {
    #[must_use]
    pub fn new(manager: Arc<ConnectionManager<C>>, policy: RetryPolicy) -> Self {
        Self { manager, policy }
    }

    /// Collects one sample per device, in order
    pub async fn collect(&self, devices: &[Device]) -> Vec<MetricSample> {
        let mut samples = Vec::with_capacity(devices.len());
        for device in devices {
            samples.push(self.collect_one(device).await);
        }
        samples
    }

    async fn collect_one(&self, device: &Device) -> MetricSample {
        let mut session = match self.manager.open(device, &self.policy).await {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!("Device '{}' unreachable for metrics: {}", device.name, e);
                return MetricSample::unreachable(device);
            }
        };
        let reply = session.command("/system/resource/print", &[]).await;
        self.manager.close(device, session).await;

        match reply.and_then(|sentences| parse_system(&sentences)) {
            Ok(resource) => {
                tracing::debug!(
                    "Collected metrics for '{}': cpu {}%, uptime {}",
                    device.name,
                    resource.cpu_load,
                    resource.uptime
                );
                MetricSample::from_resource(device, &resource)
            }
            Err(e) => {
                tracing::warn!("Failed to read resources of '{}': {}", device.name, e);
                MetricSample::unreachable(device)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RouterOsError;
    use crate::testing::{FakeConnector, Fault, device};
    use std::time::Duration;

    fn aggregator(connector: &FakeConnector) -> MetricsAggregator<FakeConnector> {
        MetricsAggregator::new(
            Arc::new(ConnectionManager::new(connector.clone())),
            RetryPolicy::new(Duration::from_secs(3), 1, Duration::from_millis(10)),
        )
    }

    #[tokio::test]
    async fn test_reachable_device_populates_all_fields() {
        let connector = FakeConnector::default();

        let samples = aggregator(&connector).collect(&[device(1, "10.0.0.1")]).await;

        assert_eq!(
            samples,
            vec![MetricSample {
                device_id: 1,
                device_name: "router-1".to_string(),
                ip_address: "10.0.0.1".to_string(),
                reachable: true,
                cpu_load_percent: Some(12),
                memory_total_bytes: Some(268_435_456),
                memory_free_bytes: Some(134_217_728),
                memory_used_bytes: Some(134_217_728),
                hdd_total_bytes: Some(134_217_728),
                hdd_free_bytes: Some(100_000_000),
                uptime_seconds: Some(788_645),
            }]
        );
        assert_eq!(connector.closes(), 1);
    }

    #[tokio::test]
    async fn test_resource_fetch_failure_leaves_fields_absent() {
        let connector = FakeConnector::default();
        connector
            .router("10.0.0.2")
            .lock()
            .unwrap()
            .fail_on("/system/resource", Fault::Trap("not allowed".to_string()));

        let samples = aggregator(&connector)
            .collect(&[device(1, "10.0.0.1"), device(2, "10.0.0.2")])
            .await;

        assert!(samples[0].reachable);
        assert_eq!(samples[1], MetricSample::unreachable(&device(2, "10.0.0.2")));
        assert_eq!(connector.closes(), 2);
    }

    #[tokio::test]
    async fn test_unparseable_resource_marks_unreachable() {
        let connector = FakeConnector::default();
        connector
            .router("10.0.0.1")
            .lock()
            .unwrap()
            .set_resource(&[("cpu-load", "n/a"), ("uptime", "1d")]);

        let samples = aggregator(&connector).collect(&[device(1, "10.0.0.1")]).await;

        assert!(!samples[0].reachable);
        assert_eq!(samples[0].cpu_load_percent, None);
        assert_eq!(samples[0].uptime_seconds, None);
        assert_eq!(connector.closes(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unreachable_device_does_not_stop_collection() {
        let connector = FakeConnector::default().unreachable("10.0.0.1");

        let samples = aggregator(&connector)
            .collect(&[device(1, "10.0.0.1"), device(2, "10.0.0.2")])
            .await;

        assert_eq!(samples.len(), 2);
        assert!(!samples[0].reachable);
        assert!(samples[1].reachable);
        // two attempts against the dead device, one against the healthy one
        assert_eq!(connector.attempts(), 3);
        assert_eq!(connector.closes(), 1);
    }

    #[tokio::test]
    async fn test_auth_failure_is_not_retried() {
        let connector =
            FakeConnector::failing(|| RouterOsError::Login("invalid user name or password".into()));

        let samples = aggregator(&connector).collect(&[device(1, "10.0.0.1")]).await;

        assert!(!samples[0].reachable);
        assert_eq!(connector.attempts(), 1);
    }

    #[test]
    fn test_sample_labels_match_device_labels() {
        let d = device(5, "10.0.0.5");
        assert_eq!(MetricSample::unreachable(&d).labels(), DeviceLabels::from(&d));
    }

    #[test]
    fn test_unreachable_sample_serializes_nulls() {
        let json = serde_json::to_value(MetricSample::unreachable(&device(4, "10.0.0.4"))).unwrap();
        assert_eq!(json["reachable"], false);
        assert!(json["cpu_load_percent"].is_null());
        assert!(json["uptime_seconds"].is_null());
    }
}
