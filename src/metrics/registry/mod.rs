// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Per-cycle metrics registry
//!
//! A registry is built from one collection cycle's samples and replaced
//! wholesale by the next, so devices that disappear take their series with
//! them.

mod init;
mod scrape;
mod update;

use crate::metrics::labels::DeviceLabels;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::registry::Registry;

pub struct MetricsRegistry {
    registry: Registry,
    cpu_load: Family<DeviceLabels, Gauge>,
    memory_total: Family<DeviceLabels, Gauge>,
    memory_free: Family<DeviceLabels, Gauge>,
    memory_used: Family<DeviceLabels, Gauge>,
    hdd_total: Family<DeviceLabels, Gauge>,
    hdd_free: Family<DeviceLabels, Gauge>,
    uptime_seconds: Family<DeviceLabels, Gauge>,
    device_up: Family<DeviceLabels, Gauge>,
    collection_cycle_duration_milliseconds: Gauge,
    devices_scraped: Gauge,
    devices_unreachable: Gauge,
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MetricsRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsRegistry")
            .field("devices_scraped", &self.devices_scraped.get())
            .field("devices_unreachable", &self.devices_unreachable.get())
            .finish_non_exhaustive()
    }
}
