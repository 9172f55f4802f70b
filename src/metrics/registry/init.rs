// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Registry initialization and metric registration

use crate::metrics::labels::DeviceLabels;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::registry::Registry;

use super::MetricsRegistry;

fn device_gauge(registry: &mut Registry, name: &str, help: &str) -> Family<DeviceLabels, Gauge> {
    let family = Family::<DeviceLabels, Gauge>::default();
    registry.register(name, help, family.clone());
    family
}

impl MetricsRegistry {
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let cpu_load = device_gauge(
            &mut registry,
            "routeros_cpu_load_percent",
            "CPU load percentage",
        );
        let memory_total = device_gauge(
            &mut registry,
            "routeros_memory_total_bytes",
            "Total memory bytes",
        );
        let memory_free = device_gauge(
            &mut registry,
            "routeros_memory_free_bytes",
            "Free memory bytes",
        );
        let memory_used = device_gauge(
            &mut registry,
            "routeros_memory_used_bytes",
            "Used memory bytes",
        );
        let hdd_total = device_gauge(
            &mut registry,
            "routeros_hdd_total_bytes",
            "Total storage bytes",
        );
        let hdd_free = device_gauge(
            &mut registry,
            "routeros_hdd_free_bytes",
            "Free storage bytes",
        );
        let uptime_seconds = device_gauge(
            &mut registry,
            "routeros_uptime_seconds",
            "Device uptime in seconds",
        );
        let device_up = device_gauge(
            &mut registry,
            "routeros_device_up",
            "Device reachable over the API (1=up,0=down)",
        );

        let collection_cycle_duration_milliseconds = Gauge::default();
        registry.register(
            "routeros_collection_cycle_duration_milliseconds",
            "Duration of the last collection cycle in milliseconds",
            collection_cycle_duration_milliseconds.clone(),
        );
        let devices_scraped = Gauge::default();
        registry.register(
            "routeros_devices_scraped",
            "Devices visited in the last collection cycle",
            devices_scraped.clone(),
        );
        let devices_unreachable = Gauge::default();
        registry.register(
            "routeros_devices_unreachable",
            "Devices that could not be read in the last collection cycle",
            devices_unreachable.clone(),
        );

        Self {
            registry,
            cpu_load,
            memory_total,
            memory_free,
            memory_used,
            hdd_total,
            hdd_free,
            uptime_seconds,
            device_up,
            collection_cycle_duration_milliseconds,
            devices_scraped,
            devices_unreachable,
        }
    }
}
