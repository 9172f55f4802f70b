// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Metric update logic for collected samples

use crate::metrics::MetricSample;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;

use crate::metrics::labels::DeviceLabels;

use super::MetricsRegistry;

fn to_gauge(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn set_if_present(family: &Family<DeviceLabels, Gauge>, labels: &DeviceLabels, value: Option<u64>) {
    if let Some(value) = value {
        family.get_or_create(labels).set(to_gauge(value));
    }
}

impl MetricsRegistry {
    /// Builds a registry holding exactly the given samples
    pub fn from_samples(samples: &[MetricSample]) -> Self {
        let registry = Self::new();
        for sample in samples {
            registry.record(sample);
        }
        let unreachable = samples.iter().filter(|s| !s.reachable).count();
        registry.devices_scraped.set(to_gauge(samples.len() as u64));
        registry.devices_unreachable.set(to_gauge(unreachable as u64));
        registry
    }

    /// Records one device sample
    ///
    /// Unreachable devices only get `routeros_device_up 0`; absent values
    /// are never written as zero.
    pub fn record(&self, sample: &MetricSample) {
        let labels = sample.labels();
        self.device_up
            .get_or_create(&labels)
            .set(i64::from(sample.reachable));
        if !sample.reachable {
            return;
        }
        set_if_present(&self.cpu_load, &labels, sample.cpu_load_percent);
        set_if_present(&self.memory_total, &labels, sample.memory_total_bytes);
        set_if_present(&self.memory_free, &labels, sample.memory_free_bytes);
        set_if_present(&self.memory_used, &labels, sample.memory_used_bytes);
        set_if_present(&self.hdd_total, &labels, sample.hdd_total_bytes);
        set_if_present(&self.hdd_free, &labels, sample.hdd_free_bytes);
        set_if_present(&self.uptime_seconds, &labels, sample.uptime_seconds);
    }
}
