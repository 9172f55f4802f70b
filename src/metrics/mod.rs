// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Metrics aggregation and exposition for the RouterOS fleet
//!
//! Contains the sequential aggregator, the uptime parser, label types and the
//! per-cycle Prometheus registry.

mod aggregator;
mod labels;
mod parsers;
mod registry;


/// Sequential collector and its per-device sample
pub use aggregator::{MetricSample, MetricsAggregator};

/// Per-device labels
pub use labels::DeviceLabels;

/// RouterOS uptime string parser
pub use parsers::parse_uptime_to_seconds;

/// Prometheus metrics registry
pub use registry::MetricsRegistry;
