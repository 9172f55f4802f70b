// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! # RouterOS Fleet
//!
//! Connectivity and telemetry core for a fleet of MikroTik RouterOS devices.
//!
//! Opens resilient API sessions, applies configuration templates, sweeps the
//! fleet for reachability and exports per-device metrics in OpenMetrics format.
//!
//! ## Main modules
//! - `api`: HTTP API handlers
//! - `collector`: periodic metrics collection
//! - `config`: configuration management
//! - `directory`: device directory and audit sink
//! - `error`: error types
//! - `health`: fleet health sweeper and probes
//! - `metrics`: metrics aggregation and registry
//! - `operations`: template executor
//! - `routeros`: RouterOS API client and connection manager
//! - `prelude`: commonly used types and traits

mod api;
mod collector;
mod config;
mod directory;
mod error;
mod health;
mod metrics;
mod operations;
mod routeros;
pub mod prelude;

#[cfg(test)]
mod testing;

// Re-export commonly used types
/// Application configuration
pub use config::{Config, Device, PolicySettings};

/// Error taxonomy and application result type
pub use error::{AppError, ConnectionError, OperationError, Result, RouterOsError};

/// HTTP API router and state
pub use api::{AppState, create_router};

/// Metrics collection loop
pub use collector::{run_collection_cycle, start_collection_loop};

/// Device directory and audit collaborators
pub use directory::{AuditSink, DeviceDirectory, StaticDirectory, TracingAuditSink};

/// Fleet health sweeper
pub use health::{
    ConnectivityReport, DeviceStatus, HealthSnapshot, HealthSweeper, ProbeResult, Prober,
    SystemProber,
};

/// Metrics aggregation and registry
pub use metrics::{
    DeviceLabels, MetricSample, MetricsAggregator, MetricsRegistry, parse_uptime_to_seconds,
};

/// Template executor
pub use operations::{OperationExecutor, Outcome, OutcomeStatus, Template};

/// RouterOS client and connection manager
pub use routeros::{
    ConnectionManager, Connector, FailureClass, RetryPolicy, RouterOsConnection,
    RouterOsConnector, Sentence, Session, SystemResource, Transition, classify,
};

/// RouterOS wire protocol length encoding (public for tests)
pub use routeros::encode_length;
