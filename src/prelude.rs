// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Prelude module for convenient imports
//!
//! This module re-exports commonly used types and traits for convenient use.
//! Users of the library can import everything they need with:
//!
//! ```rust
//! use routeros_fleet::prelude::*;
//! ```

// Core types
pub use crate::config::{Config, Device};
pub use crate::error::{AppError, ConnectionError, OperationError, Result};

// Collaborators
pub use crate::directory::{AuditSink, DeviceDirectory, StaticDirectory};

// Core components
pub use crate::health::{HealthSnapshot, HealthSweeper, Prober, SystemProber};
pub use crate::metrics::{MetricSample, MetricsAggregator, MetricsRegistry};
pub use crate::operations::{OperationExecutor, Outcome, OutcomeStatus};

// RouterOS client
pub use crate::routeros::{
    ConnectionManager, Connector, RetryPolicy, RouterOsConnector, Session,
};
