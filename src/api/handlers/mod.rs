// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

mod devices;
mod fleet;
mod health;
mod metrics;

pub use devices::{execute, resources, run_script, test_device};
pub use fleet::{status, targets};
pub use health::health_check;
pub use metrics::metrics_handler;
