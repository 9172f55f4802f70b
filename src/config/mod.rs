// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Configuration module for the RouterOS fleet service
//!
//! Loads and parses configuration from environment variables and JSON.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;
use std::time::Duration;

use crate::routeros::RetryPolicy;


/// Default configuration values
pub mod defaults {
    pub const SERVER_ADDR: &str = "0.0.0.0:9090";
    pub const ROUTEROS_USERNAME: &str = "admin";
    pub const ROUTEROS_PASSWORD: &str = "";
    pub const API_PORT: u16 = 8728;
    pub const SNMP_COMMUNITY: &str = "public";
    pub const COLLECTION_INTERVAL_SECS: u64 = 30;
    pub const PING_TIMEOUT_SECS: u64 = 1;
    pub const SWEEP_CONCURRENCY: usize = 16;
    pub const SCRIPT_SETTLE_MILLIS: u64 = 1000;
}

/// Environment variable names used by the application
pub mod env_vars {
    pub const SERVER_ADDR: &str = "SERVER_ADDR";
    pub const DEVICES_CONFIG: &str = "DEVICES_CONFIG";
    pub const ROUTEROS_ADDRESS: &str = "ROUTEROS_ADDRESS";
    pub const ROUTEROS_USERNAME: &str = "ROUTEROS_USERNAME";
    pub const ROUTEROS_PASSWORD: &str = "ROUTEROS_PASSWORD";
    pub const ROUTEROS_PORT: &str = "ROUTEROS_PORT";
    pub const COLLECTION_INTERVAL_SECONDS: &str = "COLLECTION_INTERVAL_SECONDS";
    pub const PING_TIMEOUT_SECONDS: &str = "PING_TIMEOUT_SECONDS";
    pub const SWEEP_CONCURRENCY: &str = "SWEEP_CONCURRENCY";
    pub const SCRIPT_SETTLE_MILLIS: &str = "SCRIPT_SETTLE_MILLIS";
}

fn default_api_port() -> u16 {
    defaults::API_PORT
}

fn default_snmp_community() -> String {
    defaults::SNMP_COMMUNITY.to_string()
}

/// Immutable snapshot of a managed RouterOS device
#[derive(Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Device {
    pub id: u32,
    pub name: String,
    /// IP address or host name, without port
    pub address: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    #[serde(default = "default_api_port")]
    pub api_port: u16,
    #[serde(default = "default_snmp_community")]
    pub snmp_community: String,
}

// Keeps the password out of logs
impl std::fmt::Debug for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("address", &self.address)
            .field("username", &self.username)
            .field("api_port", &self.api_port)
            .finish_non_exhaustive()
    }
}

impl Device {
    /// `host:port` of the RouterOS API service
    #[must_use]
    pub fn api_endpoint(&self) -> String {
        if self.address.contains(':') && !self.address.starts_with('[') {
            // bare IPv6 literal
            format!("[{}]:{}", self.address, self.api_port)
        } else {
            format!("{}:{}", self.address, self.api_port)
        }
    }

    /// Validates device configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err(format!("Device {} name cannot be empty", self.id));
        }

        if self.address.trim().is_empty() {
            return Err(format!("Address cannot be empty for device '{}'", self.name));
        }

        // handed to `ping` as a positional argument
        if self.address.trim_start().starts_with('-') {
            return Err(format!(
                "Address '{}' for device '{}' cannot start with '-'",
                self.address, self.name
            ));
        }

        if self.username.trim().is_empty() {
            return Err(format!("Username cannot be empty for device '{}'", self.name));
        }

        if self.api_port == 0 {
            return Err(format!("API port cannot be 0 for device '{}'", self.name));
        }

        Ok(())
    }
}

/// Timeout and retry budget for one family of connections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicySettings {
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub retry_base_ms: u64,
}

impl PolicySettings {
    fn from_env(prefix: &str, defaults: PolicySettings) -> Self {
        Self {
            timeout_secs: env_or(&format!("{prefix}_TIMEOUT_SECONDS"), defaults.timeout_secs),
            max_retries: env_or(&format!("{prefix}_MAX_RETRIES"), defaults.max_retries),
            retry_base_ms: env_or(&format!("{prefix}_RETRY_BASE_MS"), defaults.retry_base_ms),
        }
    }

    #[must_use]
    pub fn to_policy(self) -> RetryPolicy {
        RetryPolicy::new(
            Duration::from_secs(self.timeout_secs),
            self.max_retries,
            Duration::from_millis(self.retry_base_ms),
        )
    }
}

/// Application-wide configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub server_addr: String,
    pub devices: Vec<Device>,
    pub collection_interval_secs: u64,
    /// Used by the operation executor
    pub connect: PolicySettings,
    /// Used for on-demand resource reads
    pub resources: PolicySettings,
    /// Used by the metrics aggregator
    pub metrics: PolicySettings,
    pub ping_timeout_secs: u64,
    pub sweep_concurrency: usize,
    pub script_settle_millis: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server_addr: defaults::SERVER_ADDR.to_string(),
            devices: vec![],
            collection_interval_secs: defaults::COLLECTION_INTERVAL_SECS,
            connect: PolicySettings {
                timeout_secs: 10,
                max_retries: 2,
                retry_base_ms: 1000,
            },
            resources: PolicySettings {
                timeout_secs: 10,
                max_retries: 1,
                retry_base_ms: 1000,
            },
            metrics: PolicySettings {
                timeout_secs: 3,
                max_retries: 1,
                retry_base_ms: 500,
            },
            ping_timeout_secs: defaults::PING_TIMEOUT_SECS,
            sweep_concurrency: defaults::SWEEP_CONCURRENCY,
            script_settle_millis: defaults::SCRIPT_SETTLE_MILLIS,
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

/// Drops invalid devices and duplicate ids, logging each one
pub(crate) fn validate_devices(devices: Vec<Device>) -> Vec<Device> {
    let mut seen = HashSet::new();
    devices
        .into_iter()
        .filter(|device| {
            if let Err(e) = device.validate() {
                tracing::error!("Invalid device configuration: {}", e);
                tracing::warn!("Skipping invalid device: {}", device.name);
                return false;
            }
            if !seen.insert(device.id) {
                tracing::warn!(
                    "Skipping device '{}': duplicate id {}",
                    device.name,
                    device.id
                );
                return false;
            }
            true
        })
        .collect()
}

impl Config {
    /// Loads configuration from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let base = Config::default();

        let server_addr = std::env::var(env_vars::SERVER_ADDR)
            .unwrap_or_else(|_| defaults::SERVER_ADDR.to_string());

        // Load devices configuration from JSON
        let devices = if let Ok(config_json) = std::env::var(env_vars::DEVICES_CONFIG) {
            serde_json::from_str(&config_json).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse DEVICES_CONFIG: {}. Using empty list.", e);
                vec![]
            })
        } else {
            // Fallback: use legacy environment variables for single device
            let address = std::env::var(env_vars::ROUTEROS_ADDRESS).ok();
            let username = std::env::var(env_vars::ROUTEROS_USERNAME)
                .unwrap_or_else(|_| defaults::ROUTEROS_USERNAME.to_string());
            let password = std::env::var(env_vars::ROUTEROS_PASSWORD)
                .unwrap_or_else(|_| defaults::ROUTEROS_PASSWORD.to_string());

            if let Some(address) = address {
                vec![Device {
                    id: 1,
                    name: "default".to_string(),
                    address,
                    username,
                    password,
                    api_port: env_or(env_vars::ROUTEROS_PORT, defaults::API_PORT),
                    snmp_community: default_snmp_community(),
                }]
            } else {
                tracing::warn!(
                    "No device configuration found. Service will start but /metrics will be empty."
                );
                vec![]
            }
        };

        Config {
            server_addr,
            devices: validate_devices(devices),
            collection_interval_secs: env_or(
                env_vars::COLLECTION_INTERVAL_SECONDS,
                base.collection_interval_secs,
            ),
            connect: PolicySettings::from_env("CONNECT", base.connect),
            resources: PolicySettings::from_env("RESOURCES", base.resources),
            metrics: PolicySettings::from_env("METRICS", base.metrics),
            ping_timeout_secs: env_or(env_vars::PING_TIMEOUT_SECONDS, base.ping_timeout_secs),
            sweep_concurrency: env_or(env_vars::SWEEP_CONCURRENCY, base.sweep_concurrency).max(1),
            script_settle_millis: env_or(
                env_vars::SCRIPT_SETTLE_MILLIS,
                base.script_settle_millis,
            ),
        }
    }

    #[must_use]
    pub fn ping_timeout(&self) -> Duration {
        Duration::from_secs(self.ping_timeout_secs)
    }
}
