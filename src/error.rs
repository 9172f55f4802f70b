// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Error types for the RouterOS fleet service
//!
//! Errors are layered: [`RouterOsError`] is what the wire protocol produces,
//! [`ConnectionError`] is the typed taxonomy the connection manager surfaces,
//! and [`OperationError`] covers everything that can go wrong while applying
//! a configuration template.

use thiserror::Error;

/// Raw failure reported by the RouterOS transport or protocol layer
#[derive(Debug, Error)]
pub enum RouterOsError {
    /// Network or IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Operation did not finish within its bound
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Host name did not resolve
    #[error("failed to lookup address for {host}: {message}")]
    Resolve { host: String, message: String },

    /// Device answered with `!trap`
    #[error("RouterOS trap: {0}")]
    Trap(String),

    /// Device answered with `!fatal` and closed the connection
    #[error("RouterOS fatal: {0}")]
    Fatal(String),

    /// Login was rejected
    #[error("Login failed: {0}")]
    Login(String),

    /// Malformed or unexpected response
    #[error("Protocol error: {0}")]
    Protocol(String),
}

/// Typed connection failure surfaced by the connection manager
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    #[error("Timeout connecting to {address} after {attempts} attempt(s)")]
    Timeout { address: String, attempts: u32 },

    #[error("DNS resolution failed for {host}: {message}")]
    Dns { host: String, message: String },

    #[error("Authentication failed for {username}@{host}")]
    Auth { username: String, host: String },

    #[error("Network error connecting to {address}: {message}")]
    Network {
        address: String,
        message: String,
        attempts: u32,
    },
}

/// Failure while applying a configuration template
#[derive(Debug, Error)]
pub enum OperationError {
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Missing or invalid template parameter
    #[error("Parameter error: {0}")]
    Parameter(String),

    #[error("Unknown template: {0}")]
    UnknownTemplate(String),

    /// Device accepted the session but refused the command
    #[error("Device rejected operation: {0}")]
    DeviceRejected(String),

    /// Session dropped while the operation was running
    #[error("Connection lost during operation: {0}")]
    ConnectionLost(String),
}

impl From<RouterOsError> for OperationError {
    fn from(error: RouterOsError) -> Self {
        match error {
            RouterOsError::Trap(msg) => Self::DeviceRejected(msg),
            other => Self::ConnectionLost(other.to_string()),
        }
    }
}

/// Main application error type
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network or IO error
    #[error("IO error")]
    Io(#[from] std::io::Error),

    /// Metrics encoding error
    #[error("Metrics error: {0}")]
    Metrics(String),

    /// Address parsing error
    #[error("Address parse error")]
    AddrParse(#[from] std::net::AddrParseError),

    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Device lookup failed
    #[error("Device {0} not found")]
    DeviceNotFound(u32),
}

/// Convenient alias for Result with application error
pub type Result<T> = std::result::Result<T, AppError>;
