// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Connection manager: bounded, classified, retrying session opens
//!
//! Every attempt is bounded by the policy timeout. Failures are sorted into
//! [`FailureClass`]es; DNS and authentication failures end the attempt loop
//! immediately, timeouts and other network errors are retried with
//! exponential backoff (`base_delay * 2^attempt`) until the budget is spent.

use std::time::Duration;

use super::session::{Connector, Session};
use crate::config::Device;
use crate::error::{ConnectionError, RouterOsError};

/// Keywords that mark an error message as a credential rejection
const AUTH_KEYWORDS: &[&str] = &[
    "login",
    "password",
    "credential",
    "authentication",
    "not logged in",
    "invalid user",
];

/// Resolver messages as produced by the system resolver on common platforms
const DNS_KEYWORDS: &[&str] = &[
    "failed to lookup address",
    "name or service not known",
    "nodename nor servname",
    "no such host",
];

/// Largest exponent applied to the base delay
const MAX_BACKOFF_EXPONENT: u32 = 16;

/// Failure taxonomy used for retry decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    Timeout,
    Dns,
    Auth,
    Network,
}

impl FailureClass {
    /// Whether another attempt may fix this failure
    #[must_use]
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::Timeout | Self::Network)
    }
}

/// Default classifier: inspects the variant first, then the message text
#[must_use]
pub fn classify(error: &RouterOsError) -> FailureClass {
    match error {
        RouterOsError::Resolve { .. } => return FailureClass::Dns,
        RouterOsError::Timeout(_) => return FailureClass::Timeout,
        RouterOsError::Login(_) => return FailureClass::Auth,
        RouterOsError::Io(e) if e.kind() == std::io::ErrorKind::TimedOut => {
            return FailureClass::Timeout;
        }
        _ => {}
    }

    let message = error.to_string().to_lowercase();
    if DNS_KEYWORDS.iter().any(|k| message.contains(k)) {
        FailureClass::Dns
    } else if AUTH_KEYWORDS.iter().any(|k| message.contains(k)) {
        FailureClass::Auth
    } else {
        FailureClass::Network
    }
}

/// Timeout and retry budget for opening a session
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Bound applied to each attempt
    pub timeout: Duration,
    /// Additional attempts after the first
    pub max_retries: u32,
    pub base_delay: Duration,
    pub classifier: fn(&RouterOsError) -> FailureClass,
}

impl RetryPolicy {
    #[must_use]
    pub fn new(timeout: Duration, max_retries: u32, base_delay: Duration) -> Self {
        Self {
            timeout,
            max_retries,
            base_delay,
            classifier: classify,
        }
    }

    #[must_use]
    pub fn with_classifier(mut self, classifier: fn(&RouterOsError) -> FailureClass) -> Self {
        self.classifier = classifier;
        self
    }

    /// Delay before retry number `attempt + 1`
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.pow(attempt.min(MAX_BACKOFF_EXPONENT));
        self.base_delay.saturating_mul(factor)
    }

    /// Decides what follows a failed attempt (zero-based index)
    #[must_use]
    pub fn after_failure(&self, attempt: u32, class: FailureClass) -> Transition {
        if class.is_retryable() && attempt < self.max_retries {
            Transition::Retry(self.delay_for(attempt))
        } else {
            Transition::GiveUp
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(10), 2, Duration::from_secs(1))
    }
}

/// Outcome of a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Retry(Duration),
    GiveUp,
}

/// States of one `open` call
enum OpenState<S> {
    Attempting { attempt: u32 },
    Retrying { attempt: u32, delay: Duration },
    Succeeded(S),
    FailedTerminal(ConnectionError),
}

/// Opens and closes sessions; holds no per-device state
#[derive(Debug, Clone, Default)]
pub struct ConnectionManager<C> {
    connector: C,
}

impl<C: Connector> ConnectionManager<C> {
    #[must_use]
    pub fn new(connector: C) -> Self {
        Self { connector }
    }

    /// Opens a session to `device` following `policy`
    ///
    /// # Errors
    ///
    /// Returns the typed [`ConnectionError`] of the last attempt.
    pub async fn open(
        &self,
        device: &Device,
        policy: &RetryPolicy,
    ) -> Result<C::Session, ConnectionError> {
        let mut state = OpenState::Attempting { attempt: 0 };
        loop {
            state = match state {
                OpenState::Attempting { attempt } => self.attempt(device, policy, attempt).await,
                OpenState::Retrying { attempt, delay } => {
                    tokio::time::sleep(delay).await;
                    OpenState::Attempting {
                        attempt: attempt + 1,
                    }
                }
                OpenState::Succeeded(session) => return Ok(session),
                OpenState::FailedTerminal(error) => return Err(error),
            };
        }
    }

    async fn attempt(
        &self,
        device: &Device,
        policy: &RetryPolicy,
        attempt: u32,
    ) -> OpenState<C::Session> {
        tracing::info!(
            "Connecting to device '{}' at {} (attempt {}/{})",
            device.name,
            device.api_endpoint(),
            attempt + 1,
            policy.max_retries + 1
        );

        let result = tokio::time::timeout(
            policy.timeout,
            self.connector.connect(device, policy.timeout),
        )
        .await
        .unwrap_or_else(|_| {
            Err(RouterOsError::Timeout(format!(
                "connection attempt exceeded {:?}",
                policy.timeout
            )))
        });

        let error = match result {
            Ok(session) => {
                tracing::debug!("Connected to device '{}'", device.name);
                return OpenState::Succeeded(session);
            }
            Err(e) => e,
        };

        let class = (policy.classifier)(&error);
        match policy.after_failure(attempt, class) {
            Transition::Retry(delay) => {
                tracing::info!(
                    "Attempt {} to '{}' failed ({:?}: {}), retrying in {:?}",
                    attempt + 1,
                    device.name,
                    class,
                    error,
                    delay
                );
                OpenState::Retrying { attempt, delay }
            }
            Transition::GiveUp => {
                tracing::warn!(
                    "Giving up on device '{}' after {} attempt(s): {:?}: {}",
                    device.name,
                    attempt + 1,
                    class,
                    error
                );
                OpenState::FailedTerminal(to_connection_error(device, class, &error, attempt + 1))
            }
        }
    }

    /// Disconnects; failures are logged and never propagated
    pub async fn close(&self, device: &Device, session: C::Session) {
        match session.close().await {
            Ok(()) => tracing::debug!("Disconnected from device '{}'", device.name),
            Err(e) => tracing::warn!("Error disconnecting from device '{}': {}", device.name, e),
        }
    }

    /// Maps a failure that happened on an open session to the connection taxonomy
    #[must_use]
    pub fn classify_session_error(
        &self,
        device: &Device,
        policy: &RetryPolicy,
        error: &RouterOsError,
    ) -> ConnectionError {
        to_connection_error(device, (policy.classifier)(error), error, 1)
    }
}

fn to_connection_error(
    device: &Device,
    class: FailureClass,
    error: &RouterOsError,
    attempts: u32,
) -> ConnectionError {
    match class {
        FailureClass::Timeout => ConnectionError::Timeout {
            address: device.api_endpoint(),
            attempts,
        },
        FailureClass::Dns => ConnectionError::Dns {
            host: device.address.clone(),
            message: match error {
                RouterOsError::Resolve { message, .. } => message.clone(),
                other => other.to_string(),
            },
        },
        FailureClass::Auth => ConnectionError::Auth {
            username: device.username.clone(),
            host: device.address.clone(),
        },
        FailureClass::Network => ConnectionError::Network {
            address: device.api_endpoint(),
            message: error.to_string(),
            attempts,
        },
    }
}
