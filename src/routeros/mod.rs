//! `RouterOS` API client module
//!
//! This module provides the wire protocol, authentication, the
//! [`Connector`]/[`Session`] seams and the [`ConnectionManager`] that opens
//! sessions with bounded retries.

mod connection;
mod manager;
mod session;
mod types;

// Re-export public types and functions
pub use connection::{RouterOsConnection, Sentence, encode_length};
pub use manager::{ConnectionManager, FailureClass, RetryPolicy, Transition, classify};
pub use session::{Connector, RouterOsConnector, Session};
pub use types::SystemResource;

pub(crate) use session::{attrs, query};
pub(crate) use types::parse_system;

#[cfg(test)]
pub(crate) use connection::wire;
