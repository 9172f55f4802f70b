// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Session and connector abstractions over the RouterOS API
//!
//! A [`Connector`] opens one authenticated [`Session`] per call. Sessions are
//! owned by the code path that opened them and are never shared.

use std::future::Future;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};

use super::connection::{RouterOsConnection, Sentence};
use crate::config::Device;
use crate::error::RouterOsError;

/// An open, authenticated channel to one device
pub trait Session: Send {
    /// Runs one API command, e.g. `/ip/firewall/filter/add` with `=key=value` words
    fn command(
        &mut self,
        path: &str,
        args: &[String],
    ) -> impl Future<Output = Result<Vec<Sentence>, RouterOsError>> + Send;

    /// Disconnects; consumes the session
    fn close(self) -> impl Future<Output = Result<(), RouterOsError>> + Send;
}

/// Opens sessions to devices
pub trait Connector: Send + Sync {
    type Session: Session;

    /// Connects and logs in, applying `timeout` to the transport
    fn connect(
        &self,
        device: &Device,
        timeout: Duration,
    ) -> impl Future<Output = Result<Self::Session, RouterOsError>> + Send;
}

impl<S> Session for RouterOsConnection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn command(
        &mut self,
        path: &str,
        args: &[String],
    ) -> Result<Vec<Sentence>, RouterOsError> {
        RouterOsConnection::command(self, path, args).await
    }

    async fn close(mut self) -> Result<(), RouterOsError> {
        self.quit().await
    }
}

/// Connector for real devices over TCP
#[derive(Debug, Clone, Copy, Default)]
pub struct RouterOsConnector;

impl Connector for RouterOsConnector {
    type Session = RouterOsConnection;

    async fn connect(
        &self,
        device: &Device,
        timeout: Duration,
    ) -> Result<RouterOsConnection, RouterOsError> {
        let mut conn = RouterOsConnection::connect(&device.address, device.api_port, timeout).await?;
        tracing::trace!("Connection established, attempting login");
        conn.login(&device.username, &device.password).await?;
        Ok(conn)
    }
}

/// Formats `=key=value` attribute words
pub(crate) fn attrs(pairs: &[(&str, &str)]) -> Vec<String> {
    pairs.iter().map(|(k, v)| format!("={k}={v}")).collect()
}

/// Formats `?key=value` query words
pub(crate) fn query(pairs: &[(&str, &str)]) -> Vec<String> {
    pairs.iter().map(|(k, v)| format!("?{k}={v}")).collect()
}
