// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Network-layer and transport-layer reachability probes

use serde::Serialize;
use std::future::Future;
use std::process::Stdio;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::process::Command;

/// Outcome of one probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeResult {
    pub target: String,
    pub success: bool,
    pub reason: String,
}

impl ProbeResult {
    pub fn ok(target: &str, reason: impl Into<String>) -> Self {
        Self {
            target: target.to_string(),
            success: true,
            reason: reason.into(),
        }
    }

    pub fn failed(target: &str, reason: impl Into<String>) -> Self {
        Self {
            target: target.to_string(),
            success: false,
            reason: reason.into(),
        }
    }
}

/// Reachability checks; implementations must respect `timeout`
pub trait Prober: Send + Sync {
    /// Single ICMP echo
    fn ping(&self, host: &str, timeout: Duration) -> impl Future<Output = ProbeResult> + Send;

    /// TCP connect to `host:port`
    fn check_port(
        &self,
        host: &str,
        port: u16,
        timeout: Duration,
    ) -> impl Future<Output = ProbeResult> + Send;
}

/// Probes using the system `ping` binary and plain TCP connects
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProber;

fn ping_command(host: &str, timeout: Duration) -> Command {
    let mut cmd = Command::new("ping");
    if cfg!(windows) {
        let millis = timeout.as_millis().max(1).to_string();
        cmd.args(["-n", "1", "-w", millis.as_str(), host]);
    } else {
        let secs = timeout.as_secs().max(1).to_string();
        cmd.args(["-c", "1", "-W", secs.as_str(), host]);
    }
    cmd.stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true);
    cmd
}

impl Prober for SystemProber {
    async fn ping(&self, host: &str, timeout: Duration) -> ProbeResult {
        let mut cmd = ping_command(host, timeout);
        // ping's own -W is coarse; keep an outer bound so a stuck child is killed
        let bound = timeout + Duration::from_secs(1);
        match tokio::time::timeout(bound, cmd.status()).await {
            Ok(Ok(status)) if status.success() => ProbeResult::ok(host, "Host is reachable"),
            Ok(Ok(_)) | Err(_) => ProbeResult::failed(host, "Host did not respond to ping"),
            Ok(Err(e)) => {
                tracing::error!("Ping error for {}: {}", host, e);
                ProbeResult::failed(host, format!("Ping failed: {e}"))
            }
        }
    }

    async fn check_port(&self, host: &str, port: u16, timeout: Duration) -> ProbeResult {
        let addrs: Vec<_> = match tokio::time::timeout(timeout, tokio::net::lookup_host((host, port))).await
        {
            Ok(Ok(addrs)) => addrs.collect(),
            Ok(Err(_)) | Err(_) => {
                return ProbeResult::failed(host, format!("DNS resolution failed for {host}"));
            }
        };
        if addrs.is_empty() {
            return ProbeResult::failed(host, format!("DNS resolution failed for {host}"));
        }

        match tokio::time::timeout(timeout, TcpStream::connect(&addrs[..])).await {
            Ok(Ok(_)) => ProbeResult::ok(host, format!("Port {port} is open")),
            Ok(Err(_)) => ProbeResult::failed(host, format!("Port {port} is closed or filtered")),
            Err(_) => ProbeResult::failed(host, format!("Connection to port {port} timed out")),
        }
    }
}
