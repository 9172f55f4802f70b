// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Test doubles: scripted connector, in-memory RouterOS and scripted prober

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

use crate::config::Device;
use crate::error::RouterOsError;
use crate::health::{ProbeResult, Prober};
use crate::routeros::{Connector, Sentence, Session};

pub(crate) fn device(id: u32, address: &str) -> Device {
    Device {
        id,
        name: format!("router-{id}"),
        address: address.to_string(),
        username: "admin".to_string(),
        password: "secret".to_string(),
        api_port: 8728,
        snmp_community: "public".to_string(),
    }
}

fn sentence(pairs: &[(&str, &str)]) -> Sentence {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

/// How a fake device misbehaves on a given menu path
#[derive(Clone)]
pub(crate) enum Fault {
    Trap(String),
    Disconnect,
}

/// In-memory RouterOS: menu path -> items
pub(crate) struct FakeRouter {
    menus: HashMap<String, Vec<Sentence>>,
    next_id: u32,
    faults: Vec<(String, Fault)>,
    pub(crate) runs: Vec<String>,
}

impl Default for FakeRouter {
    fn default() -> Self {
        let mut menus = HashMap::new();
        menus.insert(
            "/system/resource".to_string(),
            vec![sentence(&[
                ("uptime", "1w2d3h4m5s"),
                ("cpu-load", "12"),
                ("total-memory", "268435456"),
                ("free-memory", "134217728"),
                ("total-hdd-space", "134217728"),
                ("free-hdd-space", "100000000"),
                ("version", "7.12 (stable)"),
                ("board-name", "CHR"),
            ])],
        );
        menus.insert(
            "/system/identity".to_string(),
            vec![sentence(&[("name", "MikroTik")])],
        );
        menus.insert(
            "/ip/service".to_string(),
            ["telnet", "ftp", "www", "ssh", "api", "winbox"]
                .iter()
                .enumerate()
                .map(|(i, name)| {
                    let id = format!("*S{i}");
                    sentence(&[(".id", id.as_str()), ("name", *name), ("disabled", "false")])
                })
                .collect(),
        );
        Self {
            menus,
            next_id: 1,
            faults: Vec::new(),
            runs: Vec::new(),
        }
    }
}

impl FakeRouter {
    pub(crate) fn items(&self, menu: &str) -> Vec<Sentence> {
        self.menus.get(menu).cloned().unwrap_or_default()
    }

    pub(crate) fn count(&self, menu: &str) -> usize {
        self.menus.get(menu).map_or(0, Vec::len)
    }

    pub(crate) fn set_resource(&mut self, pairs: &[(&str, &str)]) {
        self.menus
            .insert("/system/resource".to_string(), vec![sentence(pairs)]);
    }

    pub(crate) fn insert(&mut self, menu: &str, pairs: &[(&str, &str)]) {
        let id = format!("*{:X}", self.next_id);
        self.next_id += 1;
        let mut item = sentence(pairs);
        item.insert(".id".to_string(), id);
        self.menus.entry(menu.to_string()).or_default().push(item);
    }

    pub(crate) fn fail_on(&mut self, path_prefix: &str, fault: Fault) {
        self.faults.push((path_prefix.to_string(), fault));
    }

    fn execute(&mut self, path: &str, args: &[String]) -> Result<Vec<Sentence>, RouterOsError> {
        if let Some((_, fault)) = self.faults.iter().find(|(p, _)| path.starts_with(p.as_str())) {
            return Err(match fault {
                Fault::Trap(msg) => RouterOsError::Trap(msg.clone()),
                Fault::Disconnect => RouterOsError::Io(std::io::Error::new(
                    std::io::ErrorKind::ConnectionReset,
                    "connection reset by peer",
                )),
            });
        }

        let mut attrs = Sentence::new();
        let mut filters = Sentence::new();
        for arg in args {
            if let Some(rest) = arg.strip_prefix('=') {
                if let Some((k, v)) = rest.split_once('=') {
                    attrs.insert(k.to_string(), v.to_string());
                }
            } else if let Some(rest) = arg.strip_prefix('?') {
                if let Some((k, v)) = rest.split_once('=') {
                    filters.insert(k.to_string(), v.to_string());
                }
            }
        }

        let (menu, verb) = path
            .rsplit_once('/')
            .ok_or_else(|| RouterOsError::Trap("no such command".to_string()))?;
        let menu = menu.to_string();

        match verb {
            "print" => Ok(self
                .items(&menu)
                .into_iter()
                .filter(|item| filters.iter().all(|(k, v)| item.get(k) == Some(v)))
                .collect()),
            "add" => {
                if let Some(name) = attrs.get("name") {
                    if self
                        .items(&menu)
                        .iter()
                        .any(|item| item.get("name") == Some(name))
                    {
                        return Err(RouterOsError::Trap(
                            "failure: already have such name".to_string(),
                        ));
                    }
                }
                let id = format!("*{:X}", self.next_id);
                self.next_id += 1;
                attrs.insert(".id".to_string(), id.clone());
                self.menus.entry(menu).or_default().push(attrs);
                Ok(vec![sentence(&[("ret", id.as_str())])])
            }
            "set" => {
                let items = self.menus.entry(menu).or_default();
                let target = attrs
                    .remove(".id")
                    .or_else(|| attrs.remove("numbers"));
                let item = match target {
                    Some(t) => items
                        .iter_mut()
                        .find(|item| item.get(".id") == Some(&t) || item.get("name") == Some(&t)),
                    None => {
                        if items.is_empty() {
                            items.push(Sentence::new());
                        }
                        items.first_mut()
                    }
                };
                let item = item.ok_or_else(|| RouterOsError::Trap("no such item".to_string()))?;
                item.extend(attrs);
                Ok(Vec::new())
            }
            "remove" => {
                let id = attrs
                    .get(".id")
                    .cloned()
                    .ok_or_else(|| RouterOsError::Trap("missing .id".to_string()))?;
                let items = self.menus.entry(menu).or_default();
                let before = items.len();
                items.retain(|item| item.get(".id") != Some(&id));
                if items.len() == before {
                    return Err(RouterOsError::Trap("no such item".to_string()));
                }
                Ok(Vec::new())
            }
            "run" => {
                let id = attrs.get(".id").cloned().unwrap_or_default();
                self.runs.push(id);
                Ok(Vec::new())
            }
            _ => Err(RouterOsError::Trap("no such command".to_string())),
        }
    }
}

pub(crate) struct FakeSession {
    router: Arc<Mutex<FakeRouter>>,
    closes: Arc<AtomicUsize>,
    fail_close: bool,
}

impl Session for FakeSession {
    async fn command(
        &mut self,
        path: &str,
        args: &[String],
    ) -> Result<Vec<Sentence>, RouterOsError> {
        let mut router = self.router.lock().unwrap();
        router.execute(path, args)
    }

    async fn close(self) -> Result<(), RouterOsError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        if self.fail_close {
            Err(RouterOsError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "broken pipe",
            )))
        } else {
            Ok(())
        }
    }
}

#[derive(Clone)]
enum Behavior {
    Succeed,
    Fail(fn() -> RouterOsError),
    Hang,
    /// Fails with a network error this many times, then succeeds
    Flaky(u32),
}

struct ConnectorState {
    behavior: Behavior,
    unreachable: HashSet<String>,
    routers: HashMap<String, Arc<Mutex<FakeRouter>>>,
    attempt_times: Vec<Instant>,
    fail_close: bool,
}

/// Connector whose behavior is scripted per test
#[derive(Clone)]
pub(crate) struct FakeConnector {
    state: Arc<Mutex<ConnectorState>>,
    closes: Arc<AtomicUsize>,
}

impl Default for FakeConnector {
    fn default() -> Self {
        Self::with_behavior(Behavior::Succeed)
    }
}

impl FakeConnector {
    fn with_behavior(behavior: Behavior) -> Self {
        Self {
            state: Arc::new(Mutex::new(ConnectorState {
                behavior,
                unreachable: HashSet::new(),
                routers: HashMap::new(),
                attempt_times: Vec::new(),
                fail_close: false,
            })),
            closes: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub(crate) fn failing(make: fn() -> RouterOsError) -> Self {
        Self::with_behavior(Behavior::Fail(make))
    }

    pub(crate) fn hanging() -> Self {
        Self::with_behavior(Behavior::Hang)
    }

    pub(crate) fn flaky(failures: u32) -> Self {
        Self::with_behavior(Behavior::Flaky(failures))
    }

    pub(crate) fn with_failing_close(self) -> Self {
        self.state.lock().unwrap().fail_close = true;
        self
    }

    /// Connections to `address` are refused
    pub(crate) fn unreachable(self, address: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .unreachable
            .insert(address.to_string());
        self
    }

    /// The in-memory router behind `address`
    pub(crate) fn router(&self, address: &str) -> Arc<Mutex<FakeRouter>> {
        self.state
            .lock()
            .unwrap()
            .routers
            .entry(address.to_string())
            .or_default()
            .clone()
    }

    pub(crate) fn attempts(&self) -> usize {
        self.state.lock().unwrap().attempt_times.len()
    }

    pub(crate) fn attempt_times(&self) -> Vec<Instant> {
        self.state.lock().unwrap().attempt_times.clone()
    }

    pub(crate) fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

impl Connector for FakeConnector {
    type Session = FakeSession;

    async fn connect(
        &self,
        device: &Device,
        _timeout: Duration,
    ) -> Result<FakeSession, RouterOsError> {
        let outcome = {
            let mut state = self.state.lock().unwrap();
            state.attempt_times.push(Instant::now());
            if state.unreachable.contains(&device.address) {
                Some(Err(RouterOsError::Io(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    "connection refused",
                ))))
            } else {
                match &mut state.behavior {
                    Behavior::Succeed => None,
                    Behavior::Fail(make) => Some(Err(make())),
                    Behavior::Hang => Some(Ok(())),
                    Behavior::Flaky(remaining) if *remaining > 0 => {
                        *remaining -= 1;
                        Some(Err(RouterOsError::Io(std::io::Error::new(
                            std::io::ErrorKind::ConnectionReset,
                            "connection reset",
                        ))))
                    }
                    Behavior::Flaky(_) => None,
                }
            }
        };

        match outcome {
            Some(Err(e)) => return Err(e),
            Some(Ok(())) => std::future::pending::<()>().await,
            None => {}
        }

        let state = self.state.lock().unwrap();
        let fail_close = state.fail_close;
        drop(state);
        Ok(FakeSession {
            router: self.router(&device.address),
            closes: self.closes.clone(),
            fail_close,
        })
    }
}

/// Prober answering from a fixed set of reachable hosts
#[derive(Clone, Default)]
pub(crate) struct FakeProber {
    reachable: HashSet<String>,
    open_ports: HashSet<(String, u16)>,
    hanging: HashSet<String>,
}

impl FakeProber {
    pub(crate) fn reachable(mut self, host: &str) -> Self {
        self.reachable.insert(host.to_string());
        self
    }

    pub(crate) fn open_port(mut self, host: &str, port: u16) -> Self {
        self.open_ports.insert((host.to_string(), port));
        self
    }

    /// Probes of `host` never answer
    pub(crate) fn hanging(mut self, host: &str) -> Self {
        self.hanging.insert(host.to_string());
        self
    }
}

impl Prober for FakeProber {
    async fn ping(&self, host: &str, _timeout: Duration) -> ProbeResult {
        if self.hanging.contains(host) {
            std::future::pending::<()>().await;
        }
        if self.reachable.contains(host) {
            ProbeResult::ok(host, "Host is reachable")
        } else {
            ProbeResult::failed(host, "Host did not respond to ping")
        }
    }

    async fn check_port(&self, host: &str, port: u16, _timeout: Duration) -> ProbeResult {
        if self.open_ports.contains(&(host.to_string(), port)) {
            ProbeResult::ok(host, format!("Port {port} is open"))
        } else {
            ProbeResult::failed(host, format!("Port {port} is closed or filtered"))
        }
    }
}
