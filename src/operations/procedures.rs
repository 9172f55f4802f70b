// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Device-side procedures for each template
//!
//! Objects that may already exist are looked up before creation; plain rule
//! additions are additive and create a new rule on every call.

use super::template::Template;
use crate::error::{OperationError, RouterOsError};
use crate::routeros::{Sentence, Session, attrs, query};

const LAYER7: &str = "/ip/firewall/layer7-protocol";
const FILTER: &str = "/ip/firewall/filter";
const NAT: &str = "/ip/firewall/nat";

/// What a procedure achieved
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Applied {
    pub detail: String,
    /// New display name, for the identity templates
    pub identity: Option<String>,
}

impl Applied {
    fn detail(detail: String) -> Self {
        Self {
            detail,
            identity: None,
        }
    }
}

fn state(created: bool) -> &'static str {
    if created { "created" } else { "already present" }
}

/// First item of `menu` matching all `filter` pairs
pub(super) async fn find<S: Session>(
    session: &mut S,
    menu: &str,
    filter: &[(&str, &str)],
) -> Result<Option<Sentence>, RouterOsError> {
    let mut items = session
        .command(&format!("{menu}/print"), &query(filter))
        .await?;
    if items.is_empty() {
        Ok(None)
    } else {
        Ok(Some(items.swap_remove(0)))
    }
}

pub(super) async fn add<S: Session>(
    session: &mut S,
    menu: &str,
    fields: &[(&str, &str)],
) -> Result<(), RouterOsError> {
    session
        .command(&format!("{menu}/add"), &attrs(fields))
        .await?;
    Ok(())
}

/// Adds `fields` unless an item matching `filter` exists; returns whether it was created
async fn ensure<S: Session>(
    session: &mut S,
    menu: &str,
    filter: &[(&str, &str)],
    fields: &[(&str, &str)],
) -> Result<bool, RouterOsError> {
    if find(session, menu, filter).await?.is_some() {
        tracing::debug!("{} already has {:?}, skipping", menu, filter);
        return Ok(false);
    }
    add(session, menu, fields).await?;
    Ok(true)
}

fn item_id(item: &Sentence, fallback: &str) -> String {
    item.get(".id")
        .cloned()
        .unwrap_or_else(|| fallback.to_string())
}

/// Runs `template` on an open session
pub(super) async fn apply<S: Session>(
    session: &mut S,
    template: &Template,
) -> Result<Applied, OperationError> {
    match template {
        Template::BlockWebsite { url } => block_website(session, url).await,
        Template::BandwidthLimit {
            target_ip,
            max_upload,
            max_download,
        } => bandwidth_limit(session, target_ip, max_upload, max_download).await,
        Template::PortForward {
            protocol,
            external_port,
            internal_ip,
            internal_port,
            in_interface,
        } => {
            let ext = external_port.to_string();
            let int = internal_port.to_string();
            let comment =
                format!("Port forward {protocol}/{external_port} to {internal_ip}:{internal_port}");
            let mut fields = vec![
                ("chain", "dstnat"),
                ("action", "dst-nat"),
                ("protocol", protocol.as_str()),
                ("dst-port", ext.as_str()),
                ("to-addresses", internal_ip.as_str()),
                ("to-ports", int.as_str()),
                ("comment", comment.as_str()),
            ];
            if let Some(iface) = in_interface {
                fields.push(("in-interface", iface.as_str()));
            }
            add(session, NAT, &fields).await?;
            Ok(Applied::detail(format!(
                "Forwarded {protocol} port {external_port} to {internal_ip}:{internal_port}"
            )))
        }
        Template::Masquerade { out_interface } => {
            let rule = [
                ("chain", "srcnat"),
                ("action", "masquerade"),
                ("out-interface", out_interface.as_str()),
            ];
            let created = ensure(session, NAT, &rule, &rule).await?;
            Ok(Applied::detail(format!(
                "Masquerade on {out_interface} {}",
                state(created)
            )))
        }
        Template::BasicFirewall { wan_interface } => basic_firewall(session, wan_interface).await,
        Template::FirewallRule {
            chain,
            action,
            src_address,
            dst_address,
            protocol,
            dst_port,
            comment,
        } => {
            let mut fields = vec![("chain", chain.as_str()), ("action", action.as_str())];
            for (key, value) in [
                ("src-address", src_address),
                ("dst-address", dst_address),
                ("protocol", protocol),
                ("dst-port", dst_port),
                ("comment", comment),
            ] {
                if let Some(value) = value {
                    fields.push((key, value.as_str()));
                }
            }
            add(session, FILTER, &fields).await?;
            Ok(Applied::detail(format!("Added {action} rule to {chain} chain")))
        }
        Template::CreateBridge { name, ports } => {
            let created = ensure(
                session,
                "/interface/bridge",
                &[("name", name.as_str())],
                &[("name", name.as_str())],
            )
            .await?;
            let mut attached = 0;
            for port in ports {
                let binding = [("bridge", name.as_str()), ("interface", port.as_str())];
                if ensure(session, "/interface/bridge/port", &binding, &binding).await? {
                    attached += 1;
                }
            }
            Ok(Applied::detail(format!(
                "Bridge {name} {}; {attached} of {} port(s) newly attached",
                state(created),
                ports.len()
            )))
        }
        Template::CreateVlan {
            name,
            vlan_id,
            interface,
        } => {
            let id = vlan_id.to_string();
            let created = ensure(
                session,
                "/interface/vlan",
                &[("name", name.as_str())],
                &[
                    ("name", name.as_str()),
                    ("vlan-id", id.as_str()),
                    ("interface", interface.as_str()),
                ],
            )
            .await?;
            Ok(Applied::detail(format!(
                "VLAN {vlan_id} ({name}) on {interface} {}",
                state(created)
            )))
        }
        Template::DhcpServer {
            interface,
            pool_start,
            pool_end,
            network,
            gateway,
            dns,
        } => {
            dhcp_server(
                session, interface, pool_start, pool_end, network, gateway, dns.as_deref(),
            )
            .await
        }
        Template::OspfInstance {
            router_id,
            name,
            area,
        } => {
            let instance_created = ensure(
                session,
                "/routing/ospf/instance",
                &[("name", name.as_str())],
                &[("name", name.as_str()), ("router-id", router_id.as_str())],
            )
            .await?;
            let area_name = format!("{name}-{area}");
            let area_created = ensure(
                session,
                "/routing/ospf/area",
                &[("instance", name.as_str()), ("area-id", area.as_str())],
                &[
                    ("name", area_name.as_str()),
                    ("instance", name.as_str()),
                    ("area-id", area.as_str()),
                ],
            )
            .await?;
            Ok(Applied::detail(format!(
                "OSPF instance {name} (router-id {router_id}) {}; area {area} {}",
                state(instance_created),
                state(area_created)
            )))
        }
        Template::AddUser {
            username,
            password,
            group,
        } => {
            let created = ensure(
                session,
                "/user",
                &[("name", username.as_str())],
                &[
                    ("name", username.as_str()),
                    ("password", password.as_str()),
                    ("group", group.as_str()),
                ],
            )
            .await?;
            Ok(Applied::detail(format!(
                "User {username} in group {group} {}",
                state(created)
            )))
        }
        Template::SetService {
            service,
            enabled,
            port,
        } => set_service(session, service, *enabled, *port).await,
        Template::SetIdentity { name } => {
            session
                .command("/system/identity/set", &attrs(&[("name", name.as_str())]))
                .await?;
            Ok(Applied {
                detail: format!("Identity set to {name}"),
                identity: Some(name.clone()),
            })
        }
        Template::SyncIdentity => {
            let name = find(session, "/system/identity", &[])
                .await?
                .and_then(|item| item.get("name").cloned())
                .ok_or_else(|| {
                    OperationError::DeviceRejected("device did not report an identity".to_string())
                })?;
            Ok(Applied {
                detail: format!("Identity synced: {name}"),
                identity: Some(name),
            })
        }
    }
}

async fn block_website<S: Session>(session: &mut S, url: &str) -> Result<Applied, OperationError> {
    let classifier = format!("block_{url}");
    let regexp = format!("^{url}.*$");
    let created = ensure(
        session,
        LAYER7,
        &[("name", classifier.as_str())],
        &[("name", classifier.as_str()), ("regexp", regexp.as_str())],
    )
    .await?;

    let comment = format!("Blocked by fleet: {url}");
    add(
        session,
        FILTER,
        &[
            ("chain", "forward"),
            ("action", "drop"),
            ("layer7-protocol", classifier.as_str()),
            ("comment", comment.as_str()),
        ],
    )
    .await?;

    Ok(Applied::detail(format!(
        "Blocked access to {url} (L7 classifier {classifier} {}, drop rule added)",
        state(created)
    )))
}

async fn bandwidth_limit<S: Session>(
    session: &mut S,
    target_ip: &str,
    max_upload: &str,
    max_download: &str,
) -> Result<Applied, OperationError> {
    let name = format!("limit_{target_ip}");
    let target = format!("{target_ip}/32");
    let max_limit = format!("{max_upload}/{max_download}");

    let verb = match find(session, "/queue/simple", &[("name", name.as_str())]).await? {
        Some(existing) => {
            let id = item_id(&existing, &name);
            session
                .command(
                    "/queue/simple/set",
                    &attrs(&[
                        (".id", id.as_str()),
                        ("target", target.as_str()),
                        ("max-limit", max_limit.as_str()),
                    ]),
                )
                .await?;
            "updated"
        }
        None => {
            add(
                session,
                "/queue/simple",
                &[
                    ("name", name.as_str()),
                    ("target", target.as_str()),
                    ("max-limit", max_limit.as_str()),
                ],
            )
            .await?;
            "created"
        }
    };

    Ok(Applied::detail(format!(
        "Limited {target_ip} to {max_upload} upload / {max_download} download (queue {name} {verb})"
    )))
}

async fn basic_firewall<S: Session>(
    session: &mut S,
    wan_interface: &str,
) -> Result<Applied, OperationError> {
    let drop_new = format!("basic_firewall: drop new from {wan_interface}");
    let rules = [
        (
            "basic_firewall: accept established",
            vec![
                ("chain", "input"),
                ("action", "accept"),
                ("connection-state", "established,related"),
            ],
        ),
        (
            "basic_firewall: drop invalid",
            vec![
                ("chain", "input"),
                ("action", "drop"),
                ("connection-state", "invalid"),
            ],
        ),
        (
            drop_new.as_str(),
            vec![
                ("chain", "input"),
                ("action", "drop"),
                ("connection-state", "new"),
                ("in-interface", wan_interface),
            ],
        ),
    ];

    let total = rules.len();
    let mut added = 0;
    for (comment, mut fields) in rules {
        fields.push(("comment", comment));
        if ensure(session, FILTER, &[("comment", comment)], &fields).await? {
            added += 1;
        }
    }

    Ok(Applied::detail(format!(
        "Basic firewall for {wan_interface}: {added} rule(s) added, {} already present",
        total - added
    )))
}

#[allow(clippy::too_many_arguments)]
async fn dhcp_server<S: Session>(
    session: &mut S,
    interface: &str,
    pool_start: &str,
    pool_end: &str,
    network: &str,
    gateway: &str,
    dns: Option<&str>,
) -> Result<Applied, OperationError> {
    let pool = format!("dhcp_{interface}");
    let ranges = format!("{pool_start}-{pool_end}");

    let pool_created = ensure(
        session,
        "/ip/pool",
        &[("name", pool.as_str())],
        &[("name", pool.as_str()), ("ranges", ranges.as_str())],
    )
    .await?;
    let server_created = ensure(
        session,
        "/ip/dhcp-server",
        &[("name", pool.as_str())],
        &[
            ("name", pool.as_str()),
            ("interface", interface),
            ("address-pool", pool.as_str()),
            ("disabled", "no"),
        ],
    )
    .await?;

    let mut network_fields = vec![("address", network), ("gateway", gateway)];
    if let Some(dns) = dns {
        network_fields.push(("dns-server", dns));
    }
    let network_created = ensure(
        session,
        "/ip/dhcp-server/network",
        &[("address", network)],
        &network_fields,
    )
    .await?;

    Ok(Applied::detail(format!(
        "DHCP on {interface} serving {ranges} via {gateway} (pool {}, server {}, network {})",
        state(pool_created),
        state(server_created),
        state(network_created)
    )))
}

async fn set_service<S: Session>(
    session: &mut S,
    service: &str,
    enabled: bool,
    port: Option<u16>,
) -> Result<Applied, OperationError> {
    let existing = find(session, "/ip/service", &[("name", service)])
        .await?
        .ok_or_else(|| OperationError::DeviceRejected(format!("no such service: {service}")))?;
    let id = item_id(&existing, service);
    let port_value = port.map(|p| p.to_string());

    let mut fields = vec![
        (".id", id.as_str()),
        ("disabled", if enabled { "no" } else { "yes" }),
    ];
    if let Some(port) = &port_value {
        fields.push(("port", port.as_str()));
    }
    session.command("/ip/service/set", &attrs(&fields)).await?;

    Ok(Applied::detail(format!(
        "Service {service} {}{}",
        if enabled { "enabled" } else { "disabled" },
        port.map(|p| format!(" on port {p}")).unwrap_or_default()
    )))
}
