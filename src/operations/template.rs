// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Closed catalog of configuration templates and their parameter parsing
//!
//! Parsing happens before any session is opened, so a bad request never
//! reaches a device.

use serde_json::Value;
use std::collections::HashMap;
use std::str::FromStr;

use crate::error::OperationError;

/// One supported configuration procedure with its typed parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Template {
    BlockWebsite {
        url: String,
    },
    BandwidthLimit {
        target_ip: String,
        max_upload: String,
        max_download: String,
    },
    PortForward {
        protocol: String,
        external_port: u16,
        internal_ip: String,
        internal_port: u16,
        in_interface: Option<String>,
    },
    Masquerade {
        out_interface: String,
    },
    BasicFirewall {
        wan_interface: String,
    },
    FirewallRule {
        chain: String,
        action: String,
        src_address: Option<String>,
        dst_address: Option<String>,
        protocol: Option<String>,
        dst_port: Option<String>,
        comment: Option<String>,
    },
    CreateBridge {
        name: String,
        ports: Vec<String>,
    },
    CreateVlan {
        name: String,
        vlan_id: u16,
        interface: String,
    },
    DhcpServer {
        interface: String,
        pool_start: String,
        pool_end: String,
        network: String,
        gateway: String,
        dns: Option<String>,
    },
    OspfInstance {
        router_id: String,
        name: String,
        area: String,
    },
    AddUser {
        username: String,
        password: String,
        group: String,
    },
    SetService {
        service: String,
        enabled: bool,
        port: Option<u16>,
    },
    SetIdentity {
        name: String,
    },
    SyncIdentity,
}

/// Read-only view over request parameters
struct Params<'a> {
    template: &'a str,
    values: HashMap<String, String>,
}

impl<'a> Params<'a> {
    /// Flattens JSON scalars to text; `null` counts as absent
    fn new(template: &'a str, raw: &HashMap<String, Value>) -> Result<Self, OperationError> {
        let mut values = HashMap::with_capacity(raw.len());
        for (key, value) in raw {
            let text = match value {
                Value::Null => continue,
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                Value::Array(_) | Value::Object(_) => {
                    return Err(OperationError::Parameter(format!(
                        "Parameter '{key}' for {template} must be a string, number or boolean"
                    )));
                }
            };
            values.insert(key.clone(), text);
        }
        Ok(Self { template, values })
    }

    fn optional(&self, key: &str) -> Option<String> {
        self.values
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    fn required(&self, key: &str) -> Result<String, OperationError> {
        self.optional(key).ok_or_else(|| {
            OperationError::Parameter(format!(
                "Parameter '{key}' is required for {}",
                self.template
            ))
        })
    }

    fn parsed<T: FromStr>(&self, key: &str, raw: &str) -> Result<T, OperationError> {
        raw.parse().map_err(|_| {
            OperationError::Parameter(format!(
                "Parameter '{key}' for {} is invalid: '{raw}'",
                self.template
            ))
        })
    }

    fn port(&self, key: &str) -> Result<Option<u16>, OperationError> {
        match self.optional(key) {
            None => Ok(None),
            Some(raw) => match self.parsed::<u16>(key, &raw)? {
                0 => Err(OperationError::Parameter(format!(
                    "Parameter '{key}' for {} must be a port between 1 and 65535",
                    self.template
                ))),
                port => Ok(Some(port)),
            },
        }
    }

    fn required_port(&self, key: &str) -> Result<u16, OperationError> {
        self.required(key)?;
        self.port(key)?.ok_or_else(|| {
            OperationError::Parameter(format!("Parameter '{key}' is required"))
        })
    }

    fn flag(&self, key: &str, default: bool) -> Result<bool, OperationError> {
        let Some(raw) = self.optional(key) else {
            return Ok(default);
        };
        match raw.to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" | "on" => Ok(true),
            "false" | "no" | "0" | "off" => Ok(false),
            _ => Err(OperationError::Parameter(format!(
                "Parameter '{key}' for {} must be a boolean, got '{raw}'",
                self.template
            ))),
        }
    }
}

impl Template {
    /// Resolves a template name and its parameters
    ///
    /// # Errors
    ///
    /// [`OperationError::UnknownTemplate`] for names outside the catalog,
    /// [`OperationError::Parameter`] for missing or malformed values.
    pub fn parse(name: &str, params: &HashMap<String, Value>) -> Result<Self, OperationError> {
        let p = Params::new(name, params)?;

        let template = match name {
            "block_website" => Self::BlockWebsite {
                url: p.required("url")?,
            },
            "bandwidth_limit" => {
                let max_upload = p.required("max_upload")?;
                Self::BandwidthLimit {
                    target_ip: p.required("target_ip")?,
                    max_download: p.optional("max_download").unwrap_or_else(|| max_upload.clone()),
                    max_upload,
                }
            }
            "port_forward" => {
                let external_port = p.required_port("external_port")?;
                Self::PortForward {
                    protocol: p.required("protocol")?,
                    external_port,
                    internal_ip: p.required("internal_ip")?,
                    internal_port: p.port("internal_port")?.unwrap_or(external_port),
                    in_interface: p.optional("in_interface"),
                }
            }
            "masquerade" => Self::Masquerade {
                out_interface: p.required("out_interface")?,
            },
            "basic_firewall" => Self::BasicFirewall {
                wan_interface: p.required("wan_interface")?,
            },
            "firewall_rule" => Self::FirewallRule {
                chain: p.required("chain")?,
                action: p.required("action")?,
                src_address: p.optional("src_address"),
                dst_address: p.optional("dst_address"),
                protocol: p.optional("protocol"),
                dst_port: p.optional("dst_port"),
                comment: p.optional("comment"),
            },
            "create_bridge" => Self::CreateBridge {
                name: p.required("name")?,
                ports: p
                    .optional("ports")
                    .map(|ports| {
                        ports
                            .split(',')
                            .map(str::trim)
                            .filter(|port| !port.is_empty())
                            .map(str::to_string)
                            .collect()
                    })
                    .unwrap_or_default(),
            },
            "create_vlan" => {
                let raw = p.required("vlan_id")?;
                let vlan_id: u16 = p.parsed("vlan_id", &raw)?;
                if !(1..=4094).contains(&vlan_id) {
                    return Err(OperationError::Parameter(format!(
                        "Parameter 'vlan_id' must be between 1 and 4094, got {vlan_id}"
                    )));
                }
                Self::CreateVlan {
                    name: p.required("name")?,
                    vlan_id,
                    interface: p.required("interface")?,
                }
            }
            "dhcp_server" => Self::DhcpServer {
                interface: p.required("interface")?,
                pool_start: p.required("pool_start")?,
                pool_end: p.required("pool_end")?,
                network: p.required("network")?,
                gateway: p.required("gateway")?,
                dns: p.optional("dns"),
            },
            "ospf_instance" => Self::OspfInstance {
                router_id: p.required("router_id")?,
                name: p.optional("name").unwrap_or_else(|| "default".to_string()),
                area: p.optional("area").unwrap_or_else(|| "0.0.0.0".to_string()),
            },
            "add_user" => Self::AddUser {
                username: p.required("username")?,
                password: p.required("password")?,
                group: p.optional("group").unwrap_or_else(|| "read".to_string()),
            },
            "set_service" => Self::SetService {
                service: p.required("service")?,
                enabled: p.flag("enabled", true)?,
                port: p.port("port")?,
            },
            "set_identity" => Self::SetIdentity {
                name: p.required("name")?,
            },
            "sync_identity" => Self::SyncIdentity,
            other => return Err(OperationError::UnknownTemplate(other.to_string())),
        };
        Ok(template)
    }

    /// Catalog name, as accepted by [`Template::parse`]
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::BlockWebsite { .. } => "block_website",
            Self::BandwidthLimit { .. } => "bandwidth_limit",
            Self::PortForward { .. } => "port_forward",
            Self::Masquerade { .. } => "masquerade",
            Self::BasicFirewall { .. } => "basic_firewall",
            Self::FirewallRule { .. } => "firewall_rule",
            Self::CreateBridge { .. } => "create_bridge",
            Self::CreateVlan { .. } => "create_vlan",
            Self::DhcpServer { .. } => "dhcp_server",
            Self::OspfInstance { .. } => "ospf_instance",
            Self::AddUser { .. } => "add_user",
            Self::SetService { .. } => "set_service",
            Self::SetIdentity { .. } => "set_identity",
            Self::SyncIdentity => "sync_identity",
        }
    }
}
