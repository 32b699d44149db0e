//! Caller-supplied host and group specifications.
//!
//! This module defines the raw input shapes accepted by the inventory
//! builder and the normalizer that turns them into a canonical ordered
//! sequence of group specifications. Input typically arrives as JSON from a
//! database or API rather than from an inventory file, so everything here
//! derives serde and tolerates missing optional fields.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// Group name used when a flat host list is supplied without grouping.
pub const DEFAULT_GROUP: &str = "default_group";

/// Default SSH port, kept as a string like the rest of the connection vars.
pub const DEFAULT_PORT: &str = "22";

/// Default remote user when a spec does not name one.
pub const DEFAULT_USER: &str = "root";

/// Field names consumed by the builder; everything else passes through as a
/// host variable.
pub const RECOGNIZED_KEYS: [&str; 7] = [
    "ip",
    "hostname",
    "port",
    "username",
    "password",
    "ssh_key",
    "python_interpreter",
];

/// Specification for a single target host.
///
/// `ip` is the only required field; validation is deferred to the inventory
/// builder so that one bad record never aborts deserialization of the rest.
/// Unrecognized fields are captured in `extra` and copied through verbatim
/// as host variables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostSpec {
    /// Address to connect to (required by the builder)
    #[serde(default)]
    pub ip: String,

    /// Inventory name for the host; falls back to `ip`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,

    /// SSH port; falls back to `"22"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,

    /// Remote user; falls back to `"root"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Connection password
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Private key path or material
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_key: Option<String>,

    /// Interpreter path on the remote host
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub python_interpreter: Option<String>,

    /// Pass-through custom variables
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl HostSpec {
    /// Create a spec for the given address.
    pub fn new(ip: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            ..Self::default()
        }
    }

    /// Set the inventory hostname.
    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    /// Set the SSH port.
    pub fn with_port(mut self, port: impl Into<String>) -> Self {
        self.port = Some(port.into());
        self
    }

    /// Set the remote user.
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set the connection password.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Set the private key.
    pub fn with_ssh_key(mut self, key: impl Into<String>) -> Self {
        self.ssh_key = Some(key.into());
        self
    }

    /// Add a pass-through custom variable.
    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// The host's unique inventory key: `hostname` if present, else `ip`.
    pub fn resolved_name(&self) -> &str {
        self.hostname.as_deref().unwrap_or(&self.ip)
    }

    /// The port to record for the host, defaulting to `"22"`.
    pub fn resolved_port(&self) -> &str {
        self.port.as_deref().unwrap_or(DEFAULT_PORT)
    }

    /// The user for the `connect_user` variable, defaulting to `"root"`.
    /// Never mutates the spec itself.
    pub fn resolved_user(&self) -> &str {
        self.username.as_deref().unwrap_or(DEFAULT_USER)
    }

    /// Validate the spec in the context of the named group.
    pub fn validate(&self, group: &str) -> Result<()> {
        if self.ip.trim().is_empty() {
            return Err(Error::invalid_host_spec(
                group,
                "missing required field 'ip'",
            ));
        }
        Ok(())
    }
}

/// Body of a group entry in the grouped input shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupBody {
    /// Hosts in this group, in caller order
    #[serde(default)]
    pub hosts: Vec<HostSpec>,

    /// Group-level variables
    #[serde(default)]
    pub vars: IndexMap<String, Value>,
}

/// A normalized group specification consumed by the inventory builder.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSpec {
    /// Group name
    pub name: String,
    /// Hosts in caller order
    pub hosts: Vec<HostSpec>,
    /// Group-level variables
    pub vars: IndexMap<String, Value>,
}

impl GroupSpec {
    /// Create a group spec with no hosts or vars.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hosts: Vec::new(),
            vars: IndexMap::new(),
        }
    }
}

/// The two accepted input shapes for inventory construction.
///
/// Deserializes untagged, so callers can hand over either a JSON array of
/// host records or a JSON object mapping group names to `{hosts, vars}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HostSource {
    /// A flat ordered host list, wrapped as a single `default_group`
    Flat(Vec<HostSpec>),
    /// A mapping from group name to group body, in caller order
    Grouped(IndexMap<String, GroupBody>),
}

impl HostSource {
    /// Parse a source from a JSON string.
    pub fn from_json(input: &str) -> Result<Self> {
        Ok(serde_json::from_str(input)?)
    }

    /// Normalize into an ordered sequence of group specs.
    ///
    /// A flat list becomes one group named [`DEFAULT_GROUP`] with no group
    /// vars. A mapping yields one spec per key in insertion order. No
    /// per-host validation happens here; that is the builder's job.
    pub fn normalize(self) -> Vec<GroupSpec> {
        match self {
            HostSource::Flat(hosts) => vec![GroupSpec {
                name: DEFAULT_GROUP.to_string(),
                hosts,
                vars: IndexMap::new(),
            }],
            HostSource::Grouped(groups) => groups
                .into_iter()
                .map(|(name, body)| GroupSpec {
                    name,
                    hosts: body.hosts,
                    vars: body.vars,
                })
                .collect(),
        }
    }
}

impl Default for HostSource {
    fn default() -> Self {
        HostSource::Flat(Vec::new())
    }
}

impl From<Vec<HostSpec>> for HostSource {
    fn from(hosts: Vec<HostSpec>) -> Self {
        HostSource::Flat(hosts)
    }
}
