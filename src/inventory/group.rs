//! Group definition for the Hostrun inventory.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A named set of host references sharing group-level variables.
///
/// Membership is stored as host names pointing into the inventory's host
/// table, so a host appearing in several groups is still a single `Host`
/// entry. Insertion order is preserved for deterministic iteration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    /// Group name
    pub name: String,

    /// Group-level variables, used as defaults for member hosts
    #[serde(default)]
    pub vars: IndexMap<String, Value>,

    /// Member host names (non-owning references into the inventory)
    #[serde(default)]
    hosts: IndexSet<String>,
}

impl Group {
    /// Create a new empty group.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vars: IndexMap::new(),
            hosts: IndexSet::new(),
        }
    }

    /// Add a host to this group. Adding the same name twice is a no-op.
    pub fn add_host(&mut self, host: impl Into<String>) {
        self.hosts.insert(host.into());
    }

    /// Check whether a host belongs to this group.
    pub fn has_host(&self, host: &str) -> bool {
        self.hosts.contains(host)
    }

    /// Member host names in insertion order.
    pub fn hosts(&self) -> impl Iterator<Item = &str> {
        self.hosts.iter().map(String::as_str)
    }

    /// Number of member hosts.
    pub fn host_count(&self) -> usize {
        self.hosts.len()
    }

    /// Whether the group has no members.
    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    /// Set a group variable.
    pub fn set_var(&mut self, key: impl Into<String>, value: Value) {
        self.vars.insert(key.into(), value);
    }

    /// Get a group variable.
    pub fn get_var(&self, key: &str) -> Option<&Value> {
        self.vars.get(key)
    }

    /// Merge variables from another source (other takes precedence).
    pub fn merge_vars(&mut self, other: &IndexMap<String, Value>) {
        for (key, value) in other {
            self.vars.insert(key.clone(), value.clone());
        }
    }
}

impl PartialEq for Group {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Group {}

impl std::fmt::Display for Group {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({} hosts)", self.name, self.hosts.len())
    }
}
