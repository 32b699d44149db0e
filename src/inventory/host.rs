//! Host definition for the Hostrun inventory.

use serde::{Deserialize, Serialize};

/// A uniquely named remote target.
///
/// Hosts are owned exclusively by the [`Inventory`](super::Inventory) host
/// table; groups reference them by name only. Connection details beyond the
/// port live in the [`VariableStore`](crate::vars::VariableStore).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Host {
    /// Unique inventory key (hostname if supplied, else the address)
    pub name: String,

    /// SSH port, kept as a string like the connection variables
    pub port: String,
}

impl Host {
    /// Create a new host.
    pub fn new(name: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            port: port.into(),
        }
    }
}

impl PartialEq for Host {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Host {}

impl std::hash::Hash for Host {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl std::fmt::Display for Host {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.name, self.port)
    }
}
