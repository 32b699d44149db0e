//! Per-host variable storage for one run.
//!
//! The [`VariableStore`] is built alongside the inventory and handed to the
//! execution engine. It keeps three layers: group-scoped defaults, per-host
//! variables, and an extra-vars overlay merged in by the coordinator.
//! Resolution applies them in that order, so host variables override group
//! defaults and extra vars override everything.

use indexmap::IndexMap;
use serde_json::Value;

/// Names of the connection variables the inventory builder writes.
pub mod names {
    /// Address the engine should connect to.
    pub const CONNECT_HOST: &str = "connect_host";
    /// Port to connect on.
    pub const CONNECT_PORT: &str = "connect_port";
    /// Remote user.
    pub const CONNECT_USER: &str = "connect_user";
    /// Connection password, set only when the spec supplied one.
    pub const CONNECT_PASSWORD: &str = "connect_password";
    /// Private key, set only when the spec supplied one.
    pub const CONNECT_PRIVATE_KEY: &str = "connect_private_key";
    /// Remote interpreter path, set only when the spec supplied one.
    pub const REMOTE_INTERPRETER: &str = "remote_interpreter";
}

/// Variable bag type used throughout the store.
pub type VarMap = IndexMap<String, Value>;

/// Per-host key/value variable store, created once per build and discarded
/// at the end of the run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariableStore {
    host_vars: IndexMap<String, VarMap>,
    group_defaults: IndexMap<String, VarMap>,
    extra_vars: VarMap,
}

impl VariableStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensure a variable bag exists for the host.
    pub(crate) fn ensure_host(&mut self, host: &str) {
        self.host_vars.entry(host.to_string()).or_default();
    }

    /// Whether the store tracks the given host.
    pub fn has_host(&self, host: &str) -> bool {
        self.host_vars.contains_key(host)
    }

    /// Set a variable on a host.
    pub fn set_host_var(&mut self, host: &str, key: impl Into<String>, value: Value) {
        self.host_vars
            .entry(host.to_string())
            .or_default()
            .insert(key.into(), value);
    }

    /// Raw per-host variables, without group defaults or extra vars applied.
    pub fn host_vars(&self, host: &str) -> Option<&VarMap> {
        self.host_vars.get(host)
    }

    /// Record group-level variables as defaults for the group's members.
    /// Later writes for the same group merge over earlier ones.
    pub fn merge_group_defaults(&mut self, group: &str, vars: &VarMap) {
        let defaults = self.group_defaults.entry(group.to_string()).or_default();
        for (key, value) in vars {
            defaults.insert(key.clone(), value.clone());
        }
    }

    /// Group-scoped defaults recorded for a group.
    pub fn group_defaults(&self, group: &str) -> Option<&VarMap> {
        self.group_defaults.get(group)
    }

    /// Replace the extra-vars overlay for a new invocation. Extra vars are
    /// scoped to a single run and win over host and group variables at
    /// resolution time; an overlay set for one run never leaks into the
    /// next.
    pub fn set_extra_vars(&mut self, vars: VarMap) {
        self.extra_vars = vars;
    }

    /// The current extra-vars overlay.
    pub fn extra_vars(&self) -> &VarMap {
        &self.extra_vars
    }

    /// Effective variables for a host: defaults of the given groups in
    /// order, then the host's own variables, then the extra-vars overlay.
    pub fn resolve<'a>(&self, host: &str, groups: impl IntoIterator<Item = &'a str>) -> VarMap {
        let mut resolved = VarMap::new();
        for group in groups {
            if let Some(defaults) = self.group_defaults.get(group) {
                for (key, value) in defaults {
                    resolved.insert(key.clone(), value.clone());
                }
            }
        }
        if let Some(vars) = self.host_vars.get(host) {
            for (key, value) in vars {
                resolved.insert(key.clone(), value.clone());
            }
        }
        for (key, value) in &self.extra_vars {
            resolved.insert(key.clone(), value.clone());
        }
        resolved
    }

    /// Number of hosts tracked by the store.
    pub fn host_count(&self) -> usize {
        self.host_vars.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_host_vars_roundtrip() {
        let mut store = VariableStore::new();
        store.set_host_var("web1", names::CONNECT_HOST, json!("10.0.0.1"));
        assert!(store.has_host("web1"));
        assert_eq!(
            store.host_vars("web1").unwrap().get(names::CONNECT_HOST),
            Some(&json!("10.0.0.1"))
        );
        assert!(store.host_vars("web2").is_none());
    }

    #[test]
    fn test_resolution_precedence() {
        let mut store = VariableStore::new();

        let mut group_vars = VarMap::new();
        group_vars.insert("env".to_string(), json!("prod"));
        group_vars.insert("region".to_string(), json!("eu"));
        store.merge_group_defaults("web", &group_vars);

        store.set_host_var("web1", "env", json!("canary"));

        let mut extra = VarMap::new();
        extra.insert("region".to_string(), json!("us"));
        store.set_extra_vars(extra);

        let resolved = store.resolve("web1", ["web"]);
        // host var beats group default, extra var beats both
        assert_eq!(resolved.get("env"), Some(&json!("canary")));
        assert_eq!(resolved.get("region"), Some(&json!("us")));
    }

    #[test]
    fn test_extra_vars_overlay_is_replaced_not_accumulated() {
        let mut store = VariableStore::new();
        let mut first = VarMap::new();
        first.insert("deploy_tag".to_string(), json!("v1"));
        store.set_extra_vars(first);
        assert_eq!(store.extra_vars().get("deploy_tag"), Some(&json!("v1")));

        store.set_extra_vars(VarMap::new());
        assert!(store.extra_vars().is_empty());
        assert!(store.resolve("web1", std::iter::empty()).is_empty());
    }

    #[test]
    fn test_group_defaults_merge_later_wins() {
        let mut store = VariableStore::new();
        let mut first = VarMap::new();
        first.insert("env".to_string(), json!("staging"));
        store.merge_group_defaults("web", &first);

        let mut second = VarMap::new();
        second.insert("env".to_string(), json!("prod"));
        store.merge_group_defaults("web", &second);

        assert_eq!(
            store.group_defaults("web").unwrap().get("env"),
            Some(&json!("prod"))
        );
    }
}
