//! In-memory inventory construction.
//!
//! The inventory is built once per run from structured caller data, never
//! from an on-disk inventory file. Hosts and groups live in name-keyed
//! tables owned by [`Inventory`]; groups store member names only, so a host
//! appearing under several groups is a single entry referenced by all of
//! them.
//!
//! Construction is single-threaded, deterministic, and idempotent. Per-host
//! validation failures are non-fatal: the offending spec is logged at warn
//! level and skipped, and the build completes with whatever subset
//! validated.

mod group;
mod host;

pub use group::Group;
pub use host::Host;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::spec::{GroupSpec, HostSource, RECOGNIZED_KEYS};
use crate::vars::{names, VariableStore};

/// Pattern that selects every host in the inventory.
pub const ALL_PATTERN: &str = "all";

/// The in-memory collection of hosts and groups for one run.
///
/// Invariant: a host name is unique across the whole inventory. If the same
/// resolved name appears under two groups, both groups reference the same
/// [`Host`] entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Inventory {
    hosts: IndexMap<String, Host>,
    groups: IndexMap<String, Group>,
}

impl Inventory {
    /// Create an empty inventory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an inventory and its variable store from caller-supplied data.
    ///
    /// Group specs are processed in order; within a group, hosts are
    /// processed in order. The first group to introduce a host name wins:
    /// later groups referencing the same name gain membership but never
    /// overwrite the host's variables.
    pub fn build(source: HostSource) -> (Self, VariableStore) {
        let mut inventory = Self::new();
        let mut store = VariableStore::new();
        for spec in source.normalize() {
            inventory.apply_group_spec(&mut store, spec);
        }
        debug!(
            hosts = inventory.host_count(),
            groups = inventory.group_count(),
            "inventory built"
        );
        (inventory, store)
    }

    fn apply_group_spec(&mut self, store: &mut VariableStore, spec: GroupSpec) {
        let GroupSpec { name, hosts, vars } = spec;

        let group = self
            .groups
            .entry(name.clone())
            .or_insert_with(|| Group::new(&name));
        group.merge_vars(&vars);
        store.merge_group_defaults(&name, &vars);

        for host_spec in hosts {
            if let Err(err) = host_spec.validate(&name) {
                warn!(group = %name, hostname = ?host_spec.hostname, %err, "skipping host spec");
                continue;
            }

            let host_name = host_spec.resolved_name().to_string();
            if !self.hosts.contains_key(&host_name) {
                let port = host_spec.resolved_port().to_string();
                self.hosts
                    .insert(host_name.clone(), Host::new(&host_name, &port));
                store.ensure_host(&host_name);
                store.set_host_var(
                    &host_name,
                    names::CONNECT_HOST,
                    Value::String(host_spec.ip.clone()),
                );
                store.set_host_var(&host_name, names::CONNECT_PORT, Value::String(port));
                store.set_host_var(
                    &host_name,
                    names::CONNECT_USER,
                    Value::String(host_spec.resolved_user().to_string()),
                );
                if let Some(password) = &host_spec.password {
                    store.set_host_var(
                        &host_name,
                        names::CONNECT_PASSWORD,
                        Value::String(password.clone()),
                    );
                }
                if let Some(key) = &host_spec.ssh_key {
                    store.set_host_var(
                        &host_name,
                        names::CONNECT_PRIVATE_KEY,
                        Value::String(key.clone()),
                    );
                }
                if let Some(interpreter) = &host_spec.python_interpreter {
                    store.set_host_var(
                        &host_name,
                        names::REMOTE_INTERPRETER,
                        Value::String(interpreter.clone()),
                    );
                }
                for (key, value) in &host_spec.extra {
                    if RECOGNIZED_KEYS.contains(&key.as_str()) {
                        continue;
                    }
                    store.set_host_var(&host_name, key, value.clone());
                }
            }

            if let Some(group) = self.groups.get_mut(&name) {
                group.add_host(&host_name);
            }
        }
    }

    /// Look up a host by name.
    pub fn host(&self, name: &str) -> Option<&Host> {
        self.hosts.get(name)
    }

    /// Look up a group by name.
    pub fn group(&self, name: &str) -> Option<&Group> {
        self.groups.get(name)
    }

    /// All hosts in insertion order.
    pub fn hosts(&self) -> impl Iterator<Item = &Host> {
        self.hosts.values()
    }

    /// All groups in insertion order.
    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.values()
    }

    /// Number of hosts.
    pub fn host_count(&self) -> usize {
        self.hosts.len()
    }

    /// Number of groups.
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Whether the inventory has no hosts.
    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    /// Names of the groups a host belongs to, in group insertion order.
    pub fn groups_of(&self, host: &str) -> Vec<&str> {
        self.groups
            .values()
            .filter(|group| group.has_host(host))
            .map(|group| group.name.as_str())
            .collect()
    }

    /// Resolve a target pattern to hosts.
    ///
    /// `"all"` selects every host; otherwise the pattern is tried as a group
    /// name, then as a host name. Returns `None` when nothing matches (an
    /// empty inventory still matches `"all"` with zero hosts).
    pub fn resolve_pattern(&self, pattern: &str) -> Option<Vec<&Host>> {
        if pattern == ALL_PATTERN {
            return Some(self.hosts.values().collect());
        }
        if let Some(group) = self.groups.get(pattern) {
            return Some(group.hosts().filter_map(|name| self.hosts.get(name)).collect());
        }
        self.hosts.get(pattern).map(|host| vec![host])
    }
}

impl std::fmt::Display for Inventory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "inventory ({} hosts, {} groups)",
            self.hosts.len(),
            self.groups.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{GroupBody, HostSpec};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn grouped(entries: Vec<(&str, GroupBody)>) -> HostSource {
        HostSource::Grouped(
            entries
                .into_iter()
                .map(|(name, body)| (name.to_string(), body))
                .collect(),
        )
    }

    #[test]
    fn test_flat_host_gets_defaults() {
        let (inventory, store) = Inventory::build(vec![HostSpec::new("10.0.0.5")].into());

        let host = inventory.host("10.0.0.5").unwrap();
        assert_eq!(host.port, "22");

        let vars = store.host_vars("10.0.0.5").unwrap();
        assert_eq!(vars.get(names::CONNECT_HOST), Some(&json!("10.0.0.5")));
        assert_eq!(vars.get(names::CONNECT_PORT), Some(&json!("22")));
        assert_eq!(vars.get(names::CONNECT_USER), Some(&json!("root")));
        assert!(inventory.group("default_group").unwrap().has_host("10.0.0.5"));
    }

    #[test]
    fn test_grouped_host_with_credentials() {
        let source = grouped(vec![(
            "G1",
            GroupBody {
                hosts: vec![HostSpec::new("10.0.0.6")
                    .with_port("2222")
                    .with_username("admin")
                    .with_password("x")],
                vars: [("env".to_string(), json!("prod"))].into_iter().collect(),
            },
        )]);

        let (inventory, store) = Inventory::build(source);
        assert_eq!(
            inventory.group("G1").unwrap().get_var("env"),
            Some(&json!("prod"))
        );

        let vars = store.host_vars("10.0.0.6").unwrap();
        assert_eq!(vars.get(names::CONNECT_PORT), Some(&json!("2222")));
        assert_eq!(vars.get(names::CONNECT_USER), Some(&json!("admin")));
        assert_eq!(vars.get(names::CONNECT_PASSWORD), Some(&json!("x")));
        // absent optional fields never produce a variable entry
        assert!(!vars.contains_key(names::CONNECT_PRIVATE_KEY));
        assert!(!vars.contains_key(names::REMOTE_INTERPRETER));
    }

    #[test]
    fn test_host_without_ip_is_skipped_entirely() {
        let (inventory, store) =
            Inventory::build(vec![HostSpec::default().with_hostname("web1")].into());
        assert_eq!(inventory.host_count(), 0);
        assert!(inventory.group("default_group").unwrap().is_empty());
        assert!(!store.has_host("web1"));
    }

    #[test]
    fn test_bad_host_does_not_abort_the_group() {
        let (inventory, _) = Inventory::build(
            vec![
                HostSpec::new("10.0.0.1"),
                HostSpec::default().with_hostname("broken"),
                HostSpec::new("10.0.0.2"),
            ]
            .into(),
        );
        assert_eq!(inventory.host_count(), 2);
        assert!(inventory.host("10.0.0.2").is_some());
    }

    #[test]
    fn test_duplicate_host_across_groups_is_one_entry() {
        let source = grouped(vec![
            (
                "first",
                GroupBody {
                    hosts: vec![HostSpec::new("10.0.0.1")
                        .with_hostname("shared")
                        .with_username("first_user")],
                    vars: IndexMap::new(),
                },
            ),
            (
                "second",
                GroupBody {
                    hosts: vec![HostSpec::new("10.9.9.9")
                        .with_hostname("shared")
                        .with_username("second_user")],
                    vars: IndexMap::new(),
                },
            ),
        ]);

        let (inventory, store) = Inventory::build(source);
        assert_eq!(inventory.host_count(), 1);
        assert!(inventory.group("first").unwrap().has_host("shared"));
        assert!(inventory.group("second").unwrap().has_host("shared"));

        // first-writer-wins: the second spec never overwrites variables
        let vars = store.host_vars("shared").unwrap();
        assert_eq!(vars.get(names::CONNECT_HOST), Some(&json!("10.0.0.1")));
        assert_eq!(vars.get(names::CONNECT_USER), Some(&json!("first_user")));

        assert_eq!(inventory.groups_of("shared"), vec!["first", "second"]);
    }

    #[test]
    fn test_extra_fields_pass_through() {
        let spec: HostSpec = serde_json::from_value(json!({
            "ip": "10.0.0.5",
            "myname": "bankentan",
            "weight": 3
        }))
        .unwrap();

        let (_, store) = Inventory::build(vec![spec].into());
        let vars = store.host_vars("10.0.0.5").unwrap();
        assert_eq!(vars.get("myname"), Some(&json!("bankentan")));
        assert_eq!(vars.get("weight"), Some(&json!(3)));
    }

    #[test]
    fn test_extra_never_shadows_recognized_keys() {
        let mut spec = HostSpec::new("10.0.0.5");
        spec.extra.insert("port".to_string(), json!("9999"));
        spec.extra.insert("site".to_string(), json!("lab"));

        let (_, store) = Inventory::build(vec![spec].into());
        let vars = store.host_vars("10.0.0.5").unwrap();
        assert_eq!(vars.get(names::CONNECT_PORT), Some(&json!("22")));
        assert!(!vars.contains_key("port"));
        assert_eq!(vars.get("site"), Some(&json!("lab")));
    }

    #[test]
    fn test_build_is_deterministic() {
        let source = grouped(vec![
            (
                "web",
                GroupBody {
                    hosts: vec![HostSpec::new("10.0.0.1"), HostSpec::new("10.0.0.2")],
                    vars: [("env".to_string(), json!("prod"))].into_iter().collect(),
                },
            ),
            (
                "db",
                GroupBody {
                    hosts: vec![HostSpec::new("10.0.0.3")],
                    vars: IndexMap::new(),
                },
            ),
        ]);

        let (first_inv, first_store) = Inventory::build(source.clone());
        let (second_inv, second_store) = Inventory::build(source);
        let first_hosts: Vec<_> = first_inv.hosts().map(|h| h.name.clone()).collect();
        let second_hosts: Vec<_> = second_inv.hosts().map(|h| h.name.clone()).collect();
        assert_eq!(first_hosts, second_hosts);
        assert_eq!(first_store, second_store);
        let groups: Vec<_> = first_inv.groups().map(|g| g.name.as_str()).collect();
        assert_eq!(groups, vec!["web", "db"]);
    }

    #[test]
    fn test_pattern_resolution() {
        let source = grouped(vec![(
            "web",
            GroupBody {
                hosts: vec![HostSpec::new("10.0.0.1"), HostSpec::new("10.0.0.2")],
                vars: IndexMap::new(),
            },
        )]);
        let (inventory, _) = Inventory::build(source);

        assert_eq!(inventory.resolve_pattern("all").unwrap().len(), 2);
        assert_eq!(inventory.resolve_pattern("web").unwrap().len(), 2);
        assert_eq!(inventory.resolve_pattern("10.0.0.1").unwrap().len(), 1);
        assert!(inventory.resolve_pattern("nope").is_none());

        // empty inventory still matches "all" with zero hosts
        let empty = Inventory::new();
        assert_eq!(empty.resolve_pattern("all").unwrap().len(), 0);
    }
}
