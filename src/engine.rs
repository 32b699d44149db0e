//! The execution-engine seam.
//!
//! This crate prepares inventories and interprets outcome events; the actual
//! remote connection, task templating, and worker orchestration belong to an
//! external collaborator implementing [`ExecutionEngine`]. The trait, its
//! context, and the options that replace the original process-wide options
//! singleton all live here.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::collector::RunEventSink;
use crate::inventory::Inventory;
use crate::vars::VariableStore;

/// File name of the placeholder inventory-source artifact.
///
/// The engine collaborator requires an inventory source file to exist even
/// when all inventory is supplied dynamically. Its content is never parsed
/// or produced by this crate; only its existence matters.
pub const PLACEHOLDER_INVENTORY: &str = "placeholder_hosts";

/// Result type for engine implementations.
pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Errors raised by the engine invocation itself.
///
/// Per-host connectivity and credential failures are not engine errors; they
/// surface as `unreachable`/`failed` entries in the report.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The engine failed to start at the orchestration layer.
    #[error("engine failed to start: {0}")]
    Startup(String),

    /// The engine raised a fatal error mid-run.
    #[error("fatal engine error: {0}")]
    Fatal(String),

    /// IO error inside the engine.
    #[error("engine IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Explicit per-invocation engine configuration.
///
/// Replaces the original's process-wide options singleton: every invocation
/// receives its own value, and nothing is shared mutable state. Defaults
/// mirror the original's option set (5 workers, 10 second timeout, smart
/// connection selection).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineOptions {
    /// Maximum concurrent workers
    #[serde(default = "default_forks")]
    pub forks: usize,

    /// Per-host connection timeout in seconds, forwarded to the engine
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Connection plugin selection
    #[serde(default = "default_connection")]
    pub connection: String,

    /// Remote user override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_user: Option<String>,

    /// Private key file for the connection layer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_key_file: Option<PathBuf>,

    /// Privilege escalation enabled
    #[serde(default)]
    pub become_enabled: bool,

    /// Privilege escalation method
    #[serde(default = "default_become_method")]
    pub become_method: String,
}

fn default_forks() -> usize {
    5
}

fn default_timeout() -> u64 {
    10
}

fn default_connection() -> String {
    "smart".to_string()
}

fn default_become_method() -> String {
    "sudo".to_string()
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            forks: default_forks(),
            timeout_secs: default_timeout(),
            connection: default_connection(),
            remote_user: None,
            private_key_file: None,
            become_enabled: false,
            become_method: default_become_method(),
        }
    }
}

/// Named secrets handed to the engine (connection/become passwords).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Credentials(IndexMap<String, String>);

impl Credentials {
    /// Create an empty credential set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a secret under a name.
    pub fn set(&mut self, name: impl Into<String>, secret: impl Into<String>) {
        self.0.insert(name.into(), secret.into());
    }

    /// Look up a secret.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Whether no secrets are stored.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One action in an ad-hoc task list, forwarded opaquely to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskAction {
    /// Module name (e.g. `command`, `shell`)
    pub module: String,

    /// Opaque module arguments
    #[serde(default)]
    pub args: Value,
}

impl TaskAction {
    /// Create a task action.
    pub fn new(module: impl Into<String>, args: Value) -> Self {
        Self {
            module: module.into(),
            args,
        }
    }
}

/// An ordered inline task list run without a playbook file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskList(Vec<TaskAction>);

impl TaskList {
    /// Create an empty task list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an action.
    pub fn push(&mut self, action: TaskAction) {
        self.0.push(action);
    }

    /// Actions in order.
    pub fn iter(&self) -> impl Iterator<Item = &TaskAction> {
        self.0.iter()
    }

    /// Number of actions.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<TaskAction>> for TaskList {
    fn from(actions: Vec<TaskAction>) -> Self {
        Self(actions)
    }
}

/// Everything an engine invocation needs, borrowed for the duration of one
/// run. The sink is the only shared piece; workers clone the `Arc` and
/// report outcomes through it.
pub struct EngineContext<'a> {
    /// The complete inventory; fully built before the engine is invoked
    pub inventory: &'a Inventory,
    /// Per-host variables with group defaults and extra vars applied
    pub variables: &'a VariableStore,
    /// Target pattern: `"all"`, a group name, or a host name
    pub pattern: &'a str,
    /// Per-invocation configuration
    pub options: &'a EngineOptions,
    /// Connection/become secrets
    pub credentials: &'a Credentials,
    /// Path to the placeholder inventory-source artifact
    pub placeholder_inventory: &'a Path,
    /// Outcome sink; one terminal event per host per task
    pub sink: Arc<dyn RunEventSink>,
}

impl EngineContext<'_> {
    /// Effective variables for one target host.
    pub fn vars_for(&self, host: &str) -> crate::vars::VarMap {
        self.variables
            .resolve(host, self.inventory.groups_of(host))
    }
}

impl std::fmt::Debug for EngineContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineContext")
            .field("pattern", &self.pattern)
            .field("hosts", &self.inventory.host_count())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// External collaborator performing actual remote task/playbook execution.
///
/// Contract: for each host and each task attempted against it, the engine
/// must deliver exactly one terminal event through `ctx.sink`, and must
/// return exactly once (success or engine-level fatal error). Parallelism is
/// bounded by `ctx.options.forks`; per-host timeouts are the engine's
/// concern, configured via `ctx.options.timeout_secs`.
#[async_trait]
pub trait ExecutionEngine: Send + Sync {
    /// Run an inline task list against the hosts selected by `ctx.pattern`.
    async fn run_tasks(&self, ctx: EngineContext<'_>, tasks: &TaskList) -> EngineResult<()>;

    /// Run a playbook reference against the inventory.
    async fn run_playbook(&self, ctx: EngineContext<'_>, playbook: &Path) -> EngineResult<()>;
}

/// Ensure the placeholder inventory-source artifact exists in `dir`.
///
/// Returns the artifact path. The file is created empty when absent and left
/// untouched when present.
pub fn ensure_placeholder_inventory(dir: &Path) -> std::io::Result<PathBuf> {
    let path = dir.join(PLACEHOLDER_INVENTORY);
    if !path.exists() {
        std::fs::write(&path, b"")?;
    }
    Ok(path)
}
