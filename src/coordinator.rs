//! Run coordination: inventory construction, engine invocation, and report
//! assembly.
//!
//! The coordinator owns the engine and the raw host source. The inventory is
//! built on first use and reused by later runs. Every invocation gets a
//! fresh [`ResultCollector`] and a scratch directory holding the placeholder
//! inventory artifact; the scratch directory is a scoped acquisition,
//! released on every exit path including engine failure.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;
use tracing::{debug, info};

use crate::collector::{ResultCollector, RunReport};
use crate::engine::{
    ensure_placeholder_inventory, Credentials, EngineContext, EngineOptions, ExecutionEngine,
    TaskList,
};
use crate::error::{Error, Result};
use crate::inventory::{Inventory, ALL_PATTERN};
use crate::spec::HostSource;
use crate::vars::{VarMap, VariableStore};

/// Scratch resources for one engine invocation. Dropping the guard removes
/// the directory and the placeholder artifact inside it.
struct RunScratch {
    _dir: TempDir,
    placeholder: PathBuf,
}

impl RunScratch {
    fn acquire() -> Result<Self> {
        let dir = TempDir::new()?;
        let placeholder = ensure_placeholder_inventory(dir.path())?;
        debug!(path = %placeholder.display(), "scratch directory acquired");
        Ok(Self {
            _dir: dir,
            placeholder,
        })
    }
}

/// Composes the inventory builder, the execution engine, and the result
/// collector into the two run operations.
pub struct RunCoordinator<E> {
    engine: E,
    source: Option<HostSource>,
    options: EngineOptions,
    credentials: Credentials,
    built: Option<(Inventory, VariableStore)>,
}

impl<E: ExecutionEngine> RunCoordinator<E> {
    /// Create a coordinator for the given engine and host source.
    pub fn new(engine: E, source: HostSource) -> Self {
        Self {
            engine,
            source: Some(source),
            options: EngineOptions::default(),
            credentials: Credentials::new(),
            built: None,
        }
    }

    /// Replace the default engine options.
    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    /// Supply connection/become secrets.
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    /// The inventory, building it from the source on first call.
    pub fn inventory(&mut self) -> &Inventory {
        &self.ensure_built().0
    }

    /// The variable store, building the inventory on first call.
    pub fn variables(&mut self) -> &VariableStore {
        &self.ensure_built().1
    }

    fn ensure_built(&mut self) -> &mut (Inventory, VariableStore) {
        build_slot(&mut self.built, &mut self.source)
    }

    /// Run an inline task list against the hosts selected by `pattern`.
    ///
    /// Builds the inventory if needed, applies `extra_vars` as the variable
    /// overlay for this invocation only, attaches a fresh collector, and
    /// invokes the engine. On engine failure the partial report accumulated
    /// so far is returned inside [`Error::EngineInvocation`] rather than
    /// discarded.
    pub async fn run_ad_hoc(
        &mut self,
        pattern: &str,
        tasks: &TaskList,
        extra_vars: Option<VarMap>,
    ) -> Result<RunReport> {
        let (inventory, variables) = prepare(
            build_slot(&mut self.built, &mut self.source),
            extra_vars,
        );

        if inventory.resolve_pattern(pattern).is_none() {
            return Err(Error::UnknownPattern(pattern.to_string()));
        }

        info!(pattern, tasks = tasks.len(), "starting ad-hoc run");
        let collector = Arc::new(ResultCollector::new());
        let scratch = RunScratch::acquire()?;
        let outcome = self
            .engine
            .run_tasks(
                EngineContext {
                    inventory,
                    variables,
                    pattern,
                    options: &self.options,
                    credentials: &self.credentials,
                    placeholder_inventory: &scratch.placeholder,
                    sink: collector.clone(),
                },
                tasks,
            )
            .await;

        finish(collector, outcome)
    }

    /// Run a playbook reference against the inventory.
    ///
    /// Same contract as [`run_ad_hoc`](Self::run_ad_hoc), including the
    /// per-invocation extra-vars overlay; the playbook itself selects
    /// hosts, so the engine receives the `all` pattern.
    pub async fn run_playbook(
        &mut self,
        playbook: &Path,
        extra_vars: Option<VarMap>,
    ) -> Result<RunReport> {
        let (inventory, variables) = prepare(
            build_slot(&mut self.built, &mut self.source),
            extra_vars,
        );

        info!(playbook = %playbook.display(), "starting playbook run");
        let collector = Arc::new(ResultCollector::new());
        let scratch = RunScratch::acquire()?;
        let outcome = self
            .engine
            .run_playbook(
                EngineContext {
                    inventory,
                    variables,
                    pattern: ALL_PATTERN,
                    options: &self.options,
                    credentials: &self.credentials,
                    placeholder_inventory: &scratch.placeholder,
                    sink: collector.clone(),
                },
                playbook,
            )
            .await;

        finish(collector, outcome)
    }
}

fn build_slot<'a>(
    built: &'a mut Option<(Inventory, VariableStore)>,
    source: &mut Option<HostSource>,
) -> &'a mut (Inventory, VariableStore) {
    built.get_or_insert_with(|| Inventory::build(source.take().unwrap_or_default()))
}

fn prepare(
    built: &mut (Inventory, VariableStore),
    extra_vars: Option<VarMap>,
) -> (&Inventory, &VariableStore) {
    let (inventory, variables) = built;
    // the overlay is scoped to one invocation; a run without extra vars
    // starts from an empty overlay
    variables.set_extra_vars(extra_vars.unwrap_or_default());
    (inventory, variables)
}

fn finish(
    collector: Arc<ResultCollector>,
    outcome: crate::engine::EngineResult<()>,
) -> Result<RunReport> {
    match outcome {
        Ok(()) => {
            let report = match Arc::try_unwrap(collector) {
                Ok(collector) => collector.into_report(),
                Err(shared) => shared.snapshot(),
            };
            info!(%report, "run complete");
            Ok(report)
        }
        Err(err) => {
            let report = collector.snapshot();
            info!(%report, error = %err, "engine invocation failed, returning partial report");
            Err(Error::engine_invocation(err, report))
        }
    }
}
