//! # Hostrun - Dynamic Inventory and Run-Result Aggregation
//!
//! Hostrun builds an in-memory target-host inventory from structured data
//! (a database row set, an API response) rather than from a static inventory
//! file, and aggregates the per-host outcome events streamed back by a
//! remote task-execution engine into a categorized final report.
//!
//! The actual remote execution — connections, task templating, privilege
//! escalation, worker orchestration — is an external collaborator behind the
//! [`ExecutionEngine`](engine::ExecutionEngine) trait. This crate prepares
//! what the engine consumes and interprets what it emits.
//!
//! ## Core Concepts
//!
//! - **HostSource**: caller input, either a flat host list or a map of group
//!   name to hosts and vars
//! - **Inventory**: de-duplicated hosts and groups for one run; groups hold
//!   name references into the inventory's host table
//! - **VariableStore**: per-host connection and custom variables, with
//!   group-scoped defaults and an extra-vars overlay
//! - **ResultCollector**: concurrency-safe sink for the engine's per-host
//!   terminal events
//! - **RunReport**: the final `ok`/`failed`/`unreachable`/`skipped` map
//! - **RunCoordinator**: composes the above around one engine invocation
//!
//! ## Data Flow
//!
//! ```text
//! raw spec ──▶ HostSource::normalize ──▶ Inventory::build
//!                                              │
//!                              (Inventory, VariableStore)
//!                                              │
//!                                       RunCoordinator ──▶ ExecutionEngine
//!                                              ▲                  │
//!                                              │    one event per host per task
//!                                         RunReport ◀── ResultCollector
//! ```
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use hostrun::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let source = HostSource::from_json(r#"[{"ip": "192.168.122.105"}]"#)?;
//!     let tasks: TaskList = vec![TaskAction::new("command", "ls".into())].into();
//!
//!     let mut coordinator = RunCoordinator::new(my_engine, source);
//!     let report = coordinator.run_ad_hoc("all", &tasks, None).await?;
//!     println!("{report}");
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

/// Error types and result alias for Hostrun operations.
pub mod error;

/// Caller-supplied host/group specifications and their normalizer.
pub mod spec;

/// In-memory inventory: hosts, groups, and the construction algorithm.
pub mod inventory;

/// Per-host variable storage and resolution.
pub mod vars;

/// Outcome categories, the concurrency-safe result collector, and the final
/// run report.
pub mod collector;

/// The execution-engine seam: trait, options, credentials, and the
/// placeholder inventory artifact.
pub mod engine;

/// Run coordination: builds the inventory, invokes the engine, assembles the
/// report.
pub mod coordinator;

/// Convenient re-exports of commonly used types and traits.
pub mod prelude {
    pub use crate::collector::{ResultCollector, RunEvent, RunEventSink, RunOutcome, RunReport};
    pub use crate::coordinator::RunCoordinator;
    pub use crate::engine::{
        Credentials, EngineContext, EngineError, EngineOptions, EngineResult, ExecutionEngine,
        TaskAction, TaskList,
    };
    pub use crate::error::{Error, Result};
    pub use crate::inventory::{Group, Host, Inventory};
    pub use crate::spec::{GroupSpec, HostSource, HostSpec};
    pub use crate::vars::{VarMap, VariableStore};
}

/// Returns the current version of Hostrun.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
