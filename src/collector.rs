//! Concurrency-safe aggregation of per-host run outcomes.
//!
//! The execution engine emits one terminal event per host per task, from
//! whichever worker finished the task. The [`ResultCollector`] is the sink
//! for those events: four concurrent category maps plus an append-only event
//! log. Upserts are atomic per host per category; within a category the last
//! write wins, and a host may appear in several categories when different
//! tasks landed differently. The sink never performs I/O and never suspends
//! the calling worker beyond the map update.
//!
//! One collector per run: the coordinator constructs a fresh instance for
//! every engine invocation.

use dashmap::DashMap;
use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Terminal outcome category for one host/task pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunOutcome {
    /// Task completed successfully
    Ok,
    /// Task ran and failed
    Failed,
    /// Host could not be reached; connectivity failures are data, not errors
    Unreachable,
    /// Task was skipped for this host
    Skipped,
}

impl RunOutcome {
    /// All categories, in report order.
    pub fn all() -> [RunOutcome; 4] {
        [
            RunOutcome::Ok,
            RunOutcome::Failed,
            RunOutcome::Unreachable,
            RunOutcome::Skipped,
        ]
    }
}

impl std::fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunOutcome::Ok => write!(f, "ok"),
            RunOutcome::Failed => write!(f, "failed"),
            RunOutcome::Unreachable => write!(f, "unreachable"),
            RunOutcome::Skipped => write!(f, "skipped"),
        }
    }
}

/// One terminal event emitted by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunEvent {
    /// Host the task ran against
    pub host: String,
    /// Outcome category
    pub outcome: RunOutcome,
    /// Opaque result payload from the engine
    pub payload: Value,
}

/// The engine's outcome-reporting capability.
///
/// Contract: the engine must call exactly one of these methods per host per
/// task attempted. Calls may arrive concurrently from different workers;
/// implementations must complete the upsert before returning and must not
/// block on I/O.
pub trait RunEventSink: Send + Sync {
    /// Record a successful task completion.
    fn record_ok(&self, host: &str, payload: Value);
    /// Record a task failure.
    fn record_failed(&self, host: &str, payload: Value);
    /// Record an unreachable host.
    fn record_unreachable(&self, host: &str, payload: Value);
    /// Record a skipped task.
    fn record_skipped(&self, host: &str, payload: Value);
}

/// The categorized final report of one run.
///
/// Serializes with exactly the four category keys, empty maps permitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// Hosts whose latest task in this category succeeded
    pub ok: IndexMap<String, Value>,
    /// Hosts whose latest task in this category failed
    pub failed: IndexMap<String, Value>,
    /// Hosts that could not be reached
    pub unreachable: IndexMap<String, Value>,
    /// Hosts whose latest task in this category was skipped
    pub skipped: IndexMap<String, Value>,
}

impl RunReport {
    /// Create an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// The map for one category.
    pub fn category(&self, outcome: RunOutcome) -> &IndexMap<String, Value> {
        match outcome {
            RunOutcome::Ok => &self.ok,
            RunOutcome::Failed => &self.failed,
            RunOutcome::Unreachable => &self.unreachable,
            RunOutcome::Skipped => &self.skipped,
        }
    }

    /// Whether the run produced no failures and no unreachable hosts.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.unreachable.is_empty()
    }

    /// Total number of category entries across all four maps.
    pub fn entry_count(&self) -> usize {
        self.ok.len() + self.failed.len() + self.unreachable.len() + self.skipped.len()
    }

    /// Whether every category is empty.
    pub fn is_empty(&self) -> bool {
        self.entry_count() == 0
    }
}

impl std::fmt::Display for RunReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ok={} failed={} unreachable={} skipped={}",
            self.ok.len(),
            self.failed.len(),
            self.unreachable.len(),
            self.skipped.len()
        )
    }
}

/// Concurrency-safe event sink accumulating per-host terminal state.
#[derive(Debug, Default)]
pub struct ResultCollector {
    ok: DashMap<String, Value>,
    failed: DashMap<String, Value>,
    unreachable: DashMap<String, Value>,
    skipped: DashMap<String, Value>,
    events: Mutex<Vec<RunEvent>>,
}

impl ResultCollector {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, outcome: RunOutcome, host: &str, payload: Value) {
        let map = match outcome {
            RunOutcome::Ok => &self.ok,
            RunOutcome::Failed => &self.failed,
            RunOutcome::Unreachable => &self.unreachable,
            RunOutcome::Skipped => &self.skipped,
        };
        // log append and map upsert commit under the same lock: the category
        // slot always holds the payload of the host's latest logged event in
        // that category
        let mut events = self.events.lock();
        events.push(RunEvent {
            host: host.to_string(),
            outcome,
            payload: payload.clone(),
        });
        map.insert(host.to_string(), payload);
    }

    /// Number of events recorded so far.
    pub fn event_count(&self) -> usize {
        self.events.lock().len()
    }

    /// The full event log in arrival order. The categorized report collapses
    /// same-host events within a category; this log preserves the history,
    /// and the log order agrees with the category maps: a host's slot in a
    /// category carries the payload of its latest logged event there.
    pub fn events(&self) -> Vec<RunEvent> {
        self.events.lock().clone()
    }

    /// Render the current state as a report without consuming the collector.
    /// Used for partial reports when the engine fails mid-run.
    pub fn snapshot(&self) -> RunReport {
        fn drain_sorted(map: &DashMap<String, Value>) -> IndexMap<String, Value> {
            let mut entries: Vec<(String, Value)> = map
                .iter()
                .map(|entry| (entry.key().clone(), entry.value().clone()))
                .collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            entries.into_iter().collect()
        }

        RunReport {
            ok: drain_sorted(&self.ok),
            failed: drain_sorted(&self.failed),
            unreachable: drain_sorted(&self.unreachable),
            skipped: drain_sorted(&self.skipped),
        }
    }

    /// Consume the collector and produce the final report.
    pub fn into_report(self) -> RunReport {
        self.snapshot()
    }
}

impl RunEventSink for ResultCollector {
    fn record_ok(&self, host: &str, payload: Value) {
        self.record(RunOutcome::Ok, host, payload);
    }

    fn record_failed(&self, host: &str, payload: Value) {
        self.record(RunOutcome::Failed, host, payload);
    }

    fn record_unreachable(&self, host: &str, payload: Value) {
        self.record(RunOutcome::Unreachable, host, payload);
    }

    fn record_skipped(&self, host: &str, payload: Value) {
        self.record(RunOutcome::Skipped, host, payload);
    }
}
