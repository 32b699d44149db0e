//! Error types for Hostrun.
//!
//! Build-time problems are host-scoped and recovered locally (the offending
//! spec is skipped and the build continues), so [`Error::InvalidHostSpec`]
//! mostly shows up in logs. Engine failures propagate as
//! [`Error::EngineInvocation`] and always carry the partial report
//! accumulated up to the point of failure.

use thiserror::Error;

use crate::collector::RunReport;

/// Result type alias for Hostrun operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for Hostrun.
#[derive(Error, Debug)]
pub enum Error {
    /// A host specification failed validation.
    ///
    /// Non-fatal during inventory construction: the host is skipped and the
    /// build continues with whatever subset validated successfully.
    #[error("Invalid host spec in group '{group}': {reason}")]
    InvalidHostSpec {
        /// Group the spec was declared under
        group: String,
        /// Why the spec was rejected
        reason: String,
    },

    /// The execution engine invocation itself failed.
    ///
    /// Distinct from per-host unreachable/failed outcomes, which are data in
    /// the report, not errors. The partial [`RunReport`] collected before the
    /// failure is attached and never discarded.
    #[error("Engine invocation failed: {message}")]
    EngineInvocation {
        /// Error message from the engine
        message: String,
        /// Underlying engine error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        /// Outcomes accumulated before the failure
        report: Box<RunReport>,
    },

    /// Target pattern matched no host or group in the inventory.
    #[error("Pattern '{0}' matched no host or group in inventory")]
    UnknownPattern(String),

    /// IO error (scratch directory or placeholder inventory artifact).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Creates a new invalid host spec error.
    pub fn invalid_host_spec(group: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidHostSpec {
            group: group.into(),
            reason: reason.into(),
        }
    }

    /// Creates a new engine invocation error wrapping an engine failure.
    pub fn engine_invocation(
        source: impl std::error::Error + Send + Sync + 'static,
        report: RunReport,
    ) -> Self {
        Self::EngineInvocation {
            message: source.to_string(),
            source: Some(Box::new(source)),
            report: Box::new(report),
        }
    }

    /// Returns the partial report attached to an engine failure, if any.
    pub fn partial_report(&self) -> Option<&RunReport> {
        match self {
            Error::EngineInvocation { report, .. } => Some(report),
            _ => None,
        }
    }
}
