//! Service-level error type for the dispatch subsystem.

use std::time::Duration;

use fleetline_db::store::StoreError;

/// Errors surfaced by the dispatch services.
///
/// Business outcomes (no candidates, permission denied, driver already
/// assigned) are **not** errors; they are carried in the result types so
/// the caller can render a specific message. This enum covers the cases
/// where the subsystem could not do its job at all.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// A required port operation is not implemented by the store.
    ///
    /// Raised instead of degrading to an empty result, because an empty
    /// result is indistinguishable from "no drivers available".
    #[error("Persistence operation not supported: {operation}")]
    Unsupported { operation: &'static str },

    /// A port operation failed.
    #[error("Persistence error during {operation}: {source}")]
    Store {
        operation: &'static str,
        #[source]
        source: StoreError,
    },

    /// A port operation exceeded the configured per-call timeout.
    #[error("Persistence operation {operation} timed out after {timeout:?}")]
    Timeout {
        operation: &'static str,
        timeout: Duration,
    },

    /// The caller cancelled the operation.
    #[error("Operation cancelled by caller")]
    Cancelled,

    /// A commit step failed and the compensating rollback failed too,
    /// leaving the backend in a state that needs operator attention.
    #[error("Rollback after failed {operation} also failed: {rollback_source} (original: {source})")]
    RollbackFailed {
        operation: &'static str,
        #[source]
        source: Box<DispatchError>,
        rollback_source: Box<DispatchError>,
    },

    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Caller-supplied input failed validation.
    #[error("Invalid input: {0}")]
    Validation(String),
}

impl DispatchError {
    /// Wrap a store error, preserving `Unsupported` as its own variant.
    pub(crate) fn from_store(operation: &'static str, source: StoreError) -> Self {
        match source {
            StoreError::Unsupported { operation } => Self::Unsupported { operation },
            other => Self::Store {
                operation,
                source: other,
            },
        }
    }
}
