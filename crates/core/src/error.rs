//! Domain-level error type.

/// Errors produced by domain validation and pure logic.
///
/// Infrastructure-specific failures (database, timeouts) live in the
/// `db` and `dispatch` crates; this enum covers what the domain itself
/// can reject.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
