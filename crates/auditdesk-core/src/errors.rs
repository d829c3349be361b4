//! Cross-cutting error types for AuditDesk.
//!
//! `CoreError` is the error currency of the collaborator traits in
//! [`crate::repository`]. Crate-specific errors (`DatabaseError`,
//! `StorageError`, `ParseError`) convert into it at the trait boundary, and
//! `auditdesk-engine` maps it onto the user-facing `EngineError` taxonomy.

use thiserror::Error;

/// Result alias used by the collaborator traits.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can be raised by any AuditDesk crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Entity lookup returned no result.
    #[error("Entity not found: {entity_type} {id}")]
    NotFound { entity_type: String, id: String },

    /// A state machine transition was attempted that is not allowed.
    #[error("Invalid state transition: {entity_type} {id} from {from} to {to}")]
    InvalidTransition {
        entity_type: String,
        id: String,
        from: String,
        to: String,
    },

    /// A value outside a fixed enumeration was supplied for a field.
    #[error("Invalid value '{value}' for field '{field}'")]
    InvalidEnumValue { field: String, value: String },

    /// The entity cannot be mutated in its current status.
    #[error("{entity_type} {id} is locked (status: {status})")]
    Locked {
        entity_type: String,
        id: String,
        status: String,
    },

    /// Data failed validation (format, constraints).
    #[error("Validation error: {0}")]
    Validation(String),

    /// The backing store (database, object storage) failed.
    #[error("Backend failure: {0}")]
    Backend(String),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CoreError {
    /// Shorthand for [`CoreError::NotFound`].
    pub fn not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }

    /// Whether this error came from the backing store rather than from
    /// validation of the request.
    #[must_use]
    pub const fn is_backend(&self) -> bool {
        matches!(self, Self::Backend(_) | Self::Other(_))
    }
}
