//! Database error types for auditdesk-db.

use auditdesk_core::errors::CoreError;
use thiserror::Error;

/// Errors from database operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// A SQL query failed.
    #[error("Query failed: {0}")]
    Query(String),

    /// Schema migration failed.
    #[error("Migration failed: {0}")]
    Migration(String),

    /// Expected a result row but none was returned.
    #[error("No result returned")]
    NoResult,

    /// A lookup by id matched nothing.
    #[error("{entity_type} {id} not found")]
    NotFound { entity_type: String, id: String },

    /// A write touched an audit that is no longer in progress.
    #[error("Audit {audit_id} is locked (status: {status})")]
    Locked { audit_id: String, status: String },

    /// Compare-and-set on the audit status did not match.
    #[error("Cannot transition audit {audit_id} from {from} to {to}")]
    InvalidTransition {
        audit_id: String,
        from: String,
        to: String,
    },

    /// Invalid state encountered (e.g., bad data in DB).
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Underlying libSQL error.
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DatabaseError {
    pub fn not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }
}

impl From<DatabaseError> for CoreError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound { entity_type, id } => Self::NotFound { entity_type, id },
            DatabaseError::NoResult => Self::not_found("record", "unknown"),
            DatabaseError::Locked { audit_id, status } => Self::Locked {
                entity_type: "audit".into(),
                id: audit_id,
                status,
            },
            DatabaseError::InvalidTransition { audit_id, from, to } => Self::InvalidTransition {
                entity_type: "audit".into(),
                id: audit_id,
                from,
                to,
            },
            other => Self::Backend(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locked_maps_to_core_locked() {
        let core: CoreError = DatabaseError::Locked {
            audit_id: "aud-00000001".into(),
            status: "submitted".into(),
        }
        .into();
        assert!(matches!(core, CoreError::Locked { ref status, .. } if status == "submitted"));
    }

    #[test]
    fn no_result_maps_to_not_found() {
        let core: CoreError = DatabaseError::NoResult.into();
        assert!(matches!(core, CoreError::NotFound { .. }));
    }

    #[test]
    fn query_failures_are_backend() {
        let core: CoreError = DatabaseError::Query("boom".into()).into();
        assert!(core.is_backend());
        assert_eq!(core.to_string(), "Backend failure: Query failed: boom");
    }
}
