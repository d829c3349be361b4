//! Engine error taxonomy.
//!
//! Validation errors (enum values, editability, ownership, submission
//! preconditions) are raised before anything reaches the persistence layer.
//! `PersistenceFailure` wraps whatever the backing store reported. No variant
//! is fatal to the process.

use auditdesk_core::errors::CoreError;
use auditdesk_core::gate::SubmissionBlocker;
use auditdesk_sheet::ParseError;
use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    /// The uploaded file could not be read as a checklist.
    #[error("Checklist could not be parsed: {0}")]
    Parse(#[from] ParseError),

    #[error("Invalid value '{value}' for field '{field}'")]
    InvalidEnumValue { field: String, value: String },

    /// Edit attempted on an audit that has left `in_progress`.
    #[error("Audit {audit_id} is not editable (status: {status})")]
    AuditNotEditable { audit_id: String, status: String },

    #[error("Audit is incomplete: {completed} of {total} items have a remark")]
    IncompleteAudit { completed: usize, total: usize },

    #[error("{} item(s) marked 'no' have no evidence", item_ids.len())]
    MissingEvidence { item_ids: Vec<String> },

    /// A read or write against the record or object store failed.
    #[error("Persistence failed: {0}")]
    PersistenceFailure(#[source] CoreError),

    #[error("Audit {0} is not loaded")]
    AuditNotLoaded(String),

    #[error("Item {item_id} not found in audit {audit_id}")]
    ItemNotFound { audit_id: String, item_id: String },

    #[error("Evidence {evidence_id} not found on item {item_id}")]
    EvidenceNotFound { item_id: String, evidence_id: String },

    #[error("User {user_id} is not the assigned auditor of audit {audit_id}")]
    NotAssignedAuditor { audit_id: String, user_id: String },
}

impl EngineError {
    /// Errors decided locally, without a round-trip to the store.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidEnumValue { .. }
                | Self::AuditNotEditable { .. }
                | Self::IncompleteAudit { .. }
                | Self::MissingEvidence { .. }
                | Self::NotAssignedAuditor { .. }
        )
    }

    /// Transient store failures the caller may retry.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::PersistenceFailure(_))
    }
}

impl From<CoreError> for EngineError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidEnumValue { field, value } => Self::InvalidEnumValue { field, value },
            CoreError::Locked { id, status, .. } => Self::AuditNotEditable {
                audit_id: id,
                status,
            },
            // A lost compare-and-set means the audit already moved on.
            CoreError::InvalidTransition { id, from, .. } => Self::AuditNotEditable {
                audit_id: id,
                status: from,
            },
            other => Self::PersistenceFailure(other),
        }
    }
}

impl From<SubmissionBlocker> for EngineError {
    fn from(blocker: SubmissionBlocker) -> Self {
        match blocker {
            SubmissionBlocker::Incomplete { completed, total } => {
                Self::IncompleteAudit { completed, total }
            }
            SubmissionBlocker::MissingEvidence { item_ids } => Self::MissingEvidence { item_ids },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locked_becomes_not_editable() {
        let err: EngineError = CoreError::Locked {
            entity_type: "audit".into(),
            id: "aud-1".into(),
            status: "submitted".into(),
        }
        .into();
        assert!(matches!(err, EngineError::AuditNotEditable { ref status, .. } if status == "submitted"));
        assert!(err.is_validation());
    }

    #[test]
    fn backend_becomes_persistence_failure() {
        let err: EngineError = CoreError::Backend("disk full".into()).into();
        assert!(err.is_transient());
        assert!(!err.is_validation());
        assert_eq!(err.to_string(), "Persistence failed: Backend failure: disk full");
    }

    #[test]
    fn blockers_map_one_to_one() {
        let err: EngineError = SubmissionBlocker::Incomplete {
            completed: 2,
            total: 3,
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Audit is incomplete: 2 of 3 items have a remark"
        );

        let err: EngineError = SubmissionBlocker::MissingEvidence {
            item_ids: vec!["itm-1".into()],
        }
        .into();
        assert_eq!(err.to_string(), "1 item(s) marked 'no' have no evidence");
    }
}
