//! Service layer orchestrating database mutations with the activity log.
//!
//! `AuditService` wraps `AuditDb`. All repo methods are implemented as
//! `impl AuditService` blocks in [`crate::repos`].

use crate::AuditDb;
use crate::error::DatabaseError;

/// Orchestrates database mutations with the activity log.
///
/// Every mutation method follows this protocol:
/// 1. Generate ids outside the transaction
/// 2. Begin transaction
/// 3. Execute SQL
/// 4. Append activity entry on the same transaction
/// 5. Commit, or roll back on any error ([`finish_tx`])
pub struct AuditService {
    db: AuditDb,
}

impl AuditService {
    /// Create a new service wrapping a local database.
    ///
    /// `db_path` is the libSQL database file, or `":memory:"` for tests.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened.
    pub async fn new_local(db_path: &str) -> Result<Self, DatabaseError> {
        let db = AuditDb::open_local(db_path).await?;
        Ok(Self { db })
    }

    /// Create from an existing `AuditDb`.
    #[must_use]
    pub const fn from_db(db: AuditDb) -> Self {
        Self { db }
    }

    /// Access the underlying database handle.
    #[must_use]
    pub const fn db(&self) -> &AuditDb {
        &self.db
    }
}

/// Commit `tx` when `outcome` is `Ok`, otherwise roll it back and return the
/// original error.
pub(crate) async fn finish_tx<T>(
    tx: libsql::Transaction,
    outcome: Result<T, DatabaseError>,
) -> Result<T, DatabaseError> {
    match outcome {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback) = tx.rollback().await {
                tracing::warn!(error = %rollback, "transaction rollback failed");
            }
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use auditdesk_core::enums::{AuditStatus, Remark};
    use auditdesk_core::repository::{NewAudit, NewEvidence};
    use auditdesk_core::updates::ItemChangesBuilder;
    use pretty_assertions::assert_eq;

    use crate::test_support::helpers::{seeded_audit, test_service};

    fn photo() -> NewEvidence {
        NewEvidence {
            file_name: "exit.jpg".into(),
            file_path: "evidence/exit.jpg".into(),
            file_type: None,
        }
    }

    /// With the activity log gone, every append fails after its write has
    /// executed. None of those writes may survive.
    #[tokio::test]
    async fn failed_activity_append_rolls_back_the_write() {
        let svc = test_service().await;
        let (audit, items) = seeded_audit(&svc, 2).await;
        let kept = svc.create_evidence(&items[0].id, photo(), "user-1").await.unwrap();
        svc.db()
            .conn()
            .execute("DROP TABLE activity_log", ())
            .await
            .unwrap();

        let changes = ItemChangesBuilder::new()
            .remark(Some(Remark::No))
            .observation("Blocked exit")
            .build();
        assert!(svc.update_item(&items[1].id, &changes, "user-1").await.is_err());
        let untouched = svc.get_item(&items[1].id).await.unwrap();
        assert_eq!(untouched.remark, None);
        assert_eq!(untouched.observation, "");

        assert!(svc.create_evidence(&items[1].id, photo(), "user-1").await.is_err());
        assert!(svc.list_evidence_for_item(&items[1].id).await.unwrap().is_empty());

        assert!(svc.delete_evidence(&kept.id, "user-1").await.is_err());
        assert_eq!(svc.get_evidence(&kept.id).await.unwrap(), kept);

        assert!(
            svc.transition_audit(&audit.id, AuditStatus::InProgress, AuditStatus::Submitted, "user-1")
                .await
                .is_err()
        );
        let stored = svc.get_audit(&audit.id).await.unwrap();
        assert_eq!(stored.status, AuditStatus::InProgress);
        assert_eq!(stored.submitted_at, None);

        assert!(
            svc.create_audit(NewAudit {
                template_id: audit.template_id.clone(),
                title: "Audit - second".into(),
                auditor_id: "user-1".into(),
            })
            .await
            .is_err()
        );
        assert_eq!(svc.latest_audit("user-1").await.unwrap().unwrap().id, audit.id);
    }
}
