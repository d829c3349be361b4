//! Evidence metadata repository.
//!
//! Only metadata lives here; the bytes are in object storage under
//! `file_path`. Attaching and removing are refused once the audit has left
//! `in_progress`.

use chrono::Utc;

use auditdesk_core::activity_detail::EvidenceDetail;
use auditdesk_core::entities::{ActivityEntry, EvidenceRef};
use auditdesk_core::enums::{ActivityAction, EntityType};
use auditdesk_core::ids::{PREFIX_ACTIVITY, PREFIX_EVIDENCE};
use auditdesk_core::repository::NewEvidence;

use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, parse_datetime};
use crate::repos::activity::insert_activity;
use crate::service::{AuditService, finish_tx};

const SELECT_COLS: &str = "id, item_id, file_name, file_path, file_type, uploaded_by, created_at";

fn row_to_evidence(row: &libsql::Row) -> Result<EvidenceRef, DatabaseError> {
    Ok(EvidenceRef {
        id: row.get(0)?,
        item_id: row.get(1)?,
        file_name: row.get(2)?,
        file_path: row.get(3)?,
        file_type: get_opt_string(row, 4)?,
        uploaded_by: get_opt_string(row, 5)?,
        created_at: parse_datetime(&row.get::<String>(6)?)?,
    })
}

fn evidence_detail(evidence: &EvidenceRef) -> Result<serde_json::Value, DatabaseError> {
    serde_json::to_value(EvidenceDetail {
        evidence_id: evidence.id.clone(),
        file_name: evidence.file_name.clone(),
        file_path: evidence.file_path.clone(),
    })
    .map_err(|e| DatabaseError::Other(e.into()))
}

impl AuditService {
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if the item does not exist and
    /// `DatabaseError::Locked` if its audit is not in progress.
    pub async fn create_evidence(
        &self,
        item_id: &str,
        input: NewEvidence,
        actor_id: &str,
    ) -> Result<EvidenceRef, DatabaseError> {
        let (audit_id, status) = self.item_audit_status(item_id).await?;
        if !status.is_editable() {
            return Err(DatabaseError::Locked {
                audit_id,
                status: status.as_str().to_string(),
            });
        }

        let now = Utc::now();
        let evidence = EvidenceRef {
            id: self.db().generate_id(PREFIX_EVIDENCE).await?,
            item_id: item_id.to_string(),
            file_name: input.file_name,
            file_path: input.file_path,
            file_type: input.file_type,
            uploaded_by: Some(actor_id.to_string()),
            created_at: now,
        };

        let activity = ActivityEntry {
            id: self.db().generate_id(PREFIX_ACTIVITY).await?,
            actor_id: Some(actor_id.to_string()),
            entity_type: EntityType::Evidence,
            entity_id: evidence.id.clone(),
            action: ActivityAction::EvidenceAttached,
            detail: Some(evidence_detail(&evidence)?),
            created_at: now,
        };

        let tx = self.db().conn().transaction().await?;
        let written: Result<(), DatabaseError> = async {
            tx.execute(
                &format!("INSERT INTO audit_evidence ({SELECT_COLS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"),
                libsql::params![
                    evidence.id.as_str(),
                    item_id,
                    evidence.file_name.as_str(),
                    evidence.file_path.as_str(),
                    evidence.file_type.as_deref(),
                    actor_id,
                    now.to_rfc3339()
                ],
            )
            .await?;
            insert_activity(&tx, &activity).await
        }
        .await;
        finish_tx(tx, written).await?;

        Ok(evidence)
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if no evidence has this id.
    pub async fn get_evidence(&self, evidence_id: &str) -> Result<EvidenceRef, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM audit_evidence WHERE id = ?1"),
                [evidence_id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("evidence", evidence_id))?;
        row_to_evidence(&row)
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_evidence_for_item(
        &self,
        item_id: &str,
    ) -> Result<Vec<EvidenceRef>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {SELECT_COLS} FROM audit_evidence
                     WHERE item_id = ?1 ORDER BY created_at, rowid"
                ),
                [item_id],
            )
            .await?;
        let mut files = Vec::new();
        while let Some(row) = rows.next().await? {
            files.push(row_to_evidence(&row)?);
        }
        Ok(files)
    }

    /// Evidence of every item in an audit, in upload order.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_evidence_for_audit(
        &self,
        audit_id: &str,
    ) -> Result<Vec<EvidenceRef>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT e.id, e.item_id, e.file_name, e.file_path, e.file_type, e.uploaded_by, e.created_at
                 FROM audit_evidence e
                 JOIN checklist_audit_items i ON i.id = e.item_id
                 WHERE i.audit_id = ?1
                 ORDER BY e.created_at, e.rowid",
                [audit_id],
            )
            .await?;
        let mut files = Vec::new();
        while let Some(row) = rows.next().await? {
            files.push(row_to_evidence(&row)?);
        }
        Ok(files)
    }

    /// Remove an evidence record. The stored object is left in place.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if no evidence has this id and
    /// `DatabaseError::Locked` if its audit is not in progress.
    pub async fn delete_evidence(
        &self,
        evidence_id: &str,
        actor_id: &str,
    ) -> Result<(), DatabaseError> {
        let evidence = self.get_evidence(evidence_id).await?;
        let activity = ActivityEntry {
            id: self.db().generate_id(PREFIX_ACTIVITY).await?,
            actor_id: Some(actor_id.to_string()),
            entity_type: EntityType::Evidence,
            entity_id: evidence_id.to_string(),
            action: ActivityAction::EvidenceRemoved,
            detail: Some(evidence_detail(&evidence)?),
            created_at: Utc::now(),
        };

        let tx = self.db().conn().transaction().await?;
        let written: Result<u64, DatabaseError> = async {
            let changed = tx
                .execute(
                    "DELETE FROM audit_evidence WHERE id = ?1 AND item_id IN (
                         SELECT i.id FROM checklist_audit_items i
                         JOIN checklist_audits a ON a.id = i.audit_id
                         WHERE a.status = 'in_progress')",
                    [evidence_id],
                )
                .await?;
            if changed > 0 {
                insert_activity(&tx, &activity).await?;
            }
            Ok(changed)
        }
        .await;

        if finish_tx(tx, written).await? == 0 {
            let (audit_id, status) = self.item_audit_status(&evidence.item_id).await?;
            return Err(DatabaseError::Locked {
                audit_id,
                status: status.as_str().to_string(),
            });
        }
        Ok(())
    }
}
