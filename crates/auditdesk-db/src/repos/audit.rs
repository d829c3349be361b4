//! Checklist audit repository: creation, lookup and status transitions.

use chrono::Utc;

use auditdesk_core::activity_detail::StatusChangedDetail;
use auditdesk_core::entities::{ActivityEntry, Audit};
use auditdesk_core::enums::{ActivityAction, AuditStatus, EntityType};
use auditdesk_core::ids::{PREFIX_ACTIVITY, PREFIX_AUDIT};
use auditdesk_core::repository::NewAudit;

use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, parse_datetime, parse_enum, parse_optional_datetime};
use crate::repos::activity::insert_activity;
use crate::service::{AuditService, finish_tx};

const SELECT_COLS: &str =
    "id, template_id, title, auditor_id, status, created_at, updated_at, submitted_at";

fn row_to_audit(row: &libsql::Row) -> Result<Audit, DatabaseError> {
    Ok(Audit {
        id: row.get(0)?,
        template_id: row.get(1)?,
        title: row.get(2)?,
        auditor_id: row.get(3)?,
        status: parse_enum(&row.get::<String>(4)?)?,
        created_at: parse_datetime(&row.get::<String>(5)?)?,
        updated_at: parse_datetime(&row.get::<String>(6)?)?,
        submitted_at: parse_optional_datetime(get_opt_string(row, 7)?.as_deref())?,
    })
}

async fn fetch_audit(conn: &libsql::Connection, id: &str) -> Result<Audit, DatabaseError> {
    let mut rows = conn
        .query(
            &format!("SELECT {SELECT_COLS} FROM checklist_audits WHERE id = ?1"),
            [id],
        )
        .await?;
    let row = rows
        .next()
        .await?
        .ok_or_else(|| DatabaseError::not_found("audit", id))?;
    row_to_audit(&row)
}

impl AuditService {
    /// Create an audit in `in_progress`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the INSERT fails (including an unknown
    /// template id) or the activity append fails.
    pub async fn create_audit(&self, input: NewAudit) -> Result<Audit, DatabaseError> {
        let now = Utc::now();
        let id = self.db().generate_id(PREFIX_AUDIT).await?;
        let activity = ActivityEntry {
            id: self.db().generate_id(PREFIX_ACTIVITY).await?,
            actor_id: Some(input.auditor_id.clone()),
            entity_type: EntityType::Audit,
            entity_id: id.clone(),
            action: ActivityAction::Created,
            detail: None,
            created_at: now,
        };

        let tx = self.db().conn().transaction().await?;
        let written: Result<(), DatabaseError> = async {
            tx.execute(
                &format!(
                    "INSERT INTO checklist_audits ({SELECT_COLS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, NULL)"
                ),
                libsql::params![
                    id.as_str(),
                    input.template_id.as_str(),
                    input.title.as_str(),
                    input.auditor_id.as_str(),
                    AuditStatus::InProgress.as_str(),
                    now.to_rfc3339(),
                    now.to_rfc3339()
                ],
            )
            .await?;
            insert_activity(&tx, &activity).await
        }
        .await;
        finish_tx(tx, written).await?;

        Ok(Audit {
            id,
            template_id: input.template_id,
            title: input.title,
            auditor_id: input.auditor_id,
            status: AuditStatus::InProgress,
            created_at: now,
            updated_at: now,
            submitted_at: None,
        })
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if no audit has this id.
    pub async fn get_audit(&self, id: &str) -> Result<Audit, DatabaseError> {
        fetch_audit(self.db().conn(), id).await
    }

    /// Audits owned by `auditor_id`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_audits_for_auditor(
        &self,
        auditor_id: &str,
        limit: u32,
    ) -> Result<Vec<Audit>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {SELECT_COLS} FROM checklist_audits
                     WHERE auditor_id = ?1
                     ORDER BY created_at DESC, rowid DESC LIMIT {limit}"
                ),
                [auditor_id],
            )
            .await?;

        let mut audits = Vec::new();
        while let Some(row) = rows.next().await? {
            audits.push(row_to_audit(&row)?);
        }
        Ok(audits)
    }

    /// Most recently created audit owned by `auditor_id`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn latest_audit(&self, auditor_id: &str) -> Result<Option<Audit>, DatabaseError> {
        Ok(self
            .list_audits_for_auditor(auditor_id, 1)
            .await?
            .into_iter()
            .next())
    }

    /// Compare-and-set the audit status.
    ///
    /// The row is only updated when its stored status is still `from`, so a
    /// concurrent transition cannot be overwritten. Moving to `submitted`
    /// stamps `submitted_at`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::InvalidTransition` if `from -> to` is not an
    /// allowed transition or the stored status is no longer `from`, and
    /// `DatabaseError::NotFound` if the audit does not exist.
    pub async fn transition_audit(
        &self,
        audit_id: &str,
        from: AuditStatus,
        to: AuditStatus,
        actor_id: &str,
    ) -> Result<Audit, DatabaseError> {
        if !from.can_transition_to(to) {
            return Err(DatabaseError::InvalidTransition {
                audit_id: audit_id.to_string(),
                from: from.as_str().to_string(),
                to: to.as_str().to_string(),
            });
        }

        let activity_id = self.db().generate_id(PREFIX_ACTIVITY).await?;
        let detail = serde_json::to_value(StatusChangedDetail {
            from: from.as_str().to_string(),
            to: to.as_str().to_string(),
        })
        .map_err(|e| DatabaseError::Other(e.into()))?;
        let now = Utc::now().to_rfc3339();
        let submitted_at = (to == AuditStatus::Submitted).then(|| now.clone());

        let tx = self.db().conn().transaction().await?;
        let written: Result<Option<Audit>, DatabaseError> = async {
            let changed = tx
                .execute(
                    "UPDATE checklist_audits
                     SET status = ?1, updated_at = ?2, submitted_at = COALESCE(?3, submitted_at)
                     WHERE id = ?4 AND status = ?5",
                    libsql::params![
                        to.as_str(),
                        now.as_str(),
                        submitted_at.as_deref(),
                        audit_id,
                        from.as_str()
                    ],
                )
                .await?;
            if changed == 0 {
                return Ok(None);
            }

            let updated = fetch_audit(&tx, audit_id).await?;
            insert_activity(
                &tx,
                &ActivityEntry {
                    id: activity_id,
                    actor_id: Some(actor_id.to_string()),
                    entity_type: EntityType::Audit,
                    entity_id: audit_id.to_string(),
                    action: ActivityAction::StatusChanged,
                    detail: Some(detail),
                    created_at: updated.updated_at,
                },
            )
            .await?;
            Ok(Some(updated))
        }
        .await;

        let Some(updated) = finish_tx(tx, written).await? else {
            let current = self.get_audit(audit_id).await?;
            return Err(DatabaseError::InvalidTransition {
                audit_id: audit_id.to_string(),
                from: current.status.as_str().to_string(),
                to: to.as_str().to_string(),
            });
        };

        tracing::info!(audit_id, from = %from, to = %to, "audit status changed");
        Ok(updated)
    }
}
