//! Checklist template repository.

use chrono::Utc;

use auditdesk_core::activity_detail::DiscardedDetail;
use auditdesk_core::entities::{ActivityEntry, Template};
use auditdesk_core::enums::{ActivityAction, EntityType};
use auditdesk_core::ids::{PREFIX_ACTIVITY, PREFIX_TEMPLATE};
use auditdesk_core::repository::NewTemplate;

use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, parse_datetime, parse_json, to_json};
use crate::repos::activity::insert_activity;
use crate::service::{AuditService, finish_tx};

const SELECT_COLS: &str = "id, title, description, structure, created_by, created_at";

fn row_to_template(row: &libsql::Row) -> Result<Template, DatabaseError> {
    Ok(Template {
        id: row.get(0)?,
        title: row.get(1)?,
        description: get_opt_string(row, 2)?,
        structure: parse_json(&row.get::<String>(3)?)?,
        created_by: row.get(4)?,
        created_at: parse_datetime(&row.get::<String>(5)?)?,
    })
}

impl AuditService {
    /// # Errors
    ///
    /// Returns `DatabaseError` if the INSERT or the activity append fails;
    /// neither is kept in that case.
    pub async fn create_template(&self, input: NewTemplate) -> Result<Template, DatabaseError> {
        let now = Utc::now();
        let id = self.db().generate_id(PREFIX_TEMPLATE).await?;
        let structure = to_json(&input.structure)?;
        let activity = ActivityEntry {
            id: self.db().generate_id(PREFIX_ACTIVITY).await?,
            actor_id: Some(input.created_by.clone()),
            entity_type: EntityType::Template,
            entity_id: id.clone(),
            action: ActivityAction::Created,
            detail: None,
            created_at: now,
        };

        let tx = self.db().conn().transaction().await?;
        let written: Result<(), DatabaseError> = async {
            tx.execute(
                &format!("INSERT INTO checklist_templates ({SELECT_COLS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"),
                libsql::params![
                    id.as_str(),
                    input.title.as_str(),
                    input.description.as_deref(),
                    structure,
                    input.created_by.as_str(),
                    now.to_rfc3339()
                ],
            )
            .await?;
            insert_activity(&tx, &activity).await
        }
        .await;
        finish_tx(tx, written).await?;

        Ok(Template {
            id,
            title: input.title,
            description: input.description,
            structure: input.structure,
            created_by: input.created_by,
            created_at: now,
        })
    }

    /// Delete the records of an import that failed part-way: evidence and
    /// items of `audit_id`, the audit, then the template unless another audit
    /// still uses it. One `discarded` entry is logged on the template.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if a DELETE fails; nothing is removed then.
    pub async fn discard_import(
        &self,
        template_id: &str,
        audit_id: Option<&str>,
        actor_id: &str,
    ) -> Result<(), DatabaseError> {
        let activity_id = self.db().generate_id(PREFIX_ACTIVITY).await?;

        let tx = self.db().conn().transaction().await?;
        let written: Result<u64, DatabaseError> = async {
            let mut items = 0;
            if let Some(audit_id) = audit_id {
                tx.execute(
                    "DELETE FROM audit_evidence WHERE item_id IN (
                         SELECT id FROM checklist_audit_items WHERE audit_id = ?1)",
                    [audit_id],
                )
                .await?;
                items = tx
                    .execute("DELETE FROM checklist_audit_items WHERE audit_id = ?1", [audit_id])
                    .await?;
                tx.execute("DELETE FROM checklist_audits WHERE id = ?1", [audit_id])
                    .await?;
            }
            tx.execute(
                "DELETE FROM checklist_templates WHERE id = ?1
                 AND NOT EXISTS (SELECT 1 FROM checklist_audits WHERE template_id = ?1)",
                [template_id],
            )
            .await?;

            let detail = serde_json::to_value(DiscardedDetail {
                audit_id: audit_id.map(str::to_string),
                items,
            })
            .map_err(|e| DatabaseError::Other(e.into()))?;
            insert_activity(
                &tx,
                &ActivityEntry {
                    id: activity_id,
                    actor_id: Some(actor_id.to_string()),
                    entity_type: EntityType::Template,
                    entity_id: template_id.to_string(),
                    action: ActivityAction::Discarded,
                    detail: Some(detail),
                    created_at: Utc::now(),
                },
            )
            .await?;
            Ok(items)
        }
        .await;
        let items = finish_tx(tx, written).await?;

        tracing::warn!(template_id, audit_id = ?audit_id, items, "discarded partial import");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if no template has this id.
    pub async fn get_template(&self, id: &str) -> Result<Template, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM checklist_templates WHERE id = ?1"),
                [id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("template", id))?;
        row_to_template(&row)
    }
}
