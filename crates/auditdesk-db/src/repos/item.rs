//! Audit item repository: bulk import, ordered listing, guarded field updates.

use std::collections::HashMap;

use chrono::Utc;

use auditdesk_core::activity_detail::ImportedDetail;
use auditdesk_core::entities::{ActivityEntry, AuditItem, EvidenceRef};
use auditdesk_core::enums::{ActivityAction, AuditStatus, EntityType};
use auditdesk_core::ids::{PREFIX_ACTIVITY, PREFIX_ITEM};
use auditdesk_core::repository::NewAuditItem;
use auditdesk_core::updates::ItemChanges;

use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, parse_datetime, parse_enum, parse_json, to_json};
use crate::repos::activity::insert_activity;
use crate::service::{AuditService, finish_tx};

const SELECT_COLS: &str = "id, audit_id, row_index, original_data, audit_details, observation, \
                           remark, last_modified_by, updated_at";

fn row_to_item(row: &libsql::Row) -> Result<AuditItem, DatabaseError> {
    let remark = get_opt_string(row, 6)?
        .map(|s| parse_enum(&s))
        .transpose()?;
    let row_index = u32::try_from(row.get::<i64>(2)?)
        .map_err(|e| DatabaseError::InvalidState(format!("row_index out of range: {e}")))?;
    Ok(AuditItem {
        id: row.get(0)?,
        audit_id: row.get(1)?,
        row_index,
        original_data: parse_json(&row.get::<String>(3)?)?,
        audit_details: row.get(4)?,
        observation: row.get(5)?,
        remark,
        evidence: Vec::new(),
        last_modified_by: get_opt_string(row, 7)?,
        updated_at: parse_datetime(&row.get::<String>(8)?)?,
    })
}

impl AuditService {
    /// Insert all imported rows of an audit in one transaction.
    ///
    /// Appends a single `imported` activity entry on the audit.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if the audit does not exist, or any
    /// INSERT failure (the whole batch is rolled back).
    pub async fn create_items(
        &self,
        audit_id: &str,
        items: Vec<NewAuditItem>,
        actor_id: &str,
    ) -> Result<Vec<AuditItem>, DatabaseError> {
        let audit = self.get_audit(audit_id).await?;
        let now = Utc::now();

        let mut ids = Vec::with_capacity(items.len());
        for _ in &items {
            ids.push(self.db().generate_id(PREFIX_ITEM).await?);
        }
        let activity = ActivityEntry {
            id: self.db().generate_id(PREFIX_ACTIVITY).await?,
            actor_id: Some(actor_id.to_string()),
            entity_type: EntityType::Audit,
            entity_id: audit_id.to_string(),
            action: ActivityAction::Imported,
            detail: Some(
                serde_json::to_value(ImportedDetail {
                    template_id: audit.template_id.clone(),
                    rows: items.len(),
                })
                .map_err(|e| DatabaseError::Other(e.into()))?,
            ),
            created_at: now,
        };

        let tx = self.db().conn().transaction().await?;
        let written: Result<(), DatabaseError> = async {
            for (id, item) in ids.iter().zip(&items) {
                tx.execute(
                    &format!(
                        "INSERT INTO checklist_audit_items ({SELECT_COLS})
                         VALUES (?1, ?2, ?3, ?4, '', '', NULL, ?5, ?6)"
                    ),
                    libsql::params![
                        id.as_str(),
                        audit_id,
                        i64::from(item.row_index),
                        to_json(&item.original_data)?,
                        actor_id,
                        now.to_rfc3339()
                    ],
                )
                .await?;
            }
            insert_activity(&tx, &activity).await
        }
        .await;

        finish_tx(tx, written).await?;

        tracing::debug!(audit_id, rows = items.len(), "inserted audit items");

        let mut created: Vec<AuditItem> = ids
            .into_iter()
            .zip(items)
            .map(|(id, item)| AuditItem {
                id,
                audit_id: audit_id.to_string(),
                row_index: item.row_index,
                original_data: item.original_data,
                audit_details: String::new(),
                observation: String::new(),
                remark: None,
                evidence: Vec::new(),
                last_modified_by: Some(actor_id.to_string()),
                updated_at: now,
            })
            .collect();
        created.sort_by_key(|item| item.row_index);
        Ok(created)
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if no item has this id.
    pub async fn get_item(&self, item_id: &str) -> Result<AuditItem, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM checklist_audit_items WHERE id = ?1"),
                [item_id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("item", item_id))?;
        let mut item = row_to_item(&row)?;
        item.evidence = self.list_evidence_for_item(item_id).await?;
        Ok(item)
    }

    /// All items of an audit ordered by `row_index`, with evidence attached
    /// in upload order.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if a query fails.
    pub async fn list_items(&self, audit_id: &str) -> Result<Vec<AuditItem>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {SELECT_COLS} FROM checklist_audit_items
                     WHERE audit_id = ?1 ORDER BY row_index"
                ),
                [audit_id],
            )
            .await?;
        let mut items = Vec::new();
        while let Some(row) = rows.next().await? {
            items.push(row_to_item(&row)?);
        }

        let mut evidence: HashMap<String, Vec<EvidenceRef>> = HashMap::new();
        for file in self.list_evidence_for_audit(audit_id).await? {
            evidence.entry(file.item_id.clone()).or_default().push(file);
        }
        for item in &mut items {
            if let Some(files) = evidence.remove(&item.id) {
                item.evidence = files;
            }
        }
        Ok(items)
    }

    /// Parent audit id and status of an item.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if no item has this id.
    pub async fn item_audit_status(
        &self,
        item_id: &str,
    ) -> Result<(String, AuditStatus), DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT a.id, a.status FROM checklist_audit_items i
                 JOIN checklist_audits a ON a.id = i.audit_id
                 WHERE i.id = ?1",
                [item_id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("item", item_id))?;
        Ok((row.get(0)?, parse_enum(&row.get::<String>(1)?)?))
    }

    /// Write only the changed fields of an item, plus `updated_at` and
    /// `last_modified_by`.
    ///
    /// The UPDATE only matches while the parent audit is `in_progress`, so a
    /// write from a stale client after submission is refused atomically.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Locked` if the parent audit is not in progress,
    /// `DatabaseError::NotFound` if the item does not exist.
    pub async fn update_item(
        &self,
        item_id: &str,
        changes: &ItemChanges,
        actor_id: &str,
    ) -> Result<(), DatabaseError> {
        if changes.is_empty() {
            return Ok(());
        }

        let mut sets = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();
        let mut idx = 1usize;

        if let Some(ref audit_details) = changes.audit_details {
            sets.push(format!("audit_details = ?{idx}"));
            params.push(audit_details.clone().into());
            idx += 1;
        }
        if let Some(ref observation) = changes.observation {
            sets.push(format!("observation = ?{idx}"));
            params.push(observation.clone().into());
            idx += 1;
        }
        if let Some(remark) = changes.remark {
            sets.push(format!("remark = ?{idx}"));
            params.push(remark.map_or(libsql::Value::Null, |r| r.as_str().into()));
            idx += 1;
        }

        let now = Utc::now();
        sets.push(format!("updated_at = ?{idx}"));
        params.push(now.to_rfc3339().into());
        idx += 1;
        sets.push(format!("last_modified_by = ?{idx}"));
        params.push(actor_id.into());
        idx += 1;

        params.push(item_id.into());
        let sql = format!(
            "UPDATE checklist_audit_items SET {} WHERE id = ?{idx}
             AND audit_id IN (SELECT id FROM checklist_audits WHERE status = '{}')",
            sets.join(", "),
            AuditStatus::InProgress.as_str()
        );
        let activity = ActivityEntry {
            id: self.db().generate_id(PREFIX_ACTIVITY).await?,
            actor_id: Some(actor_id.to_string()),
            entity_type: EntityType::Item,
            entity_id: item_id.to_string(),
            action: ActivityAction::Updated,
            detail: Some(serde_json::to_value(changes).map_err(|e| DatabaseError::Other(e.into()))?),
            created_at: now,
        };

        let tx = self.db().conn().transaction().await?;
        let written: Result<u64, DatabaseError> = async {
            let changed = tx.execute(&sql, libsql::params_from_iter(params)).await?;
            if changed > 0 {
                insert_activity(&tx, &activity).await?;
            }
            Ok(changed)
        }
        .await;

        if finish_tx(tx, written).await? == 0 {
            let (audit_id, status) = self.item_audit_status(item_id).await?;
            return Err(DatabaseError::Locked {
                audit_id,
                status: status.as_str().to_string(),
            });
        }
        Ok(())
    }
}
