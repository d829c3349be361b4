//! Activity log repository.
//!
//! Append-only entries recording every mutation, with dynamic filtering.

use auditdesk_core::entities::ActivityEntry;
use auditdesk_core::enums::{ActivityAction, EntityType};

use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, parse_datetime, parse_enum, parse_optional_json};
use crate::service::AuditService;

const SELECT_COLS: &str = "id, actor_id, entity_type, entity_id, action, detail, created_at";

/// Filter criteria for activity queries.
#[derive(Debug, Default)]
pub struct ActivityFilter {
    pub entity_type: Option<EntityType>,
    pub entity_id: Option<String>,
    pub action: Option<ActivityAction>,
    pub actor_id: Option<String>,
    /// Entries for this audit, its items and their evidence.
    pub audit_id: Option<String>,
    pub limit: Option<u32>,
}

fn row_to_activity(row: &libsql::Row) -> Result<ActivityEntry, DatabaseError> {
    Ok(ActivityEntry {
        id: row.get(0)?,
        actor_id: get_opt_string(row, 1)?,
        entity_type: parse_enum(&row.get::<String>(2)?)?,
        entity_id: row.get(3)?,
        action: parse_enum(&row.get::<String>(4)?)?,
        detail: parse_optional_json(get_opt_string(row, 5)?.as_deref())?,
        created_at: parse_datetime(&row.get::<String>(6)?)?,
    })
}

/// Insert an activity entry on `conn`, which may be inside a transaction.
pub(crate) async fn insert_activity(
    conn: &libsql::Connection,
    entry: &ActivityEntry,
) -> Result<(), DatabaseError> {
    conn.execute(
        &format!("INSERT INTO activity_log ({SELECT_COLS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"),
        libsql::params![
            entry.id.as_str(),
            entry.actor_id.as_deref(),
            entry.entity_type.as_str(),
            entry.entity_id.as_str(),
            entry.action.as_str(),
            entry.detail.as_ref().map(std::string::ToString::to_string).as_deref(),
            entry.created_at.to_rfc3339()
        ],
    )
    .await?;
    Ok(())
}

impl AuditService {
    /// Append an activity entry outside any transaction.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the INSERT fails.
    pub async fn append_activity(&self, entry: &ActivityEntry) -> Result<(), DatabaseError> {
        insert_activity(self.db().conn(), entry).await
    }

    /// Query activity entries with optional filters, newest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_activity(
        &self,
        filter: &ActivityFilter,
    ) -> Result<Vec<ActivityEntry>, DatabaseError> {
        let mut conditions = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();

        if let Some(et) = filter.entity_type {
            params.push(libsql::Value::Text(et.as_str().to_string()));
            conditions.push(format!("entity_type = ?{}", params.len()));
        }
        if let Some(ref eid) = filter.entity_id {
            params.push(libsql::Value::Text(eid.clone()));
            conditions.push(format!("entity_id = ?{}", params.len()));
        }
        if let Some(action) = filter.action {
            params.push(libsql::Value::Text(action.as_str().to_string()));
            conditions.push(format!("action = ?{}", params.len()));
        }
        if let Some(ref actor) = filter.actor_id {
            params.push(libsql::Value::Text(actor.clone()));
            conditions.push(format!("actor_id = ?{}", params.len()));
        }
        if let Some(ref audit_id) = filter.audit_id {
            params.push(libsql::Value::Text(audit_id.clone()));
            let n = params.len();
            conditions.push(format!(
                "(entity_id = ?{n}
                  OR entity_id IN (SELECT id FROM checklist_audit_items WHERE audit_id = ?{n})
                  OR entity_id IN (SELECT e.id FROM audit_evidence e
                                   JOIN checklist_audit_items i ON i.id = e.item_id
                                   WHERE i.audit_id = ?{n}))"
            ));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let limit = filter.limit.unwrap_or(100);
        let sql = format!(
            "SELECT {SELECT_COLS} FROM activity_log {where_clause}
             ORDER BY created_at DESC, rowid DESC LIMIT {limit}"
        );

        let mut rows = self
            .db()
            .conn()
            .query(&sql, libsql::params_from_iter(params))
            .await?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next().await? {
            entries.push(row_to_activity(&row)?);
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use auditdesk_core::entities::ActivityEntry;
    use auditdesk_core::enums::{ActivityAction, EntityType};
    use auditdesk_core::ids::PREFIX_ACTIVITY;
    use auditdesk_core::updates::ItemChangesBuilder;
    use chrono::Utc;

    use super::ActivityFilter;
    use crate::test_support::helpers::{seeded_audit, test_service};

    #[tokio::test]
    async fn append_and_filter() {
        let svc = test_service().await;
        for (entity_type, action) in [
            (EntityType::Template, ActivityAction::Created),
            (EntityType::Audit, ActivityAction::Created),
            (EntityType::Audit, ActivityAction::StatusChanged),
        ] {
            let id = svc.db().generate_id(PREFIX_ACTIVITY).await.unwrap();
            svc.append_activity(&ActivityEntry {
                id,
                actor_id: Some("user-1".into()),
                entity_type,
                entity_id: "x-1".into(),
                action,
                detail: Some(serde_json::json!({"k": "v"})),
                created_at: Utc::now(),
            })
            .await
            .unwrap();
        }

        let all = svc.list_activity(&ActivityFilter::default()).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].action, ActivityAction::StatusChanged);
        assert_eq!(all[0].detail, Some(serde_json::json!({"k": "v"})));

        let audits = svc
            .list_activity(&ActivityFilter {
                entity_type: Some(EntityType::Audit),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(audits.len(), 2);

        let limited = svc
            .list_activity(&ActivityFilter {
                limit: Some(1),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn audit_filter_includes_items() {
        let svc = test_service().await;
        let (audit, items) = seeded_audit(&svc, 2).await;
        svc.update_item(
            &items[0].id,
            &ItemChangesBuilder::new().observation("checked").build(),
            "user-1",
        )
        .await
        .unwrap();

        let entries = svc
            .list_activity(&ActivityFilter {
                audit_id: Some(audit.id.clone()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(entries.iter().any(|e| e.entity_id == audit.id));
        assert!(
            entries
                .iter()
                .any(|e| e.entity_id == items[0].id && e.entity_type == EntityType::Item)
        );
        assert!(entries.iter().all(|e| e.entity_type != EntityType::Template));
    }
}
