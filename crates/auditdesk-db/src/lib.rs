//! # auditdesk-db
//!
//! libSQL persistence for AuditDesk: checklist templates, audits, audit items,
//! evidence metadata and the activity log.
//!
//! [`service::AuditService`] hosts the repository methods and implements
//! [`auditdesk_core::repository::AuditRepository`] for the engine.

pub mod error;
pub mod helpers;
mod migrations;
pub mod repos;
mod repository;
pub mod service;
mod test_support;

use error::DatabaseError;
use libsql::Builder;

/// Database handle: a libSQL database and one connection.
pub struct AuditDb {
    #[allow(dead_code)]
    db: libsql::Database,
    conn: libsql::Connection,
}

impl AuditDb {
    /// Open a local database at the given path, or `":memory:"`.
    ///
    /// Runs migrations automatically on first open.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or
    /// migrations fail.
    pub async fn open_local(path: &str) -> Result<Self, DatabaseError> {
        let db = Builder::new_local(path).build().await?;
        let conn = db.connect()?;

        // Enable foreign keys (must be per-connection in SQLite)
        conn.execute("PRAGMA foreign_keys = ON", ())
            .await
            .map_err(|e| DatabaseError::Migration(format!("PRAGMA foreign_keys: {e}")))?;

        let audit_db = Self { db, conn };
        audit_db.run_migrations().await?;
        tracing::debug!(path, "opened audit database");
        Ok(audit_db)
    }

    /// Access the underlying libSQL connection for direct queries.
    #[must_use]
    pub const fn conn(&self) -> &libsql::Connection {
        &self.conn
    }

    /// Generate a prefixed ID via libSQL. Returns e.g., `"itm-a3f8b2c1"`.
    ///
    /// Uses `randomblob(4)` in SQL to produce 8-char hex, then prepends the prefix.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails or returns no rows.
    pub async fn generate_id(&self, prefix: &str) -> Result<String, DatabaseError> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT '{prefix}-' || lower(hex(randomblob(4)))"),
                (),
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        Ok(row.get::<String>(0)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use auditdesk_core::ids::{ALL_PREFIXES, PREFIX_ITEM, has_prefix};
    use std::collections::HashSet;

    async fn test_db() -> AuditDb {
        AuditDb::open_local(":memory:").await.unwrap()
    }

    #[tokio::test]
    async fn open_local_creates_schema() {
        let db = test_db().await;
        let tables = [
            "checklist_templates",
            "checklist_audits",
            "checklist_audit_items",
            "audit_evidence",
            "activity_log",
        ];
        for table in &tables {
            let mut rows = db
                .conn()
                .query(
                    "SELECT name FROM sqlite_master WHERE type='table' AND name=?1",
                    [*table],
                )
                .await
                .unwrap();
            let row = rows.next().await.unwrap();
            assert!(row.is_some(), "table '{table}' should exist");
        }
    }

    #[tokio::test]
    async fn migrations_are_idempotent() {
        let db = test_db().await;
        db.run_migrations().await.unwrap();
        db.run_migrations().await.unwrap();
    }

    #[tokio::test]
    async fn generate_id_format() {
        let db = test_db().await;
        for prefix in ALL_PREFIXES {
            let id = db.generate_id(prefix).await.unwrap();
            assert!(has_prefix(&id, prefix), "{id} should start with {prefix}-");
            assert_eq!(id.len(), prefix.len() + 1 + 8);
        }
    }

    #[tokio::test]
    async fn generate_id_is_unique() {
        let db = test_db().await;
        let mut ids = HashSet::new();
        for _ in 0..200 {
            assert!(ids.insert(db.generate_id(PREFIX_ITEM).await.unwrap()));
        }
    }

    #[tokio::test]
    async fn file_database_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audits.db");
        let path = path.to_str().unwrap();

        {
            let db = AuditDb::open_local(path).await.unwrap();
            db.conn()
                .execute(
                    "INSERT INTO checklist_templates (id, title, created_by, created_at)
                     VALUES ('tpl-00000001', 'safety', 'user-1', '2026-01-01 00:00:00')",
                    (),
                )
                .await
                .unwrap();
        }

        let db = AuditDb::open_local(path).await.unwrap();
        let mut rows = db
            .conn()
            .query("SELECT count(*) FROM checklist_templates", ())
            .await
            .unwrap();
        let row = rows.next().await.unwrap().unwrap();
        assert_eq!(row.get::<i64>(0).unwrap(), 1);
    }
}
