//! Collaborator traits for the record store and the object store.
//!
//! The engine is written against these traits only. `auditdesk-db` implements
//! [`AuditRepository`] on libSQL and `auditdesk-storage` implements
//! [`BlobStore`] on `object_store`. All operations are async and return
//! futures that are `Send`, so callers can drive them from spawned tasks.

use crate::cell::RowRecord;
use crate::entities::{Audit, AuditItem, EvidenceRef, Template};
use crate::enums::AuditStatus;
use crate::errors::CoreResult;
use crate::identity::Actor;
use crate::updates::ItemChanges;

/// Input for a new checklist template.
#[derive(Debug, Clone)]
pub struct NewTemplate {
    pub title: String,
    pub description: Option<String>,
    pub structure: Vec<RowRecord>,
    pub created_by: String,
}

/// Input for a new audit. Audits always start `in_progress`.
#[derive(Debug, Clone)]
pub struct NewAudit {
    pub template_id: String,
    pub title: String,
    pub auditor_id: String,
}

/// Input for one imported row.
#[derive(Debug, Clone)]
pub struct NewAuditItem {
    pub row_index: u32,
    pub original_data: RowRecord,
}

/// Metadata for a file already placed in object storage.
#[derive(Debug, Clone)]
pub struct NewEvidence {
    pub file_name: String,
    pub file_path: String,
    pub file_type: Option<String>,
}

// ---------------------------------------------------------------------------
// Record store
// ---------------------------------------------------------------------------

pub trait AuditRepository: Send + Sync {
    fn insert_template(
        &self,
        input: NewTemplate,
    ) -> impl Future<Output = CoreResult<Template>> + Send;

    fn insert_audit(&self, input: NewAudit) -> impl Future<Output = CoreResult<Audit>> + Send;

    /// Insert all rows of an import. Items come back ordered by `row_index`.
    fn insert_items(
        &self,
        audit_id: &str,
        items: Vec<NewAuditItem>,
        actor: &Actor,
    ) -> impl Future<Output = CoreResult<Vec<AuditItem>>> + Send;

    /// Remove what a failed import already wrote: the items of `audit_id`,
    /// the audit itself and the template. Used as compensation so a half
    /// finished import is never visible.
    fn discard_import(
        &self,
        template_id: &str,
        audit_id: Option<&str>,
        actor: &Actor,
    ) -> impl Future<Output = CoreResult<()>> + Send;

    fn get_audit(&self, audit_id: &str) -> impl Future<Output = CoreResult<Audit>> + Send;

    /// Most recently created audit owned by `auditor_id`, if any.
    fn latest_audit_for_auditor(
        &self,
        auditor_id: &str,
    ) -> impl Future<Output = CoreResult<Option<Audit>>> + Send;

    /// All items of an audit ordered by `row_index`, each with its evidence.
    fn list_items(
        &self,
        audit_id: &str,
    ) -> impl Future<Output = CoreResult<Vec<AuditItem>>> + Send;

    /// Write changed fields of one item.
    ///
    /// Implementations must reject the write with `CoreError::Locked` when the
    /// parent audit is no longer editable.
    fn update_item_fields(
        &self,
        item_id: &str,
        changes: &ItemChanges,
        actor: &Actor,
    ) -> impl Future<Output = CoreResult<()>> + Send;

    fn insert_evidence(
        &self,
        item_id: &str,
        input: NewEvidence,
        actor: &Actor,
    ) -> impl Future<Output = CoreResult<EvidenceRef>> + Send;

    fn delete_evidence(
        &self,
        evidence_id: &str,
        actor: &Actor,
    ) -> impl Future<Output = CoreResult<()>> + Send;

    /// Move an audit from `from` to `to`. Fails with
    /// `CoreError::InvalidTransition` when the stored status is not `from` or
    /// the transition is not allowed.
    fn update_audit_status(
        &self,
        audit_id: &str,
        from: AuditStatus,
        to: AuditStatus,
        actor: &Actor,
    ) -> impl Future<Output = CoreResult<Audit>> + Send;
}

// ---------------------------------------------------------------------------
// Object store
// ---------------------------------------------------------------------------

pub trait BlobStore: Send + Sync {
    fn put(&self, path: &str, bytes: Vec<u8>) -> impl Future<Output = CoreResult<()>> + Send;

    fn get(&self, path: &str) -> impl Future<Output = CoreResult<Vec<u8>>> + Send;

    fn exists(&self, path: &str) -> impl Future<Output = CoreResult<bool>> + Send;
}
