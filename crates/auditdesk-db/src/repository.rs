//! `AuditRepository` on top of the libSQL service.
//!
//! Thin delegation: each trait method calls the matching repo method and
//! converts `DatabaseError` into `CoreError`.

use auditdesk_core::entities::{Audit, AuditItem, EvidenceRef, Template};
use auditdesk_core::enums::AuditStatus;
use auditdesk_core::errors::CoreResult;
use auditdesk_core::identity::Actor;
use auditdesk_core::repository::{
    AuditRepository, NewAudit, NewAuditItem, NewEvidence, NewTemplate,
};
use auditdesk_core::updates::ItemChanges;

use crate::service::AuditService;

impl AuditRepository for AuditService {
    async fn insert_template(&self, input: NewTemplate) -> CoreResult<Template> {
        Ok(self.create_template(input).await?)
    }

    async fn insert_audit(&self, input: NewAudit) -> CoreResult<Audit> {
        Ok(self.create_audit(input).await?)
    }

    async fn insert_items(
        &self,
        audit_id: &str,
        items: Vec<NewAuditItem>,
        actor: &Actor,
    ) -> CoreResult<Vec<AuditItem>> {
        Ok(self.create_items(audit_id, items, actor.id()).await?)
    }

    async fn discard_import(
        &self,
        template_id: &str,
        audit_id: Option<&str>,
        actor: &Actor,
    ) -> CoreResult<()> {
        Ok(Self::discard_import(self, template_id, audit_id, actor.id()).await?)
    }

    async fn get_audit(&self, audit_id: &str) -> CoreResult<Audit> {
        Ok(Self::get_audit(self, audit_id).await?)
    }

    async fn latest_audit_for_auditor(&self, auditor_id: &str) -> CoreResult<Option<Audit>> {
        Ok(self.latest_audit(auditor_id).await?)
    }

    async fn list_items(&self, audit_id: &str) -> CoreResult<Vec<AuditItem>> {
        Ok(Self::list_items(self, audit_id).await?)
    }

    async fn update_item_fields(
        &self,
        item_id: &str,
        changes: &ItemChanges,
        actor: &Actor,
    ) -> CoreResult<()> {
        Ok(self.update_item(item_id, changes, actor.id()).await?)
    }

    async fn insert_evidence(
        &self,
        item_id: &str,
        input: NewEvidence,
        actor: &Actor,
    ) -> CoreResult<EvidenceRef> {
        Ok(self.create_evidence(item_id, input, actor.id()).await?)
    }

    async fn delete_evidence(&self, evidence_id: &str, actor: &Actor) -> CoreResult<()> {
        Ok(Self::delete_evidence(self, evidence_id, actor.id()).await?)
    }

    async fn update_audit_status(
        &self,
        audit_id: &str,
        from: AuditStatus,
        to: AuditStatus,
        actor: &Actor,
    ) -> CoreResult<Audit> {
        Ok(self.transition_audit(audit_id, from, to, actor.id()).await?)
    }
}
