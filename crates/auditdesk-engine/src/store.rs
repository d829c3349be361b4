//! Working copies of loaded audits.
//!
//! [`AuditItemStore`] keeps one reconciled copy per audit id. Edits are
//! validated and applied locally, then handed to the [`DebouncedPersister`];
//! progress is recomputed from the full item list after every change.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use auditdesk_config::AuditDeskConfig;
use auditdesk_core::entities::{Audit, AuditItem, EvidenceRef};
use auditdesk_core::enums::{AuditStatus, ItemField};
use auditdesk_core::errors::CoreError;
use auditdesk_core::gate::{self, SubmissionBlocker};
use auditdesk_core::identity::Actor;
use auditdesk_core::progress::ProgressStats;
use auditdesk_core::repository::{AuditRepository, BlobStore, NewEvidence};
use auditdesk_core::updates::ItemChanges;
use auditdesk_storage::{content_type_for, evidence_path};
use chrono::Utc;
use tokio::sync::broadcast;

use crate::error::{EngineError, EngineResult};
use crate::events::{EngineEvent, EventBus};
use crate::import::{ImportLimits, ImportedChecklist, import_checklist};
use crate::persister::{DebouncedPersister, FailedWrite, FlushReport};

/// Runtime knobs for an [`AuditItemStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSettings {
    pub debounce_window: Duration,
    pub event_capacity: usize,
    pub evidence_prefix: String,
    pub limits: ImportLimits,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self::from(&AuditDeskConfig::default())
    }
}

impl From<&AuditDeskConfig> for StoreSettings {
    fn from(config: &AuditDeskConfig) -> Self {
        Self {
            debounce_window: config.engine.debounce_window(),
            event_capacity: config.engine.event_capacity,
            evidence_prefix: config.storage.evidence_prefix.clone(),
            limits: ImportLimits::from(&config.import),
        }
    }
}

struct LoadedAudit {
    audit: Audit,
    items: Vec<AuditItem>,
}

impl LoadedAudit {
    fn item_mut(&mut self, item_id: &str) -> EngineResult<&mut AuditItem> {
        let audit_id = &self.audit.id;
        self.items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or_else(|| EngineError::ItemNotFound {
                audit_id: audit_id.clone(),
                item_id: item_id.to_string(),
            })
    }

    fn stats(&self) -> ProgressStats {
        ProgressStats::compute(&self.items)
    }

    fn item_ids(&self) -> Vec<String> {
        self.items.iter().map(|i| i.id.clone()).collect()
    }
}

/// Only the assigned auditor may change an in-progress audit.
fn ensure_mutable(audit: &Audit, actor: &Actor) -> EngineResult<()> {
    if !audit.is_editable() {
        return Err(EngineError::AuditNotEditable {
            audit_id: audit.id.clone(),
            status: audit.status.as_str().to_string(),
        });
    }
    if !audit.is_assigned_to(actor.id()) {
        return Err(EngineError::NotAssignedAuditor {
            audit_id: audit.id.clone(),
            user_id: actor.id().to_string(),
        });
    }
    Ok(())
}

/// Drop fields that already hold the requested value.
fn effective_changes(item: &AuditItem, mut changes: ItemChanges) -> ItemChanges {
    if changes.audit_details.as_deref() == Some(item.audit_details.as_str()) {
        changes.audit_details = None;
    }
    if changes.observation.as_deref() == Some(item.observation.as_str()) {
        changes.observation = None;
    }
    if changes.remark == Some(item.remark) {
        changes.remark = None;
    }
    changes
}

pub struct AuditItemStore<R, B> {
    repo: Arc<R>,
    blobs: Arc<B>,
    persister: DebouncedPersister<R>,
    events: EventBus,
    settings: StoreSettings,
    audits: Mutex<HashMap<String, LoadedAudit>>,
}

impl<R: AuditRepository + 'static, B: BlobStore> AuditItemStore<R, B> {
    /// Must be called from within a tokio runtime once edits start.
    #[must_use]
    pub fn new(repo: Arc<R>, blobs: Arc<B>, settings: StoreSettings) -> Self {
        let events = EventBus::new(settings.event_capacity);
        let persister =
            DebouncedPersister::new(Arc::clone(&repo), events.clone(), settings.debounce_window);
        Self {
            repo,
            blobs,
            persister,
            events,
            settings,
            audits: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub const fn events(&self) -> &EventBus {
        &self.events
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    #[must_use]
    pub const fn persister(&self) -> &DebouncedPersister<R> {
        &self.persister
    }

    #[must_use]
    pub const fn settings(&self) -> &StoreSettings {
        &self.settings
    }

    fn lock_audits(&self) -> MutexGuard<'_, HashMap<String, LoadedAudit>> {
        self.audits.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_audit<T>(
        &self,
        audit_id: &str,
        f: impl FnOnce(&mut LoadedAudit) -> EngineResult<T>,
    ) -> EngineResult<T> {
        let mut audits = self.lock_audits();
        let loaded = audits
            .get_mut(audit_id)
            .ok_or_else(|| EngineError::AuditNotLoaded(audit_id.to_string()))?;
        f(loaded)
    }

    /// Replace the working copy of an audit.
    fn install(&self, audit: Audit, items: Vec<AuditItem>) {
        let audit_id = audit.id.clone();
        let loaded = LoadedAudit { audit, items };
        let stats = loaded.stats();
        let count = loaded.items.len();
        self.lock_audits().insert(audit_id.clone(), loaded);

        self.events.emit_lossy(EngineEvent::AuditLoaded {
            audit_id: audit_id.clone(),
            items: count,
        });
        self.events
            .emit_lossy(EngineEvent::ProgressChanged { audit_id, stats });
    }

    fn emit_progress(&self, audit_id: &str, stats: ProgressStats) {
        self.events.emit_lossy(EngineEvent::ProgressChanged {
            audit_id: audit_id.to_string(),
            stats,
        });
    }

    // -----------------------------------------------------------------------
    // Loading
    // -----------------------------------------------------------------------

    /// Import a checklist file and load the new audit.
    ///
    /// # Errors
    ///
    /// See [`import_checklist`].
    pub async fn import(
        &self,
        actor: &Actor,
        file_name: &str,
        bytes: &[u8],
    ) -> EngineResult<ImportedChecklist> {
        let imported =
            import_checklist(self.repo.as_ref(), actor, file_name, bytes, &self.settings.limits)
                .await?;
        self.install(imported.audit.clone(), imported.items.clone());
        Ok(imported)
    }

    /// Reconciling fetch: the stored audit and items replace the working copy.
    ///
    /// Buffered edits for the audit are flushed first so the fetch sees them.
    /// Edits whose write failed are laid back over the fetched items while the
    /// audit is still editable, so they stay visible until retried.
    ///
    /// # Errors
    ///
    /// `EngineError::PersistenceFailure` when the fetch fails.
    pub async fn load(&self, audit_id: &str) -> EngineResult<Vec<AuditItem>> {
        let ids = self
            .with_audit(audit_id, |loaded| Ok(loaded.item_ids()))
            .unwrap_or_default();
        if !ids.is_empty() {
            self.persister.flush_items(&ids).await;
        }

        let audit = self.repo.get_audit(audit_id).await?;
        let mut items = self.repo.list_items(audit_id).await?;
        if audit.is_editable() {
            for item in &mut items {
                if let Some(failed) = self.persister.failure(&item.id) {
                    item.apply(&failed.changes);
                }
            }
        }
        tracing::debug!(audit_id, items = items.len(), "loaded audit");
        self.install(audit, items.clone());
        Ok(items)
    }

    /// Load the most recently created audit owned by `actor`, if any.
    ///
    /// # Errors
    ///
    /// `EngineError::PersistenceFailure` when the fetch fails.
    pub async fn load_latest_for_actor(&self, actor: &Actor) -> EngineResult<Option<Audit>> {
        let Some(audit) = self.repo.latest_audit_for_auditor(actor.id()).await? else {
            return Ok(None);
        };
        self.load(&audit.id).await?;
        self.audit(&audit.id).map(Some)
    }

    /// # Errors
    ///
    /// `EngineError::AuditNotLoaded` if the audit has not been loaded.
    pub fn audit(&self, audit_id: &str) -> EngineResult<Audit> {
        self.with_audit(audit_id, |loaded| Ok(loaded.audit.clone()))
    }

    /// Items in `row_index` order.
    ///
    /// # Errors
    ///
    /// `EngineError::AuditNotLoaded` if the audit has not been loaded.
    pub fn items(&self, audit_id: &str) -> EngineResult<Vec<AuditItem>> {
        self.with_audit(audit_id, |loaded| Ok(loaded.items.clone()))
    }

    /// # Errors
    ///
    /// `EngineError::AuditNotLoaded` or `EngineError::ItemNotFound`.
    pub fn item(&self, audit_id: &str, item_id: &str) -> EngineResult<AuditItem> {
        self.with_audit(audit_id, |loaded| loaded.item_mut(item_id).cloned())
    }

    /// # Errors
    ///
    /// `EngineError::AuditNotLoaded` if the audit has not been loaded.
    pub fn stats(&self, audit_id: &str) -> EngineResult<ProgressStats> {
        self.with_audit(audit_id, |loaded| Ok(loaded.stats()))
    }

    // -----------------------------------------------------------------------
    // Edits
    // -----------------------------------------------------------------------

    /// Set one field from raw input.
    ///
    /// # Errors
    ///
    /// `InvalidEnumValue` for a bad remark (checked before anything else),
    /// then `AuditNotLoaded`, `AuditNotEditable`, `NotAssignedAuditor` or
    /// `ItemNotFound`.
    pub fn update_field(
        &self,
        audit_id: &str,
        item_id: &str,
        field: ItemField,
        value: &str,
        actor: &Actor,
    ) -> EngineResult<AuditItem> {
        let changes = ItemChanges::for_field(field, value)?;
        self.update_fields(audit_id, item_id, changes, actor)
    }

    /// Apply a change set locally and schedule its write.
    ///
    /// Fields already holding the requested value are ignored; a call that
    /// changes nothing schedules nothing.
    ///
    /// # Errors
    ///
    /// See [`Self::update_field`].
    pub fn update_fields(
        &self,
        audit_id: &str,
        item_id: &str,
        changes: ItemChanges,
        actor: &Actor,
    ) -> EngineResult<AuditItem> {
        let (item, changes, stats) = self.with_audit(audit_id, |loaded| {
            ensure_mutable(&loaded.audit, actor)?;
            let item = loaded.item_mut(item_id)?;
            let changes = effective_changes(item, changes);
            if !changes.is_empty() {
                item.apply(&changes);
                item.last_modified_by = Some(actor.id().to_string());
                item.updated_at = Utc::now();
            }
            let item = item.clone();
            Ok((item, changes, loaded.stats()))
        })?;

        if changes.is_empty() {
            return Ok(item);
        }

        let fields = changes.changed_fields();
        self.persister.schedule(item_id, changes, actor);
        self.events.emit_lossy(EngineEvent::ItemUpdated {
            audit_id: audit_id.to_string(),
            item_id: item_id.to_string(),
            fields,
        });
        self.emit_progress(audit_id, stats);
        Ok(item)
    }

    // -----------------------------------------------------------------------
    // Evidence
    // -----------------------------------------------------------------------

    /// Register a file that is already in object storage.
    ///
    /// # Errors
    ///
    /// Local guard errors as for [`Self::update_field`];
    /// `AuditNotEditable` or `PersistenceFailure` from the record store.
    pub async fn attach_evidence(
        &self,
        audit_id: &str,
        item_id: &str,
        evidence: NewEvidence,
        actor: &Actor,
    ) -> EngineResult<EvidenceRef> {
        self.with_audit(audit_id, |loaded| {
            ensure_mutable(&loaded.audit, actor)?;
            loaded.item_mut(item_id).map(|_| ())
        })?;

        let stored = self.repo.insert_evidence(item_id, evidence, actor).await?;

        let stats = self.with_audit(audit_id, |loaded| {
            let item = loaded.item_mut(item_id)?;
            item.evidence.push(stored.clone());
            Ok(loaded.stats())
        });
        self.events.emit_lossy(EngineEvent::EvidenceAdded {
            audit_id: audit_id.to_string(),
            item_id: item_id.to_string(),
            evidence_id: stored.id.clone(),
        });
        if let Ok(stats) = stats {
            self.emit_progress(audit_id, stats);
        }
        Ok(stored)
    }

    /// Upload `bytes` to object storage, then register the file on the item.
    ///
    /// The upload and the metadata insert are separate operations. When the
    /// insert fails the uploaded object is left behind and logged.
    ///
    /// # Errors
    ///
    /// As [`Self::attach_evidence`], plus `PersistenceFailure` for the upload.
    pub async fn add_evidence(
        &self,
        audit_id: &str,
        item_id: &str,
        file_name: &str,
        bytes: Vec<u8>,
        actor: &Actor,
    ) -> EngineResult<EvidenceRef> {
        self.with_audit(audit_id, |loaded| {
            ensure_mutable(&loaded.audit, actor)?;
            loaded.item_mut(item_id).map(|_| ())
        })?;

        let path = evidence_path(
            &self.settings.evidence_prefix,
            item_id,
            file_name,
            Utc::now().timestamp_millis(),
        );
        let size = bytes.len();
        self.blobs
            .put(&path, bytes)
            .await
            .map_err(EngineError::PersistenceFailure)?;
        tracing::debug!(item_id, path = %path, size, "uploaded evidence");

        let evidence = NewEvidence {
            file_name: file_name.to_string(),
            file_path: path.clone(),
            file_type: content_type_for(file_name).map(str::to_string),
        };
        self.attach_evidence(audit_id, item_id, evidence, actor)
            .await
            .inspect_err(|err| {
                tracing::warn!(item_id, path = %path, error = %err, "evidence object orphaned");
            })
    }

    /// Detach one evidence file from an item. The stored object is kept.
    ///
    /// # Errors
    ///
    /// Local guard errors, `EvidenceNotFound` when the item has no such
    /// evidence, or record store errors.
    pub async fn remove_evidence(
        &self,
        audit_id: &str,
        item_id: &str,
        evidence_id: &str,
        actor: &Actor,
    ) -> EngineResult<()> {
        self.with_audit(audit_id, |loaded| {
            ensure_mutable(&loaded.audit, actor)?;
            let item = loaded.item_mut(item_id)?;
            if item.evidence.iter().any(|e| e.id == evidence_id) {
                Ok(())
            } else {
                Err(EngineError::EvidenceNotFound {
                    item_id: item_id.to_string(),
                    evidence_id: evidence_id.to_string(),
                })
            }
        })?;

        self.repo.delete_evidence(evidence_id, actor).await?;

        let stats = self.with_audit(audit_id, |loaded| {
            let item = loaded.item_mut(item_id)?;
            item.evidence.retain(|e| e.id != evidence_id);
            Ok(loaded.stats())
        });
        self.events.emit_lossy(EngineEvent::EvidenceRemoved {
            audit_id: audit_id.to_string(),
            item_id: item_id.to_string(),
            evidence_id: evidence_id.to_string(),
        });
        if let Ok(stats) = stats {
            self.emit_progress(audit_id, stats);
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Submission
    // -----------------------------------------------------------------------

    /// Gate verdict on the working copy.
    ///
    /// # Errors
    ///
    /// `EngineError::AuditNotLoaded` if the audit has not been loaded.
    pub fn submission_blocker(&self, audit_id: &str) -> EngineResult<Option<SubmissionBlocker>> {
        self.with_audit(audit_id, |loaded| Ok(gate::evaluate(&loaded.items).err()))
    }

    /// # Errors
    ///
    /// `EngineError::AuditNotLoaded` if the audit has not been loaded.
    pub fn can_submit(&self, audit_id: &str) -> EngineResult<bool> {
        self.with_audit(audit_id, |loaded| Ok(gate::can_submit(&loaded.items)))
    }

    /// Move the audit to `submitted`.
    ///
    /// The gate is checked on the working copy, buffered writes are flushed,
    /// the audit is re-fetched and the gate checked again on stored state
    /// before the compare-and-set transition.
    ///
    /// # Errors
    ///
    /// `IncompleteAudit` or `MissingEvidence` when the gate fails,
    /// `AuditNotEditable` when the audit already left `in_progress`,
    /// `PersistenceFailure` when a flush or fetch fails.
    pub async fn submit(&self, audit_id: &str, actor: &Actor) -> EngineResult<Audit> {
        let ids = self.with_audit(audit_id, |loaded| {
            ensure_mutable(&loaded.audit, actor)?;
            gate::evaluate(&loaded.items)?;
            Ok(loaded.item_ids())
        })?;

        let report = self.persister.flush_items(&ids).await;
        if let Some(failed) = report.failed.first() {
            tracing::warn!(audit_id, item_id = %failed.item_id, "submit aborted by failed write");
            return Err(EngineError::PersistenceFailure(CoreError::Backend(format!(
                "write for item {} failed: {}",
                failed.item_id, failed.error
            ))));
        }

        let audit = self.repo.get_audit(audit_id).await?;
        let items = self.repo.list_items(audit_id).await?;
        self.install(audit.clone(), items.clone());
        ensure_mutable(&audit, actor)?;
        gate::evaluate(&items)?;

        let submitted = self
            .repo
            .update_audit_status(audit_id, AuditStatus::InProgress, AuditStatus::Submitted, actor)
            .await?;
        self.with_audit(audit_id, |loaded| {
            loaded.audit = submitted.clone();
            Ok(())
        })?;

        tracing::info!(audit_id, items = items.len(), "audit submitted");
        self.events.emit_lossy(EngineEvent::AuditSubmitted {
            audit_id: audit_id.to_string(),
        });
        Ok(submitted)
    }

    // -----------------------------------------------------------------------
    // Write-behind control
    // -----------------------------------------------------------------------

    /// Write buffered edits of one audit now.
    ///
    /// # Errors
    ///
    /// `EngineError::AuditNotLoaded` if the audit has not been loaded.
    pub async fn flush(&self, audit_id: &str) -> EngineResult<FlushReport> {
        let ids = self.with_audit(audit_id, |loaded| Ok(loaded.item_ids()))?;
        Ok(self.persister.flush_items(&ids).await)
    }

    pub async fn flush_all(&self) -> FlushReport {
        self.persister.flush_all().await
    }

    /// Reschedule the failed write of an item. `false` if there is none.
    pub fn retry_failed(&self, item_id: &str) -> bool {
        self.persister.retry_failed(item_id)
    }

    #[must_use]
    pub fn failed_writes(&self) -> Vec<FailedWrite> {
        self.persister.failed_writes()
    }
}
