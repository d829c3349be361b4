//! Checklist import: file bytes to template, audit and items.

use auditdesk_config::ImportConfig;
use auditdesk_core::entities::{Audit, AuditItem, Template};
use auditdesk_core::errors::CoreError;
use auditdesk_core::identity::Actor;
use auditdesk_core::repository::{AuditRepository, NewAudit, NewAuditItem, NewTemplate};
use auditdesk_sheet::ColumnDrift;

use crate::error::{EngineError, EngineResult};

/// Limits applied to an uploaded checklist before parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportLimits {
    pub max_file_bytes: usize,
}

impl Default for ImportLimits {
    fn default() -> Self {
        Self::from(&ImportConfig::default())
    }
}

impl From<&ImportConfig> for ImportLimits {
    fn from(config: &ImportConfig) -> Self {
        Self {
            max_file_bytes: config.max_file_bytes,
        }
    }
}

/// Everything created by one import.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedChecklist {
    pub template: Template,
    pub audit: Audit,
    /// Ordered by `row_index`.
    pub items: Vec<AuditItem>,
    /// Rows whose columns differ from the first row's.
    pub drift: Vec<ColumnDrift>,
}

/// `"site-a.xlsx"` -> `"site-a"`. Only the last extension is removed.
pub(crate) fn file_stem(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < file_name.len() => &file_name[..idx],
        _ => file_name,
    }
}

/// Undo the records a failed import already wrote so the user never sees a
/// template or an audit without its items. The original error is returned
/// whether or not the cleanup succeeds.
async fn abandon<R: AuditRepository>(
    repo: &R,
    actor: &Actor,
    template_id: &str,
    audit_id: Option<&str>,
    cause: CoreError,
) -> EngineError {
    tracing::error!(template_id, audit_id = ?audit_id, error = %cause, "checklist import failed");
    if let Err(err) = repo.discard_import(template_id, audit_id, actor).await {
        tracing::error!(
            template_id,
            audit_id = ?audit_id,
            error = %err,
            "partial checklist import left behind"
        );
    }
    EngineError::PersistenceFailure(cause)
}

/// Parse `bytes` and create a template, an in-progress audit owned by
/// `actor`, and one unset item per data row.
///
/// Parsing happens before anything is written, so a malformed file leaves
/// no trace in the record store. A failed insert discards whatever the
/// import had already written.
///
/// # Errors
///
/// `EngineError::Parse` for unreadable or oversized input,
/// `EngineError::PersistenceFailure` when an insert fails.
pub async fn import_checklist<R: AuditRepository>(
    repo: &R,
    actor: &Actor,
    file_name: &str,
    bytes: &[u8],
    limits: &ImportLimits,
) -> EngineResult<ImportedChecklist> {
    let parsed = auditdesk_sheet::parse_with_limit(bytes, limits.max_file_bytes)?;
    for drift in &parsed.drift {
        tracing::warn!(
            file_name,
            row_index = drift.row_index,
            missing = ?drift.missing,
            extra = ?drift.extra,
            "checklist row columns differ from header row"
        );
    }

    let stem = file_stem(file_name);
    let template = repo
        .insert_template(NewTemplate {
            title: stem.to_string(),
            description: Some(format!("Uploaded checklist from {file_name}")),
            structure: parsed.records.clone(),
            created_by: actor.id().to_string(),
        })
        .await
        .map_err(EngineError::PersistenceFailure)?;

    let audit = match repo
        .insert_audit(NewAudit {
            template_id: template.id.clone(),
            title: format!("Audit - {stem}"),
            auditor_id: actor.id().to_string(),
        })
        .await
    {
        Ok(audit) => audit,
        Err(err) => return Err(abandon(repo, actor, &template.id, None, err).await),
    };

    let rows: Vec<NewAuditItem> = (0u32..)
        .zip(parsed.records)
        .map(|(row_index, original_data)| NewAuditItem {
            row_index,
            original_data,
        })
        .collect();

    let items = match repo.insert_items(&audit.id, rows, actor).await {
        Ok(items) => items,
        Err(err) => {
            return Err(abandon(repo, actor, &template.id, Some(&audit.id), err).await);
        }
    };

    tracing::info!(
        audit_id = %audit.id,
        template_id = %template.id,
        file_name,
        rows = items.len(),
        drift = parsed.drift.len(),
        "imported checklist"
    );

    Ok(ImportedChecklist {
        template,
        audit,
        items,
        drift: parsed.drift,
    })
}
