use auditdesk_core::enums::AuditStatus;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::AuditArgs;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct StatsResponse {
    audit_id: String,
    status: AuditStatus,
    total: usize,
    completed: usize,
    issues: usize,
    evidence_count: usize,
    completion_percent: u8,
    can_submit: bool,
    /// Why submission is blocked, if it is.
    blocker: Option<String>,
}

/// Handle `auditdesk stats`.
pub async fn handle(args: &AuditArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    ctx.store.load(&args.audit_id).await?;
    let audit = ctx.store.audit(&args.audit_id)?;
    let stats = ctx.store.stats(&args.audit_id)?;
    let blocker = ctx.store.submission_blocker(&args.audit_id)?;

    output(
        &StatsResponse {
            audit_id: audit.id,
            status: audit.status,
            total: stats.total,
            completed: stats.completed,
            issues: stats.issues,
            evidence_count: stats.evidence_count,
            completion_percent: stats.completion_percent,
            can_submit: audit.status.is_editable() && blocker.is_none(),
            blocker: blocker.map(|b| b.to_string()),
        },
        flags.format,
    )
}
