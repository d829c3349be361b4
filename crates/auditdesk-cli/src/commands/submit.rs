use crate::cli::GlobalFlags;
use crate::cli::root_commands::AuditArgs;
use crate::context::AppContext;
use crate::output::output;

/// Handle `auditdesk submit`.
pub async fn handle(args: &AuditArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    ctx.store.load(&args.audit_id).await?;
    let audit = ctx.store.submit(&args.audit_id, &ctx.actor).await?;
    output(&audit, flags.format)
}
