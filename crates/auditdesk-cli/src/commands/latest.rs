use auditdesk_core::entities::Audit;
use auditdesk_core::progress::ProgressStats;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct LatestResponse {
    #[serde(flatten)]
    audit: Audit,
    #[serde(flatten)]
    stats: ProgressStats,
}

/// Handle `auditdesk latest`.
pub async fn handle(ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let Some(audit) = ctx.store.load_latest_for_actor(&ctx.actor).await? else {
        if !flags.quiet {
            eprintln!("no audits found for user {}", ctx.actor.id());
        }
        return Ok(());
    };
    let stats = ctx.store.stats(&audit.id)?;
    output(&LatestResponse { audit, stats }, flags.format)
}
