use auditdesk_db::repos::activity::ActivityFilter;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::ActivityArgs;
use crate::context::AppContext;
use crate::output::output;

/// Handle `auditdesk activity`.
pub async fn handle(
    args: &ActivityArgs,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let entries = ctx
        .service
        .list_activity(&ActivityFilter {
            audit_id: Some(args.audit_id.clone()),
            limit: args.limit,
            ..Default::default()
        })
        .await?;
    output(&entries, flags.format)
}
