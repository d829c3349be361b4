use crate::cli::GlobalFlags;
use crate::cli::root_commands::SetArgs;
use crate::context::AppContext;
use crate::output::output;

/// Handle `auditdesk set`.
///
/// The write is buffered by the engine and goes out with the final flush.
pub async fn handle(args: &SetArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    ctx.store.load(&args.audit_id).await?;
    let item = ctx.store.update_field(
        &args.audit_id,
        &args.item_id,
        args.field,
        &args.value,
        &ctx.actor,
    )?;
    if flags.quiet {
        return Ok(());
    }
    output(&item, flags.format)
}
