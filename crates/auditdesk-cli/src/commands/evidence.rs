use anyhow::Context;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::{AttachArgs, DetachArgs};
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct DetachResponse {
    item_id: String,
    evidence_id: String,
    removed: bool,
}

/// Handle `auditdesk attach`.
pub async fn handle_attach(
    args: &AttachArgs,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let file_name = args
        .file
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("invalid file name: {}", args.file.display()))?;
    let bytes = tokio::fs::read(&args.file)
        .await
        .with_context(|| format!("failed to read {}", args.file.display()))?;

    ctx.store.load(&args.audit_id).await?;
    let evidence = ctx
        .store
        .add_evidence(&args.audit_id, &args.item_id, file_name, bytes, &ctx.actor)
        .await?;
    output(&evidence, flags.format)
}

/// Handle `auditdesk detach`.
pub async fn handle_detach(
    args: &DetachArgs,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    ctx.store.load(&args.audit_id).await?;
    ctx.store
        .remove_evidence(&args.audit_id, &args.item_id, &args.evidence_id, &ctx.actor)
        .await?;
    output(
        &DetachResponse {
            item_id: args.item_id.clone(),
            evidence_id: args.evidence_id.clone(),
            removed: true,
        },
        flags.format,
    )
}
