use anyhow::Context;
use auditdesk_core::entities::Audit;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::ImportArgs;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct DriftRow {
    row_index: usize,
    missing: Vec<String>,
    extra: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ImportResponse {
    audit: Audit,
    template_id: String,
    items: usize,
    columns: Vec<String>,
    drift: Vec<DriftRow>,
}

/// Handle `auditdesk import`.
pub async fn handle(args: &ImportArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let file_name = args
        .file
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("invalid file name: {}", args.file.display()))?;
    if !auditdesk_sheet::accepted_extension(file_name) {
        anyhow::bail!(
            "unsupported checklist file '{file_name}' (expected one of: {})",
            auditdesk_sheet::ACCEPTED_EXTENSIONS.join(", ")
        );
    }

    let bytes = tokio::fs::read(&args.file)
        .await
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let imported = ctx
        .store
        .import(&ctx.actor, file_name, &bytes)
        .await
        .with_context(|| format!("failed to import {file_name}"))?;

    let columns = imported
        .template
        .structure
        .first()
        .map(|row| row.columns().map(str::to_string).collect())
        .unwrap_or_default();

    output(
        &ImportResponse {
            template_id: imported.template.id,
            items: imported.items.len(),
            columns,
            drift: imported
                .drift
                .into_iter()
                .map(|d| DriftRow {
                    row_index: d.row_index,
                    missing: d.missing,
                    extra: d.extra,
                })
                .collect(),
            audit: imported.audit,
        },
        flags.format,
    )
}
