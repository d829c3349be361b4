use auditdesk_core::entities::AuditItem;
use serde::Serialize;

use crate::cli::root_commands::AuditArgs;
use crate::cli::{GlobalFlags, OutputFormat};
use crate::context::AppContext;
use crate::output::output;

/// One line of the item table.
#[derive(Debug, Serialize)]
struct ItemRow {
    row: u32,
    id: String,
    question: String,
    remark: String,
    evidence: usize,
    observation: String,
}

impl ItemRow {
    fn from_item(item: &AuditItem) -> Self {
        // The first column of the sheet usually carries the question.
        let question = item
            .original_data
            .iter()
            .next()
            .map(|(_, cell)| cell.display_text())
            .unwrap_or_default();
        Self {
            row: item.row_index,
            id: item.id.clone(),
            question,
            remark: item
                .remark
                .map_or_else(|| String::from("-"), |r| r.as_str().to_string()),
            evidence: item.evidence.len(),
            observation: item.observation.clone(),
        }
    }
}

/// Handle `auditdesk show`.
pub async fn handle(args: &AuditArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let items = ctx.store.load(&args.audit_id).await?;
    match flags.format {
        OutputFormat::Json => output(&items, flags.format),
        OutputFormat::Table => {
            let rows: Vec<ItemRow> = items.iter().map(ItemRow::from_item).collect();
            output(&rows, flags.format)
        }
    }
}
