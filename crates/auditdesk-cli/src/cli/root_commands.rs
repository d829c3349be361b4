use std::path::PathBuf;

use auditdesk_core::enums::ItemField;
use clap::{Args, Subcommand};

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Import a checklist (xlsx, xls, ods, csv) as a new audit.
    Import(ImportArgs),
    /// Show the items of an audit.
    Show(AuditArgs),
    /// Progress statistics and submission readiness.
    Stats(AuditArgs),
    /// Set one field of an audit item.
    Set(SetArgs),
    /// Upload a file as evidence for an item.
    Attach(AttachArgs),
    /// Remove an evidence file from an item.
    Detach(DetachArgs),
    /// Submit an audit for review.
    Submit(AuditArgs),
    /// Show the most recent audit of the acting user.
    Latest,
    /// Activity log of an audit.
    Activity(ActivityArgs),
}

#[derive(Clone, Debug, Args)]
pub struct ImportArgs {
    /// Checklist file to import.
    pub file: PathBuf,
}

#[derive(Clone, Debug, Args)]
pub struct AuditArgs {
    pub audit_id: String,
}

#[derive(Clone, Debug, Args)]
pub struct SetArgs {
    pub audit_id: String,
    pub item_id: String,
    /// audit-details, observation or remark
    #[arg(value_parser = parse_item_field)]
    pub field: ItemField,
    /// New value. Remarks: yes, no, not_applicable, unavailable, or "" to clear.
    #[arg(allow_hyphen_values = true)]
    pub value: String,
}

#[derive(Clone, Debug, Args)]
pub struct AttachArgs {
    pub audit_id: String,
    pub item_id: String,
    pub file: PathBuf,
}

#[derive(Clone, Debug, Args)]
pub struct DetachArgs {
    pub audit_id: String,
    pub item_id: String,
    pub evidence_id: String,
}

#[derive(Clone, Debug, Args)]
pub struct ActivityArgs {
    pub audit_id: String,
    /// Max entries to return
    #[arg(short, long)]
    pub limit: Option<u32>,
}

fn parse_item_field(value: &str) -> Result<ItemField, String> {
    value.parse::<ItemField>().map_err(|e| e.to_string())
}
