//! Typed activity detail payloads.
//!
//! Each activity action can carry a structured `detail` JSON blob. These types
//! fix the shape of the common ones.

use serde::{Deserialize, Serialize};

/// Detail for `ActivityAction::StatusChanged`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusChangedDetail {
    pub from: String,
    pub to: String,
}

/// Detail for `ActivityAction::Imported`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImportedDetail {
    pub template_id: String,
    pub rows: usize,
}

/// Detail for `ActivityAction::EvidenceAttached` and `ActivityAction::EvidenceRemoved`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EvidenceDetail {
    pub evidence_id: String,
    pub file_name: String,
    pub file_path: String,
}

/// Detail for `ActivityAction::Discarded`, logged against the template.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiscardedDetail {
    pub audit_id: Option<String>,
    pub items: u64,
}
