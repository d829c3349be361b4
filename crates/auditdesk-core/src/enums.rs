//! Status enums, remark values, editable fields and activity kinds.
//!
//! All enums use `snake_case` serialization via `#[serde(rename_all = "snake_case")]`.
//! `AuditStatus` provides `allowed_next_states()` to enforce valid transitions at
//! the application layer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::CoreError;

// ---------------------------------------------------------------------------
// Remark
// ---------------------------------------------------------------------------

/// Auditor's categorical finding for a checklist row.
///
/// The "unset" state is represented as `Option<Remark>::None` on the item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Remark {
    Yes,
    No,
    NotApplicable,
    Unavailable,
}

impl Remark {
    pub const ALL: [Self; 4] = [Self::Yes, Self::No, Self::NotApplicable, Self::Unavailable];

    /// Return the string representation used in SQL storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Yes => "yes",
            Self::No => "no",
            Self::NotApplicable => "not_applicable",
            Self::Unavailable => "unavailable",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Yes => "Yes",
            Self::No => "No",
            Self::NotApplicable => "Not Applicable",
            Self::Unavailable => "Unavailable",
        }
    }

    /// A "no" remark is a non-compliance finding and needs evidence.
    #[must_use]
    pub const fn requires_evidence(self) -> bool {
        matches!(self, Self::No)
    }

    /// Parse a remark as entered by the auditor, where `""` and `"unset"`
    /// clear the remark.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidEnumValue` for anything outside the
    /// allowed set.
    pub fn parse_optional(value: &str) -> Result<Option<Self>, CoreError> {
        match value.trim() {
            "" | "unset" => Ok(None),
            other => other.parse().map(Some),
        }
    }
}

impl FromStr for Remark {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| CoreError::InvalidEnumValue {
                field: ItemField::Remark.as_str().to_string(),
                value: s.to_string(),
            })
    }
}

impl fmt::Display for Remark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// AuditStatus
// ---------------------------------------------------------------------------

/// Status of a checklist audit.
///
/// ```text
/// in_progress → submitted → reviewed → approved
/// ```
///
/// The engine only drives `in_progress → submitted`; the later states belong
/// to the external review workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditStatus {
    InProgress,
    Submitted,
    Reviewed,
    Approved,
}

impl AuditStatus {
    /// Valid next states from the current state.
    #[must_use]
    pub const fn allowed_next_states(self) -> &'static [Self] {
        match self {
            Self::InProgress => &[Self::Submitted],
            Self::Submitted => &[Self::Reviewed],
            Self::Reviewed => &[Self::Approved],
            Self::Approved => &[],
        }
    }

    /// Check whether transitioning to `next` is allowed.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next_states().contains(&next)
    }

    /// Items and evidence may only change while the audit is in progress.
    #[must_use]
    pub const fn is_editable(self) -> bool {
        matches!(self, Self::InProgress)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::Submitted => "submitted",
            Self::Reviewed => "reviewed",
            Self::Approved => "approved",
        }
    }
}

impl fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ItemField
// ---------------------------------------------------------------------------

/// Auditor-editable fields of an audit item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemField {
    AuditDetails,
    Observation,
    Remark,
}

impl ItemField {
    pub const ALL: [Self; 3] = [Self::AuditDetails, Self::Observation, Self::Remark];

    /// Column name in storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AuditDetails => "audit_details",
            Self::Observation => "observation",
            Self::Remark => "remark",
        }
    }

    /// Whether the field only accepts a fixed set of values.
    #[must_use]
    pub const fn is_enumerated(self) -> bool {
        matches!(self, Self::Remark)
    }
}

impl FromStr for ItemField {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace('-', "_").to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|f| f.as_str() == normalized)
            .ok_or_else(|| CoreError::Validation(format!("unknown item field '{s}'")))
    }
}

impl fmt::Display for ItemField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// EntityType
// ---------------------------------------------------------------------------

/// Type of persisted entity, used in the activity log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Template,
    Audit,
    Item,
    Evidence,
}

impl EntityType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Template => "template",
            Self::Audit => "audit",
            Self::Item => "item",
            Self::Evidence => "evidence",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ActivityAction
// ---------------------------------------------------------------------------

/// Type of action recorded in the activity log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
    Created,
    Imported,
    Updated,
    EvidenceAttached,
    EvidenceRemoved,
    StatusChanged,
    /// Records of an import that failed part-way were removed.
    Discarded,
}

impl ActivityAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Imported => "imported",
            Self::Updated => "updated",
            Self::EvidenceAttached => "evidence_attached",
            Self::EvidenceRemoved => "evidence_removed",
            Self::StatusChanged => "status_changed",
            Self::Discarded => "discarded",
        }
    }
}

impl fmt::Display for ActivityAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
