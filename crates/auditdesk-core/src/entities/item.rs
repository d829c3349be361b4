use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cell::RowRecord;
use crate::entities::EvidenceRef;
use crate::enums::Remark;
use crate::updates::ItemChanges;

/// One checklist row bound into an audit.
///
/// `id`, `row_index` and `original_data` are fixed at import. The auditor
/// fills in `audit_details`, `observation` and `remark`, and attaches evidence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditItem {
    pub id: String,
    pub audit_id: String,
    pub row_index: u32,
    pub original_data: RowRecord,
    pub audit_details: String,
    pub observation: String,
    /// `None` means unset.
    pub remark: Option<Remark>,
    pub evidence: Vec<EvidenceRef>,
    pub last_modified_by: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl AuditItem {
    /// An item counts as completed once a remark is set.
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        self.remark.is_some()
    }

    /// A "no" remark without any evidence attached.
    #[must_use]
    pub fn lacks_required_evidence(&self) -> bool {
        self.remark.is_some_and(Remark::requires_evidence) && self.evidence.is_empty()
    }

    /// Apply field changes in place.
    pub fn apply(&mut self, changes: &ItemChanges) {
        if let Some(ref details) = changes.audit_details {
            self.audit_details.clone_from(details);
        }
        if let Some(ref observation) = changes.observation {
            self.observation.clone_from(observation);
        }
        if let Some(remark) = changes.remark {
            self.remark = remark;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::updates::ItemChangesBuilder;

    fn blank_item() -> AuditItem {
        AuditItem {
            id: "itm-00000001".into(),
            audit_id: "aud-00000001".into(),
            row_index: 0,
            original_data: RowRecord::new(),
            audit_details: String::new(),
            observation: String::new(),
            remark: None,
            evidence: Vec::new(),
            last_modified_by: None,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn apply_only_touches_changed_fields() {
        let mut item = blank_item();
        item.observation = "keep me".into();

        item.apply(
            &ItemChangesBuilder::new()
                .audit_details("Checked logbook")
                .remark(Some(Remark::Yes))
                .build(),
        );

        assert_eq!(item.audit_details, "Checked logbook");
        assert_eq!(item.observation, "keep me");
        assert_eq!(item.remark, Some(Remark::Yes));
    }

    #[test]
    fn apply_can_clear_remark() {
        let mut item = blank_item();
        item.remark = Some(Remark::No);
        item.apply(&ItemChangesBuilder::new().remark(None).build());
        assert_eq!(item.remark, None);
    }

    #[test]
    fn no_remark_without_evidence_is_flagged() {
        let mut item = blank_item();
        assert!(!item.lacks_required_evidence());

        item.remark = Some(Remark::No);
        assert!(item.lacks_required_evidence());

        item.evidence.push(EvidenceRef {
            id: "evd-00000001".into(),
            item_id: item.id.clone(),
            file_name: "photo.jpg".into(),
            file_path: "evidence/itm-00000001-1.jpg".into(),
            file_type: Some("image/jpeg".into()),
            uploaded_by: None,
            created_at: Utc::now(),
        });
        assert!(!item.lacks_required_evidence());
    }
}
