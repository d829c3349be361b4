use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::AuditStatus;

/// One application of a checklist template, owned by a single auditor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Audit {
    pub id: String,
    pub template_id: String,
    pub title: String,
    pub auditor_id: String,
    pub status: AuditStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
}

impl Audit {
    #[must_use]
    pub const fn is_editable(&self) -> bool {
        self.status.is_editable()
    }

    #[must_use]
    pub fn is_assigned_to(&self, user_id: &str) -> bool {
        self.auditor_id == user_id
    }
}
