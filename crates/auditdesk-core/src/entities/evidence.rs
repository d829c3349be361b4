use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored file attached to an audit item.
///
/// `file_path` is the opaque object-storage path; `file_name` is the name the
/// auditor uploaded it under.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EvidenceRef {
    pub id: String,
    pub item_id: String,
    pub file_name: String,
    pub file_path: String,
    pub file_type: Option<String>,
    pub uploaded_by: Option<String>,
    pub created_at: DateTime<Utc>,
}
