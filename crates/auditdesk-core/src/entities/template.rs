use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cell::RowRecord;

/// A reusable checklist definition. Read when an audit is created, never
/// mutated by the audit-filling workflow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Template {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    /// Parsed rows of the uploaded checklist, in sheet order.
    pub structure: Vec<RowRecord>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}
