//! Completion statistics for an audit.
//!
//! Always derived from the full item sequence, never maintained as deltas.

use serde::{Deserialize, Serialize};

use crate::entities::AuditItem;

/// Aggregate progress of one audit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProgressStats {
    /// Number of items.
    pub total: usize,
    /// Items with a remark set.
    pub completed: usize,
    /// Items with remark `no`.
    pub issues: usize,
    /// Evidence files across all items.
    pub evidence_count: usize,
    /// `round(100 * completed / total)`, `0` for an empty audit.
    pub completion_percent: u8,
}

impl ProgressStats {
    #[must_use]
    pub fn compute(items: &[AuditItem]) -> Self {
        let total = items.len();
        let completed = items.iter().filter(|i| i.is_completed()).count();
        let issues = items
            .iter()
            .filter(|i| i.remark.is_some_and(crate::enums::Remark::requires_evidence))
            .count();
        let evidence_count = items.iter().map(|i| i.evidence.len()).sum();

        Self {
            total,
            completed,
            issues,
            evidence_count,
            completion_percent: completion_percent(completed, total),
        }
    }

    /// Every item has a remark. An empty audit is never complete.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.total > 0 && self.completed == self.total
    }
}

/// Round-half-up percentage using integer arithmetic.
fn completion_percent(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = (200 * completed + total) / (2 * total);
    u8::try_from(pct.min(100)).unwrap_or(100)
}
