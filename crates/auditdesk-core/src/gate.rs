//! Submission preconditions.
//!
//! An audit may move to `submitted` only when every item has a remark and every
//! `no` remark is backed by at least one evidence file. Completeness is checked
//! on the raw counts, not on the rounded percentage: 199 of 200 rounds to 100%
//! but is still incomplete.

use thiserror::Error;

use crate::entities::AuditItem;
use crate::progress::ProgressStats;

/// Why an audit cannot be submitted yet.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionBlocker {
    #[error("{completed} of {total} items have a remark")]
    Incomplete { completed: usize, total: usize },

    #[error("{} item(s) marked 'no' have no evidence", item_ids.len())]
    MissingEvidence { item_ids: Vec<String> },
}

/// Evaluate the submission policy against the current items.
///
/// Incompleteness is reported before missing evidence.
///
/// # Errors
///
/// Returns the first [`SubmissionBlocker`] that applies.
pub fn evaluate(items: &[AuditItem]) -> Result<ProgressStats, SubmissionBlocker> {
    let stats = ProgressStats::compute(items);
    if !stats.is_complete() {
        return Err(SubmissionBlocker::Incomplete {
            completed: stats.completed,
            total: stats.total,
        });
    }

    let missing: Vec<String> = items
        .iter()
        .filter(|i| i.lacks_required_evidence())
        .map(|i| i.id.clone())
        .collect();
    if !missing.is_empty() {
        return Err(SubmissionBlocker::MissingEvidence { item_ids: missing });
    }

    Ok(stats)
}

#[must_use]
pub fn can_submit(items: &[AuditItem]) -> bool {
    evaluate(items).is_ok()
}
