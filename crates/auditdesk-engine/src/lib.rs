//! # auditdesk-engine
//!
//! The audit import and progress engine:
//! - [`import_checklist`] turns an uploaded sheet into a template, an audit
//!   and its items
//! - [`AuditItemStore`] holds working copies of loaded audits and validates
//!   every edit at its boundary
//! - [`DebouncedPersister`] coalesces edits per item into single writes
//! - [`AuditItemStore::submit`] re-checks the submission gate on stored state
//!   before moving the audit to `submitted`
//! - [`EventBus`] reports item changes, progress and write outcomes
//!
//! Storage is reached only through the collaborator traits in
//! [`auditdesk_core::repository`].

pub mod error;
pub mod events;
pub mod import;
pub mod persister;
pub mod store;

#[cfg(test)]
mod test_support;

pub use error::{EngineError, EngineResult};
pub use events::{EngineEvent, EventBus};
pub use import::{ImportLimits, ImportedChecklist, import_checklist};
pub use persister::{DebouncedPersister, FailedWrite, FlushReport};
pub use store::{AuditItemStore, StoreSettings};
