//! Entity structs for all AuditDesk domain objects.
//!
//! Each entity maps to a table in the libSQL database owned by `auditdesk-db`.
//! All structs derive `Serialize` and `Deserialize` for JSON output and
//! storage of nested payloads.

mod activity;
mod audit;
mod evidence;
mod item;
mod template;

pub use activity::ActivityEntry;
pub use audit::Audit;
pub use evidence::EvidenceRef;
pub use item::AuditItem;
pub use template::Template;
