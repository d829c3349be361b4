//! # auditdesk-storage
//!
//! Evidence files live in an object store (memory, local directory, or an
//! S3-compatible bucket) under keys built by [`evidence_path`]. The engine
//! only sees opaque path strings through
//! [`BlobStore`](auditdesk_core::repository::BlobStore).

mod bucket;
mod error;
mod paths;

pub use bucket::EvidenceBucket;
pub use error::StorageError;
pub use paths::{content_type_for, evidence_path, file_name_of};
