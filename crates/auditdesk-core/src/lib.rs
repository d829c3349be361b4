//! # auditdesk-core
//!
//! Core types shared across all AuditDesk crates:
//! - Entity structs for checklist templates, audits, audit items and evidence
//! - Status and remark enums, with the audit state machine
//! - Dynamically typed spreadsheet cells (`CellValue`, `RowRecord`)
//! - Progress statistics and the submission gate predicate
//! - Collaborator traits for the record store and the object store
//! - Cross-cutting error types and ID prefixes

pub mod activity_detail;
pub mod cell;
pub mod entities;
pub mod enums;
pub mod errors;
pub mod gate;
pub mod identity;
pub mod ids;
pub mod progress;
pub mod repository;
pub mod updates;
