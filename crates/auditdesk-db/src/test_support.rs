//! Shared test utilities for auditdesk-db tests.
