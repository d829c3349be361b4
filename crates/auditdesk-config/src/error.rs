//! Errors raised while loading or checking the auditdesk configuration.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// A source could not be read or merged: malformed `config.toml`, or an
    /// `AUDITDESK_*` variable that does not parse as the field's type.
    #[error("failed to load auditdesk configuration: {0}")]
    Load(#[from] figment::Error),

    /// `[storage]` selects a backend whose required fields are empty.
    #[error("[storage] backend '{backend}' is missing {}", missing.join(", "))]
    StorageIncomplete {
        backend: &'static str,
        missing: Vec<&'static str>,
    },

    /// A field is outside its allowed range, e.g. `[engine] debounce_ms = 0`.
    #[error("invalid [{section}] {key}: {reason}")]
    InvalidValue {
        section: &'static str,
        key: &'static str,
        reason: &'static str,
    },
}
