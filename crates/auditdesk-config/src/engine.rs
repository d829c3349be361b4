//! Audit engine tuning.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Quiescence window before a burst of edits to one item is written.
const fn default_debounce_ms() -> u64 {
    1000
}

/// Buffered engine events per subscriber.
const fn default_event_capacity() -> usize {
    256
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineConfig {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            event_capacity: default_event_capacity(),
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub const fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the window or capacity is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.debounce_ms == 0 {
            return Err(ConfigError::InvalidValue {
                section: "engine",
                key: "debounce_ms",
                reason: "must be greater than zero",
            });
        }
        if self.event_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                section: "engine",
                key: "event_capacity",
                reason: "must be greater than zero",
            });
        }
        Ok(())
    }
}
