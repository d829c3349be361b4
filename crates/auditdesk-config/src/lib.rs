//! # auditdesk-config
//!
//! Layered configuration loading for AuditDesk using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`AUDITDESK_*` prefix, `__` as separator)
//! 2. Project-level `.auditdesk/config.toml`
//! 3. User-level `~/.config/auditdesk/config.toml`
//! 4. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `AUDITDESK_ENGINE__DEBOUNCE_MS` -> `engine.debounce_ms`,
//! `AUDITDESK_STORAGE__BACKEND` -> `storage.backend`, etc.
//!
//! # Usage
//!
//! ```no_run
//! use auditdesk_config::AuditDeskConfig;
//!
//! let config = AuditDeskConfig::load_with_dotenv().expect("config");
//! println!("database: {}", config.database.path);
//! ```

mod database;
mod engine;
mod error;
mod import;
mod storage;

pub use database::DatabaseConfig;
pub use engine::EngineConfig;
pub use error::ConfigError;
pub use import::ImportConfig;
pub use storage::{StorageBackend, StorageConfig};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AuditDeskConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub import: ImportConfig,
}

impl AuditDeskConfig {
    /// Load configuration from all sources (TOML files + environment variables).
    ///
    /// Does NOT call `dotenvy`; use [`Self::load_with_dotenv`] for `.env` support.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if extraction fails or a value is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let config: Self = Self::figment().extract()?;
        config.engine.validate()?;
        Ok(config)
    }

    /// Load configuration after reading a `.env` file from the current
    /// directory (or its parents).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if extraction fails or a value is invalid.
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// Build the figment provider chain.
    ///
    /// Public so tests can inspect the figment or layer providers on top.
    #[must_use]
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Layer 1: User-global config
        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(global_path));
        }

        // Layer 2: Project-local config
        let local_path = PathBuf::from(".auditdesk/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        // Layer 3: Environment variables (highest priority)
        figment.merge(Env::prefixed("AUDITDESK_").split("__"))
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("auditdesk").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_loads() {
        let config = AuditDeskConfig::default();
        assert_eq!(config.engine.debounce_ms, 1000);
        assert_eq!(config.database.path, ".auditdesk/auditdesk.db");
        assert_eq!(config.storage.backend, StorageBackend::Local);
        assert_eq!(config.import.max_file_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn figment_builds_without_files() {
        let config: AuditDeskConfig = AuditDeskConfig::figment()
            .extract()
            .expect("should extract defaults");
        assert!(config.storage.is_configured());
        assert!(!config.database.is_in_memory());
    }
}
