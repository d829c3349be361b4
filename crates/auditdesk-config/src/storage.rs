//! Evidence object storage configuration.

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Which object store backs evidence files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// Process memory. Files vanish on exit; for tests and dry runs.
    Memory,
    /// A directory on the local filesystem.
    #[default]
    Local,
    /// An S3-compatible bucket.
    S3,
}

impl StorageBackend {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Local => "local",
            Self::S3 => "s3",
        }
    }
}

fn default_local_root() -> String {
    String::from(".auditdesk/evidence")
}

fn default_bucket_name() -> String {
    String::from("audit-evidence")
}

fn default_region() -> String {
    String::from("auto")
}

fn default_evidence_prefix() -> String {
    String::from("evidence")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Root directory for the `local` backend.
    #[serde(default = "default_local_root")]
    pub local_root: String,

    /// Bucket name for the `s3` backend.
    #[serde(default = "default_bucket_name")]
    pub bucket_name: String,

    /// Custom endpoint URL for S3-compatible services. Empty means AWS.
    #[serde(default)]
    pub endpoint: String,

    #[serde(default = "default_region")]
    pub region: String,

    #[serde(default)]
    pub access_key_id: String,

    #[serde(default)]
    pub secret_access_key: String,

    /// Path prefix under which evidence objects are stored.
    #[serde(default = "default_evidence_prefix")]
    pub evidence_prefix: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            local_root: default_local_root(),
            bucket_name: default_bucket_name(),
            endpoint: String::new(),
            region: default_region(),
            access_key_id: String::new(),
            secret_access_key: String::new(),
            evidence_prefix: default_evidence_prefix(),
        }
    }
}

impl StorageConfig {
    /// Required fields of the selected backend that are empty.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let required: Vec<(&'static str, &str)> = match self.backend {
            StorageBackend::Memory => Vec::new(),
            StorageBackend::Local => vec![("local_root", self.local_root.as_str())],
            StorageBackend::S3 => vec![
                ("bucket_name", self.bucket_name.as_str()),
                ("access_key_id", self.access_key_id.as_str()),
                ("secret_access_key", self.secret_access_key.as_str()),
            ],
        };
        required
            .into_iter()
            .filter(|(_, value)| value.is_empty())
            .map(|(name, _)| name)
            .collect()
    }

    /// Check if the selected backend has the fields it needs.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// # Errors
    ///
    /// Returns `ConfigError::StorageIncomplete` naming the empty fields of the
    /// selected backend.
    pub fn require_configured(&self) -> Result<(), ConfigError> {
        let missing = self.missing_fields();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::StorageIncomplete {
                backend: self.backend.as_str(),
                missing,
            })
        }
    }

    /// Custom endpoint if set.
    #[must_use]
    pub fn endpoint_url(&self) -> Option<&str> {
        if self.endpoint.is_empty() {
            None
        } else {
            Some(self.endpoint.as_str())
        }
    }
}
