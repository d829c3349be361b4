//! `EvidenceBucket`: the evidence object store.

use std::sync::Arc;

use auditdesk_config::{StorageBackend, StorageConfig};
use auditdesk_core::errors::CoreResult;
use auditdesk_core::repository::BlobStore;
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path;
use object_store::{ObjectStore, PutPayload};

use crate::StorageError;

/// Object store for evidence files, addressed by opaque path strings.
#[derive(Debug, Clone)]
pub struct EvidenceBucket {
    store: Arc<dyn ObjectStore>,
    prefix: String,
}

impl EvidenceBucket {
    /// Wrap an existing store.
    #[must_use]
    pub fn new(store: Arc<dyn ObjectStore>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }

    /// In-process store; contents are lost on drop.
    #[must_use]
    pub fn in_memory(prefix: impl Into<String>) -> Self {
        Self::new(Arc::new(InMemory::new()), prefix)
    }

    /// Store rooted at a local directory, created if missing.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the directory cannot be created or opened.
    pub fn local(
        root: impl AsRef<std::path::Path>,
        prefix: impl Into<String>,
    ) -> Result<Self, StorageError> {
        std::fs::create_dir_all(root.as_ref())?;
        let store = LocalFileSystem::new_with_prefix(root.as_ref())?;
        Ok(Self::new(Arc::new(store), prefix))
    }

    /// Build the store selected by `[storage]`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotConfigured` when the selected backend lacks
    /// required settings, or the builder error from `object_store`.
    pub fn from_config(config: &StorageConfig) -> Result<Self, StorageError> {
        if !config.is_configured() {
            return Err(StorageError::NotConfigured(format!(
                "{:?} backend is missing required fields",
                config.backend
            )));
        }
        let prefix = config.evidence_prefix.clone();
        match config.backend {
            StorageBackend::Memory => Ok(Self::in_memory(prefix)),
            StorageBackend::Local => Self::local(&config.local_root, prefix),
            StorageBackend::S3 => {
                let mut builder = AmazonS3Builder::new()
                    .with_bucket_name(&config.bucket_name)
                    .with_region(&config.region)
                    .with_access_key_id(&config.access_key_id)
                    .with_secret_access_key(&config.secret_access_key);
                if let Some(endpoint) = config.endpoint_url() {
                    builder = builder
                        .with_endpoint(endpoint)
                        .with_allow_http(endpoint.starts_with("http://"));
                }
                let store = builder.build()?;
                tracing::debug!(bucket = %config.bucket_name, "opened s3 evidence bucket");
                Ok(Self::new(Arc::new(store), prefix))
            }
        }
    }

    /// Key prefix new evidence is stored under.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the path is invalid or the write fails.
    pub async fn put_bytes(&self, path: &str, bytes: Vec<u8>) -> Result<(), StorageError> {
        let location = Path::parse(path)?;
        let size = bytes.len();
        self.store.put(&location, PutPayload::from(bytes)).await?;
        tracing::debug!(path, size, "stored evidence object");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the path is invalid, missing, or unreadable.
    pub async fn get_bytes(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        let location = Path::parse(path)?;
        let bytes = self.store.get(&location).await?.bytes().await?;
        Ok(bytes.to_vec())
    }

    /// # Errors
    ///
    /// Returns `StorageError` for failures other than the object being absent.
    pub async fn contains(&self, path: &str) -> Result<bool, StorageError> {
        let location = Path::parse(path)?;
        match self.store.head(&location).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

impl BlobStore for EvidenceBucket {
    async fn put(&self, path: &str, bytes: Vec<u8>) -> CoreResult<()> {
        Ok(self.put_bytes(path, bytes).await?)
    }

    async fn get(&self, path: &str) -> CoreResult<Vec<u8>> {
        Ok(self.get_bytes(path).await?)
    }

    async fn exists(&self, path: &str) -> CoreResult<bool> {
        Ok(self.contains(path).await?)
    }
}
