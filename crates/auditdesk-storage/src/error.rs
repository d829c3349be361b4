use auditdesk_core::errors::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("Invalid object path: {0}")]
    InvalidPath(#[from] object_store::path::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage not configured: {0}")]
    NotConfigured(String),
}

impl StorageError {
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::ObjectStore(object_store::Error::NotFound { .. }))
    }
}

impl From<StorageError> for CoreError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::ObjectStore(object_store::Error::NotFound { path, .. }) => {
                Self::not_found("object", path)
            }
            StorageError::InvalidPath(e) => Self::Validation(e.to_string()),
            other => Self::Backend(other.to_string()),
        }
    }
}
