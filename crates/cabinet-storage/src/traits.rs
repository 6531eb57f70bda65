//! File backend abstraction
//!
//! This module defines the `FileBackend` trait implemented by the local
//! filesystem and the remote document management service (DMS).

use async_trait::async_trait;
use bytes::Bytes;
use cabinet_core::{AppError, FileBackendKind};
use thiserror::Error;

use crate::keys::ObjectKey;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidKey(msg) => AppError::InvalidInput(msg),
            StorageError::ConfigError(msg) => AppError::ServiceNotDefined(msg),
            other => AppError::Storage(other.to_string()),
        }
    }
}

/// Backend holding attachment bytes.
///
/// Keys are relative to the backend root (`<tenant>/<kind>/...`, see
/// [`crate::keys`]). Remote backends may hand back their own reference from
/// `store`; callers persist it and pass it back to `load`/`remove`. Every
/// call names the tenant that owns the object.
#[async_trait]
pub trait FileBackend: Send + Sync {
    /// Store `data` under `key`; returns the backend's reference for the object, if it assigns one.
    async fn store(
        &self,
        tenant: &str,
        key: &ObjectKey,
        content_type: Option<&str>,
        data: Bytes,
    ) -> StorageResult<Option<String>>;

    /// Read an object back; `Ok(None)` when the backend has nothing for it.
    async fn load(
        &self,
        tenant: &str,
        key: &ObjectKey,
        storage_ref: Option<&str>,
        version: Option<i32>,
    ) -> StorageResult<Option<Bytes>>;

    /// Remove an object. Removing something that is already gone succeeds.
    async fn remove(
        &self,
        tenant: &str,
        key: &ObjectKey,
        storage_ref: Option<&str>,
    ) -> StorageResult<()>;

    fn kind(&self) -> FileBackendKind;
}
