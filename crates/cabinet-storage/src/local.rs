use crate::keys::ObjectKey;
use crate::traits::{FileBackend, StorageError, StorageResult};
use async_trait::async_trait;
use bytes::Bytes;
use cabinet_core::FileBackendKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Local filesystem backend rooted at the configured upload directory
#[derive(Clone)]
pub struct LocalFileBackend {
    base_path: PathBuf,
}

impl LocalFileBackend {
    /// Create the backend, creating `base_path` if needed
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create upload directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalFileBackend { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Convert an object key to a filesystem path, refusing anything that
    /// would resolve outside the upload root.
    fn key_to_path(&self, key: &ObjectKey) -> StorageResult<PathBuf> {
        let relative = key.as_key();
        if relative.contains("..") || relative.starts_with('/') || relative.starts_with('\\') {
            return Err(StorageError::InvalidKey(
                "Storage key contains invalid characters".to_string(),
            ));
        }

        let path = self.base_path.join(&relative);

        let base_canonical = self.base_path.canonicalize().map_err(|e| {
            StorageError::ConfigError(format!("Failed to canonicalize upload root: {}", e))
        })?;

        if let Ok(canonical) = path.canonicalize() {
            if canonical.strip_prefix(&base_canonical).is_err() {
                return Err(StorageError::InvalidKey(
                    "Storage key resolves outside upload root".to_string(),
                ));
            }
        }

        Ok(path)
    }

    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl FileBackend for LocalFileBackend {
    async fn store(
        &self,
        tenant: &str,
        key: &ObjectKey,
        _content_type: Option<&str>,
        data: Bytes,
    ) -> StorageResult<Option<String>> {
        let path = self.key_to_path(key)?;
        let size = data.len();

        self.ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();

        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        file.write_all(&data).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            tenant = %tenant,
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local file stored"
        );

        Ok(None)
    }

    async fn load(
        &self,
        tenant: &str,
        key: &ObjectKey,
        _storage_ref: Option<&str>,
        _version: Option<i32>,
    ) -> StorageResult<Option<Bytes>> {
        let path = self.key_to_path(key)?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            tracing::debug!(tenant = %tenant, key = %key, "Local file missing");
            return Ok(None);
        }

        let data = fs::read(&path).await.map_err(|e| {
            StorageError::DownloadFailed(format!("Failed to read file {}: {}", path.display(), e))
        })?;

        tracing::debug!(tenant = %tenant, key = %key, size_bytes = data.len(), "Local file loaded");
        Ok(Some(Bytes::from(data)))
    }

    async fn remove(
        &self,
        tenant: &str,
        key: &ObjectKey,
        _storage_ref: Option<&str>,
    ) -> StorageResult<()> {
        let path = self.key_to_path(key)?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(());
        }

        fs::remove_file(&path).await.map_err(|e| {
            StorageError::DeleteFailed(format!("Failed to delete file {}: {}", path.display(), e))
        })?;

        tracing::info!(tenant = %tenant, key = %key, "Local file removed");
        Ok(())
    }

    fn kind(&self) -> FileBackendKind {
        FileBackendKind::Local
    }
}
