use crate::{DmsFileBackend, FileBackend, LocalFileBackend, StorageError, StorageResult};
use cabinet_core::{Config, FileBackendKind};
use std::sync::Arc;
use std::time::Duration;

/// Create the attachment backend selected by configuration
pub async fn create_file_backend(config: &Config) -> StorageResult<Arc<dyn FileBackend>> {
    match config.file_backend() {
        FileBackendKind::Local => {
            let backend = LocalFileBackend::new(config.upload_root().clone()).await?;
            tracing::info!(root = %config.upload_root().display(), "Using local file backend");
            Ok(Arc::new(backend))
        }
        FileBackendKind::Dms => {
            let base_url = config.dms_base_url().ok_or_else(|| {
                StorageError::ConfigError("DMS_BASE_URL not configured".to_string())
            })?;
            let backend = DmsFileBackend::new(
                base_url,
                Duration::from_secs(config.dms_timeout_seconds()),
            )?;
            tracing::info!(base_url = %base_url, "Using DMS file backend");
            Ok(Arc::new(backend))
        }
    }
}
