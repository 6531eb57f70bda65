//! Remote document management service (DMS) backend
//!
//! Files are pushed to `POST {base}/linked-files` and addressed afterwards by
//! the code the DMS returns. Every request carries the owning tenant in the
//! tenant header. The DMS is treated as best-effort: transport or
//! status failures are logged and degrade to "nothing stored" / "nothing
//! found" / "nothing removed" instead of failing the caller's operation.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use cabinet_core::constants::TENANT_HEADER;
use cabinet_core::FileBackendKind;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde::Deserialize;

use crate::keys::ObjectKey;
use crate::traits::{FileBackend, StorageError, StorageResult};

#[derive(Debug, Deserialize)]
struct StoredLinkedFile {
    code: String,
}

/// HTTP client for the DMS linked-file API
#[derive(Clone)]
pub struct DmsFileBackend {
    client: reqwest::Client,
    base_url: String,
}

impl DmsFileBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> StorageResult<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(StorageError::ConfigError(
                "DMS base URL must not be empty".to_string(),
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StorageError::ConfigError(format!("Failed to build DMS client: {}", e)))?;
        Ok(Self { client, base_url })
    }

    fn linked_file_url(&self, code: &str) -> String {
        format!(
            "{}/linked-files/{}",
            self.base_url,
            urlencoding::encode(code)
        )
    }

    async fn try_store(
        &self,
        tenant: &str,
        key: &ObjectKey,
        content_type: Option<&str>,
        data: Bytes,
    ) -> Result<String, String> {
        let part = Part::bytes(data.to_vec()).file_name(key.name.clone());
        let part = match content_type {
            Some(ct) => part.mime_str(ct).map_err(|e| e.to_string())?,
            None => part,
        };
        let form = Form::new()
            .part("file", part)
            .text("path", key.path.clone())
            .text("name", key.name.clone());

        let response = self
            .client
            .post(format!("{}/linked-files", self.base_url))
            .header(TENANT_HEADER, tenant)
            .multipart(form)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("DMS responded with {}", status));
        }

        let stored: StoredLinkedFile = response.json().await.map_err(|e| e.to_string())?;
        Ok(stored.code)
    }

    async fn try_load(
        &self,
        tenant: &str,
        code: &str,
        version: Option<i32>,
    ) -> Result<Option<Bytes>, String> {
        let mut request = self
            .client
            .get(self.linked_file_url(code))
            .header(TENANT_HEADER, tenant);
        if let Some(version) = version {
            request = request.query(&[("version", version)]);
        }
        let response = request.send().await.map_err(|e| e.to_string())?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                response.bytes().await.map(Some).map_err(|e| e.to_string())
            }
            status => Err(format!("DMS responded with {}", status)),
        }
    }

    async fn try_remove(&self, tenant: &str, code: &str) -> Result<(), String> {
        let response = self
            .client
            .delete(self.linked_file_url(code))
            .header(TENANT_HEADER, tenant)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if status.is_success() || status == StatusCode::NOT_FOUND {
            Ok(())
        } else {
            Err(format!("DMS responded with {}", status))
        }
    }
}

#[async_trait]
impl FileBackend for DmsFileBackend {
    async fn store(
        &self,
        tenant: &str,
        key: &ObjectKey,
        content_type: Option<&str>,
        data: Bytes,
    ) -> StorageResult<Option<String>> {
        let size = data.len();
        match self.try_store(tenant, key, content_type, data).await {
            Ok(code) => {
                tracing::info!(tenant = %tenant, key = %key, dms_code = %code, size_bytes = size, "File stored in DMS");
                Ok(Some(code))
            }
            Err(error) => {
                tracing::error!(tenant = %tenant, key = %key, error = %error, "DMS upload failed; file not stored");
                Ok(None)
            }
        }
    }

    async fn load(
        &self,
        tenant: &str,
        key: &ObjectKey,
        storage_ref: Option<&str>,
        version: Option<i32>,
    ) -> StorageResult<Option<Bytes>> {
        let Some(code) = storage_ref else {
            tracing::warn!(tenant = %tenant, key = %key, "No DMS reference recorded for file");
            return Ok(None);
        };
        match self.try_load(tenant, code, version).await {
            Ok(data) => Ok(data),
            Err(error) => {
                tracing::error!(tenant = %tenant, key = %key, dms_code = %code, error = %error, "DMS download failed");
                Ok(None)
            }
        }
    }

    async fn remove(
        &self,
        tenant: &str,
        key: &ObjectKey,
        storage_ref: Option<&str>,
    ) -> StorageResult<()> {
        let Some(code) = storage_ref else {
            return Ok(());
        };
        if let Err(error) = self.try_remove(tenant, code).await {
            tracing::error!(tenant = %tenant, key = %key, dms_code = %code, error = %error, "DMS delete failed");
        }
        Ok(())
    }

    fn kind(&self) -> FileBackendKind {
        FileBackendKind::Dms
    }
}
