use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use cabinet_core::{BucketInfo, ObjectInfo, ObjectStorageProvider, StorageConnection};
use validator::Validate;

use crate::error::{ObjectStorageError, ObjectStorageResult};
use crate::filter::TagFilter;

/// An object to upload, with optional content type and tags.
#[derive(Debug, Clone)]
pub struct ObjectUpload {
    pub key: String,
    pub content_type: Option<String>,
    pub data: Bytes,
    pub tags: HashMap<String, String>,
}

impl ObjectUpload {
    pub fn new(key: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            key: key.into(),
            content_type: None,
            data: data.into(),
            tags: HashMap::new(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_tags(mut self, tags: HashMap<String, String>) -> Self {
        self.tags = tags;
        self
    }
}

/// Bucket and object operations against one provider family.
///
/// Every call takes the tenant's connection; adapters cache one client per
/// tenant and validate arguments before contacting the provider.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    fn provider(&self) -> ObjectStorageProvider;

    /// Rebuild the tenant's client from `conn`, replacing any cached one.
    async fn update_connection(&self, conn: &StorageConnection) -> ObjectStorageResult<()>;

    /// Forget the tenant's cached client; the next call builds a fresh one.
    async fn evict_connection(&self, _conn: &StorageConnection) {}

    async fn make_bucket(&self, conn: &StorageConnection, bucket: &str) -> ObjectStorageResult<()>;
    async fn bucket_exists(&self, conn: &StorageConnection, bucket: &str) -> ObjectStorageResult<bool>;
    async fn delete_bucket(&self, conn: &StorageConnection, bucket: &str) -> ObjectStorageResult<()>;
    async fn list_buckets(&self, conn: &StorageConnection) -> ObjectStorageResult<Vec<BucketInfo>>;
    async fn set_versioning(
        &self,
        conn: &StorageConnection,
        bucket: &str,
        enabled: bool,
    ) -> ObjectStorageResult<()>;
    async fn versioning_enabled(
        &self,
        conn: &StorageConnection,
        bucket: &str,
    ) -> ObjectStorageResult<bool>;

    async fn upload_object(
        &self,
        conn: &StorageConnection,
        bucket: &str,
        object: ObjectUpload,
    ) -> ObjectStorageResult<ObjectInfo>;
    async fn download_object(
        &self,
        conn: &StorageConnection,
        bucket: &str,
        key: &str,
    ) -> ObjectStorageResult<Bytes>;
    async fn stat_object(
        &self,
        conn: &StorageConnection,
        bucket: &str,
        key: &str,
    ) -> ObjectStorageResult<ObjectInfo>;
    async fn delete_object(
        &self,
        conn: &StorageConnection,
        bucket: &str,
        key: &str,
    ) -> ObjectStorageResult<()>;
    async fn delete_objects(
        &self,
        conn: &StorageConnection,
        bucket: &str,
        keys: &[String],
    ) -> ObjectStorageResult<()>;
    async fn presigned_get_url(
        &self,
        conn: &StorageConnection,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> ObjectStorageResult<String>;
    async fn list_objects(
        &self,
        conn: &StorageConnection,
        bucket: &str,
        prefix: Option<&str>,
    ) -> ObjectStorageResult<Vec<ObjectInfo>>;

    async fn object_tags(
        &self,
        conn: &StorageConnection,
        bucket: &str,
        key: &str,
    ) -> ObjectStorageResult<HashMap<String, String>>;
    async fn set_object_tags(
        &self,
        conn: &StorageConnection,
        bucket: &str,
        key: &str,
        tags: HashMap<String, String>,
    ) -> ObjectStorageResult<()>;

    /// Objects whose tags satisfy `filter`.
    ///
    /// Lists the bucket, then fetches tags object by object.
    async fn filter_objects(
        &self,
        conn: &StorageConnection,
        bucket: &str,
        filter: &TagFilter,
    ) -> ObjectStorageResult<Vec<ObjectInfo>> {
        require_name("bucket", bucket)?;
        let objects = self.list_objects(conn, bucket, None).await?;
        let total = objects.len();

        let mut matched = Vec::new();
        for object in objects {
            let tags = self.object_tags(conn, bucket, &object.key).await?;
            if filter.matches(&tags) {
                matched.push(object);
            }
        }

        tracing::debug!(
            provider = %self.provider(),
            bucket = %bucket,
            scanned = total,
            matched = matched.len(),
            "Objects filtered by tags"
        );
        Ok(matched)
    }
}

pub(crate) fn require_name(what: &str, value: &str) -> ObjectStorageResult<()> {
    if value.trim().is_empty() {
        return Err(ObjectStorageError::InvalidArgument(format!(
            "{} name must not be empty",
            what
        )));
    }
    Ok(())
}

pub(crate) fn require_object(bucket: &str, key: &str) -> ObjectStorageResult<()> {
    require_name("bucket", bucket)?;
    require_name("object", key)
}

pub(crate) fn require_upload(bucket: &str, object: &ObjectUpload) -> ObjectStorageResult<()> {
    require_object(bucket, &object.key)?;
    if object.data.is_empty() {
        return Err(ObjectStorageError::InvalidArgument(format!(
            "object {} has no content",
            object.key
        )));
    }
    Ok(())
}

pub(crate) fn require_keys(bucket: &str, keys: &[String]) -> ObjectStorageResult<()> {
    require_name("bucket", bucket)?;
    if keys.is_empty() {
        return Err(ObjectStorageError::InvalidArgument(
            "at least one object name is required".to_string(),
        ));
    }
    for key in keys {
        require_name("object", key)?;
    }
    Ok(())
}

/// The connection must be complete and meant for `provider`.
pub(crate) fn require_connection(
    conn: &StorageConnection,
    provider: ObjectStorageProvider,
) -> ObjectStorageResult<()> {
    conn.validate()?;
    if conn.provider != provider {
        return Err(ObjectStorageError::InvalidArgument(format!(
            "connection is for {}, not {}",
            conn.provider, provider
        )));
    }
    Ok(())
}
