//! In-process adapter for tests and local development.
//!
//! Emulates one provider per instance; state is kept per tenant and lost on
//! drop. Validation and error behaviour match the remote adapters.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use cabinet_core::{BucketInfo, ObjectInfo, ObjectStorageProvider, StorageConnection};
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::error::{ObjectStorageError, ObjectStorageResult};
use crate::traits::{
    require_connection, require_keys, require_name, require_object, require_upload,
    ObjectStorage, ObjectUpload,
};

#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    content_type: Option<String>,
    tags: HashMap<String, String>,
    last_modified: DateTime<Utc>,
    version: u64,
}

#[derive(Debug, Clone)]
struct StoredBucket {
    created_at: DateTime<Utc>,
    versioning: bool,
    objects: BTreeMap<String, StoredObject>,
}

type TenantBuckets = BTreeMap<String, StoredBucket>;

#[derive(Clone)]
pub struct InMemoryObjectStorage {
    provider: ObjectStorageProvider,
    tenants: Arc<RwLock<HashMap<String, TenantBuckets>>>,
}

impl InMemoryObjectStorage {
    pub fn new(provider: ObjectStorageProvider) -> Self {
        Self {
            provider,
            tenants: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    fn missing(&self, resource: String) -> ObjectStorageError {
        ObjectStorageError::not_found(self.provider, resource)
    }

    fn info(key: &str, object: &StoredObject) -> ObjectInfo {
        ObjectInfo {
            key: key.to_string(),
            size: object.data.len() as i64,
            etag: Some(format!("{:08x}", cabinet_core::checksum::crc32(&object.data))),
            content_type: object.content_type.clone(),
            last_modified: Some(object.last_modified),
            version_id: Some(object.version.to_string()),
        }
    }

    async fn read_object<T>(
        &self,
        conn: &StorageConnection,
        bucket: &str,
        key: &str,
        read: impl FnOnce(&StoredObject) -> T,
    ) -> ObjectStorageResult<T> {
        require_object(bucket, key)?;
        require_connection(conn, self.provider)?;
        let tenants = self.tenants.read().await;
        let object = tenants
            .get(&conn.cache_key())
            .and_then(|buckets| buckets.get(bucket))
            .ok_or_else(|| self.missing(format!("bucket {}", bucket)))?
            .objects
            .get(key)
            .ok_or_else(|| self.missing(format!("object {}", key)))?;
        Ok(read(object))
    }

    async fn write_bucket<T>(
        &self,
        conn: &StorageConnection,
        bucket: &str,
        write: impl FnOnce(&mut StoredBucket) -> ObjectStorageResult<T>,
    ) -> ObjectStorageResult<T> {
        require_name("bucket", bucket)?;
        require_connection(conn, self.provider)?;
        let mut tenants = self.tenants.write().await;
        let stored = tenants
            .get_mut(&conn.cache_key())
            .and_then(|buckets| buckets.get_mut(bucket))
            .ok_or_else(|| self.missing(format!("bucket {}", bucket)))?;
        write(stored)
    }
}

#[async_trait]
impl ObjectStorage for InMemoryObjectStorage {
    fn provider(&self) -> ObjectStorageProvider {
        self.provider
    }

    async fn update_connection(&self, conn: &StorageConnection) -> ObjectStorageResult<()> {
        require_connection(conn, self.provider)
    }

    async fn make_bucket(&self, conn: &StorageConnection, bucket: &str) -> ObjectStorageResult<()> {
        require_name("bucket", bucket)?;
        require_connection(conn, self.provider)?;
        let mut tenants = self.tenants.write().await;
        let buckets = tenants.entry(conn.cache_key()).or_default();
        if buckets.contains_key(bucket) {
            return Err(ObjectStorageError::backend(
                self.provider,
                "create_bucket",
                format!("bucket {} already exists", bucket),
            ));
        }
        buckets.insert(
            bucket.to_string(),
            StoredBucket {
                created_at: Utc::now(),
                versioning: self.provider == ObjectStorageProvider::LakeFs,
                objects: BTreeMap::new(),
            },
        );
        Ok(())
    }

    async fn bucket_exists(&self, conn: &StorageConnection, bucket: &str) -> ObjectStorageResult<bool> {
        require_name("bucket", bucket)?;
        require_connection(conn, self.provider)?;
        let tenants = self.tenants.read().await;
        Ok(tenants
            .get(&conn.cache_key())
            .is_some_and(|buckets| buckets.contains_key(bucket)))
    }

    async fn delete_bucket(&self, conn: &StorageConnection, bucket: &str) -> ObjectStorageResult<()> {
        require_name("bucket", bucket)?;
        require_connection(conn, self.provider)?;
        let mut tenants = self.tenants.write().await;
        let buckets = tenants
            .get_mut(&conn.cache_key())
            .ok_or_else(|| self.missing(format!("bucket {}", bucket)))?;
        match buckets.get(bucket) {
            None => Err(self.missing(format!("bucket {}", bucket))),
            Some(stored) if !stored.objects.is_empty() => Err(ObjectStorageError::backend(
                self.provider,
                "delete_bucket",
                format!("bucket {} is not empty", bucket),
            )),
            Some(_) => {
                buckets.remove(bucket);
                Ok(())
            }
        }
    }

    async fn list_buckets(&self, conn: &StorageConnection) -> ObjectStorageResult<Vec<BucketInfo>> {
        require_connection(conn, self.provider)?;
        let tenants = self.tenants.read().await;
        Ok(tenants
            .get(&conn.cache_key())
            .map(|buckets| {
                buckets
                    .iter()
                    .map(|(name, stored)| BucketInfo {
                        name: name.clone(),
                        created_at: Some(stored.created_at),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn set_versioning(
        &self,
        conn: &StorageConnection,
        bucket: &str,
        enabled: bool,
    ) -> ObjectStorageResult<()> {
        let lakefs = self.provider == ObjectStorageProvider::LakeFs;
        self.write_bucket(conn, bucket, |stored| {
            stored.versioning = enabled || lakefs;
            Ok(())
        })
        .await
    }

    async fn versioning_enabled(
        &self,
        conn: &StorageConnection,
        bucket: &str,
    ) -> ObjectStorageResult<bool> {
        self.write_bucket(conn, bucket, |stored| Ok(stored.versioning))
            .await
    }

    async fn upload_object(
        &self,
        conn: &StorageConnection,
        bucket: &str,
        object: ObjectUpload,
    ) -> ObjectStorageResult<ObjectInfo> {
        require_upload(bucket, &object)?;
        self.write_bucket(conn, bucket, |stored| {
            let version = stored
                .objects
                .get(&object.key)
                .map_or(1, |previous| previous.version + 1);
            let entry = StoredObject {
                data: object.data,
                content_type: object.content_type,
                tags: object.tags,
                last_modified: Utc::now(),
                version,
            };
            let info = Self::info(&object.key, &entry);
            stored.objects.insert(object.key, entry);
            Ok(info)
        })
        .await
    }

    async fn download_object(
        &self,
        conn: &StorageConnection,
        bucket: &str,
        key: &str,
    ) -> ObjectStorageResult<Bytes> {
        self.read_object(conn, bucket, key, |object| object.data.clone())
            .await
    }

    async fn stat_object(
        &self,
        conn: &StorageConnection,
        bucket: &str,
        key: &str,
    ) -> ObjectStorageResult<ObjectInfo> {
        self.read_object(conn, bucket, key, |object| Self::info(key, object))
            .await
    }

    async fn delete_object(
        &self,
        conn: &StorageConnection,
        bucket: &str,
        key: &str,
    ) -> ObjectStorageResult<()> {
        require_object(bucket, key)?;
        self.write_bucket(conn, bucket, |stored| {
            stored.objects.remove(key);
            Ok(())
        })
        .await
    }

    async fn delete_objects(
        &self,
        conn: &StorageConnection,
        bucket: &str,
        keys: &[String],
    ) -> ObjectStorageResult<()> {
        require_keys(bucket, keys)?;
        self.write_bucket(conn, bucket, |stored| {
            for key in keys {
                stored.objects.remove(key);
            }
            Ok(())
        })
        .await
    }

    async fn presigned_get_url(
        &self,
        conn: &StorageConnection,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> ObjectStorageResult<String> {
        self.read_object(conn, bucket, key, |_| ()).await?;
        Ok(format!(
            "{}/{}/{}?expires={}",
            conn.endpoint.trim_end_matches('/'),
            urlencoding::encode(bucket),
            urlencoding::encode(key),
            expires_in.as_secs()
        ))
    }

    async fn list_objects(
        &self,
        conn: &StorageConnection,
        bucket: &str,
        prefix: Option<&str>,
    ) -> ObjectStorageResult<Vec<ObjectInfo>> {
        let prefix = prefix.unwrap_or_default();
        self.write_bucket(conn, bucket, |stored| {
            Ok(stored
                .objects
                .iter()
                .filter(|(key, _)| key.starts_with(prefix))
                .map(|(key, object)| Self::info(key, object))
                .collect())
        })
        .await
    }

    async fn object_tags(
        &self,
        conn: &StorageConnection,
        bucket: &str,
        key: &str,
    ) -> ObjectStorageResult<HashMap<String, String>> {
        self.read_object(conn, bucket, key, |object| object.tags.clone())
            .await
    }

    async fn set_object_tags(
        &self,
        conn: &StorageConnection,
        bucket: &str,
        key: &str,
        tags: HashMap<String, String>,
    ) -> ObjectStorageResult<()> {
        require_object(bucket, key)?;
        self.write_bucket(conn, bucket, |stored| {
            let object = stored
                .objects
                .get_mut(key)
                .ok_or_else(|| ObjectStorageError::not_found(self.provider, format!("object {}", key)))?;
            object.tags = tags;
            Ok(())
        })
        .await
    }
}
