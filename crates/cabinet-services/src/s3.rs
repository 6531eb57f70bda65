//! S3-compatible adapter (Garage, OxiCloud, MinIO)
//!
//! The three providers speak the same S3 API; the flavor only changes the
//! default region and the label carried by errors. Path-style addressing is
//! always used and the SDK's own retries are disabled in favour of
//! [`with_retry`].

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use aws_config::retry::RetryConfig;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{
    BucketLocationConstraint, BucketVersioningStatus, CreateBucketConfiguration, Delete,
    ObjectIdentifier, Tag, Tagging, VersioningConfiguration,
};
use aws_sdk_s3::Client;
use bytes::Bytes;
use cabinet_core::{BucketInfo, ObjectInfo, ObjectStorageProvider, StorageConnection};
use chrono::{DateTime, Utc};

use crate::cache::ClientCache;
use crate::error::{ObjectStorageError, ObjectStorageResult};
use crate::retry::{with_retry, RetryPolicy};
use crate::traits::{
    require_connection, require_keys, require_name, require_object, require_upload,
    ObjectStorage, ObjectUpload,
};

const US_EAST_1: &str = "us-east-1";

#[derive(Clone)]
struct S3Handle {
    client: Client,
    region: String,
}

/// Adapter for one S3-compatible provider family.
#[derive(Clone)]
pub struct S3CompatibleStorage {
    flavor: ObjectStorageProvider,
    clients: ClientCache<S3Handle>,
    retry: RetryPolicy,
}

impl S3CompatibleStorage {
    pub fn new(flavor: ObjectStorageProvider, retry: RetryPolicy) -> ObjectStorageResult<Self> {
        if flavor == ObjectStorageProvider::LakeFs {
            return Err(ObjectStorageError::InvalidArgument(
                "lakefs is not an S3-compatible flavor".to_string(),
            ));
        }
        Ok(Self {
            flavor,
            clients: ClientCache::new(),
            retry,
        })
    }

    /// Region used when the connection does not name one.
    pub fn default_region(flavor: ObjectStorageProvider) -> &'static str {
        match flavor {
            ObjectStorageProvider::Garage => "garage",
            _ => US_EAST_1,
        }
    }

    async fn handle(&self, conn: &StorageConnection) -> ObjectStorageResult<S3Handle> {
        require_connection(conn, self.flavor)?;
        let flavor = self.flavor;
        self.clients
            .get_or_try_insert_with(&conn.cache_key(), || build_handle(flavor, conn))
            .await
    }

    fn sdk_error<E>(&self, operation: &str, resource: &str, err: SdkError<E, HttpResponse>) -> ObjectStorageError
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        let status = err.raw_response().map(|response| response.status().as_u16());
        if status == Some(404) {
            return ObjectStorageError::not_found(self.flavor, resource.to_string());
        }
        ObjectStorageError::backend(self.flavor, operation, DisplayErrorContext(&err).to_string())
    }
}

async fn build_handle(
    flavor: ObjectStorageProvider,
    conn: &StorageConnection,
) -> ObjectStorageResult<S3Handle> {
    let region = conn
        .region
        .clone()
        .filter(|r| !r.trim().is_empty())
        .unwrap_or_else(|| S3CompatibleStorage::default_region(flavor).to_string());

    let credentials = Credentials::new(
        conn.access_key.clone(),
        conn.secret_key.clone(),
        None,
        None,
        "cabinet-storage-connection",
    );

    let sdk_config = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region.clone()))
        .credentials_provider(credentials)
        .retry_config(RetryConfig::disabled())
        .load()
        .await;

    let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
        .endpoint_url(conn.endpoint.clone())
        .force_path_style(true)
        .build();

    tracing::info!(
        provider = %flavor,
        tenant = %conn.cache_key(),
        endpoint = %conn.endpoint,
        region = %region,
        "S3 client configured"
    );

    Ok(S3Handle {
        client: Client::from_conf(s3_config),
        region,
    })
}

fn to_chrono(value: &aws_sdk_s3::primitives::DateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(value.secs(), value.subsec_nanos())
}

/// S3 tagging header: `k1=v1&k2=v2`, URL-encoded.
fn encode_tags(tags: &HashMap<String, String>) -> Option<String> {
    if tags.is_empty() {
        return None;
    }
    let mut pairs: Vec<String> = tags
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect();
    pairs.sort();
    Some(pairs.join("&"))
}

#[async_trait]
impl ObjectStorage for S3CompatibleStorage {
    fn provider(&self) -> ObjectStorageProvider {
        self.flavor
    }

    async fn update_connection(&self, conn: &StorageConnection) -> ObjectStorageResult<()> {
        require_connection(conn, self.flavor)?;
        let handle = build_handle(self.flavor, conn).await?;
        self.clients.replace(&conn.cache_key(), handle).await;
        Ok(())
    }

    async fn evict_connection(&self, conn: &StorageConnection) {
        if self.clients.remove(&conn.cache_key()).await {
            tracing::info!(provider = %self.flavor, tenant = %conn.cache_key(), "Cached client evicted");
        }
    }

    #[tracing::instrument(skip(self, conn), fields(provider = %self.flavor))]
    async fn make_bucket(&self, conn: &StorageConnection, bucket: &str) -> ObjectStorageResult<()> {
        require_name("bucket", bucket)?;
        let handle = self.handle(conn).await?;
        let client = &handle.client;
        let location = (handle.region != US_EAST_1).then(|| {
            CreateBucketConfiguration::builder()
                .location_constraint(BucketLocationConstraint::from(handle.region.as_str()))
                .build()
        });

        with_retry(&self.retry, "create_bucket", || {
            let location = location.clone();
            async move {
                client
                    .create_bucket()
                    .bucket(bucket)
                    .set_create_bucket_configuration(location)
                    .send()
                    .await
                    .map_err(|e| self.sdk_error("create_bucket", bucket, e))
            }
        })
        .await?;

        tracing::info!(bucket = %bucket, "Bucket created");
        Ok(())
    }

    async fn bucket_exists(&self, conn: &StorageConnection, bucket: &str) -> ObjectStorageResult<bool> {
        require_name("bucket", bucket)?;
        let handle = self.handle(conn).await?;
        let client = &handle.client;

        with_retry(&self.retry, "head_bucket", || async move {
            match client.head_bucket().bucket(bucket).send().await {
                Ok(_) => Ok(true),
                Err(e) => match self.sdk_error("head_bucket", bucket, e) {
                    ObjectStorageError::NotFound { .. } => Ok(false),
                    other => Err(other),
                },
            }
        })
        .await
    }

    #[tracing::instrument(skip(self, conn), fields(provider = %self.flavor))]
    async fn delete_bucket(&self, conn: &StorageConnection, bucket: &str) -> ObjectStorageResult<()> {
        require_name("bucket", bucket)?;
        let handle = self.handle(conn).await?;
        let client = &handle.client;

        with_retry(&self.retry, "delete_bucket", || async move {
            client
                .delete_bucket()
                .bucket(bucket)
                .send()
                .await
                .map_err(|e| self.sdk_error("delete_bucket", bucket, e))
        })
        .await?;

        tracing::info!(bucket = %bucket, "Bucket deleted");
        Ok(())
    }

    async fn list_buckets(&self, conn: &StorageConnection) -> ObjectStorageResult<Vec<BucketInfo>> {
        let handle = self.handle(conn).await?;
        let client = &handle.client;

        let output = with_retry(&self.retry, "list_buckets", || async move {
            client
                .list_buckets()
                .send()
                .await
                .map_err(|e| self.sdk_error("list_buckets", "buckets", e))
        })
        .await?;

        Ok(output
            .buckets()
            .iter()
            .filter_map(|bucket| {
                bucket.name().map(|name| BucketInfo {
                    name: name.to_string(),
                    created_at: bucket.creation_date().and_then(to_chrono),
                })
            })
            .collect())
    }

    async fn set_versioning(
        &self,
        conn: &StorageConnection,
        bucket: &str,
        enabled: bool,
    ) -> ObjectStorageResult<()> {
        require_name("bucket", bucket)?;
        let handle = self.handle(conn).await?;
        let client = &handle.client;
        let status = if enabled {
            BucketVersioningStatus::Enabled
        } else {
            BucketVersioningStatus::Suspended
        };

        with_retry(&self.retry, "put_bucket_versioning", || {
            let configuration = VersioningConfiguration::builder()
                .status(status.clone())
                .build();
            async move {
                client
                    .put_bucket_versioning()
                    .bucket(bucket)
                    .versioning_configuration(configuration)
                    .send()
                    .await
                    .map_err(|e| self.sdk_error("put_bucket_versioning", bucket, e))
            }
        })
        .await?;

        tracing::info!(bucket = %bucket, enabled = enabled, "Bucket versioning updated");
        Ok(())
    }

    async fn versioning_enabled(
        &self,
        conn: &StorageConnection,
        bucket: &str,
    ) -> ObjectStorageResult<bool> {
        require_name("bucket", bucket)?;
        let handle = self.handle(conn).await?;
        let client = &handle.client;

        let output = with_retry(&self.retry, "get_bucket_versioning", || async move {
            client
                .get_bucket_versioning()
                .bucket(bucket)
                .send()
                .await
                .map_err(|e| self.sdk_error("get_bucket_versioning", bucket, e))
        })
        .await?;

        Ok(output.status() == Some(&BucketVersioningStatus::Enabled))
    }

    #[tracing::instrument(skip(self, conn, object), fields(provider = %self.flavor, key = %object.key))]
    async fn upload_object(
        &self,
        conn: &StorageConnection,
        bucket: &str,
        object: ObjectUpload,
    ) -> ObjectStorageResult<ObjectInfo> {
        require_upload(bucket, &object)?;
        let handle = self.handle(conn).await?;
        let client = &handle.client;
        let tagging = encode_tags(&object.tags);
        let object = &object;
        let start = std::time::Instant::now();

        let output = with_retry(&self.retry, "put_object", || {
            let tagging = tagging.clone();
            async move {
                client
                    .put_object()
                    .bucket(bucket)
                    .key(&object.key)
                    .body(ByteStream::from(object.data.clone()))
                    .set_content_type(object.content_type.clone())
                    .set_tagging(tagging)
                    .send()
                    .await
                    .map_err(|e| self.sdk_error("put_object", &object.key, e))
            }
        })
        .await?;

        tracing::info!(
            bucket = %bucket,
            size_bytes = object.data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Object uploaded"
        );

        Ok(ObjectInfo {
            key: object.key.clone(),
            size: object.data.len() as i64,
            etag: output.e_tag().map(str::to_string),
            content_type: object.content_type.clone(),
            last_modified: None,
            version_id: output.version_id().map(str::to_string),
        })
    }

    async fn download_object(
        &self,
        conn: &StorageConnection,
        bucket: &str,
        key: &str,
    ) -> ObjectStorageResult<Bytes> {
        require_object(bucket, key)?;
        let handle = self.handle(conn).await?;
        let client = &handle.client;

        with_retry(&self.retry, "get_object", || async move {
            let output = client
                .get_object()
                .bucket(bucket)
                .key(key)
                .send()
                .await
                .map_err(|e| self.sdk_error("get_object", key, e))?;
            let data = output.body.collect().await.map_err(|e| {
                ObjectStorageError::backend(self.flavor, "get_object", e.to_string())
            })?;
            Ok(data.into_bytes())
        })
        .await
    }

    async fn stat_object(
        &self,
        conn: &StorageConnection,
        bucket: &str,
        key: &str,
    ) -> ObjectStorageResult<ObjectInfo> {
        require_object(bucket, key)?;
        let handle = self.handle(conn).await?;
        let client = &handle.client;

        let output = with_retry(&self.retry, "head_object", || async move {
            client
                .head_object()
                .bucket(bucket)
                .key(key)
                .send()
                .await
                .map_err(|e| self.sdk_error("head_object", key, e))
        })
        .await?;

        Ok(ObjectInfo {
            key: key.to_string(),
            size: output.content_length().unwrap_or_default(),
            etag: output.e_tag().map(str::to_string),
            content_type: output.content_type().map(str::to_string),
            last_modified: output.last_modified().and_then(to_chrono),
            version_id: output.version_id().map(str::to_string),
        })
    }

    #[tracing::instrument(skip(self, conn), fields(provider = %self.flavor))]
    async fn delete_object(
        &self,
        conn: &StorageConnection,
        bucket: &str,
        key: &str,
    ) -> ObjectStorageResult<()> {
        require_object(bucket, key)?;
        let handle = self.handle(conn).await?;
        let client = &handle.client;

        with_retry(&self.retry, "delete_object", || async move {
            client
                .delete_object()
                .bucket(bucket)
                .key(key)
                .send()
                .await
                .map_err(|e| self.sdk_error("delete_object", key, e))
        })
        .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self, conn, keys), fields(provider = %self.flavor, count = keys.len()))]
    async fn delete_objects(
        &self,
        conn: &StorageConnection,
        bucket: &str,
        keys: &[String],
    ) -> ObjectStorageResult<()> {
        require_keys(bucket, keys)?;
        let identifiers = keys
            .iter()
            .map(|key| ObjectIdentifier::builder().key(key).build())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ObjectStorageError::InvalidArgument(e.to_string()))?;
        let delete = Delete::builder()
            .set_objects(Some(identifiers))
            .quiet(true)
            .build()
            .map_err(|e| ObjectStorageError::InvalidArgument(e.to_string()))?;

        let handle = self.handle(conn).await?;
        let client = &handle.client;

        with_retry(&self.retry, "delete_objects", || {
            let delete = delete.clone();
            async move {
                let output = client
                    .delete_objects()
                    .bucket(bucket)
                    .delete(delete)
                    .send()
                    .await
                    .map_err(|e| self.sdk_error("delete_objects", bucket, e))?;
                let failed: Vec<&str> = output.errors().iter().filter_map(|e| e.key()).collect();
                if failed.is_empty() {
                    Ok(())
                } else {
                    Err(ObjectStorageError::backend(
                        self.flavor,
                        "delete_objects",
                        format!("could not delete {}", failed.join(", ")),
                    ))
                }
            }
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
        require_object(bucket, key)?;
        let presigning = PresigningConfig::expires_in(expires_in)
            .map_err(|e| ObjectStorageError::InvalidArgument(e.to_string()))?;
        let handle = self.handle(conn).await?;

        let request = handle
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| self.sdk_error("presign_get_object", key, e))?;

        Ok(request.uri().to_string())
    }

    async fn list_objects(
        &self,
        conn: &StorageConnection,
        bucket: &str,
        prefix: Option<&str>,
    ) -> ObjectStorageResult<Vec<ObjectInfo>> {
        require_name("bucket", bucket)?;
        let handle = self.handle(conn).await?;
        let client = &handle.client;

        let mut objects = Vec::new();
        let mut continuation: Option<String> = None;
        loop {
            let token = continuation.take();
            let page = with_retry(&self.retry, "list_objects_v2", || {
                let token = token.clone();
                async move {
                    client
                        .list_objects_v2()
                        .bucket(bucket)
                        .set_prefix(prefix.map(str::to_string))
                        .set_continuation_token(token)
                        .send()
                        .await
                        .map_err(|e| self.sdk_error("list_objects_v2", bucket, e))
                }
            })
            .await?;

            objects.extend(page.contents().iter().filter_map(|object| {
                object.key().map(|key| ObjectInfo {
                    key: key.to_string(),
                    size: object.size().unwrap_or_default(),
                    etag: object.e_tag().map(str::to_string),
                    content_type: None,
                    last_modified: object.last_modified().and_then(to_chrono),
                    version_id: None,
                })
            }));

            continuation = page.next_continuation_token().map(str::to_string);
            if !page.is_truncated().unwrap_or(false) || continuation.is_none() {
                break;
            }
        }
        Ok(objects)
    }

    async fn object_tags(
        &self,
        conn: &StorageConnection,
        bucket: &str,
        key: &str,
    ) -> ObjectStorageResult<HashMap<String, String>> {
        require_object(bucket, key)?;
        let handle = self.handle(conn).await?;
        let client = &handle.client;

        let output = with_retry(&self.retry, "get_object_tagging", || async move {
            client
                .get_object_tagging()
                .bucket(bucket)
                .key(key)
                .send()
                .await
                .map_err(|e| self.sdk_error("get_object_tagging", key, e))
        })
        .await?;

        Ok(output
            .tag_set()
            .iter()
            .map(|tag| (tag.key().to_string(), tag.value().to_string()))
            .collect())
    }

    async fn set_object_tags(
        &self,
        conn: &StorageConnection,
        bucket: &str,
        key: &str,
        tags: HashMap<String, String>,
    ) -> ObjectStorageResult<()> {
        require_object(bucket, key)?;
        let tag_set = tags
            .iter()
            .map(|(k, v)| Tag::builder().key(k).value(v).build())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ObjectStorageError::InvalidArgument(e.to_string()))?;
        let tagging = Tagging::builder()
            .set_tag_set(Some(tag_set))
            .build()
            .map_err(|e| ObjectStorageError::InvalidArgument(e.to_string()))?;

        let handle = self.handle(conn).await?;
        let client = &handle.client;

        with_retry(&self.retry, "put_object_tagging", || {
            let tagging = tagging.clone();
            async move {
                client
                    .put_object_tagging()
                    .bucket(bucket)
                    .key(key)
                    .tagging(tagging)
                    .send()
                    .await
                    .map_err(|e| self.sdk_error("put_object_tagging", key, e))
            }
        })
        .await?;
        Ok(())
    }
}
