use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

/// A bucket (or LakeFS repository) as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct BucketInfo {
    pub name: String,
    pub created_at: Option<DateTime<Utc>>,
}

/// Object listing / stat entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ObjectInfo {
    pub key: String,
    pub size: i64,
    pub etag: Option<String>,
    pub content_type: Option<String>,
    pub last_modified: Option<DateTime<Utc>>,
    pub version_id: Option<String>,
}

impl ObjectInfo {
    pub fn new(key: impl Into<String>, size: i64) -> Self {
        Self {
            key: key.into(),
            size,
            etag: None,
            content_type: None,
            last_modified: None,
            version_id: None,
        }
    }
}
