use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Metadata for a single file or image attached to an entity.
///
/// `path` is the directory relative to the upload root and `file_name` the
/// stored object's name inside it; the object key is `path/file_name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AttachmentMeta {
    pub path: String,
    pub file_name: String,
    pub original_filename: String,
    pub extension: Option<String>,
    pub content_type: Option<String>,
    pub size: i64,
    /// Remote document code when stored in the DMS.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_ref: Option<String>,
}

impl AttachmentMeta {
    pub fn key(&self) -> String {
        join_key(&self.path, &self.file_name)
    }
}

/// A file linked to a multi-file entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LinkedFile {
    pub id: Uuid,
    pub code: String,
    pub tenant: String,
    pub path: String,
    pub original_filename: String,
    pub extension: Option<String>,
    pub mimetype: Option<String>,
    pub crc16: u16,
    pub crc32: u32,
    pub size: i64,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_ref: Option<String>,
}

impl LinkedFile {
    /// Object key of the stored bytes; linked files are stored under their code.
    pub fn key(&self) -> String {
        join_key(&self.path, &self.code)
    }
}

fn join_key(path: &str, name: &str) -> String {
    let path = path.trim_end_matches('/');
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", path, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attachment_key() {
        let meta = AttachmentMeta {
            path: "acme/document/".to_string(),
            file_name: "DOC-1".to_string(),
            original_filename: "hello.txt".to_string(),
            extension: Some("txt".to_string()),
            content_type: Some("text/plain".to_string()),
            size: 5,
            storage_ref: None,
        };
        assert_eq!(meta.key(), "acme/document/DOC-1");
    }

    #[test]
    fn test_storage_ref_omitted_when_local() {
        let meta = AttachmentMeta {
            path: String::new(),
            file_name: "a".to_string(),
            original_filename: "a".to_string(),
            extension: None,
            content_type: None,
            size: 0,
            storage_ref: None,
        };
        let json = serde_json::to_value(&meta).unwrap();
        assert!(json.get("storage_ref").is_none());
        assert_eq!(meta.key(), "a");
    }
}
