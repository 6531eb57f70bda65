//! Shared key layout for attachment backends.
//!
//! Every key starts with `<tenant>/<kind>`:
//! - single file: `<tenant>/<kind>/<code>`
//! - image: `<tenant>/<kind>/image/<filename>_<code>.png`
//! - linked file: `<tenant>/<kind>/additional/<linked-code>`
//!
//! Segments are sanitised so no caller-supplied value can add directories.
//! The caller-supplied part of an image name is cut to [`MAX_FILE_STEM_CHARS`].

use cabinet_core::constants::{ADDITIONAL_DIR, IMAGE_DIR, IMAGE_EXTENSION};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Longest original-filename stem kept in an image key.
pub const MAX_FILE_STEM_CHARS: usize = 64;

/// Relative location of a stored object: a directory and a name inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectKey {
    pub path: String,
    pub name: String,
}

impl ObjectKey {
    pub fn new(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
        }
    }

    /// `path/name`, or just `name` when the path is empty.
    pub fn as_key(&self) -> String {
        let path = self.path.trim_end_matches('/');
        if path.is_empty() {
            self.name.clone()
        } else {
            format!("{}/{}", path, self.name)
        }
    }
}

impl Display for ObjectKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_key())
    }
}

/// Replace anything that could act as a path separator or parent reference.
fn segment(value: &str) -> String {
    let cleaned: String = value
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.replace("..", "_");
    if cleaned.is_empty() {
        "_".to_string()
    } else {
        cleaned
    }
}

/// `<tenant>/<kind>`
pub fn entity_dir(tenant: &str, kind: &str) -> String {
    format!("{}/{}", segment(tenant), segment(kind))
}

/// Whether `path` is `dir` or lies below it, with no parent references.
pub fn is_within(path: &str, dir: &str) -> bool {
    if path.split('/').any(|part| part == "..") {
        return false;
    }
    match path.strip_prefix(dir) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

pub fn file_key(tenant: &str, kind: &str, code: &str) -> ObjectKey {
    ObjectKey::new(entity_dir(tenant, kind), segment(code))
}

pub fn image_key(tenant: &str, kind: &str, file_stem: &str, code: &str) -> ObjectKey {
    ObjectKey::new(
        format!("{}/{}", entity_dir(tenant, kind), IMAGE_DIR),
        format!(
            "{}_{}.{}",
            segment(file_stem)
                .chars()
                .take(MAX_FILE_STEM_CHARS)
                .collect::<String>(),
            segment(code),
            IMAGE_EXTENSION
        ),
    )
}

pub fn additional_key(tenant: &str, kind: &str, linked_code: &str) -> ObjectKey {
    ObjectKey::new(
        format!("{}/{}", entity_dir(tenant, kind), ADDITIONAL_DIR),
        segment(linked_code),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        assert_eq!(file_key("acme", "document", "DOC-1").as_key(), "acme/document/DOC-1");
        assert_eq!(
            image_key("acme", "profile", "avatar", "PRO-1").as_key(),
            "acme/profile/image/avatar_PRO-1.png"
        );
        assert_eq!(
            additional_key("acme", "document", "LF-9").as_key(),
            "acme/document/additional/LF-9"
        );
    }

    #[test]
    fn test_segments_cannot_escape() {
        let key = file_key("../etc", "doc/x", "a\\b");
        assert_eq!(key.as_key(), "__etc/doc_x/a_b");
        assert!(!key.as_key().contains(".."));
        assert_eq!(file_key("", "doc", "c").path, "_/doc");
    }

    #[test]
    fn test_long_image_stem_is_cut() {
        let stem = "x".repeat(300);
        let key = image_key("acme", "profile", &stem, "PRO-1");
        assert_eq!(key.name, format!("{}_PRO-1.png", "x".repeat(MAX_FILE_STEM_CHARS)));
    }

    #[test]
    fn test_is_within() {
        let dir = entity_dir("acme", "document");
        assert!(is_within("acme/document", &dir));
        assert!(is_within("acme/document/additional", &dir));
        assert!(!is_within("acme/documents", &dir));
        assert!(!is_within("globex/document", &dir));
        assert!(!is_within("acme/document/../../globex/document", &dir));
    }
}
