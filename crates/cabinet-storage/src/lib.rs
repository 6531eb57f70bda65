//! Cabinet Storage Library
//!
//! Attachment byte storage behind the `FileBackend` trait, with a local
//! filesystem implementation and a remote DMS implementation. The backend is
//! chosen once from configuration.
//!
//! # Key layout
//!
//! Keys are relative and tenant-scoped, always `<tenant>/<kind>/...`. Key
//! generation is centralised in the `keys` module so both backends agree.

pub mod dms;
pub mod factory;
pub mod keys;
pub mod local;
pub mod traits;

// Re-export commonly used types
pub use dms::DmsFileBackend;
pub use factory::create_file_backend;
pub use keys::ObjectKey;
pub use local::LocalFileBackend;
pub use traits::{FileBackend, StorageError, StorageResult};
