//! Cabinet Core Library
//!
//! Domain types shared by every Cabinet crate: the error taxonomy, configuration,
//! entity capability traits, tenant scope, attachment models, checksums, code
//! generation and extension hooks.

pub mod checksum;
pub mod code;
pub mod config;
pub mod constants;
pub mod entity;
pub mod error;
pub mod hooks;
pub mod models;
pub mod storage_types;
pub mod tenant;

// Re-export commonly used types
pub use code::{CodeGenerator, RandomCodeGenerator};
pub use config::{BaseConfig, CabinetConfig, Config};
pub use entity::{
    Cancelable, CodeAssignable, Entity, FileAttached, ImageAttached, MultiFileAttached,
    TenantAssignable,
};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use hooks::{CrudHooks, FileHooks, NoHooks};
pub use models::{
    AttachmentMeta, BucketInfo, DeleteOutcome, DownloadedFile, LinkedFile, ObjectInfo, Page,
    StorageConnection, UploadedFile,
};
pub use storage_types::{FileBackendKind, ObjectStorageProvider};
pub use tenant::TenantScope;
