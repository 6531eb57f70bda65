//! Object-storage adapters
//!
//! Thin wrappers over S3-compatible providers (Garage, OxiCloud, MinIO) and
//! LakeFS behind the [`ObjectStorage`] trait. Each adapter keeps one client
//! per tenant, validates arguments before any remote call and retries
//! provider failures with a bounded linear backoff.

pub mod cache;
pub mod error;
pub mod filter;
pub mod lakefs;
pub mod memory;
pub mod registry;
pub mod retry;
pub mod s3;
pub mod traits;

pub use cache::ClientCache;
pub use error::{ObjectStorageError, ObjectStorageResult};
pub use filter::{FilterOperator, TagFilter};
pub use lakefs::LakeFsStorage;
pub use memory::InMemoryObjectStorage;
pub use registry::ObjectStorageRegistry;
pub use retry::{with_retry, RetryPolicy};
pub use s3::S3CompatibleStorage;
pub use traits::{ObjectStorage, ObjectUpload};
