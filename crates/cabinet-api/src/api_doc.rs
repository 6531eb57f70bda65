//! OpenAPI documentation, served at `/api-docs/openapi.json`.
//!
//! The generic entity routes are not annotated; their bodies are listed as
//! schemas so clients can still generate types for them.

use utoipa::OpenApi;

use crate::entities::{Document, Profile};
use crate::error::ErrorResponse;
use crate::handlers::{self, buckets, crud, storage_connections};
use cabinet_core::models::{AttachmentMeta, BucketInfo, DeleteOutcome, LinkedFile, ObjectInfo};
use cabinet_core::{ObjectStorageProvider, StorageConnection};
use cabinet_services::{FilterOperator, TagFilter};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Cabinet API",
        version = "0.1.0",
        description = "Multi-tenant records with file, image and linked-file attachments, plus per-tenant object storage. Every /api/v1 route requires the X-Tenant-ID header."
    ),
    paths(
        buckets::list_buckets,
        buckets::make_bucket,
        buckets::filter_objects,
        storage_connections::list_connections,
        storage_connections::create_connection,
    ),
    components(schemas(
        Document,
        Profile,
        AttachmentMeta,
        LinkedFile,
        DeleteOutcome,
        StorageConnection,
        storage_connections::StorageConnectionResponse,
        ObjectStorageProvider,
        BucketInfo,
        ObjectInfo,
        TagFilter,
        FilterOperator,
        buckets::CreateBucketRequest,
        buckets::ExistsResponse,
        buckets::VersioningBody,
        buckets::PresignResponse,
        buckets::DeleteObjectsRequest,
        crud::IdList,
        handlers::CountResponse,
        ErrorResponse,
    )),
    tags(
        (name = "documents", description = "Cancelable records with a file and linked files"),
        (name = "profiles", description = "Records with an image"),
        (name = "storage-connections", description = "Per-tenant object storage settings"),
        (name = "object-storage", description = "Buckets and objects on the tenant's storage"),
    )
)]
pub struct ApiDoc;
