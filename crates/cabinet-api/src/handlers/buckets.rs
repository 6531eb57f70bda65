//! Object storage routes
//!
//! Every call runs against the caller's storage connection. Object keys may
//! contain `/`, so they travel in the query string rather than the path.
//!
//! | method | path | result |
//! |---|---|---|
//! | GET / POST | `/` | buckets / create bucket (201) |
//! | GET | `/{bucket}/exists` | `{exists}` |
//! | DELETE | `/{bucket}` | 204 |
//! | GET / PUT | `/{bucket}/versioning` | `{enabled}` / 204 |
//! | GET / POST / DELETE | `/{bucket}/objects` | list (`?prefix`) / upload (201) / delete (`?key`) |
//! | GET | `/{bucket}/objects/download?key=` | bytes |
//! | GET | `/{bucket}/objects/stat?key=` | object info |
//! | GET | `/{bucket}/objects/presign?key=&expires_secs=` | `{url}` |
//! | GET / PUT | `/{bucket}/objects/tags?key=` | tags / 204 |
//! | POST | `/{bucket}/objects/delete` | batch delete, 204 |
//! | POST | `/{bucket}/objects/filter` | objects matching a tag filter |

use std::collections::HashMap;
use std::time::Duration;

use axum::{
    extract::{rejection::QueryRejection, Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use cabinet_core::{AppError, BucketInfo, DownloadedFile, ObjectInfo};
use cabinet_services::{ObjectUpload, TagFilter};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::constants::FILE_FIELD;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::middleware::Tenant;
use crate::state::ObjectStorageState;
use crate::utils::download::file_response;
use crate::utils::multipart::MultipartForm;

#[derive(Clone)]
pub struct BucketState {
    pub storage: ObjectStorageState,
    pub max_file_size: usize,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBucketRequest {
    pub name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ExistsResponse {
    pub exists: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VersioningBody {
    pub enabled: bool,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct KeyQuery {
    pub key: String,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListQuery {
    #[serde(default)]
    pub prefix: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct PresignQuery {
    pub key: String,
    #[serde(default)]
    pub expires_secs: Option<u64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PresignResponse {
    pub url: String,
    pub expires_in_secs: u64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DeleteObjectsRequest {
    pub keys: Vec<String>,
}

pub fn routes(storage: ObjectStorageState, max_file_size: usize) -> Router {
    Router::new()
        .route("/", get(list_buckets).post(make_bucket))
        .route("/{bucket}", delete(delete_bucket))
        .route("/{bucket}/exists", get(bucket_exists))
        .route("/{bucket}/versioning", get(get_versioning).put(set_versioning))
        .route(
            "/{bucket}/objects",
            get(list_objects).post(upload_object).delete(delete_object),
        )
        .route("/{bucket}/objects/download", get(download_object))
        .route("/{bucket}/objects/stat", get(stat_object))
        .route("/{bucket}/objects/presign", get(presigned_url))
        .route("/{bucket}/objects/tags", get(object_tags).put(set_object_tags))
        .route("/{bucket}/objects/delete", post(delete_objects))
        .route("/{bucket}/objects/filter", post(filter_objects))
        .with_state(BucketState {
            storage,
            max_file_size,
        })
}

#[utoipa::path(
    get,
    path = "/api/v1/storage/buckets",
    tag = "object-storage",
    params(("X-Tenant-ID" = String, Header, description = "Tenant")),
    responses(
        (status = 200, description = "Buckets of the tenant's storage", body = Vec<BucketInfo>),
        (status = 404, description = "No storage connection for the tenant", body = ErrorResponse),
        (status = 502, description = "Provider unavailable", body = ErrorResponse)
    )
)]
pub async fn list_buckets(
    State(state): State<BucketState>,
    Tenant(scope): Tenant,
) -> Result<Json<Vec<BucketInfo>>, HttpAppError> {
    let (conn, adapter) = state.storage.resolve(&scope).await?;
    Ok(Json(adapter.list_buckets(&conn).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/storage/buckets",
    tag = "object-storage",
    params(("X-Tenant-ID" = String, Header, description = "Tenant")),
    request_body = CreateBucketRequest,
    responses(
        (status = 201, description = "Bucket created", body = BucketInfo),
        (status = 400, description = "Invalid bucket name", body = ErrorResponse),
        (status = 502, description = "Provider unavailable", body = ErrorResponse)
    )
)]
pub async fn make_bucket(
    State(state): State<BucketState>,
    Tenant(scope): Tenant,
    ValidatedJson(body): ValidatedJson<CreateBucketRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let (conn, adapter) = state.storage.resolve(&scope).await?;
    adapter.make_bucket(&conn, &body.name).await?;
    Ok((
        StatusCode::CREATED,
        Json(BucketInfo {
            name: body.name,
            created_at: None,
        }),
    ))
}

async fn bucket_exists(
    State(state): State<BucketState>,
    Tenant(scope): Tenant,
    Path(bucket): Path<String>,
) -> Result<Json<ExistsResponse>, HttpAppError> {
    let (conn, adapter) = state.storage.resolve(&scope).await?;
    let exists = adapter.bucket_exists(&conn, &bucket).await?;
    Ok(Json(ExistsResponse { exists }))
}

async fn delete_bucket(
    State(state): State<BucketState>,
    Tenant(scope): Tenant,
    Path(bucket): Path<String>,
) -> Result<StatusCode, HttpAppError> {
    let (conn, adapter) = state.storage.resolve(&scope).await?;
    adapter.delete_bucket(&conn, &bucket).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_versioning(
    State(state): State<BucketState>,
    Tenant(scope): Tenant,
    Path(bucket): Path<String>,
) -> Result<Json<VersioningBody>, HttpAppError> {
    let (conn, adapter) = state.storage.resolve(&scope).await?;
    let enabled = adapter.versioning_enabled(&conn, &bucket).await?;
    Ok(Json(VersioningBody { enabled }))
}

async fn set_versioning(
    State(state): State<BucketState>,
    Tenant(scope): Tenant,
    Path(bucket): Path<String>,
    ValidatedJson(body): ValidatedJson<VersioningBody>,
) -> Result<StatusCode, HttpAppError> {
    let (conn, adapter) = state.storage.resolve(&scope).await?;
    adapter.set_versioning(&conn, &bucket, body.enabled).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_objects(
    State(state): State<BucketState>,
    Tenant(scope): Tenant,
    Path(bucket): Path<String>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Vec<ObjectInfo>>, HttpAppError> {
    let Query(query) = query?;
    let (conn, adapter) = state.storage.resolve(&scope).await?;
    let objects = adapter
        .list_objects(&conn, &bucket, query.prefix.as_deref())
        .await?;
    Ok(Json(objects))
}

/// Multipart upload: a `file` part, an optional `key` (defaults to the
/// filename) and optional `tags` as a JSON object of strings.
async fn upload_object(
    State(state): State<BucketState>,
    Tenant(scope): Tenant,
    Path(bucket): Path<String>,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let mut form = MultipartForm::read(multipart, state.max_file_size).await?;
    let file = form.require_file(FILE_FIELD)?;
    let key = form
        .text("key")
        .filter(|k| !k.trim().is_empty())
        .unwrap_or_else(|| file.filename.clone());
    let tags: HashMap<String, String> = match form.text("tags") {
        Some(_) => form.json("tags")?,
        None => HashMap::new(),
    };

    let mut upload = ObjectUpload::new(key, file.data).with_tags(tags);
    if let Some(content_type) = file.content_type {
        upload = upload.with_content_type(content_type);
    }

    let (conn, adapter) = state.storage.resolve(&scope).await?;
    let info = adapter.upload_object(&conn, &bucket, upload).await?;
    Ok((StatusCode::CREATED, Json(info)))
}

async fn download_object(
    State(state): State<BucketState>,
    Tenant(scope): Tenant,
    Path(bucket): Path<String>,
    query: Result<Query<KeyQuery>, QueryRejection>,
) -> Result<impl IntoResponse, HttpAppError> {
    let Query(KeyQuery { key }) = query?;
    let (conn, adapter) = state.storage.resolve(&scope).await?;
    let data = adapter.download_object(&conn, &bucket, &key).await?;
    let filename = key.rsplit('/').next().unwrap_or(&key).to_string();
    Ok(file_response(DownloadedFile {
        filename,
        content_type: None,
        data,
    })?)
}

async fn stat_object(
    State(state): State<BucketState>,
    Tenant(scope): Tenant,
    Path(bucket): Path<String>,
    query: Result<Query<KeyQuery>, QueryRejection>,
) -> Result<Json<ObjectInfo>, HttpAppError> {
    let Query(KeyQuery { key }) = query?;
    let (conn, adapter) = state.storage.resolve(&scope).await?;
    Ok(Json(adapter.stat_object(&conn, &bucket, &key).await?))
}

async fn delete_object(
    State(state): State<BucketState>,
    Tenant(scope): Tenant,
    Path(bucket): Path<String>,
    query: Result<Query<KeyQuery>, QueryRejection>,
) -> Result<StatusCode, HttpAppError> {
    let Query(KeyQuery { key }) = query?;
    let (conn, adapter) = state.storage.resolve(&scope).await?;
    adapter.delete_object(&conn, &bucket, &key).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_objects(
    State(state): State<BucketState>,
    Tenant(scope): Tenant,
    Path(bucket): Path<String>,
    ValidatedJson(body): ValidatedJson<DeleteObjectsRequest>,
) -> Result<StatusCode, HttpAppError> {
    if body.keys.is_empty() {
        return Err(AppError::EmptyList("No object keys to delete".to_string()).into());
    }
    let (conn, adapter) = state.storage.resolve(&scope).await?;
    adapter.delete_objects(&conn, &bucket, &body.keys).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn presigned_url(
    State(state): State<BucketState>,
    Tenant(scope): Tenant,
    Path(bucket): Path<String>,
    query: Result<Query<PresignQuery>, QueryRejection>,
) -> Result<Json<PresignResponse>, HttpAppError> {
    let Query(query) = query?;
    let expires = query
        .expires_secs
        .map(Duration::from_secs)
        .unwrap_or(state.storage.presigned_url_expiry);
    let (conn, adapter) = state.storage.resolve(&scope).await?;
    let url = adapter
        .presigned_get_url(&conn, &bucket, &query.key, expires)
        .await?;
    Ok(Json(PresignResponse {
        url,
        expires_in_secs: expires.as_secs(),
    }))
}

async fn object_tags(
    State(state): State<BucketState>,
    Tenant(scope): Tenant,
    Path(bucket): Path<String>,
    query: Result<Query<KeyQuery>, QueryRejection>,
) -> Result<Json<HashMap<String, String>>, HttpAppError> {
    let Query(KeyQuery { key }) = query?;
    let (conn, adapter) = state.storage.resolve(&scope).await?;
    Ok(Json(adapter.object_tags(&conn, &bucket, &key).await?))
}

async fn set_object_tags(
    State(state): State<BucketState>,
    Tenant(scope): Tenant,
    Path(bucket): Path<String>,
    query: Result<Query<KeyQuery>, QueryRejection>,
    ValidatedJson(tags): ValidatedJson<HashMap<String, String>>,
) -> Result<StatusCode, HttpAppError> {
    let Query(KeyQuery { key }) = query?;
    let (conn, adapter) = state.storage.resolve(&scope).await?;
    adapter.set_object_tags(&conn, &bucket, &key, tags).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/v1/storage/buckets/{bucket}/objects/filter",
    tag = "object-storage",
    params(
        ("X-Tenant-ID" = String, Header, description = "Tenant"),
        ("bucket" = String, Path, description = "Bucket name")
    ),
    request_body = TagFilter,
    responses(
        (status = 200, description = "Objects whose tags match", body = Vec<ObjectInfo>),
        (status = 404, description = "Bucket not found", body = ErrorResponse)
    )
)]
pub async fn filter_objects(
    State(state): State<BucketState>,
    Tenant(scope): Tenant,
    Path(bucket): Path<String>,
    ValidatedJson(filter): ValidatedJson<TagFilter>,
) -> Result<Json<Vec<ObjectInfo>>, HttpAppError> {
    let (conn, adapter) = state.storage.resolve(&scope).await?;
    Ok(Json(adapter.filter_objects(&conn, &bucket, &filter).await?))
}
