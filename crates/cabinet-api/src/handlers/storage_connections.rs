//! Tenant storage connections
//!
//! Stored through the CRUD core like any entity. Saving a connection also
//! rebuilds the tenant's cached client, and responses never echo the secret.

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use cabinet_core::{AppError, ObjectStorageProvider, Page, StorageConnection, TenantScope};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::middleware::Tenant;
use crate::state::ObjectStorageState;

/// A storage connection without its secret
#[derive(Debug, Serialize, ToSchema)]
pub struct StorageConnectionResponse {
    pub id: Option<Uuid>,
    pub tenant: Option<String>,
    pub provider: ObjectStorageProvider,
    pub endpoint: String,
    pub access_key: String,
    pub region: Option<String>,
    pub branch: Option<String>,
    pub storage_namespace: Option<String>,
}

impl From<StorageConnection> for StorageConnectionResponse {
    fn from(conn: StorageConnection) -> Self {
        Self {
            id: conn.id,
            tenant: conn.tenant,
            provider: conn.provider,
            endpoint: conn.endpoint,
            access_key: conn.access_key,
            region: conn.region,
            branch: conn.branch,
            storage_namespace: conn.storage_namespace,
        }
    }
}

pub fn routes(state: ObjectStorageState) -> Router {
    Router::new()
        .route(
            "/",
            get(list_connections)
                .post(create_connection)
                .put(update_connection),
        )
        .route("/{id}", get(get_connection).delete(delete_connection))
        .with_state(state)
}

/// Push the saved connection into the adapter's client cache.
async fn refresh_client(
    state: &ObjectStorageState,
    conn: &StorageConnection,
) -> Result<(), AppError> {
    let adapter = state.adapter_for(conn)?;
    adapter.update_connection(conn).await?;
    Ok(())
}

#[utoipa::path(
    get,
    path = "/api/v1/storage/connections",
    tag = "storage-connections",
    params(("X-Tenant-ID" = String, Header, description = "Tenant"), Page),
    responses(
        (status = 200, description = "Connections visible to the tenant", body = Vec<StorageConnectionResponse>)
    )
)]
pub async fn list_connections(
    State(state): State<ObjectStorageState>,
    Tenant(scope): Tenant,
    query: Result<Query<Page>, QueryRejection>,
) -> Result<Json<Vec<StorageConnectionResponse>>, HttpAppError> {
    let Query(page) = query?;
    let connections = state.connections.find_all(&scope, page.clamped()).await?;
    Ok(Json(connections.into_iter().map(Into::into).collect()))
}

async fn get_connection(
    State(state): State<ObjectStorageState>,
    Tenant(scope): Tenant,
    Path(id): Path<Uuid>,
) -> Result<Json<StorageConnectionResponse>, HttpAppError> {
    let conn = state.connections.find_by_id(&scope, id).await?;
    Ok(Json(conn.into()))
}

async fn ensure_single_connection(
    state: &ObjectStorageState,
    scope: &TenantScope,
    conn: &StorageConnection,
) -> Result<(), AppError> {
    // the owner the record will be saved under
    let owner = match conn.tenant.as_deref().filter(|t| !t.trim().is_empty()) {
        Some(given) if scope.is_super() => given,
        _ => scope.tenant(),
    };
    let existing = state
        .connections
        .find_owned_by(scope, owner, Page::new(0, 1))
        .await?;
    if !existing.is_empty() {
        return Err(AppError::Conflict(format!(
            "Tenant {} already has a storage connection",
            owner
        )));
    }
    Ok(())
}

#[utoipa::path(
    post,
    path = "/api/v1/storage/connections",
    tag = "storage-connections",
    params(("X-Tenant-ID" = String, Header, description = "Tenant")),
    request_body = StorageConnection,
    responses(
        (status = 201, description = "Connection stored and client built", body = StorageConnectionResponse),
        (status = 400, description = "Invalid connection", body = ErrorResponse),
        (status = 409, description = "Tenant already has a connection", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip_all, fields(tenant = %scope, provider = %conn.provider))]
pub async fn create_connection(
    State(state): State<ObjectStorageState>,
    Tenant(scope): Tenant,
    ValidatedJson(conn): ValidatedJson<StorageConnection>,
) -> Result<impl IntoResponse, HttpAppError> {
    conn.validate().map_err(AppError::from)?;
    ensure_single_connection(&state, &scope, &conn).await?;

    let created = state.connections.create(&scope, conn).await?;
    if let Err(error) = refresh_client(&state, &created).await {
        if let Some(id) = created.id {
            state.connections.delete(&scope, id).await?;
        }
        return Err(error.into());
    }

    tracing::info!(id = ?created.id, "Storage connection created");
    Ok((
        StatusCode::CREATED,
        Json(StorageConnectionResponse::from(created)),
    ))
}

#[tracing::instrument(skip_all, fields(tenant = %scope, provider = %conn.provider))]
async fn update_connection(
    State(state): State<ObjectStorageState>,
    Tenant(scope): Tenant,
    ValidatedJson(conn): ValidatedJson<StorageConnection>,
) -> Result<Json<StorageConnectionResponse>, HttpAppError> {
    conn.validate().map_err(AppError::from)?;
    let id = conn
        .id
        .ok_or_else(|| AppError::BadRequest("Storage connection id is required".to_string()))?;
    let previous = state.connections.find_by_id(&scope, id).await?;

    let updated = state.connections.update(&scope, conn).await?;
    if let Err(error) = refresh_client(&state, &updated).await {
        // keep the stored row in line with the client still cached
        state.connections.update(&scope, previous).await?;
        return Err(error.into());
    }

    if previous.provider != updated.provider || previous.cache_key() != updated.cache_key() {
        if let Ok(adapter) = state.adapter_for(&previous) {
            adapter.evict_connection(&previous).await;
        }
    }

    tracing::info!(id = ?updated.id, "Storage connection updated");
    Ok(Json(updated.into()))
}

async fn delete_connection(
    State(state): State<ObjectStorageState>,
    Tenant(scope): Tenant,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, HttpAppError> {
    state.connections.delete(&scope, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
