//! Generic CRUD routes
//!
//! | method | path | result |
//! |---|---|---|
//! | GET | `/` | page of records visible to the tenant |
//! | GET | `/count` | `{count}` |
//! | GET | `/{id}` | one record |
//! | GET | `/code/{code}` | one record by business code |
//! | POST / PUT | `/` | created (201) / updated record |
//! | DELETE | `/{id}` | 204 |
//! | POST / PUT / DELETE | `/batch` | 201 / 200 / 204 |

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use cabinet_core::{AppError, DeleteOutcome, Entity, Page, TenantScope};
use cabinet_crud::{CrudService, FileService, ImageService};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::error::{HttpAppError, ValidatedJson};
use crate::handlers::CountResponse;
use crate::middleware::Tenant;

/// How records of one entity type are deleted.
///
/// Plain CRUD just deletes the record; attachment services also remove the
/// stored bytes of hard-deleted records.
#[async_trait]
pub trait RecordDeletion<E: Entity>: Send + Sync + 'static {
    async fn delete(&self, scope: &TenantScope, id: Uuid) -> Result<DeleteOutcome, AppError>;

    async fn delete_all(
        &self,
        scope: &TenantScope,
        ids: Vec<Uuid>,
    ) -> Result<Vec<DeleteOutcome>, AppError>;
}

#[async_trait]
impl<E: Entity> RecordDeletion<E> for CrudService<E> {
    async fn delete(&self, scope: &TenantScope, id: Uuid) -> Result<DeleteOutcome, AppError> {
        CrudService::delete(self, scope, id).await
    }

    async fn delete_all(
        &self,
        scope: &TenantScope,
        ids: Vec<Uuid>,
    ) -> Result<Vec<DeleteOutcome>, AppError> {
        CrudService::delete_all(self, scope, ids).await
    }
}

#[async_trait]
impl<E: Entity + cabinet_core::FileAttached> RecordDeletion<E> for FileService<E> {
    async fn delete(&self, scope: &TenantScope, id: Uuid) -> Result<DeleteOutcome, AppError> {
        FileService::delete(self, scope, id).await
    }

    async fn delete_all(
        &self,
        scope: &TenantScope,
        ids: Vec<Uuid>,
    ) -> Result<Vec<DeleteOutcome>, AppError> {
        FileService::delete_all(self, scope, ids).await
    }
}

#[async_trait]
impl<E: Entity + cabinet_core::ImageAttached> RecordDeletion<E> for ImageService<E> {
    async fn delete(&self, scope: &TenantScope, id: Uuid) -> Result<DeleteOutcome, AppError> {
        ImageService::delete(self, scope, id).await
    }

    async fn delete_all(
        &self,
        scope: &TenantScope,
        ids: Vec<Uuid>,
    ) -> Result<Vec<DeleteOutcome>, AppError> {
        ImageService::delete_all(self, scope, ids).await
    }
}

pub struct CrudState<E: Entity> {
    pub crud: CrudService<E>,
    pub deletion: Arc<dyn RecordDeletion<E>>,
}

impl<E: Entity> Clone for CrudState<E> {
    fn clone(&self) -> Self {
        Self {
            crud: self.crud.clone(),
            deletion: Arc::clone(&self.deletion),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct IdList {
    pub ids: Vec<Uuid>,
}

pub fn routes<E>(crud: CrudService<E>, deletion: Arc<dyn RecordDeletion<E>>) -> Router
where
    E: Entity + Validate,
{
    Router::new()
        .route("/", get(list::<E>).post(create::<E>).put(update::<E>))
        .route("/count", get(count::<E>))
        .route(
            "/batch",
            axum::routing::post(create_all::<E>)
                .put(update_all::<E>)
                .delete(delete_all::<E>),
        )
        .route("/code/{code}", get(find_by_code::<E>))
        .route("/{id}", get(find_by_id::<E>).delete(delete::<E>))
        .with_state(CrudState { crud, deletion })
}

fn validate_all<E: Validate>(entities: &[E]) -> Result<(), AppError> {
    for entity in entities {
        entity.validate()?;
    }
    Ok(())
}

async fn list<E: Entity>(
    State(state): State<CrudState<E>>,
    Tenant(scope): Tenant,
    query: Result<Query<Page>, QueryRejection>,
) -> Result<Json<Vec<E>>, HttpAppError> {
    let Query(page) = query?;
    Ok(Json(state.crud.find_all(&scope, page.clamped()).await?))
}

async fn count<E: Entity>(
    State(state): State<CrudState<E>>,
    Tenant(scope): Tenant,
) -> Result<Json<CountResponse>, HttpAppError> {
    let count = state.crud.count(&scope).await?;
    Ok(Json(CountResponse { count }))
}

async fn find_by_id<E: Entity>(
    State(state): State<CrudState<E>>,
    Tenant(scope): Tenant,
    Path(id): Path<Uuid>,
) -> Result<Json<E>, HttpAppError> {
    Ok(Json(state.crud.find_by_id(&scope, id).await?))
}

async fn find_by_code<E: Entity>(
    State(state): State<CrudState<E>>,
    Tenant(scope): Tenant,
    Path(code): Path<String>,
) -> Result<Json<E>, HttpAppError> {
    Ok(Json(state.crud.find_by_code(&scope, &code).await?))
}

async fn create<E: Entity + Validate>(
    State(state): State<CrudState<E>>,
    Tenant(scope): Tenant,
    ValidatedJson(entity): ValidatedJson<E>,
) -> Result<impl IntoResponse, HttpAppError> {
    entity.validate().map_err(AppError::from)?;
    let created = state.crud.create(&scope, entity).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update<E: Entity + Validate>(
    State(state): State<CrudState<E>>,
    Tenant(scope): Tenant,
    ValidatedJson(entity): ValidatedJson<E>,
) -> Result<Json<E>, HttpAppError> {
    entity.validate().map_err(AppError::from)?;
    Ok(Json(state.crud.update(&scope, entity).await?))
}

async fn delete<E: Entity>(
    State(state): State<CrudState<E>>,
    Tenant(scope): Tenant,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, HttpAppError> {
    let outcome = state.deletion.delete(&scope, id).await?;
    tracing::debug!(kind = E::KIND, id = %id, outcome = ?outcome, "Record deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn create_all<E: Entity + Validate>(
    State(state): State<CrudState<E>>,
    Tenant(scope): Tenant,
    ValidatedJson(entities): ValidatedJson<Vec<E>>,
) -> Result<impl IntoResponse, HttpAppError> {
    validate_all(&entities)?;
    let created = state.crud.create_all(&scope, entities).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_all<E: Entity + Validate>(
    State(state): State<CrudState<E>>,
    Tenant(scope): Tenant,
    ValidatedJson(entities): ValidatedJson<Vec<E>>,
) -> Result<Json<Vec<E>>, HttpAppError> {
    validate_all(&entities)?;
    Ok(Json(state.crud.update_all(&scope, entities).await?))
}

async fn delete_all<E: Entity>(
    State(state): State<CrudState<E>>,
    Tenant(scope): Tenant,
    ValidatedJson(body): ValidatedJson<IdList>,
) -> Result<StatusCode, HttpAppError> {
    state.deletion.delete_all(&scope, body.ids).await?;
    Ok(StatusCode::NO_CONTENT)
}
