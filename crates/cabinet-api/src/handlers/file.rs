//! Single-file routes
//!
//! Combined create/update calls take a multipart body with an `entity` JSON
//! part and an optional `file` part.

use axum::{
    extract::{rejection::QueryRejection, Multipart, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use cabinet_core::{AppError, Entity, FileAttached};
use cabinet_crud::FileService;
use validator::Validate;

use crate::constants::{ENTITY_FIELD, FILE_FIELD};
use crate::error::HttpAppError;
use crate::handlers::IdQuery;
use crate::middleware::Tenant;
use crate::utils::download::file_response;
use crate::utils::multipart::MultipartForm;

pub struct FileState<E: Entity + FileAttached> {
    pub service: FileService<E>,
    pub max_file_size: usize,
}

impl<E: Entity + FileAttached> Clone for FileState<E> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            max_file_size: self.max_file_size,
        }
    }
}

pub fn routes<E>(service: FileService<E>, max_file_size: usize) -> Router
where
    E: Entity + FileAttached + Validate,
{
    Router::new()
        .route(
            "/file",
            post(create_with_file::<E>)
                .put(update_with_file::<E>)
                .delete(delete_file::<E>),
        )
        .route("/file/upload", post(upload_file::<E>))
        .route("/file/download", get(download_file::<E>))
        .with_state(FileState {
            service,
            max_file_size,
        })
}

async fn read_entity_and_file<E: Entity + Validate>(
    multipart: Multipart,
    max_file_size: usize,
) -> Result<(E, Option<cabinet_core::UploadedFile>), HttpAppError> {
    let mut form = MultipartForm::read(multipart, max_file_size).await?;
    let entity: E = form.json(ENTITY_FIELD)?;
    entity.validate().map_err(AppError::from)?;
    let file = form.take_file(FILE_FIELD)?;
    Ok((entity, file))
}

async fn create_with_file<E: Entity + FileAttached + Validate>(
    State(state): State<FileState<E>>,
    Tenant(scope): Tenant,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let (entity, file) = read_entity_and_file::<E>(multipart, state.max_file_size).await?;
    let created = state.service.create_with_file(&scope, entity, file).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_with_file<E: Entity + FileAttached + Validate>(
    State(state): State<FileState<E>>,
    Tenant(scope): Tenant,
    multipart: Multipart,
) -> Result<Json<E>, HttpAppError> {
    let (entity, file) = read_entity_and_file::<E>(multipart, state.max_file_size).await?;
    Ok(Json(state.service.update_with_file(&scope, entity, file).await?))
}

async fn upload_file<E: Entity + FileAttached>(
    State(state): State<FileState<E>>,
    Tenant(scope): Tenant,
    query: Result<Query<IdQuery>, QueryRejection>,
    multipart: Multipart,
) -> Result<Json<E>, HttpAppError> {
    let Query(IdQuery { id }) = query?;
    let mut form = MultipartForm::read(multipart, state.max_file_size).await?;
    let file = form.require_file(FILE_FIELD)?;
    Ok(Json(state.service.upload_file(&scope, id, file).await?))
}

async fn download_file<E: Entity + FileAttached>(
    State(state): State<FileState<E>>,
    Tenant(scope): Tenant,
    query: Result<Query<IdQuery>, QueryRejection>,
) -> Result<impl IntoResponse, HttpAppError> {
    let Query(IdQuery { id }) = query?;
    let file = state.service.download_file(&scope, id).await?;
    Ok(file_response(file)?)
}

async fn delete_file<E: Entity + FileAttached>(
    State(state): State<FileState<E>>,
    Tenant(scope): Tenant,
    query: Result<Query<IdQuery>, QueryRejection>,
) -> Result<StatusCode, HttpAppError> {
    let Query(IdQuery { id }) = query?;
    state.service.delete_file(&scope, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
