//! Multi-file (linked file) routes

use axum::{
    extract::{rejection::QueryRejection, Multipart, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use cabinet_core::{Entity, LinkedFile, MultiFileAttached};
use cabinet_crud::MultiFileService;
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::constants::{FILES_FIELD, FILE_FIELD};
use crate::error::HttpAppError;
use crate::handlers::IdQuery;
use crate::middleware::Tenant;
use crate::utils::download::file_response;
use crate::utils::multipart::MultipartForm;

pub struct MultiFileState<E: Entity + MultiFileAttached> {
    pub service: MultiFileService<E>,
    pub max_file_size: usize,
}

impl<E: Entity + MultiFileAttached> Clone for MultiFileState<E> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            max_file_size: self.max_file_size,
        }
    }
}

/// `?id=&file_id=` addressing one linked file, with an optional version
#[derive(Debug, Deserialize, IntoParams)]
pub struct LinkedFileQuery {
    pub id: Uuid,
    pub file_id: Uuid,
    #[serde(default)]
    pub version: Option<i32>,
}

pub fn routes<E>(service: MultiFileService<E>, max_file_size: usize) -> Router
where
    E: Entity + MultiFileAttached,
{
    Router::new()
        .route("/multi-files", get(list_files::<E>).delete(delete_file::<E>))
        .route("/multi-files/upload", post(upload_files::<E>))
        .route("/multi-files/upload/one", post(upload_file::<E>))
        .route("/multi-files/download", get(download_file::<E>))
        .with_state(MultiFileState {
            service,
            max_file_size,
        })
}

async fn upload_files<E: Entity + MultiFileAttached>(
    State(state): State<MultiFileState<E>>,
    Tenant(scope): Tenant,
    query: Result<Query<IdQuery>, QueryRejection>,
    multipart: Multipart,
) -> Result<Json<Vec<LinkedFile>>, HttpAppError> {
    let Query(IdQuery { id }) = query?;
    let mut form = MultipartForm::read(multipart, state.max_file_size).await?;
    let files = form.take_files(FILES_FIELD);
    Ok(Json(state.service.upload_files(&scope, id, files).await?))
}

async fn upload_file<E: Entity + MultiFileAttached>(
    State(state): State<MultiFileState<E>>,
    Tenant(scope): Tenant,
    query: Result<Query<IdQuery>, QueryRejection>,
    multipart: Multipart,
) -> Result<Json<LinkedFile>, HttpAppError> {
    let Query(IdQuery { id }) = query?;
    let mut form = MultipartForm::read(multipart, state.max_file_size).await?;
    let file = form.require_file(FILE_FIELD)?;
    Ok(Json(state.service.upload_file(&scope, id, file).await?))
}

async fn list_files<E: Entity + MultiFileAttached>(
    State(state): State<MultiFileState<E>>,
    Tenant(scope): Tenant,
    query: Result<Query<IdQuery>, QueryRejection>,
) -> Result<Json<Vec<LinkedFile>>, HttpAppError> {
    let Query(IdQuery { id }) = query?;
    Ok(Json(state.service.list_files(&scope, id).await?))
}

async fn download_file<E: Entity + MultiFileAttached>(
    State(state): State<MultiFileState<E>>,
    Tenant(scope): Tenant,
    query: Result<Query<LinkedFileQuery>, QueryRejection>,
) -> Result<impl IntoResponse, HttpAppError> {
    let Query(query) = query?;
    let file = state
        .service
        .download_file(&scope, query.id, query.file_id, query.version)
        .await?;
    Ok(file_response(file)?)
}

async fn delete_file<E: Entity + MultiFileAttached>(
    State(state): State<MultiFileState<E>>,
    Tenant(scope): Tenant,
    query: Result<Query<LinkedFileQuery>, QueryRejection>,
) -> Result<StatusCode, HttpAppError> {
    let Query(query) = query?;
    state
        .service
        .delete_file(&scope, query.id, query.file_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
