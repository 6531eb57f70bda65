//! Image routes
//!
//! Same shape as the file routes, with the record id in the path and the
//! upload in an `image` part.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use cabinet_core::{AppError, Entity, ImageAttached};
use cabinet_crud::ImageService;
use uuid::Uuid;
use validator::Validate;

use crate::constants::{ENTITY_FIELD, IMAGE_FIELD};
use crate::error::HttpAppError;
use crate::middleware::Tenant;
use crate::utils::download::file_response;
use crate::utils::multipart::MultipartForm;

pub struct ImageState<E: Entity + ImageAttached> {
    pub service: ImageService<E>,
    pub max_file_size: usize,
}

impl<E: Entity + ImageAttached> Clone for ImageState<E> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            max_file_size: self.max_file_size,
        }
    }
}

pub fn routes<E>(service: ImageService<E>, max_file_size: usize) -> Router
where
    E: Entity + ImageAttached + Validate,
{
    Router::new()
        .route(
            "/image",
            post(create_with_image::<E>).put(update_with_image::<E>),
        )
        .route("/image/upload/{id}", post(upload_image::<E>))
        .route("/image/download/{id}", get(download_image::<E>))
        .route("/image/{id}", delete(delete_image::<E>))
        .with_state(ImageState {
            service,
            max_file_size,
        })
}

async fn read_entity_and_image<E: Entity + Validate>(
    multipart: Multipart,
    max_file_size: usize,
) -> Result<(E, Option<cabinet_core::UploadedFile>), HttpAppError> {
    let mut form = MultipartForm::read(multipart, max_file_size).await?;
    let entity: E = form.json(ENTITY_FIELD)?;
    entity.validate().map_err(AppError::from)?;
    let image = form.take_file(IMAGE_FIELD)?;
    Ok((entity, image))
}

async fn create_with_image<E: Entity + ImageAttached + Validate>(
    State(state): State<ImageState<E>>,
    Tenant(scope): Tenant,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let (entity, image) = read_entity_and_image::<E>(multipart, state.max_file_size).await?;
    let created = state.service.create_with_image(&scope, entity, image).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_with_image<E: Entity + ImageAttached + Validate>(
    State(state): State<ImageState<E>>,
    Tenant(scope): Tenant,
    multipart: Multipart,
) -> Result<Json<E>, HttpAppError> {
    let (entity, image) = read_entity_and_image::<E>(multipart, state.max_file_size).await?;
    Ok(Json(state.service.update_with_image(&scope, entity, image).await?))
}

async fn upload_image<E: Entity + ImageAttached>(
    State(state): State<ImageState<E>>,
    Tenant(scope): Tenant,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<E>, HttpAppError> {
    let mut form = MultipartForm::read(multipart, state.max_file_size).await?;
    let image = form.require_file(IMAGE_FIELD)?;
    Ok(Json(state.service.upload_image(&scope, id, image).await?))
}

async fn download_image<E: Entity + ImageAttached>(
    State(state): State<ImageState<E>>,
    Tenant(scope): Tenant,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let image = state.service.download_image(&scope, id).await?;
    Ok(file_response(image)?)
}

async fn delete_image<E: Entity + ImageAttached>(
    State(state): State<ImageState<E>>,
    Tenant(scope): Tenant,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, HttpAppError> {
    state.service.delete_image(&scope, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
