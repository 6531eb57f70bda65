//! Per-entity route groups under the API prefix

use crate::handlers::{buckets, crud, file, image, multi_file, storage_connections};
use crate::state::AppState;
use axum::Router;
use std::sync::Arc;

pub(super) fn api_routes(state: &AppState) -> Router {
    let max_file_size = state.config.max_file_size_bytes();

    let documents = &state.documents;
    let document_routes = crud::routes(
        documents.files.crud().clone(),
        Arc::new(documents.files.clone()),
    )
    .merge(file::routes(documents.files.clone(), max_file_size))
    .merge(multi_file::routes(
        documents.multi_files.clone(),
        max_file_size,
    ));

    let profiles = &state.profiles;
    let profile_routes = crud::routes(
        profiles.images.crud().clone(),
        Arc::new(profiles.images.clone()),
    )
    .merge(image::routes(profiles.images.clone(), max_file_size));

    Router::new()
        .nest("/documents", document_routes)
        .nest("/profiles", profile_routes)
        .nest(
            "/storage/connections",
            storage_connections::routes(state.object_storage.clone()),
        )
        .nest(
            "/storage/buckets",
            buckets::routes(state.object_storage.clone(), max_file_size),
        )
}
