//! Service wiring

use anyhow::{Context, Result};
use cabinet_core::{Config, StorageConnection};
use cabinet_crud::{CrudService, FileService, ImageService, MultiFileService};
use cabinet_services::ObjectStorageRegistry;
use cabinet_storage::{create_file_backend, FileBackend};
use std::sync::Arc;
use std::time::Duration;

use super::database::repository;
use crate::entities::{Document, Profile};
use crate::state::{AppState, DocumentServices, ObjectStorageState, Persistence, ProfileServices};

/// Build every service from configuration, with the adapters for real providers
pub async fn initialize_services(config: Config, persistence: Persistence) -> Result<Arc<AppState>> {
    let file_backend = create_file_backend(&config)
        .await
        .context("Failed to initialize file backend")?;
    let registry =
        ObjectStorageRegistry::from_config(&config).context("Failed to initialize object storage")?;

    Ok(build_state(config, persistence, file_backend, registry))
}

/// Assemble the state from already-built backends
pub fn build_state(
    config: Config,
    persistence: Persistence,
    file_backend: Arc<dyn FileBackend>,
    registry: ObjectStorageRegistry,
) -> Arc<AppState> {
    let super_tenant = config.super_tenant().to_string();

    let document_crud = CrudService::new(repository::<Document>(&persistence), super_tenant.clone());
    let documents = DocumentServices {
        files: FileService::new(document_crud.clone(), file_backend.clone()),
        multi_files: MultiFileService::new(document_crud, file_backend.clone()),
    };

    let profile_crud = CrudService::new(repository::<Profile>(&persistence), super_tenant.clone());
    let profiles = ProfileServices {
        images: ImageService::new(profile_crud, file_backend.clone()),
    };

    let object_storage = ObjectStorageState {
        connections: CrudService::new(repository::<StorageConnection>(&persistence), super_tenant),
        registry,
        presigned_url_expiry: Duration::from_secs(config.presigned_url_expiry_secs()),
    };

    tracing::info!(
        persistence = persistence.label(),
        file_backend = %file_backend.kind(),
        "Services initialized"
    );

    Arc::new(AppState {
        config,
        persistence,
        file_backend,
        documents,
        profiles,
        object_storage,
    })
}
