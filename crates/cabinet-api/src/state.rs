//! Application state
//!
//! Each route group gets only the services it needs; `AppState` owns them
//! all and is what setup builds and tests inspect.

use std::sync::Arc;
use std::time::Duration;

use cabinet_core::{AppError, Config, Page, StorageConnection, TenantScope};
use cabinet_crud::{CrudService, FileService, ImageService, MultiFileService};
use cabinet_services::{ObjectStorage, ObjectStorageRegistry};
use cabinet_storage::FileBackend;
use sqlx::PgPool;

use crate::entities::{Document, Profile};

/// Where records are persisted
#[derive(Clone)]
pub enum Persistence {
    Postgres(PgPool),
    Memory,
}

impl Persistence {
    pub fn label(&self) -> &'static str {
        match self {
            Persistence::Postgres(_) => "postgres",
            Persistence::Memory => "memory",
        }
    }
}

/// Services behind `/documents`
#[derive(Clone)]
pub struct DocumentServices {
    pub files: FileService<Document>,
    pub multi_files: MultiFileService<Document>,
}

/// Services behind `/profiles`
#[derive(Clone)]
pub struct ProfileServices {
    pub images: ImageService<Profile>,
}

/// Tenant storage connections plus the adapters that serve them
#[derive(Clone)]
pub struct ObjectStorageState {
    pub connections: CrudService<StorageConnection>,
    pub registry: ObjectStorageRegistry,
    pub presigned_url_expiry: Duration,
}

impl ObjectStorageState {
    /// The storage connection owned by the caller's tenant.
    ///
    /// One connection per tenant; the super tenant only uses its own.
    pub async fn connection_for(&self, scope: &TenantScope) -> Result<StorageConnection, AppError> {
        self.connections
            .find_owned_by(scope, scope.tenant(), Page::new(0, 1))
            .await?
            .pop()
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "No storage connection configured for tenant {}",
                    scope
                ))
            })
    }

    pub fn adapter_for(&self, conn: &StorageConnection) -> Result<Arc<dyn ObjectStorage>, AppError> {
        self.registry.for_connection(conn).ok_or_else(|| {
            AppError::ServiceNotDefined(format!("No adapter registered for {}", conn.provider))
        })
    }

    /// Connection and adapter for the caller, in one call.
    pub async fn resolve(
        &self,
        scope: &TenantScope,
    ) -> Result<(StorageConnection, Arc<dyn ObjectStorage>), AppError> {
        let conn = self.connection_for(scope).await?;
        let adapter = self.adapter_for(&conn)?;
        Ok((conn, adapter))
    }
}

pub struct AppState {
    pub config: Config,
    pub persistence: Persistence,
    pub file_backend: Arc<dyn FileBackend>,
    pub documents: DocumentServices,
    pub profiles: ProfileServices,
    pub object_storage: ObjectStorageState,
}
