//! Extension hooks around CRUD and file operations
//!
//! Services call these at fixed points of each operation. Applications plug in
//! behaviour (auditing, derived fields, notifications) by implementing the
//! traits; [`NoHooks`] is the default and does nothing.

use async_trait::async_trait;

use crate::entity::Entity;
use crate::models::{DownloadedFile, UploadedFile};
use crate::tenant::TenantScope;
use crate::AppError;

/// Hooks around create, update and delete.
///
/// A `before_*` error aborts the operation before the repository is touched.
#[async_trait]
pub trait CrudHooks<E: Entity>: Send + Sync {
    async fn before_create(&self, _scope: &TenantScope, _entity: &mut E) -> Result<(), AppError> {
        Ok(())
    }

    /// The returned entity is what `create` hands back to the caller.
    async fn after_create(&self, _scope: &TenantScope, entity: E) -> Result<E, AppError> {
        Ok(entity)
    }

    async fn before_update(&self, _scope: &TenantScope, _entity: &mut E) -> Result<(), AppError> {
        Ok(())
    }

    async fn after_update(&self, _scope: &TenantScope, _entity: &E) -> Result<(), AppError> {
        Ok(())
    }

    async fn before_delete(&self, _scope: &TenantScope, _entity: &E) -> Result<(), AppError> {
        Ok(())
    }

    async fn after_delete(&self, _scope: &TenantScope, _entity: &E) -> Result<(), AppError> {
        Ok(())
    }
}

/// Hooks around attachment uploads, downloads and removals.
#[async_trait]
pub trait FileHooks<E: Entity>: Send + Sync {
    async fn before_upload(
        &self,
        _scope: &TenantScope,
        _entity: &E,
        _file: &UploadedFile,
    ) -> Result<(), AppError> {
        Ok(())
    }

    async fn after_upload(&self, _scope: &TenantScope, _entity: &E) -> Result<(), AppError> {
        Ok(())
    }

    async fn before_download(
        &self,
        _scope: &TenantScope,
        _entity: &E,
        _file: &DownloadedFile,
    ) -> Result<(), AppError> {
        Ok(())
    }

    async fn after_delete_file(&self, _scope: &TenantScope, _entity: &E) -> Result<(), AppError> {
        Ok(())
    }
}

/// No-op hooks.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl<E: Entity> CrudHooks<E> for NoHooks {}

impl<E: Entity> FileHooks<E> for NoHooks {}
