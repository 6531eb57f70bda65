//! Single-file attachments
//!
//! The file is stored at `<tenant>/<kind>/<code>` (the id stands in for a
//! missing code) on whichever backend the service was built with.

use std::sync::Arc;

use cabinet_core::{
    AppError, AttachmentMeta, DeleteOutcome, DownloadedFile, Entity, FileAttached, FileHooks,
    NoHooks, TenantScope, UploadedFile,
};
use cabinet_storage::{keys, FileBackend, ObjectKey};
use uuid::Uuid;

use crate::attachment::{SingleAttachment, Slot};
use crate::crud::CrudService;

pub(crate) struct FileSlot;

impl<E: Entity + FileAttached> Slot<E> for FileSlot {
    const LABEL: &'static str = "file";

    fn get(entity: &E) -> Option<&AttachmentMeta> {
        entity.file()
    }

    fn set(entity: &mut E, meta: Option<AttachmentMeta>) {
        entity.set_file(meta);
    }

    fn key(tenant: &str, _file: &UploadedFile, storage_name: &str) -> ObjectKey {
        keys::file_key(tenant, E::KIND, storage_name)
    }
}

/// CRUD plus one attached file per record.
pub struct FileService<E: Entity + FileAttached> {
    inner: SingleAttachment<E, FileSlot>,
}

impl<E: Entity + FileAttached> Clone for FileService<E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<E: Entity + FileAttached> FileService<E> {
    pub fn new(crud: CrudService<E>, backend: Arc<dyn FileBackend>) -> Self {
        Self {
            inner: SingleAttachment::new(crud, backend, Arc::new(NoHooks)),
        }
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn FileHooks<E>>) -> Self {
        self.inner.set_hooks(hooks);
        self
    }

    pub fn crud(&self) -> &CrudService<E> {
        &self.inner.crud
    }

    /// Create the record, then store `file` (if any) and record its metadata.
    #[tracing::instrument(skip(self, entity, file), fields(tenant = %scope, kind = E::KIND))]
    pub async fn create_with_file(
        &self,
        scope: &TenantScope,
        entity: E,
        file: Option<UploadedFile>,
    ) -> Result<E, AppError> {
        self.inner.create_with(scope, entity, file).await
    }

    /// Update the record; without a new file the stored one is kept.
    #[tracing::instrument(skip(self, entity, file), fields(tenant = %scope, kind = E::KIND))]
    pub async fn update_with_file(
        &self,
        scope: &TenantScope,
        entity: E,
        file: Option<UploadedFile>,
    ) -> Result<E, AppError> {
        self.inner.update_with(scope, entity, file).await
    }

    #[tracing::instrument(skip(self, file), fields(tenant = %scope, kind = E::KIND))]
    pub async fn upload_file(
        &self,
        scope: &TenantScope,
        id: Uuid,
        file: UploadedFile,
    ) -> Result<E, AppError> {
        self.inner.upload(scope, id, file).await
    }

    #[tracing::instrument(skip(self), fields(tenant = %scope, kind = E::KIND))]
    pub async fn download_file(
        &self,
        scope: &TenantScope,
        id: Uuid,
    ) -> Result<DownloadedFile, AppError> {
        self.inner.download(scope, id).await
    }

    #[tracing::instrument(skip(self), fields(tenant = %scope, kind = E::KIND))]
    pub async fn delete_file(&self, scope: &TenantScope, id: Uuid) -> Result<E, AppError> {
        self.inner.detach(scope, id).await
    }

    #[tracing::instrument(skip(self), fields(tenant = %scope, kind = E::KIND))]
    pub async fn delete(&self, scope: &TenantScope, id: Uuid) -> Result<DeleteOutcome, AppError> {
        self.inner.delete(scope, id).await
    }

    #[tracing::instrument(skip(self, ids), fields(tenant = %scope, kind = E::KIND, count = ids.len()))]
    pub async fn delete_all(
        &self,
        scope: &TenantScope,
        ids: Vec<Uuid>,
    ) -> Result<Vec<DeleteOutcome>, AppError> {
        self.inner.delete_all(scope, ids).await
    }
}
