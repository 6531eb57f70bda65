//! Image attachments
//!
//! Images live under `<tenant>/<kind>/image/<original-stem>_<code>.png`.
//! The bytes are stored as received; the `.png` suffix is part of the key
//! layout only.

use std::sync::Arc;

use cabinet_core::{
    AppError, AttachmentMeta, DeleteOutcome, DownloadedFile, Entity, FileHooks, ImageAttached,
    NoHooks, TenantScope, UploadedFile,
};
use cabinet_storage::{keys, FileBackend, ObjectKey};
use uuid::Uuid;

use crate::attachment::{SingleAttachment, Slot};
use crate::crud::CrudService;

pub(crate) struct ImageSlot;

impl<E: Entity + ImageAttached> Slot<E> for ImageSlot {
    const LABEL: &'static str = "image";

    fn get(entity: &E) -> Option<&AttachmentMeta> {
        entity.image()
    }

    fn set(entity: &mut E, meta: Option<AttachmentMeta>) {
        entity.set_image(meta);
    }

    fn key(tenant: &str, file: &UploadedFile, storage_name: &str) -> ObjectKey {
        keys::image_key(tenant, E::KIND, &file.stem(), storage_name)
    }
}

/// CRUD plus one image per record.
pub struct ImageService<E: Entity + ImageAttached> {
    inner: SingleAttachment<E, ImageSlot>,
}

impl<E: Entity + ImageAttached> Clone for ImageService<E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<E: Entity + ImageAttached> ImageService<E> {
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

    #[tracing::instrument(skip(self, entity, image), fields(tenant = %scope, kind = E::KIND))]
    pub async fn create_with_image(
        &self,
        scope: &TenantScope,
        entity: E,
        image: Option<UploadedFile>,
    ) -> Result<E, AppError> {
        self.inner.create_with(scope, entity, image).await
    }

    #[tracing::instrument(skip(self, entity, image), fields(tenant = %scope, kind = E::KIND))]
    pub async fn update_with_image(
        &self,
        scope: &TenantScope,
        entity: E,
        image: Option<UploadedFile>,
    ) -> Result<E, AppError> {
        self.inner.update_with(scope, entity, image).await
    }

    /// Replace the record's image; an image stored under a different name is removed.
    #[tracing::instrument(skip(self, image), fields(tenant = %scope, kind = E::KIND))]
    pub async fn upload_image(
        &self,
        scope: &TenantScope,
        id: Uuid,
        image: UploadedFile,
    ) -> Result<E, AppError> {
        self.inner.upload(scope, id, image).await
    }

    #[tracing::instrument(skip(self), fields(tenant = %scope, kind = E::KIND))]
    pub async fn download_image(
        &self,
        scope: &TenantScope,
        id: Uuid,
    ) -> Result<DownloadedFile, AppError> {
        self.inner.download(scope, id).await
    }

    #[tracing::instrument(skip(self), fields(tenant = %scope, kind = E::KIND))]
    pub async fn delete_image(&self, scope: &TenantScope, id: Uuid) -> Result<E, AppError> {
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
