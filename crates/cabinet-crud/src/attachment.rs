//! Single-attachment engine shared by the file and image services.
//!
//! The two services differ only in which field of the entity holds the
//! metadata and how the object key is built; both are captured by [`Slot`].

use std::marker::PhantomData;
use std::sync::Arc;

use cabinet_core::{
    AppError, AttachmentMeta, DeleteOutcome, DownloadedFile, Entity, FileHooks, TenantScope,
    UploadedFile,
};
use cabinet_storage::{keys, FileBackend, ObjectKey};
use uuid::Uuid;

use crate::crud::CrudService;

/// Where an attachment lives on the entity and how its key is derived.
pub(crate) trait Slot<E>: Send + Sync + 'static {
    const LABEL: &'static str;

    fn get(entity: &E) -> Option<&AttachmentMeta>;
    fn set(entity: &mut E, meta: Option<AttachmentMeta>);
    fn key(tenant: &str, file: &UploadedFile, storage_name: &str) -> ObjectKey;
}

pub(crate) fn ensure_not_empty(file: &UploadedFile) -> Result<(), AppError> {
    if file.is_empty() {
        return Err(AppError::BadRequest(format!(
            "File {} is empty",
            file.filename
        )));
    }
    Ok(())
}

/// Tenant directory for an entity's objects: its owner, else the caller.
pub(crate) fn path_tenant<'a, E: Entity>(scope: &'a TenantScope, entity: &'a E) -> &'a str {
    entity.owner().unwrap_or(scope.tenant())
}

pub(crate) fn meta_key(meta: &AttachmentMeta) -> ObjectKey {
    ObjectKey::new(meta.path.clone(), meta.file_name.clone())
}

/// Stored metadata must point inside the owner's directory for this kind.
pub(crate) fn ensure_owned_path<E: Entity>(
    scope: &TenantScope,
    entity: &E,
    path: &str,
) -> Result<(), AppError> {
    let dir = keys::entity_dir(path_tenant(scope, entity), E::KIND);
    if keys::is_within(path, &dir) {
        return Ok(());
    }
    tracing::warn!(
        tenant = %scope,
        kind = E::KIND,
        id = ?entity.id(),
        path = %path,
        "Attachment path outside the owner's directory"
    );
    Err(AppError::TenantNotAllowed(format!(
        "Attachment of {} is not stored for its owner",
        E::KIND
    )))
}

pub(crate) struct SingleAttachment<E: Entity, S> {
    pub(crate) crud: CrudService<E>,
    backend: Arc<dyn FileBackend>,
    hooks: Arc<dyn FileHooks<E>>,
    _slot: PhantomData<fn() -> S>,
}

impl<E: Entity, S> Clone for SingleAttachment<E, S> {
    fn clone(&self) -> Self {
        Self {
            crud: self.crud.clone(),
            backend: Arc::clone(&self.backend),
            hooks: Arc::clone(&self.hooks),
            _slot: PhantomData,
        }
    }
}

impl<E: Entity, S: Slot<E>> SingleAttachment<E, S> {
    pub(crate) fn new(
        crud: CrudService<E>,
        backend: Arc<dyn FileBackend>,
        hooks: Arc<dyn FileHooks<E>>,
    ) -> Self {
        Self {
            crud,
            backend,
            hooks,
            _slot: PhantomData,
        }
    }

    pub(crate) fn set_hooks(&mut self, hooks: Arc<dyn FileHooks<E>>) {
        self.hooks = hooks;
    }

    pub(crate) async fn create_with(
        &self,
        scope: &TenantScope,
        entity: E,
        file: Option<UploadedFile>,
    ) -> Result<E, AppError> {
        if let Some(file) = &file {
            ensure_not_empty(file)?;
        }
        let created = self.crud.create(scope, entity).await?;
        match file {
            Some(file) => self.attach(scope, created, file).await,
            None => Ok(created),
        }
    }

    pub(crate) async fn update_with(
        &self,
        scope: &TenantScope,
        entity: E,
        file: Option<UploadedFile>,
    ) -> Result<E, AppError> {
        if let Some(file) = &file {
            ensure_not_empty(file)?;
        }
        let updated = self.crud.update(scope, entity).await?;
        match file {
            Some(file) => self.attach(scope, updated, file).await,
            None => Ok(updated),
        }
    }

    pub(crate) async fn upload(
        &self,
        scope: &TenantScope,
        id: Uuid,
        file: UploadedFile,
    ) -> Result<E, AppError> {
        ensure_not_empty(&file)?;
        let entity = self.crud.find_by_id(scope, id).await?;
        self.attach(scope, entity, file).await
    }

    pub(crate) async fn download(
        &self,
        scope: &TenantScope,
        id: Uuid,
    ) -> Result<DownloadedFile, AppError> {
        let entity = self.crud.find_by_id(scope, id).await?;
        let meta = S::get(&entity).ok_or_else(|| {
            AppError::NotFound(format!("{} {} has no {}", E::KIND, id, S::LABEL))
        })?;
        ensure_owned_path(scope, &entity, &meta.path)?;

        let data = self
            .backend
            .load(
                path_tenant(scope, &entity),
                &meta_key(meta),
                meta.storage_ref.as_deref(),
                None,
            )
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("{} content for {} {} is unavailable", S::LABEL, E::KIND, id))
            })?;

        let downloaded = DownloadedFile {
            filename: meta.original_filename.clone(),
            content_type: meta.content_type.clone(),
            data,
        };
        self.hooks.before_download(scope, &entity, &downloaded).await?;
        Ok(downloaded)
    }

    /// Remove the stored object and clear the metadata.
    pub(crate) async fn detach(&self, scope: &TenantScope, id: Uuid) -> Result<E, AppError> {
        let mut entity = self.crud.find_by_id(scope, id).await?;
        let meta = S::get(&entity).cloned().ok_or_else(|| {
            AppError::NotFound(format!("{} {} has no {}", E::KIND, id, S::LABEL))
        })?;
        ensure_owned_path(scope, &entity, &meta.path)?;

        self.backend
            .remove(
                path_tenant(scope, &entity),
                &meta_key(&meta),
                meta.storage_ref.as_deref(),
            )
            .await?;
        S::set(&mut entity, None);
        let saved = self.crud.replace(scope, &entity).await?;
        self.hooks.after_delete_file(scope, &saved).await?;
        tracing::info!(kind = E::KIND, id = %id, slot = S::LABEL, "Attachment removed");
        Ok(saved)
    }

    /// CRUD delete; a hard-deleted record also loses its stored object.
    pub(crate) async fn delete(
        &self,
        scope: &TenantScope,
        id: Uuid,
    ) -> Result<DeleteOutcome, AppError> {
        let (outcome, entity) = self.crud.delete_returning(scope, id).await?;
        if outcome == DeleteOutcome::Removed {
            if let Some(meta) = S::get(&entity) {
                self.remove_logged(scope, &entity, meta).await;
            }
        }
        Ok(outcome)
    }

    /// Batch delete; attachments of hard-deleted records are removed afterwards.
    pub(crate) async fn delete_all(
        &self,
        scope: &TenantScope,
        ids: Vec<Uuid>,
    ) -> Result<Vec<DeleteOutcome>, AppError> {
        let mut stored = Vec::with_capacity(ids.len());
        for id in &ids {
            stored.push(self.crud.find_by_id(scope, *id).await?);
        }

        let outcomes = self.crud.delete_all(scope, ids).await?;
        for (entity, outcome) in stored.iter().zip(&outcomes) {
            if *outcome != DeleteOutcome::Removed {
                continue;
            }
            if let Some(meta) = S::get(entity) {
                self.remove_logged(scope, entity, meta).await;
            }
        }
        Ok(outcomes)
    }

    /// Remove an object the record no longer points at; failures are only logged.
    async fn remove_logged(&self, scope: &TenantScope, entity: &E, meta: &AttachmentMeta) {
        if ensure_owned_path(scope, entity, &meta.path).is_err() {
            return;
        }
        if let Err(error) = self
            .backend
            .remove(
                path_tenant(scope, entity),
                &meta_key(meta),
                meta.storage_ref.as_deref(),
            )
            .await
        {
            tracing::error!(
                kind = E::KIND,
                id = ?entity.id(),
                key = %meta_key(meta),
                error = %error,
                "Attachment object could not be removed"
            );
        }
    }

    /// Store the new object, point the record at it, then drop the old object.
    async fn attach(&self, scope: &TenantScope, mut entity: E, file: UploadedFile) -> Result<E, AppError> {
        self.hooks.before_upload(scope, &entity, &file).await?;

        let tenant = path_tenant(scope, &entity).to_string();
        let key = S::key(&tenant, &file, &entity.storage_name());
        let previous = S::get(&entity).cloned();

        let storage_ref = self
            .backend
            .store(&tenant, &key, file.content_type.as_deref(), file.data.clone())
            .await?;

        let meta = AttachmentMeta {
            path: key.path.clone(),
            file_name: key.name.clone(),
            original_filename: file.filename.clone(),
            extension: file.extension(),
            content_type: file.content_type.clone(),
            size: file.size(),
            storage_ref,
        };
        S::set(&mut entity, Some(meta.clone()));

        let overwrote_previous = previous
            .as_ref()
            .is_some_and(|p| meta_key(p) == key && p.storage_ref.is_none());
        let saved = match self.crud.replace(scope, &entity).await {
            Ok(saved) => saved,
            Err(error) => {
                if !overwrote_previous {
                    self.remove_logged(scope, &entity, &meta).await;
                }
                return Err(error);
            }
        };

        if let Some(previous) = previous {
            let superseded = meta_key(&previous) != key
                || (previous.storage_ref.is_some() && previous.storage_ref != meta.storage_ref);
            if superseded {
                self.remove_logged(scope, &saved, &previous).await;
            }
        }
        self.hooks.after_upload(scope, &saved).await?;
        tracing::info!(
            kind = E::KIND,
            id = ?saved.id(),
            slot = S::LABEL,
            key = %key,
            size_bytes = file.size(),
            "Attachment stored"
        );
        Ok(saved)
    }
}
