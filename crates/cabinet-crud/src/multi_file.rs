//! Multi-file attachments
//!
//! Each uploaded file becomes a [`LinkedFile`] appended to the parent's
//! collection and stored at `<tenant>/<kind>/additional/<linked-code>`.
//! The parent is re-saved after every change to the collection.

use std::sync::Arc;

use cabinet_core::checksum::{crc16, crc32};
use cabinet_core::constants::INITIAL_FILE_VERSION;
use cabinet_core::{
    AppError, DownloadedFile, Entity, FileHooks, LinkedFile, MultiFileAttached, NoHooks,
    TenantScope, UploadedFile,
};
use cabinet_storage::{keys, FileBackend, ObjectKey};
use chrono::Utc;
use uuid::Uuid;

use crate::attachment::{ensure_not_empty, ensure_owned_path, path_tenant};
use crate::crud::CrudService;

const LINKED_FILE_KIND: &str = "linked_file";

fn linked_key(file: &LinkedFile) -> ObjectKey {
    ObjectKey::new(file.path.clone(), file.code.clone())
}

/// CRUD plus a collection of linked files per record.
pub struct MultiFileService<E: Entity + MultiFileAttached> {
    crud: CrudService<E>,
    backend: Arc<dyn FileBackend>,
    hooks: Arc<dyn FileHooks<E>>,
}

impl<E: Entity + MultiFileAttached> Clone for MultiFileService<E> {
    fn clone(&self) -> Self {
        Self {
            crud: self.crud.clone(),
            backend: Arc::clone(&self.backend),
            hooks: Arc::clone(&self.hooks),
        }
    }
}

impl<E: Entity + MultiFileAttached> MultiFileService<E> {
    pub fn new(crud: CrudService<E>, backend: Arc<dyn FileBackend>) -> Self {
        Self {
            crud,
            backend,
            hooks: Arc::new(NoHooks),
        }
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn FileHooks<E>>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn crud(&self) -> &CrudService<E> {
        &self.crud
    }

    /// Store every file and link it to the record.
    ///
    /// Either all files are linked or none are: objects stored before a
    /// failure are removed again.
    #[tracing::instrument(skip(self, files), fields(tenant = %scope, kind = E::KIND, count = files.len()))]
    pub async fn upload_files(
        &self,
        scope: &TenantScope,
        id: Uuid,
        files: Vec<UploadedFile>,
    ) -> Result<Vec<LinkedFile>, AppError> {
        if files.is_empty() {
            return Err(AppError::EmptyList("No files to upload".to_string()));
        }
        for file in &files {
            ensure_not_empty(file)?;
        }

        let mut entity = self.crud.find_by_id(scope, id).await?;
        for file in &files {
            self.hooks.before_upload(scope, &entity, file).await?;
        }

        let tenant = path_tenant(scope, &entity).to_string();
        let mut linked = Vec::with_capacity(files.len());
        for file in files {
            match self.store_one(&tenant, file).await {
                Ok(linked_file) => linked.push(linked_file),
                Err(error) => {
                    self.discard(&tenant, &linked).await;
                    return Err(error);
                }
            }
        }

        entity.linked_files_mut().extend(linked.iter().cloned());
        let saved = match self.crud.replace(scope, &entity).await {
            Ok(saved) => saved,
            Err(error) => {
                self.discard(&tenant, &linked).await;
                return Err(error);
            }
        };
        self.hooks.after_upload(scope, &saved).await?;

        tracing::info!(kind = E::KIND, id = %id, linked = linked.len(), "Linked files stored");
        Ok(linked)
    }

    pub async fn upload_file(
        &self,
        scope: &TenantScope,
        id: Uuid,
        file: UploadedFile,
    ) -> Result<LinkedFile, AppError> {
        let mut linked = self.upload_files(scope, id, vec![file]).await?;
        linked
            .pop()
            .ok_or_else(|| AppError::Internal("Upload produced no linked file".to_string()))
    }

    #[tracing::instrument(skip(self), fields(tenant = %scope, kind = E::KIND))]
    pub async fn list_files(&self, scope: &TenantScope, id: Uuid) -> Result<Vec<LinkedFile>, AppError> {
        let entity = self.crud.find_by_id(scope, id).await?;
        Ok(entity.linked_files().to_vec())
    }

    /// Download one linked file; a requested version other than the stored one is not found.
    #[tracing::instrument(skip(self), fields(tenant = %scope, kind = E::KIND))]
    pub async fn download_file(
        &self,
        scope: &TenantScope,
        id: Uuid,
        file_id: Uuid,
        version: Option<i32>,
    ) -> Result<DownloadedFile, AppError> {
        let entity = self.crud.find_by_id(scope, id).await?;
        let linked = entity
            .linked_files()
            .iter()
            .find(|f| f.id == file_id)
            .ok_or_else(|| not_found(id, file_id))?;

        if let Some(version) = version {
            if version != linked.version {
                return Err(AppError::NotFound(format!(
                    "Linked file {} has no version {}",
                    file_id, version
                )));
            }
        }

        ensure_owned_path(scope, &entity, &linked.path)?;

        let data = self
            .backend
            .load(
                path_tenant(scope, &entity),
                &linked_key(linked),
                linked.storage_ref.as_deref(),
                Some(linked.version),
            )
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Content of linked file {} is unavailable", file_id))
            })?;

        let downloaded = DownloadedFile {
            filename: linked.original_filename.clone(),
            content_type: linked.mimetype.clone(),
            data,
        };
        self.hooks.before_download(scope, &entity, &downloaded).await?;
        Ok(downloaded)
    }

    #[tracing::instrument(skip(self), fields(tenant = %scope, kind = E::KIND))]
    pub async fn delete_file(&self, scope: &TenantScope, id: Uuid, file_id: Uuid) -> Result<(), AppError> {
        let mut entity = self.crud.find_by_id(scope, id).await?;
        let files = entity.linked_files_mut();
        let position = files
            .iter()
            .position(|f| f.id == file_id)
            .ok_or_else(|| not_found(id, file_id))?;
        let removed = files.remove(position);
        ensure_owned_path(scope, &entity, &removed.path)?;

        self.backend
            .remove(
                path_tenant(scope, &entity),
                &linked_key(&removed),
                removed.storage_ref.as_deref(),
            )
            .await?;
        let saved = self.crud.replace(scope, &entity).await?;
        self.hooks.after_delete_file(scope, &saved).await?;

        tracing::info!(kind = E::KIND, id = %id, file_id = %file_id, "Linked file removed");
        Ok(())
    }

    async fn store_one(&self, tenant: &str, file: UploadedFile) -> Result<LinkedFile, AppError> {
        let code = self.crud.codes().generate(LINKED_FILE_KIND);
        let key = keys::additional_key(tenant, E::KIND, &code);

        let storage_ref = self
            .backend
            .store(tenant, &key, file.content_type.as_deref(), file.data.clone())
            .await?;

        Ok(LinkedFile {
            id: Uuid::new_v4(),
            code: key.name,
            tenant: tenant.to_string(),
            path: key.path,
            extension: file.extension(),
            mimetype: file.content_type.clone(),
            crc16: crc16(&file.data),
            crc32: crc32(&file.data),
            size: file.size(),
            version: INITIAL_FILE_VERSION,
            created_at: Utc::now(),
            storage_ref,
            original_filename: file.filename,
        })
    }

    async fn discard(&self, tenant: &str, linked: &[LinkedFile]) {
        for file in linked {
            if let Err(error) = self
                .backend
                .remove(tenant, &linked_key(file), file.storage_ref.as_deref())
                .await
            {
                tracing::warn!(code = %file.code, error = %error, "Failed to remove orphaned linked file");
            }
        }
    }
}

fn not_found(id: Uuid, file_id: Uuid) -> AppError {
    AppError::NotFound(format!("Record {} has no linked file {}", id, file_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{document, Document};
    use cabinet_db::InMemoryRepository;
    use cabinet_storage::LocalFileBackend;
    use tempfile::TempDir;

    async fn service() -> (MultiFileService<Document>, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalFileBackend::new(dir.path()).await.unwrap();
        let crud = CrudService::new(Arc::new(InMemoryRepository::<Document>::new()), "super");
        (MultiFileService::new(crud, Arc::new(backend)), dir)
    }

    fn text(name: &str, body: &'static str) -> UploadedFile {
        UploadedFile::new(name, Some("text/plain".to_string()), body)
    }

    #[tokio::test]
    async fn test_three_files_listed_downloaded_and_deleted() {
        let (service, dir) = service().await;
        let acme = service.crud().scope("acme").unwrap();
        let parent = service.crud().create(&acme, document("Bundle")).await.unwrap();
        let id = parent.id.unwrap();

        let linked = service
            .upload_files(
                &acme,
                id,
                vec![text("a.txt", "alpha"), text("b.txt", "beta"), text("c.txt", "gamma")],
            )
            .await
            .unwrap();
        assert_eq!(linked.len(), 3);

        let listed = service.list_files(&acme, id).await.unwrap();
        assert_eq!(listed, linked);
        for file in &listed {
            assert_eq!(file.tenant, "acme");
            assert_eq!(file.path, "acme/document/additional");
            assert_eq!(file.version, 1);
            assert!(dir.path().join(file.key()).exists());
        }

        let second = service
            .download_file(&acme, id, listed[1].id, None)
            .await
            .unwrap();
        assert_eq!(&second.data[..], b"beta");
        assert_eq!(second.filename, "b.txt");

        service.delete_file(&acme, id, listed[0].id).await.unwrap();
        let remaining = service.list_files(&acme, id).await.unwrap();
        assert_eq!(remaining.len(), 2);
        assert!(!dir.path().join(listed[0].key()).exists());
        assert!(matches!(
            service.download_file(&acme, id, listed[0].id, None).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_checksums_recorded() {
        let (service, _dir) = service().await;
        let acme = service.crud().scope("acme").unwrap();
        let parent = service.crud().create(&acme, document("Sums")).await.unwrap();

        let linked = service
            .upload_file(&acme, parent.id.unwrap(), text("digits.txt", "123456789"))
            .await
            .unwrap();
        assert_eq!(linked.crc16, 0xBB3D);
        assert_eq!(linked.crc32, 0xCBF4_3926);
        assert_eq!(linked.size, 9);
        assert_eq!(linked.extension.as_deref(), Some("txt"));
        assert_eq!(linked.mimetype.as_deref(), Some("text/plain"));
    }

    #[tokio::test]
    async fn test_version_mismatch_is_not_found() {
        let (service, _dir) = service().await;
        let acme = service.crud().scope("acme").unwrap();
        let parent = service.crud().create(&acme, document("Versions")).await.unwrap();
        let id = parent.id.unwrap();
        let linked = service.upload_file(&acme, id, text("a.txt", "Hello")).await.unwrap();

        let current = service.download_file(&acme, id, linked.id, Some(1)).await.unwrap();
        assert_eq!(&current.data[..], b"Hello");
        assert!(matches!(
            service.download_file(&acme, id, linked.id, Some(2)).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_inputs_rejected() {
        let (service, _dir) = service().await;
        let acme = service.crud().scope("acme").unwrap();
        let parent = service.crud().create(&acme, document("Empty")).await.unwrap();
        let id = parent.id.unwrap();

        assert!(matches!(
            service.upload_files(&acme, id, Vec::new()).await,
            Err(AppError::EmptyList(_))
        ));
        assert!(matches!(
            service
                .upload_files(&acme, id, vec![text("a.txt", "a"), text("b.txt", "")])
                .await,
            Err(AppError::BadRequest(_))
        ));
        assert!(service.list_files(&acme, id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_file_and_other_tenant() {
        let (service, _dir) = service().await;
        let t1 = service.crud().scope("t1").unwrap();
        let t2 = service.crud().scope("t2").unwrap();
        let parent = service.crud().create(&t1, document("Mine")).await.unwrap();
        let id = parent.id.unwrap();
        let linked = service.upload_file(&t1, id, text("a.txt", "x")).await.unwrap();

        assert!(matches!(
            service.delete_file(&t1, id, Uuid::new_v4()).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service.download_file(&t2, id, linked.id, None).await,
            Err(AppError::TenantNotAllowed(_))
        ));
        assert!(matches!(
            service.upload_file(&t2, id, text("b.txt", "y")).await,
            Err(AppError::TenantNotAllowed(_))
        ));
    }

    #[tokio::test]
    async fn test_linked_file_of_other_tenant_is_refused() {
        let (service, _dir) = service().await;
        let t1 = service.crud().scope("t1").unwrap();
        let t2 = service.crud().scope("t2").unwrap();
        let theirs = service.crud().create(&t1, document("Theirs")).await.unwrap();
        let linked = service
            .upload_file(&t1, theirs.id.unwrap(), text("a.txt", "private"))
            .await
            .unwrap();

        let mut input = document("Mine");
        input.linked_files.push(linked.clone());
        let mut mine = service.crud().create(&t2, input).await.unwrap();
        assert!(mine.linked_files.is_empty());

        mine.linked_files.push(linked.clone());
        service.crud().replace(&t2, &mine).await.unwrap();
        let id = mine.id.unwrap();
        assert!(matches!(
            service.download_file(&t2, id, linked.id, None).await,
            Err(AppError::TenantNotAllowed(_))
        ));
        assert!(matches!(
            service.delete_file(&t2, id, linked.id).await,
            Err(AppError::TenantNotAllowed(_))
        ));

        let kept = service
            .download_file(&t1, theirs.id.unwrap(), linked.id, None)
            .await
            .unwrap();
        assert_eq!(&kept.data[..], b"private");
    }

    #[tokio::test]
    async fn test_update_keeps_linked_files() {
        let (service, _dir) = service().await;
        let acme = service.crud().scope("acme").unwrap();
        let parent = service.crud().create(&acme, document("Keep")).await.unwrap();
        let id = parent.id.unwrap();
        service.upload_file(&acme, id, text("a.txt", "x")).await.unwrap();

        let mut incoming = service.crud().find_by_id(&acme, id).await.unwrap();
        incoming.linked_files.clear();
        incoming.title = "Keep v2".to_string();
        let updated = service.crud().update(&acme, incoming).await.unwrap();
        assert_eq!(updated.linked_files.len(), 1);
    }
}
