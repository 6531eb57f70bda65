//! Tenant-aware CRUD core
//!
//! Every operation takes the caller's [`TenantScope`]. Records owned by another
//! tenant are refused with `TenantNotAllowed` unless the caller is the super
//! tenant; listings only show the caller's records (plus unowned ones).
//! Cancelable entities are flagged instead of removed on delete.
//!
//! Attachment metadata is never taken from the caller: create clears it and
//! update carries over what is stored. Only the attachment services write it.

use std::collections::HashMap;
use std::sync::Arc;

use cabinet_core::{
    AppError, CodeGenerator, CrudHooks, DeleteOutcome, Entity, NoHooks, Page,
    RandomCodeGenerator, TenantScope,
};
use cabinet_db::{EntityRepository, ListFilter};
use chrono::Utc;
use uuid::Uuid;

/// Generic CRUD service over one entity kind.
pub struct CrudService<E: Entity> {
    repo: Arc<dyn EntityRepository<E>>,
    hooks: Arc<dyn CrudHooks<E>>,
    codes: Arc<dyn CodeGenerator>,
    super_tenant: String,
}

impl<E: Entity> Clone for CrudService<E> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
            hooks: Arc::clone(&self.hooks),
            codes: Arc::clone(&self.codes),
            super_tenant: self.super_tenant.clone(),
        }
    }
}

impl<E: Entity> CrudService<E> {
    pub fn new(repo: Arc<dyn EntityRepository<E>>, super_tenant: impl Into<String>) -> Self {
        Self {
            repo,
            hooks: Arc::new(NoHooks),
            codes: Arc::new(RandomCodeGenerator),
            super_tenant: super_tenant.into(),
        }
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn CrudHooks<E>>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_code_generator(mut self, codes: Arc<dyn CodeGenerator>) -> Self {
        self.codes = codes;
        self
    }

    /// Scope for `tenant` against this service's super tenant.
    pub fn scope(&self, tenant: &str) -> Result<TenantScope, AppError> {
        TenantScope::new(tenant, &self.super_tenant)
    }

    pub(crate) fn codes(&self) -> &dyn CodeGenerator {
        self.codes.as_ref()
    }

    fn ensure_access(scope: &TenantScope, entity: &E) -> Result<(), AppError> {
        if scope.can_access(entity.owner()) {
            Ok(())
        } else {
            tracing::warn!(
                tenant = %scope,
                owner = entity.owner().unwrap_or_default(),
                kind = E::KIND,
                "Tenant refused access to record"
            );
            Err(AppError::TenantNotAllowed(format!(
                "Tenant {} may not access this {}",
                scope.tenant(),
                E::KIND
            )))
        }
    }

    fn not_found(id: Uuid) -> AppError {
        AppError::NotFound(format!("{} {} not found", E::KIND, id))
    }

    /// Assign id, tenant and code to a record about to be created.
    fn prepare_new(&self, scope: &TenantScope, entity: &mut E) {
        if entity.id().is_none() {
            entity.set_id(Uuid::new_v4());
        }
        if let Some(owned) = entity.tenant_assignable_mut() {
            let keep_given = scope.is_super()
                && owned.tenant().map(|t| !t.trim().is_empty()).unwrap_or(false);
            if !keep_given {
                owned.set_tenant(scope.tenant().to_string());
            }
        }
        Self::clear_attachments(entity);
        self.fill_code(entity);
    }

    fn clear_attachments(entity: &mut E) {
        if let Some(slot) = entity.file_attached_mut() {
            slot.set_file(None);
        }
        if let Some(slot) = entity.image_attached_mut() {
            slot.set_image(None);
        }
        if let Some(slot) = entity.multi_file_attached_mut() {
            slot.linked_files_mut().clear();
        }
    }

    fn copy_attachments(stored: &E, incoming: &mut E) {
        if let Some(slot) = incoming.file_attached_mut() {
            slot.set_file(stored.file_attached().and_then(|f| f.file().cloned()));
        }
        if let Some(slot) = incoming.image_attached_mut() {
            slot.set_image(stored.image_attached().and_then(|i| i.image().cloned()));
        }
        if let Some(slot) = incoming.multi_file_attached_mut() {
            *slot.linked_files_mut() = stored
                .multi_file_attached()
                .map(|m| m.linked_files().to_vec())
                .unwrap_or_default();
        }
    }

    fn fill_code(&self, entity: &mut E) {
        if entity.code_assignable().is_some() && entity.business_code().is_none() {
            let code = self.codes.generate(E::KIND);
            if let Some(coded) = entity.code_assignable_mut() {
                coded.set_code(code);
            }
        }
    }

    /// Carry over what an update must not lose from the stored record.
    fn preserve(&self, scope: &TenantScope, stored: &E, incoming: &mut E) {
        Self::copy_attachments(stored, incoming);

        if incoming.business_code().is_none() {
            if let (Some(code), Some(slot)) = (
                stored.business_code().map(str::to_string),
                incoming.code_assignable_mut(),
            ) {
                slot.set_code(code);
            }
        }
        self.fill_code(incoming);

        let stored_owner = stored.owner().map(str::to_string);
        if let Some(owned) = incoming.tenant_assignable_mut() {
            let incoming_blank = owned.tenant().map(|t| t.trim().is_empty()).unwrap_or(true);
            if !scope.is_super() || incoming_blank {
                owned.set_tenant(stored_owner.unwrap_or_else(|| scope.tenant().to_string()));
            }
        }
    }

    async fn load_for_update(&self, scope: &TenantScope, mut entity: E) -> Result<E, AppError> {
        let id = entity
            .id()
            .ok_or_else(|| AppError::BadRequest(format!("{} id is required for update", E::KIND)))?;
        let stored = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| Self::not_found(id))?;
        Self::ensure_access(scope, &stored)?;
        self.preserve(scope, &stored, &mut entity);
        self.hooks.before_update(scope, &mut entity).await?;
        Ok(entity)
    }

    #[tracing::instrument(skip(self, entity), fields(tenant = %scope, kind = E::KIND))]
    pub async fn create(&self, scope: &TenantScope, mut entity: E) -> Result<E, AppError> {
        self.prepare_new(scope, &mut entity);
        self.hooks.before_create(scope, &mut entity).await?;
        let saved = self.repo.insert(&entity).await?;
        tracing::debug!(id = ?saved.id(), "Record created");
        self.hooks.after_create(scope, saved).await
    }

    #[tracing::instrument(skip(self, entities), fields(tenant = %scope, kind = E::KIND, count = entities.len()))]
    pub async fn create_all(&self, scope: &TenantScope, entities: Vec<E>) -> Result<Vec<E>, AppError> {
        if entities.is_empty() {
            return Err(AppError::EmptyList(format!("No {} records to create", E::KIND)));
        }
        let mut prepared = Vec::with_capacity(entities.len());
        for mut entity in entities {
            self.prepare_new(scope, &mut entity);
            self.hooks.before_create(scope, &mut entity).await?;
            prepared.push(entity);
        }
        let saved = self.repo.insert_many(&prepared).await?;
        let mut results = Vec::with_capacity(saved.len());
        for entity in saved {
            results.push(self.hooks.after_create(scope, entity).await?);
        }
        Ok(results)
    }

    #[tracing::instrument(skip(self, entity), fields(tenant = %scope, kind = E::KIND, id = ?entity.id()))]
    pub async fn update(&self, scope: &TenantScope, entity: E) -> Result<E, AppError> {
        let entity = self.load_for_update(scope, entity).await?;
        let saved = self.repo.update(&entity).await?;
        self.hooks.after_update(scope, &saved).await?;
        Ok(saved)
    }

    #[tracing::instrument(skip(self, entities), fields(tenant = %scope, kind = E::KIND, count = entities.len()))]
    pub async fn update_all(&self, scope: &TenantScope, entities: Vec<E>) -> Result<Vec<E>, AppError> {
        if entities.is_empty() {
            return Err(AppError::EmptyList(format!("No {} records to update", E::KIND)));
        }
        let mut prepared = Vec::with_capacity(entities.len());
        for entity in entities {
            prepared.push(self.load_for_update(scope, entity).await?);
        }
        let saved = self.repo.update_many(&prepared).await?;
        for entity in &saved {
            self.hooks.after_update(scope, entity).await?;
        }
        Ok(saved)
    }

    /// Delete by id: cancel a cancelable record, remove anything else.
    pub async fn delete(&self, scope: &TenantScope, id: Uuid) -> Result<DeleteOutcome, AppError> {
        self.delete_returning(scope, id).await.map(|(outcome, _)| outcome)
    }

    /// Like [`Self::delete`], also handing back the record as it was before deletion.
    #[tracing::instrument(skip(self), fields(tenant = %scope, kind = E::KIND))]
    pub async fn delete_returning(
        &self,
        scope: &TenantScope,
        id: Uuid,
    ) -> Result<(DeleteOutcome, E), AppError> {
        let stored = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| Self::not_found(id))?;
        Self::ensure_access(scope, &stored)?;
        self.hooks.before_delete(scope, &stored).await?;

        let outcome = if stored.cancelable().is_some() {
            if !stored.canceled() {
                let mut canceled = stored.clone();
                if let Some(c) = canceled.cancelable_mut() {
                    c.cancel(Utc::now());
                }
                self.repo.update(&canceled).await?;
            }
            DeleteOutcome::Canceled
        } else {
            if !self.repo.delete(id).await? {
                return Err(Self::not_found(id));
            }
            DeleteOutcome::Removed
        };

        tracing::info!(id = %id, outcome = ?outcome, "Record deleted");
        self.hooks.after_delete(scope, &stored).await?;
        Ok((outcome, stored))
    }

    /// Delete several records; every id must exist and be accessible before anything changes.
    #[tracing::instrument(skip(self, ids), fields(tenant = %scope, kind = E::KIND, count = ids.len()))]
    pub async fn delete_all(
        &self,
        scope: &TenantScope,
        ids: Vec<Uuid>,
    ) -> Result<Vec<DeleteOutcome>, AppError> {
        if ids.is_empty() {
            return Err(AppError::EmptyList(format!("No {} ids to delete", E::KIND)));
        }

        let mut stored = Vec::with_capacity(ids.len());
        for id in &ids {
            let entity = self
                .repo
                .find_by_id(*id)
                .await?
                .ok_or_else(|| Self::not_found(*id))?;
            Self::ensure_access(scope, &entity)?;
            stored.push(entity);
        }
        for entity in &stored {
            self.hooks.before_delete(scope, entity).await?;
        }

        let now = Utc::now();
        let mut to_cancel = Vec::new();
        let mut to_remove = Vec::new();
        let mut outcomes = HashMap::with_capacity(stored.len());
        for (id, entity) in ids.iter().zip(&stored) {
            if entity.cancelable().is_some() {
                if !entity.canceled() {
                    let mut canceled = entity.clone();
                    if let Some(c) = canceled.cancelable_mut() {
                        c.cancel(now);
                    }
                    to_cancel.push(canceled);
                }
                outcomes.insert(*id, DeleteOutcome::Canceled);
            } else {
                to_remove.push(*id);
                outcomes.insert(*id, DeleteOutcome::Removed);
            }
        }

        if !to_cancel.is_empty() {
            self.repo.update_many(&to_cancel).await?;
        }
        if !to_remove.is_empty() {
            self.repo.delete_many(&to_remove).await?;
        }
        for entity in &stored {
            self.hooks.after_delete(scope, entity).await?;
        }

        Ok(ids
            .iter()
            .map(|id| outcomes.get(id).copied().unwrap_or(DeleteOutcome::Removed))
            .collect())
    }

    #[tracing::instrument(skip(self), fields(tenant = %scope, kind = E::KIND))]
    pub async fn find_by_id(&self, scope: &TenantScope, id: Uuid) -> Result<E, AppError> {
        let entity = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| Self::not_found(id))?;
        Self::ensure_access(scope, &entity)?;
        Ok(entity)
    }

    /// Resolve a code. The caller's own record wins when several tenants use the same code.
    #[tracing::instrument(skip(self), fields(tenant = %scope, kind = E::KIND))]
    pub async fn find_by_code(&self, scope: &TenantScope, code: &str) -> Result<E, AppError> {
        let mut matches = self.repo.find_by_code(code).await?;
        if matches.is_empty() {
            return Err(AppError::NotFound(format!(
                "{} with code {} not found",
                E::KIND,
                code
            )));
        }
        let own = matches
            .iter()
            .position(|e| e.owner() == Some(scope.tenant()))
            .or_else(|| matches.iter().position(|e| scope.can_access(e.owner())));
        match own {
            Some(index) => Ok(matches.swap_remove(index)),
            None => Err(AppError::TenantNotAllowed(format!(
                "Tenant {} may not access this {}",
                scope.tenant(),
                E::KIND
            ))),
        }
    }

    #[tracing::instrument(skip(self), fields(tenant = %scope, kind = E::KIND))]
    pub async fn find_all(&self, scope: &TenantScope, page: Page) -> Result<Vec<E>, AppError> {
        let filter = ListFilter::for_tenant(scope.listing_filter());
        self.repo.find_all(&filter, page.clamped()).await
    }

    #[tracing::instrument(skip(self), fields(tenant = %scope, kind = E::KIND))]
    pub async fn count(&self, scope: &TenantScope) -> Result<i64, AppError> {
        let filter = ListFilter::for_tenant(scope.listing_filter());
        self.repo.count(&filter).await
    }

    /// Records owned by exactly `owner`; unowned records are left out.
    #[tracing::instrument(skip(self), fields(tenant = %scope, kind = E::KIND))]
    pub async fn find_owned_by(
        &self,
        scope: &TenantScope,
        owner: &str,
        page: Page,
    ) -> Result<Vec<E>, AppError> {
        if !scope.can_access(Some(owner)) {
            return Err(AppError::TenantNotAllowed(format!(
                "Tenant {} may not list records of {}",
                scope.tenant(),
                owner
            )));
        }
        self.repo
            .find_all(&ListFilter::owned_by(owner), page.clamped())
            .await
    }

    /// Write `entity` as given, after checking the caller may touch the stored
    /// record. Used by attachment services once they have changed the
    /// attachment fields themselves.
    pub(crate) async fn replace(&self, scope: &TenantScope, entity: &E) -> Result<E, AppError> {
        let id = entity
            .id()
            .ok_or_else(|| AppError::BadRequest(format!("{} id is required", E::KIND)))?;
        let stored = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| Self::not_found(id))?;
        Self::ensure_access(scope, &stored)?;
        self.repo.update(entity).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{document, profile, Document, Profile};
    use async_trait::async_trait;
    use cabinet_core::AttachmentMeta;
    use cabinet_db::InMemoryRepository;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn documents() -> CrudService<Document> {
        CrudService::new(Arc::new(InMemoryRepository::<Document>::new()), "super")
    }

    fn profiles() -> CrudService<Profile> {
        CrudService::new(Arc::new(InMemoryRepository::<Profile>::new()), "super")
    }

    #[tokio::test]
    async fn test_create_assigns_id_tenant_and_code() {
        let service = documents();
        let acme = service.scope("acme").unwrap();

        let mut input = document("Contract");
        input.tenant = Some("globex".to_string());
        let created = service.create(&acme, input).await.unwrap();

        assert!(created.id.is_some());
        assert_eq!(created.tenant.as_deref(), Some("acme"));
        assert!(created.code.as_deref().unwrap().starts_with("DOC-"));
    }

    #[tokio::test]
    async fn test_super_tenant_keeps_given_tenant() {
        let service = documents();
        let root = service.scope("super").unwrap();

        let mut input = document("Contract");
        input.tenant = Some("globex".to_string());
        let created = service.create(&root, input).await.unwrap();
        assert_eq!(created.tenant.as_deref(), Some("globex"));
    }

    #[tokio::test]
    async fn test_tenant_isolation() {
        let service = documents();
        let t1 = service.scope("t1").unwrap();
        let t2 = service.scope("t2").unwrap();
        let root = service.scope("super").unwrap();

        let created = service.create(&t1, document("Secret")).await.unwrap();
        let id = created.id.unwrap();

        assert!(matches!(
            service.find_by_id(&t2, id).await,
            Err(AppError::TenantNotAllowed(_))
        ));
        assert!(matches!(
            service.delete(&t2, id).await,
            Err(AppError::TenantNotAllowed(_))
        ));
        let mut hijack = created.clone();
        hijack.title = "Mine now".to_string();
        assert!(matches!(
            service.update(&t2, hijack).await,
            Err(AppError::TenantNotAllowed(_))
        ));

        assert_eq!(service.find_by_id(&root, id).await.unwrap().title, "Secret");
        assert_eq!(service.count(&t2).await.unwrap(), 0);
        assert_eq!(service.count(&t1).await.unwrap(), 1);
        assert_eq!(service.find_all(&root, Page::default()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_cancelable_entity_is_soft_deleted() {
        let service = documents();
        let acme = service.scope("acme").unwrap();
        let id = service.create(&acme, document("Draft")).await.unwrap().id.unwrap();

        assert_eq!(service.delete(&acme, id).await.unwrap(), DeleteOutcome::Canceled);

        let stored = service.find_by_id(&acme, id).await.unwrap();
        assert!(stored.canceled);
        assert!(stored.canceled_at.is_some());
        assert_eq!(service.count(&acme).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_plain_entity_is_removed() {
        let service = profiles();
        let acme = service.scope("acme").unwrap();
        let id = service.create(&acme, profile("Ada")).await.unwrap().id.unwrap();

        assert_eq!(service.delete(&acme, id).await.unwrap(), DeleteOutcome::Removed);
        assert!(matches!(
            service.find_by_id(&acme, id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_preserves_attachment_code_and_tenant() {
        let service = documents();
        let acme = service.scope("acme").unwrap();
        let mut created = service.create(&acme, document("Original")).await.unwrap();
        let meta = AttachmentMeta {
            path: "acme/document".to_string(),
            file_name: created.code.clone().unwrap(),
            original_filename: "a.txt".to_string(),
            extension: Some("txt".to_string()),
            content_type: Some("text/plain".to_string()),
            size: 5,
            storage_ref: None,
        };
        created.file = Some(meta.clone());
        service.replace(&acme, &created).await.unwrap();

        let mut incoming = created.clone();
        incoming.title = "Renamed".to_string();
        incoming.file = None;
        incoming.code = Some("  ".to_string());
        incoming.tenant = Some("globex".to_string());

        let updated = service.update(&acme, incoming).await.unwrap();
        assert_eq!(updated.title, "Renamed");
        assert_eq!(updated.file, Some(meta));
        assert_eq!(updated.code, created.code);
        assert_eq!(updated.tenant.as_deref(), Some("acme"));
    }

    #[tokio::test]
    async fn test_caller_cannot_set_attachment_metadata() {
        let service = documents();
        let t1 = service.scope("t1").unwrap();
        let t2 = service.scope("t2").unwrap();

        let foreign = AttachmentMeta {
            path: "t1/document".to_string(),
            file_name: "DOC-SECRET".to_string(),
            original_filename: "secret.txt".to_string(),
            extension: None,
            content_type: None,
            size: 10,
            storage_ref: Some("LF-1".to_string()),
        };
        let mut input = document("Borrowed");
        input.file = Some(foreign.clone());
        let created = service.create(&t2, input).await.unwrap();
        assert!(created.file.is_none());
        assert!(created.linked_files.is_empty());

        let mut incoming = created.clone();
        incoming.file = Some(foreign);
        let updated = service.update(&t2, incoming).await.unwrap();
        assert!(updated.file.is_none());

        let stored = service.find_by_id(&t2, created.id.unwrap()).await.unwrap();
        assert!(stored.file.is_none());
        assert_eq!(service.count(&t1).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_find_owned_by_skips_other_and_unowned_records() {
        let service = documents();
        let root = service.scope("super").unwrap();
        let acme = service.scope("acme").unwrap();

        for i in 0..5 {
            let mut other = document(&format!("other-{}", i));
            other.tenant = Some(format!("tenant-{}", i));
            service.create(&root, other).await.unwrap();
        }
        service.create(&root, document("own")).await.unwrap();

        let own = service
            .find_owned_by(&root, "super", Page::new(0, 1))
            .await
            .unwrap();
        assert_eq!(own.len(), 1);
        assert_eq!(own[0].title, "own");

        assert!(service
            .find_owned_by(&acme, "acme", Page::default())
            .await
            .unwrap()
            .is_empty());
        assert!(matches!(
            service.find_owned_by(&acme, "tenant-1", Page::default()).await,
            Err(AppError::TenantNotAllowed(_))
        ));
    }

    struct FixedCodes;

    impl CodeGenerator for FixedCodes {
        fn generate(&self, kind: &str) -> String {
            format!("{}-0001", kind.to_uppercase())
        }
    }

    #[tokio::test]
    async fn test_custom_code_generator() {
        let service = documents().with_code_generator(Arc::new(FixedCodes));
        let acme = service.scope("acme").unwrap();
        let created = service.create(&acme, document("Coded")).await.unwrap();
        assert_eq!(created.code.as_deref(), Some("DOCUMENT-0001"));
    }

    #[tokio::test]
    async fn test_update_without_id_is_bad_request() {
        let service = documents();
        let acme = service.scope("acme").unwrap();
        assert!(matches!(
            service.update(&acme, document("x")).await,
            Err(AppError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_batches_rejected() {
        let service = documents();
        let acme = service.scope("acme").unwrap();
        assert!(matches!(
            service.create_all(&acme, vec![]).await,
            Err(AppError::EmptyList(_))
        ));
        assert!(matches!(
            service.update_all(&acme, vec![]).await,
            Err(AppError::EmptyList(_))
        ));
        assert!(matches!(
            service.delete_all(&acme, vec![]).await,
            Err(AppError::EmptyList(_))
        ));
    }

    #[tokio::test]
    async fn test_batch_create_and_delete() {
        let service = documents();
        let acme = service.scope("acme").unwrap();
        let created = service
            .create_all(&acme, vec![document("a"), document("b")])
            .await
            .unwrap();
        assert_eq!(created.len(), 2);

        let ids = created.iter().map(|d| d.id.unwrap()).collect();
        let outcomes = service.delete_all(&acme, ids).await.unwrap();
        assert_eq!(outcomes, vec![DeleteOutcome::Canceled, DeleteOutcome::Canceled]);
        assert_eq!(service.count(&acme).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_batch_delete_checks_every_owner_first() {
        let service = profiles();
        let t1 = service.scope("t1").unwrap();
        let t2 = service.scope("t2").unwrap();
        let mine = service.create(&t1, profile("a")).await.unwrap().id.unwrap();
        let theirs = service.create(&t2, profile("b")).await.unwrap().id.unwrap();

        assert!(matches!(
            service.delete_all(&t1, vec![mine, theirs]).await,
            Err(AppError::TenantNotAllowed(_))
        ));
        assert!(service.find_by_id(&t1, mine).await.is_ok());
    }

    #[tokio::test]
    async fn test_duplicate_code_conflicts() {
        let service = documents();
        let acme = service.scope("acme").unwrap();
        let mut a = document("a");
        a.code = Some("DOC-FIXED".to_string());
        service.create(&acme, a.clone()).await.unwrap();
        assert!(matches!(
            service.create(&acme, a).await,
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_find_by_code_prefers_own_tenant() {
        let service = documents();
        let t1 = service.scope("t1").unwrap();
        let t2 = service.scope("t2").unwrap();
        let t3 = service.scope("t3").unwrap();

        for scope in [&t1, &t2] {
            let mut d = document(scope.tenant());
            d.code = Some("SHARED".to_string());
            service.create(scope, d).await.unwrap();
        }

        assert_eq!(service.find_by_code(&t2, "SHARED").await.unwrap().title, "t2");
        assert!(matches!(
            service.find_by_code(&t3, "SHARED").await,
            Err(AppError::TenantNotAllowed(_))
        ));
        assert!(matches!(
            service.find_by_code(&t1, "MISSING").await,
            Err(AppError::NotFound(_))
        ));
    }

    struct CountingHooks {
        created: AtomicUsize,
        deleted: AtomicUsize,
    }

    #[async_trait]
    impl CrudHooks<Profile> for CountingHooks {
        async fn after_create(&self, _scope: &TenantScope, mut entity: Profile) -> Result<Profile, AppError> {
            self.created.fetch_add(1, Ordering::SeqCst);
            entity.name = entity.name.to_uppercase();
            Ok(entity)
        }

        async fn before_delete(&self, _scope: &TenantScope, entity: &Profile) -> Result<(), AppError> {
            if entity.name == "locked" {
                return Err(AppError::BadRequest("locked".to_string()));
            }
            Ok(())
        }

        async fn after_delete(&self, _scope: &TenantScope, _entity: &Profile) -> Result<(), AppError> {
            self.deleted.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_hooks_run_around_operations() {
        let hooks = Arc::new(CountingHooks {
            created: AtomicUsize::new(0),
            deleted: AtomicUsize::new(0),
        });
        let service = profiles().with_hooks(hooks.clone());
        let acme = service.scope("acme").unwrap();

        let created = service.create(&acme, profile("ada")).await.unwrap();
        assert_eq!(created.name, "ADA");
        assert_eq!(hooks.created.load(Ordering::SeqCst), 1);

        let locked = service.create(&acme, profile("x")).await.unwrap();
        let mut locked_input = locked.clone();
        locked_input.name = "locked".to_string();
        let locked = service.update(&acme, locked_input).await.unwrap();
        assert!(service.delete(&acme, locked.id.unwrap()).await.is_err());
        assert_eq!(hooks.deleted.load(Ordering::SeqCst), 0);

        service.delete(&acme, created.id.unwrap()).await.unwrap();
        assert_eq!(hooks.deleted.load(Ordering::SeqCst), 1);
    }
}
