//! Entity capability traits
//!
//! Every persisted record implements [`Entity`]. Optional capabilities
//! (tenant ownership, generated codes, soft cancel, attachments) are separate
//! traits; an entity advertises the ones it supports by overriding the matching
//! accessor on [`Entity`], which lets the generic CRUD core act on them without
//! knowing the concrete type.

use crate::models::{AttachmentMeta, LinkedFile};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

/// Entity owned by a tenant.
pub trait TenantAssignable {
    fn tenant(&self) -> Option<&str>;
    fn set_tenant(&mut self, tenant: String);
}

/// Entity carrying a business code, generated when left blank.
pub trait CodeAssignable {
    fn code(&self) -> Option<&str>;
    fn set_code(&mut self, code: String);
}

/// Entity whose deletion is a soft cancel (flag + date) instead of a row delete.
pub trait Cancelable {
    fn is_canceled(&self) -> bool;
    fn canceled_at(&self) -> Option<DateTime<Utc>>;
    fn cancel(&mut self, at: DateTime<Utc>);
}

/// Entity with a single attached file.
pub trait FileAttached {
    fn file(&self) -> Option<&AttachmentMeta>;
    fn set_file(&mut self, file: Option<AttachmentMeta>);
}

/// Entity with a single attached image.
pub trait ImageAttached {
    fn image(&self) -> Option<&AttachmentMeta>;
    fn set_image(&mut self, image: Option<AttachmentMeta>);
}

/// Entity with a collection of linked files.
pub trait MultiFileAttached {
    fn linked_files(&self) -> &[LinkedFile];
    fn linked_files_mut(&mut self) -> &mut Vec<LinkedFile>;
}

/// A persisted record handled by the generic CRUD core.
pub trait Entity: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// Entity type name; used as the repository discriminator and in storage paths.
    const KIND: &'static str;

    fn id(&self) -> Option<Uuid>;
    fn set_id(&mut self, id: Uuid);

    fn tenant_assignable(&self) -> Option<&dyn TenantAssignable> {
        None
    }

    fn tenant_assignable_mut(&mut self) -> Option<&mut dyn TenantAssignable> {
        None
    }

    fn code_assignable(&self) -> Option<&dyn CodeAssignable> {
        None
    }

    fn code_assignable_mut(&mut self) -> Option<&mut dyn CodeAssignable> {
        None
    }

    fn cancelable(&self) -> Option<&dyn Cancelable> {
        None
    }

    fn cancelable_mut(&mut self) -> Option<&mut dyn Cancelable> {
        None
    }

    fn file_attached(&self) -> Option<&dyn FileAttached> {
        None
    }

    fn file_attached_mut(&mut self) -> Option<&mut dyn FileAttached> {
        None
    }

    fn image_attached(&self) -> Option<&dyn ImageAttached> {
        None
    }

    fn image_attached_mut(&mut self) -> Option<&mut dyn ImageAttached> {
        None
    }

    fn multi_file_attached(&self) -> Option<&dyn MultiFileAttached> {
        None
    }

    fn multi_file_attached_mut(&mut self) -> Option<&mut dyn MultiFileAttached> {
        None
    }

    /// Owning tenant, if the entity is tenant-assignable and the tenant is set.
    fn owner(&self) -> Option<&str> {
        self.tenant_assignable().and_then(|t| t.tenant())
    }

    /// Business code, if the entity is code-assignable and the code is not blank.
    fn business_code(&self) -> Option<&str> {
        self.code_assignable()
            .and_then(|c| c.code())
            .filter(|code| !code.trim().is_empty())
    }

    /// Whether the entity is cancelable and currently canceled.
    fn canceled(&self) -> bool {
        self.cancelable().map(|c| c.is_canceled()).unwrap_or(false)
    }

    /// Name used for this entity's stored objects: its code, falling back to its id.
    fn storage_name(&self) -> String {
        match (self.business_code(), self.id()) {
            (Some(code), _) => code.to_string(),
            (None, Some(id)) => id.simple().to_string(),
            (None, None) => String::new(),
        }
    }
}
