//! Entities shared by the service tests.

use cabinet_core::{
    AttachmentMeta, Cancelable, CodeAssignable, Entity, FileAttached, ImageAttached, LinkedFile,
    MultiFileAttached, TenantAssignable,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Cancelable record with a single file and linked files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: Option<Uuid>,
    pub tenant: Option<String>,
    pub code: Option<String>,
    pub title: String,
    #[serde(default)]
    pub canceled: bool,
    pub canceled_at: Option<DateTime<Utc>>,
    pub file: Option<AttachmentMeta>,
    #[serde(default)]
    pub linked_files: Vec<LinkedFile>,
}

/// Plain record with an image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Option<Uuid>,
    pub tenant: Option<String>,
    pub code: Option<String>,
    pub name: String,
    pub image: Option<AttachmentMeta>,
}

pub fn document(title: &str) -> Document {
    Document {
        id: None,
        tenant: None,
        code: None,
        title: title.to_string(),
        canceled: false,
        canceled_at: None,
        file: None,
        linked_files: Vec::new(),
    }
}

pub fn profile(name: &str) -> Profile {
    Profile {
        id: None,
        tenant: None,
        code: None,
        name: name.to_string(),
        image: None,
    }
}

impl TenantAssignable for Document {
    fn tenant(&self) -> Option<&str> {
        self.tenant.as_deref()
    }
    fn set_tenant(&mut self, tenant: String) {
        self.tenant = Some(tenant);
    }
}

impl CodeAssignable for Document {
    fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }
    fn set_code(&mut self, code: String) {
        self.code = Some(code);
    }
}

impl Cancelable for Document {
    fn is_canceled(&self) -> bool {
        self.canceled
    }
    fn canceled_at(&self) -> Option<DateTime<Utc>> {
        self.canceled_at
    }
    fn cancel(&mut self, at: DateTime<Utc>) {
        self.canceled = true;
        self.canceled_at = Some(at);
    }
}

impl FileAttached for Document {
    fn file(&self) -> Option<&AttachmentMeta> {
        self.file.as_ref()
    }
    fn set_file(&mut self, file: Option<AttachmentMeta>) {
        self.file = file;
    }
}

impl MultiFileAttached for Document {
    fn linked_files(&self) -> &[LinkedFile] {
        &self.linked_files
    }
    fn linked_files_mut(&mut self) -> &mut Vec<LinkedFile> {
        &mut self.linked_files
    }
}

impl Entity for Document {
    const KIND: &'static str = "document";

    fn id(&self) -> Option<Uuid> {
        self.id
    }
    fn set_id(&mut self, id: Uuid) {
        self.id = Some(id);
    }
    fn tenant_assignable(&self) -> Option<&dyn TenantAssignable> {
        Some(self)
    }
    fn tenant_assignable_mut(&mut self) -> Option<&mut dyn TenantAssignable> {
        Some(self)
    }
    fn code_assignable(&self) -> Option<&dyn CodeAssignable> {
        Some(self)
    }
    fn code_assignable_mut(&mut self) -> Option<&mut dyn CodeAssignable> {
        Some(self)
    }
    fn cancelable(&self) -> Option<&dyn Cancelable> {
        Some(self)
    }
    fn cancelable_mut(&mut self) -> Option<&mut dyn Cancelable> {
        Some(self)
    }
    fn file_attached(&self) -> Option<&dyn FileAttached> {
        Some(self)
    }
    fn file_attached_mut(&mut self) -> Option<&mut dyn FileAttached> {
        Some(self)
    }
    fn multi_file_attached(&self) -> Option<&dyn MultiFileAttached> {
        Some(self)
    }
    fn multi_file_attached_mut(&mut self) -> Option<&mut dyn MultiFileAttached> {
        Some(self)
    }
}

impl TenantAssignable for Profile {
    fn tenant(&self) -> Option<&str> {
        self.tenant.as_deref()
    }
    fn set_tenant(&mut self, tenant: String) {
        self.tenant = Some(tenant);
    }
}

impl CodeAssignable for Profile {
    fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }
    fn set_code(&mut self, code: String) {
        self.code = Some(code);
    }
}

impl ImageAttached for Profile {
    fn image(&self) -> Option<&AttachmentMeta> {
        self.image.as_ref()
    }
    fn set_image(&mut self, image: Option<AttachmentMeta>) {
        self.image = image;
    }
}

impl Entity for Profile {
    const KIND: &'static str = "profile";

    fn id(&self) -> Option<Uuid> {
        self.id
    }
    fn set_id(&mut self, id: Uuid) {
        self.id = Some(id);
    }
    fn tenant_assignable(&self) -> Option<&dyn TenantAssignable> {
        Some(self)
    }
    fn tenant_assignable_mut(&mut self) -> Option<&mut dyn TenantAssignable> {
        Some(self)
    }
    fn code_assignable(&self) -> Option<&dyn CodeAssignable> {
        Some(self)
    }
    fn code_assignable_mut(&mut self) -> Option<&mut dyn CodeAssignable> {
        Some(self)
    }
    fn image_attached(&self) -> Option<&dyn ImageAttached> {
        Some(self)
    }
    fn image_attached_mut(&mut self) -> Option<&mut dyn ImageAttached> {
        Some(self)
    }
}
