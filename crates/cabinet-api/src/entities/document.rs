use cabinet_core::{
    AttachmentMeta, Cancelable, CodeAssignable, Entity, FileAttached, LinkedFile,
    MultiFileAttached, TenantAssignable,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// A business document: one main file plus any number of linked files.
///
/// Deleting a document cancels it; the row and its files are kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct Document {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub tenant: Option<String>,
    #[serde(default)]
    #[validate(length(max = 64, message = "code must be at most 64 characters"))]
    pub code: Option<String>,
    #[validate(length(min = 1, max = 255, message = "title must be 1 to 255 characters"))]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub canceled: bool,
    #[serde(default)]
    pub canceled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub file: Option<AttachmentMeta>,
    #[serde(default)]
    pub linked_files: Vec<LinkedFile>,
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
