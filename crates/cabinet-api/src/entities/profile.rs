use cabinet_core::{AttachmentMeta, CodeAssignable, Entity, ImageAttached, TenantAssignable};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// A person or organisation with a picture. Deletes are hard deletes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct Profile {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub tenant: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[validate(length(min = 1, max = 255, message = "name must be 1 to 255 characters"))]
    pub name: String,
    #[serde(default)]
    #[validate(email(message = "email must be a valid address"))]
    pub email: Option<String>,
    #[serde(default)]
    pub image: Option<AttachmentMeta>,
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
