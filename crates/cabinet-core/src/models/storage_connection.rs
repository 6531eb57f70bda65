use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::entity::{Entity, TenantAssignable};
use crate::storage_types::ObjectStorageProvider;

/// Connection parameters for a tenant's object storage.
///
/// For S3-compatible providers `access_key`/`secret_key` are the key pair; for
/// LakeFS they are the access key id and secret. `branch` and
/// `storage_namespace` only apply to LakeFS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
pub struct StorageConnection {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub tenant: Option<String>,
    pub provider: ObjectStorageProvider,
    #[validate(url(message = "endpoint must be a valid URL"))]
    pub endpoint: String,
    #[validate(length(min = 1, message = "access_key must not be empty"))]
    pub access_key: String,
    #[validate(length(min = 1, message = "secret_key must not be empty"))]
    pub secret_key: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
    /// Root under which new LakeFS repositories get their storage namespace.
    #[serde(default)]
    pub storage_namespace: Option<String>,
}

impl StorageConnection {
    /// Cache key for this connection's client.
    pub fn cache_key(&self) -> String {
        self.tenant.clone().unwrap_or_default()
    }
}

impl TenantAssignable for StorageConnection {
    fn tenant(&self) -> Option<&str> {
        self.tenant.as_deref()
    }

    fn set_tenant(&mut self, tenant: String) {
        self.tenant = Some(tenant);
    }
}

impl Entity for StorageConnection {
    const KIND: &'static str = "storage_connection";

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
}
