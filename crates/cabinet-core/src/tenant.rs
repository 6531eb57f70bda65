//! Tenant scope carried with every CRUD operation.

use crate::AppError;
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Tenant the caller acts as, resolved once per request.
///
/// A scope is never blank. `is_super` is set when the tenant equals the
/// configured super tenant, which bypasses ownership checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantScope {
    tenant: String,
    is_super: bool,
}

impl TenantScope {
    /// Build a scope from a raw tenant value.
    ///
    /// # Errors
    /// Returns `AppError::BadRequest` when the tenant is blank.
    pub fn new(tenant: impl Into<String>, super_tenant: &str) -> Result<Self, AppError> {
        let tenant = tenant.into().trim().to_string();
        if tenant.is_empty() {
            return Err(AppError::BadRequest("Tenant must not be empty".to_string()));
        }
        let is_super = tenant == super_tenant;
        Ok(Self { tenant, is_super })
    }

    pub fn tenant(&self) -> &str {
        &self.tenant
    }

    pub fn is_super(&self) -> bool {
        self.is_super
    }

    /// Whether this scope may act on a record owned by `owner`.
    ///
    /// Records without an owner are open to every scope.
    pub fn can_access(&self, owner: Option<&str>) -> bool {
        match owner {
            None => true,
            Some(owner) => self.is_super || owner == self.tenant,
        }
    }

    /// Tenant filter to apply to listings: `None` means every tenant.
    pub fn listing_filter(&self) -> Option<&str> {
        if self.is_super {
            None
        } else {
            Some(&self.tenant)
        }
    }
}

impl Display for TenantScope {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.tenant)
    }
}
