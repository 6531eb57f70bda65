use async_trait::async_trait;
use cabinet_core::{AppError, Entity, Page};
use uuid::Uuid;

/// Which records a listing or count covers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    /// Restrict to this tenant plus records without an owner; `None` lists every tenant.
    pub tenant: Option<String>,
    /// With a tenant set, also leave out records without an owner.
    pub owner_only: bool,
    pub include_canceled: bool,
}

impl ListFilter {
    pub fn for_tenant(tenant: Option<&str>) -> Self {
        Self {
            tenant: tenant.map(str::to_string),
            owner_only: false,
            include_canceled: false,
        }
    }

    /// Records owned by exactly `owner`.
    pub fn owned_by(owner: &str) -> Self {
        Self {
            tenant: Some(owner.to_string()),
            owner_only: true,
            include_canceled: false,
        }
    }

    /// Whether a record with this owner and cancel state passes the filter.
    pub fn matches(&self, owner: Option<&str>, canceled: bool) -> bool {
        let tenant_ok = match (&self.tenant, owner) {
            (None, _) => true,
            (Some(_), None) => !self.owner_only,
            (Some(tenant), Some(owner)) => tenant == owner,
        };
        tenant_ok && (self.include_canceled || !canceled)
    }
}

/// Persistence contract for one entity kind.
///
/// Implementations never apply tenant ownership rules; callers pass the
/// filter they want and check ownership themselves. Every entity handed to
/// `insert`/`update` must already carry an id.
#[async_trait]
pub trait EntityRepository<E: Entity>: Send + Sync {
    /// Insert a new record. Duplicate id or duplicate `(tenant, code)` is `Conflict`.
    async fn insert(&self, entity: &E) -> Result<E, AppError>;

    /// Insert all records or none.
    async fn insert_many(&self, entities: &[E]) -> Result<Vec<E>, AppError>;

    /// Replace an existing record. Missing record is `NotFound`.
    async fn update(&self, entity: &E) -> Result<E, AppError>;

    /// Replace all records or none.
    async fn update_many(&self, entities: &[E]) -> Result<Vec<E>, AppError>;

    /// Remove a record; `false` when it did not exist.
    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;

    /// Remove records, returning how many existed.
    async fn delete_many(&self, ids: &[Uuid]) -> Result<u64, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<E>, AppError>;

    /// Every record carrying `code`, across tenants, oldest first.
    async fn find_by_code(&self, code: &str) -> Result<Vec<E>, AppError>;

    async fn find_all(&self, filter: &ListFilter, page: Page) -> Result<Vec<E>, AppError>;

    async fn count(&self, filter: &ListFilter) -> Result<i64, AppError>;
}

/// Id of an entity about to be written; a missing id is a caller bug.
pub(crate) fn require_id<E: Entity>(entity: &E) -> Result<Uuid, AppError> {
    entity.id().ok_or_else(|| {
        AppError::Internal(format!("{} record has no id assigned", E::KIND))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_matches() {
        let acme = ListFilter::for_tenant(Some("acme"));
        assert!(acme.matches(Some("acme"), false));
        assert!(acme.matches(None, false));
        assert!(!acme.matches(Some("globex"), false));
        assert!(!acme.matches(Some("acme"), true));

        let all = ListFilter {
            tenant: None,
            owner_only: false,
            include_canceled: true,
        };
        assert!(all.matches(Some("globex"), true));

        let owned = ListFilter::owned_by("acme");
        assert!(owned.matches(Some("acme"), false));
        assert!(!owned.matches(None, false));
        assert!(!owned.matches(Some("globex"), false));
    }
}
