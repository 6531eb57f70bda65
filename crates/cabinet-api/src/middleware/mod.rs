pub mod tenant;

pub use tenant::{tenant_middleware, Tenant, TenantConfig};
