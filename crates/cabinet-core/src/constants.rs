//! Shared constants.

/// Header carrying the caller's tenant on every API request.
pub const TENANT_HEADER: &str = "X-Tenant-ID";

/// Reserved tenant that bypasses per-tenant ownership checks.
pub const DEFAULT_SUPER_TENANT: &str = "super";

/// Directory (below `<tenant>/<kind>`) holding entity images.
pub const IMAGE_DIR: &str = "image";

/// Directory (below `<tenant>/<kind>`) holding multi-file attachments.
pub const ADDITIONAL_DIR: &str = "additional";

/// Extension given to stored images.
pub const IMAGE_EXTENSION: &str = "png";

/// Version assigned to every newly uploaded linked file.
pub const INITIAL_FILE_VERSION: i32 = 1;

/// Default page size for list endpoints.
pub const DEFAULT_PAGE_SIZE: i64 = 50;

/// Upper bound for list page sizes.
pub const MAX_PAGE_SIZE: i64 = 500;
