//! API constants

/// Prefix of every tenant-scoped route
pub const API_PREFIX: &str = "/api/v1";

/// Multipart field carrying the entity JSON on combined create/update calls
pub const ENTITY_FIELD: &str = "entity";

pub const FILE_FIELD: &str = "file";
pub const IMAGE_FIELD: &str = "image";
pub const FILES_FIELD: &str = "files";
