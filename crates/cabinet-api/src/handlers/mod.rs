//! HTTP handlers
//!
//! The entity handlers are generic: each module exposes a `routes` function
//! that builds a router for one entity type, ready to be nested under the
//! entity's base path.

pub mod buckets;
pub mod crud;
pub mod file;
pub mod image;
pub mod multi_file;
pub mod storage_connections;

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// `?id=` selecting the owning record
#[derive(Debug, Deserialize, IntoParams)]
pub struct IdQuery {
    pub id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CountResponse {
    pub count: i64,
}
