//! Tenant resolution
//!
//! Every `/api/v1` request must carry `X-Tenant-ID`. The middleware turns it
//! into a [`TenantScope`] once, so handlers never look at the raw header.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use cabinet_core::constants::TENANT_HEADER;
use cabinet_core::{AppError, TenantScope};

use crate::error::HttpAppError;

/// Tenant of the current request, as resolved by [`tenant_middleware`]
#[derive(Debug, Clone)]
pub struct Tenant(pub TenantScope);

#[derive(Debug, Clone)]
pub struct TenantConfig {
    pub super_tenant: Arc<str>,
}

pub async fn tenant_middleware(
    State(config): State<TenantConfig>,
    mut request: Request,
    next: Next,
) -> Response {
    let raw = request
        .headers()
        .get(TENANT_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    let scope = match TenantScope::new(raw, &config.super_tenant) {
        Ok(scope) => scope,
        Err(_) => {
            return HttpAppError(AppError::BadRequest(format!(
                "Missing or blank {} header",
                TENANT_HEADER
            )))
            .into_response();
        }
    };

    tracing::debug!(tenant = %scope, is_super = scope.is_super(), "Tenant resolved");
    request.extensions_mut().insert(Tenant(scope));
    next.run(request).await
}

impl<S> FromRequestParts<S> for Tenant
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Tenant>().cloned().ok_or_else(|| {
            HttpAppError(AppError::BadRequest(format!(
                "Missing or blank {} header",
                TENANT_HEADER
            )))
        })
    }
}
