//! Route configuration and setup.
//!
//! Entity routers live in [domains]; health checks in [health].

mod domains;
mod health;

use crate::constants::API_PREFIX;
use crate::middleware::{tenant_middleware, TenantConfig};
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::get,
    Json, Router,
};
use cabinet_core::Config;
use cabinet_infra::{request_id_middleware, security_headers_middleware};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

/// Files a multi-file upload may carry at the per-file size limit
const MAX_FILES_PER_BODY: usize = 10;

/// Room for multipart framing and the entity part on top of the files
const BODY_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Setup all application routes
pub fn setup_routes(state: Arc<AppState>) -> Result<Router, anyhow::Error> {
    let config = &state.config;
    let cors = setup_cors(config)?;
    let body_limit = config
        .max_file_size_bytes()
        .saturating_mul(MAX_FILES_PER_BODY)
        .saturating_add(BODY_OVERHEAD_BYTES);

    let tenant_config = TenantConfig {
        super_tenant: Arc::from(config.super_tenant()),
    };
    let api = domains::api_routes(&state).layer(axum::middleware::from_fn_with_state(
        tenant_config,
        tenant_middleware,
    ));

    let app = Router::new()
        .nest(API_PREFIX, api)
        .merge(health::routes(state.clone()))
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(crate::api_doc::ApiDoc::openapi()) }),
        )
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(axum::middleware::from_fn(security_headers_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(request_id_middleware));

    tracing::info!(
        prefix = API_PREFIX,
        body_limit_bytes = body_limit,
        "Routes configured"
    );
    Ok(app)
}

fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ];
    let cors = if config.cors_origins().iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins()
            .iter()
            .map(|o| o.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| anyhow::anyhow!("Invalid CORS origin: {}", e))?;
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(Any)
    };
    Ok(cors)
}
