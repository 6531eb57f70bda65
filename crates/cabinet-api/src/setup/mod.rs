//! Application setup and initialization
//!
//! Kept out of `main.rs` so integration tests can build the same router.

pub mod database;
pub mod routes;
pub mod server;
pub mod services;

use crate::state::AppState;
use anyhow::{Context, Result};
use cabinet_core::Config;
use cabinet_infra::LogFormat;
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Fail fast on misconfiguration, before anything is started
    config.validate().context("Configuration validation failed")?;

    cabinet_infra::init_telemetry(
        env!("CARGO_PKG_NAME"),
        LogFormat::for_environment(config.environment()),
    )
    .context("Failed to initialize telemetry")?;

    tracing::info!(
        environment = %config.environment(),
        super_tenant = %config.super_tenant(),
        "Configuration loaded and validated successfully"
    );

    let persistence = database::setup_database(&config).await?;
    let state = services::initialize_services(config, persistence).await?;
    let router = routes::setup_routes(state.clone())?;

    Ok((state, router))
}
