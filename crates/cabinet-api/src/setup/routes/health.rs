//! Health check handlers.

use crate::state::{AppState, Persistence};
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use std::sync::Arc;
use std::time::Duration;

const CHECK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(serde::Serialize)]
struct HealthCheckResponse {
    status: &'static str,
    persistence: &'static str,
    database: String,
    file_backend: String,
}

pub(super) fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/live", get(liveness_check))
        .with_state(state)
}

/// Liveness probe - process is running.
async fn liveness_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({ "status": "alive" })),
    )
}

/// Readiness of the persistence layer; public, no tenant required.
async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let database = match &state.persistence {
        Persistence::Memory => "not_configured".to_string(),
        Persistence::Postgres(pool) => {
            match tokio::time::timeout(CHECK_TIMEOUT, sqlx::query("SELECT 1").execute(pool)).await {
                Ok(Ok(_)) => "healthy".to_string(),
                Ok(Err(e)) => {
                    tracing::error!(error = %e, "Database health check failed");
                    format!("unhealthy: {}", e)
                }
                Err(_) => {
                    tracing::error!("Database health check timed out");
                    "timeout".to_string()
                }
            }
        }
    };

    let healthy = database == "healthy" || database == "not_configured";
    let status_code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(HealthCheckResponse {
            status: if healthy { "healthy" } else { "unhealthy" },
            persistence: state.persistence.label(),
            database,
            file_backend: state.file_backend.kind().to_string(),
        }),
    )
}
