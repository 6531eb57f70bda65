//! Database setup and initialization

use anyhow::{Context, Result};
use cabinet_core::{Config, Entity};
use cabinet_db::{EntityRepository, InMemoryRepository, PgEntityRepository};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;

use crate::state::Persistence;

/// Connect and migrate when `DATABASE_URL` is set; otherwise keep records in memory.
pub async fn setup_database(config: &Config) -> Result<Persistence> {
    let Some(database_url) = config.database_url() else {
        tracing::warn!("DATABASE_URL not set; records are kept in memory and lost on restart");
        return Ok(Persistence::Memory);
    };

    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections())
        .acquire_timeout(Duration::from_secs(config.db_timeout_seconds()))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(database_url)
        .await
        .context("Failed to connect to database")?;

    tracing::info!(
        max_connections = config.db_max_connections(),
        "Database connected successfully"
    );

    cabinet_db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    Ok(Persistence::Postgres(pool))
}

/// Repository for one entity kind on the selected persistence
pub fn repository<E: Entity>(persistence: &Persistence) -> Arc<dyn EntityRepository<E>> {
    match persistence {
        Persistence::Postgres(pool) => Arc::new(PgEntityRepository::<E>::new(pool.clone())),
        Persistence::Memory => Arc::new(InMemoryRepository::<E>::new()),
    }
}
