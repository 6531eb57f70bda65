use std::marker::PhantomData;
use std::path::Path;

use anyhow::Context;
use async_trait::async_trait;
use cabinet_core::{AppError, Entity, Page};
use serde_json::Value;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use super::repository::{require_id, EntityRepository, ListFilter};

/// Apply pending migrations from the workspace `migrations/` directory.
pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    let migrations_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../migrations");
    let migrator = sqlx::migrate::Migrator::new(migrations_dir)
        .await
        .context("Failed to load migrations")?;
    migrator
        .run(pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");
    Ok(())
}

/// Repository storing one entity kind in the shared `entities` table.
///
/// The entity is kept whole in `body`; `tenant`, `code` and `canceled` are
/// projected into columns for filtering and the `(kind, tenant, code)`
/// uniqueness constraint.
pub struct PgEntityRepository<E> {
    pool: PgPool,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for PgEntityRepository<E> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            _entity: PhantomData,
        }
    }
}

struct Columns {
    id: Uuid,
    tenant: Option<String>,
    code: Option<String>,
    canceled: bool,
    body: Value,
}

fn columns<E: Entity>(entity: &E) -> Result<Columns, AppError> {
    Ok(Columns {
        id: require_id(entity)?,
        tenant: entity.owner().map(str::to_string),
        code: entity.business_code().map(str::to_string),
        canceled: entity.canceled(),
        body: serde_json::to_value(entity)?,
    })
}

fn decode<E: Entity>(body: Value) -> Result<E, AppError> {
    serde_json::from_value(body).map_err(|e| {
        AppError::Internal(format!("Stored {} record is unreadable: {}", E::KIND, e))
    })
}

const INSERT_SQL: &str = r#"
    INSERT INTO entities (id, kind, tenant, code, canceled, body)
    VALUES ($1, $2, $3, $4, $5, $6)
    RETURNING body
"#;

const UPDATE_SQL: &str = r#"
    UPDATE entities
    SET tenant = $3, code = $4, canceled = $5, body = $6, updated_at = NOW()
    WHERE id = $1 AND kind = $2
    RETURNING body
"#;

impl<E: Entity> PgEntityRepository<E> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _entity: PhantomData,
        }
    }

    async fn insert_with<'c, X>(executor: X, entity: &E) -> Result<E, AppError>
    where
        X: sqlx::Executor<'c, Database = Postgres>,
    {
        let cols = columns(entity)?;
        let body = sqlx::query_scalar::<Postgres, Value>(INSERT_SQL)
            .bind(cols.id)
            .bind(E::KIND)
            .bind(cols.tenant)
            .bind(cols.code)
            .bind(cols.canceled)
            .bind(cols.body)
            .fetch_one(executor)
            .await?;
        decode(body)
    }

    async fn update_with<'c, X>(executor: X, entity: &E) -> Result<E, AppError>
    where
        X: sqlx::Executor<'c, Database = Postgres>,
    {
        let cols = columns(entity)?;
        let body = sqlx::query_scalar::<Postgres, Value>(UPDATE_SQL)
            .bind(cols.id)
            .bind(E::KIND)
            .bind(cols.tenant)
            .bind(cols.code)
            .bind(cols.canceled)
            .bind(cols.body)
            .fetch_optional(executor)
            .await?;
        match body {
            Some(body) => decode(body),
            None => Err(AppError::NotFound(format!(
                "{} {} not found",
                E::KIND,
                cols.id
            ))),
        }
    }
}

#[async_trait]
impl<E: Entity> EntityRepository<E> for PgEntityRepository<E> {
    #[tracing::instrument(skip(self, entity), fields(db.table = "entities", db.operation = "insert", kind = E::KIND))]
    async fn insert(&self, entity: &E) -> Result<E, AppError> {
        Self::insert_with(&self.pool, entity).await
    }

    #[tracing::instrument(skip(self, entities), fields(db.table = "entities", db.operation = "insert", kind = E::KIND, count = entities.len()))]
    async fn insert_many(&self, entities: &[E]) -> Result<Vec<E>, AppError> {
        let mut tx = self.pool.begin().await?;
        let mut saved = Vec::with_capacity(entities.len());
        for entity in entities {
            saved.push(Self::insert_with(&mut *tx, entity).await?);
        }
        tx.commit().await?;
        Ok(saved)
    }

    #[tracing::instrument(skip(self, entity), fields(db.table = "entities", db.operation = "update", kind = E::KIND))]
    async fn update(&self, entity: &E) -> Result<E, AppError> {
        Self::update_with(&self.pool, entity).await
    }

    #[tracing::instrument(skip(self, entities), fields(db.table = "entities", db.operation = "update", kind = E::KIND, count = entities.len()))]
    async fn update_many(&self, entities: &[E]) -> Result<Vec<E>, AppError> {
        let mut tx = self.pool.begin().await?;
        let mut saved = Vec::with_capacity(entities.len());
        for entity in entities {
            saved.push(Self::update_with(&mut *tx, entity).await?);
        }
        tx.commit().await?;
        Ok(saved)
    }

    #[tracing::instrument(skip(self), fields(db.table = "entities", db.operation = "delete", db.record_id = %id, kind = E::KIND))]
    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM entities WHERE id = $1 AND kind = $2")
            .bind(id)
            .bind(E::KIND)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self, ids), fields(db.table = "entities", db.operation = "delete", kind = E::KIND, count = ids.len()))]
    async fn delete_many(&self, ids: &[Uuid]) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM entities WHERE id = ANY($1) AND kind = $2")
            .bind(ids)
            .bind(E::KIND)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    #[tracing::instrument(skip(self), fields(db.table = "entities", db.operation = "select", db.record_id = %id, kind = E::KIND))]
    async fn find_by_id(&self, id: Uuid) -> Result<Option<E>, AppError> {
        let body = sqlx::query_scalar::<Postgres, Value>(
            "SELECT body FROM entities WHERE id = $1 AND kind = $2",
        )
        .bind(id)
        .bind(E::KIND)
        .fetch_optional(&self.pool)
        .await?;
        body.map(decode).transpose()
    }

    #[tracing::instrument(skip(self), fields(db.table = "entities", db.operation = "select", kind = E::KIND))]
    async fn find_by_code(&self, code: &str) -> Result<Vec<E>, AppError> {
        let bodies = sqlx::query_scalar::<Postgres, Value>(
            "SELECT body FROM entities WHERE kind = $1 AND code = $2 ORDER BY created_at ASC, id ASC",
        )
        .bind(E::KIND)
        .bind(code)
        .fetch_all(&self.pool)
        .await?;
        bodies.into_iter().map(decode).collect()
    }

    #[tracing::instrument(skip(self), fields(db.table = "entities", db.operation = "select", kind = E::KIND))]
    async fn find_all(&self, filter: &ListFilter, page: Page) -> Result<Vec<E>, AppError> {
        let page = page.clamped();
        let bodies = sqlx::query_scalar::<Postgres, Value>(
            r#"
            SELECT body FROM entities
            WHERE kind = $1
              AND ($2::text IS NULL OR tenant = $2 OR (tenant IS NULL AND NOT $6))
              AND ($3 OR NOT canceled)
            ORDER BY created_at ASC, id ASC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(E::KIND)
        .bind(filter.tenant.as_deref())
        .bind(filter.include_canceled)
        .bind(page.limit)
        .bind(page.offset)
        .bind(filter.owner_only)
        .fetch_all(&self.pool)
        .await?;
        bodies.into_iter().map(decode).collect()
    }

    #[tracing::instrument(skip(self), fields(db.table = "entities", db.operation = "count", kind = E::KIND))]
    async fn count(&self, filter: &ListFilter) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<Postgres, i64>(
            r#"
            SELECT COUNT(*) FROM entities
            WHERE kind = $1
              AND ($2::text IS NULL OR tenant = $2 OR (tenant IS NULL AND NOT $4))
              AND ($3 OR NOT canceled)
            "#,
        )
        .bind(E::KIND)
        .bind(filter.tenant.as_deref())
        .bind(filter.include_canceled)
        .bind(filter.owner_only)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}
