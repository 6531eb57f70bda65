//! Cabinet persistence layer
//!
//! One generic repository contract over entity kinds, with a PostgreSQL
//! implementation (single JSONB document table) and an in-memory one for
//! development and tests.

pub mod db;

pub use db::{
    run_migrations, EntityRepository, InMemoryRepository, ListFilter, PgEntityRepository,
};
