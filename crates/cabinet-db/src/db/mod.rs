//! Entity repositories
//
// Repository contract shared by every backend
pub mod repository;
//
// PostgreSQL document-table repository and migrations
pub mod postgres;
//
// Process-local repository
pub mod memory;

pub use memory::InMemoryRepository;
pub use postgres::{run_migrations, PgEntityRepository};
pub use repository::{EntityRepository, ListFilter};
