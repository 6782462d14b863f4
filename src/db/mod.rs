//! Database layer: pool, migrations and queries for PostgreSQL.

mod pool;
mod repositories;

pub use pool::{create_pool, run_migrations, DbPool};
pub use repositories::*;
