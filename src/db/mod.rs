//! Database layer
//!
//! SQLite is the default (single-file deployment); MySQL is selected by
//! configuration or by a `mysql://` `DATABASE_URL`.
//!
//! ```ignore
//! let pool = create_pool(&config.database).await?;
//! migrations::run_migrations(&pool).await?;
//! ```

pub mod migrations;
pub mod pool;

pub use pool::{create_pool, create_test_pool, DatabasePool, DynDatabasePool};
