//! Database layer
//!
//! The importer writes straight into the SQLite database of a Noteva blog.
//!
//! # Usage
//!
//! ```ignore
//! use noteva_import::config::DatabaseConfig;
//! use noteva_import::db::{create_pool, migrations};
//!
//! let pool = create_pool(&DatabaseConfig::default()).await?;
//! migrations::run_migrations(&pool).await?;
//! pool.ping().await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{create_pool, create_test_pool, DatabasePool, DynDatabasePool, SqliteDatabase};
