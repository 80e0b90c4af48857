//! Database connection pool
//!
//! The importer writes into the same SQLite database the Noteva server reads.
//! Repositories hold a `DynDatabasePool` and never the concrete pool type,
//! so tests can swap in an in-memory database.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::sync::Arc;

use crate::config::DatabaseConfig;

const MEMORY_URL: &str = "sqlite::memory:";

#[async_trait]
pub trait DatabasePool: Send + Sync {
    /// Run a statement, returning the number of affected rows
    async fn execute(&self, query: &str) -> Result<u64>;

    async fn close(&self);

    fn sqlite(&self) -> &SqlitePool;
}

pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl SqliteDatabase {
    /// Connect to `url`, creating the database file and its directory if needed
    pub async fn new(url: &str) -> Result<Self> {
        let connection_url = connection_url(url);

        let max_connections = if connection_url.starts_with(MEMORY_URL) {
            // Every in-memory connection is a separate database
            1
        } else {
            if let Some(parent) = Path::new(database_path(url)).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)
                        .with_context(|| format!("Failed to create database directory: {:?}", parent))?;
                }
            }
            5
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(&connection_url)
            .await
            .with_context(|| format!("Failed to connect to SQLite database: {}", url))?;

        sqlx::query("PRAGMA foreign_keys = ON")
            .execute(&pool)
            .await
            .context("Failed to enable foreign keys")?;

        Ok(Self { pool })
    }
}

/// File path part of a `sqlite:` URL or bare path
fn database_path(url: &str) -> &str {
    let path = url.strip_prefix("sqlite:").unwrap_or(url);
    path.split('?').next().unwrap_or(path)
}

/// Accepts `:memory:`, bare paths and `sqlite:` URLs; files are opened read-write-create
fn connection_url(url: &str) -> String {
    if url == ":memory:" {
        MEMORY_URL.to_string()
    } else if url.starts_with("sqlite:") {
        if url.contains('?') || url.starts_with(MEMORY_URL) {
            url.to_string()
        } else {
            format!("{}?mode=rwc", url)
        }
    } else {
        format!("sqlite:{}?mode=rwc", url)
    }
}

#[async_trait]
impl DatabasePool for SqliteDatabase {
    async fn execute(&self, query: &str) -> Result<u64> {
        let result = sqlx::query(query)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to execute query: {}", query))?;
        Ok(result.rows_affected())
    }

    async fn close(&self) {
        self.pool.close().await;
    }

    fn sqlite(&self) -> &SqlitePool {
        &self.pool
    }
}

pub type DynDatabasePool = Arc<dyn DatabasePool>;

pub async fn create_pool(config: &DatabaseConfig) -> Result<DynDatabasePool> {
    let db = SqliteDatabase::new(&config.url).await?;
    Ok(Arc::new(db))
}

/// In-memory database for tests
pub async fn create_test_pool() -> Result<DynDatabasePool> {
    create_pool(&DatabaseConfig {
        url: ":memory:".to_string(),
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_url_forms() {
        assert_eq!(connection_url(":memory:"), "sqlite::memory:");
        assert_eq!(connection_url("sqlite::memory:"), "sqlite::memory:");
        assert_eq!(connection_url("data/noteva.db"), "sqlite:data/noteva.db?mode=rwc");
        assert_eq!(connection_url("sqlite:data/noteva.db"), "sqlite:data/noteva.db?mode=rwc");
        assert_eq!(connection_url("sqlite:data/noteva.db?mode=ro"), "sqlite:data/noteva.db?mode=ro");
    }

    #[test]
    fn test_database_path_strips_scheme_and_query() {
        assert_eq!(database_path("sqlite:data/noteva.db?mode=rwc"), "data/noteva.db");
        assert_eq!(database_path("data/noteva.db"), "data/noteva.db");
    }

    #[tokio::test]
    async fn test_memory_pool_execute() {
        let pool = create_test_pool().await.expect("Failed to create pool");

        pool.execute("CREATE TABLE test (id INTEGER PRIMARY KEY, name TEXT)")
            .await
            .expect("Failed to create table");
        let affected = pool
            .execute("INSERT INTO test (name) VALUES ('test')")
            .await
            .expect("Failed to insert");

        assert_eq!(affected, 1);
    }

    #[tokio::test]
    async fn test_file_database_creates_directories() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("nested").join("dir").join("test.db");

        let pool = create_pool(&DatabaseConfig {
            url: db_path.to_string_lossy().to_string(),
        })
        .await
        .expect("Failed to create pool");
        pool.close().await;

        assert!(db_path.exists());
    }
}
