//! Database connection pool
//!
//! Manara runs on SQLite for single-binary deployment. The pool
//! creation handles bare file paths, `sqlite:` URLs, and in-memory
//! databases for tests.

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::config::DatabaseConfig;

/// Create a connection pool from configuration
pub async fn create_pool(config: &DatabaseConfig) -> Result<SqlitePool> {
    connect(&config.url).await
}

/// Create an in-memory pool for tests
pub async fn create_test_pool() -> Result<SqlitePool> {
    connect("sqlite::memory:").await
}

async fn connect(url: &str) -> Result<SqlitePool> {
    let in_memory = url.contains(":memory:");

    // Ensure the database directory exists for file-based SQLite
    if !in_memory {
        let path = url.trim_start_matches("sqlite:");
        if let Some(parent) = std::path::Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create database directory: {parent:?}"))?;
            }
        }
    }

    let options = if in_memory {
        "sqlite::memory:"
            .parse::<SqliteConnectOptions>()
            .context("Failed to build in-memory connect options")?
    } else {
        let path = url.trim_start_matches("sqlite:");
        let path = path.split('?').next().unwrap_or(path);
        SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
    }
    // SQLite does not enforce foreign keys unless asked; applied per connection
    .foreign_keys(true);

    // An in-memory database exists per connection, so the pool must
    // hold exactly one
    let max_connections = if in_memory { 1 } else { 20 };

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to connect to SQLite database: {url}"))?;

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_test_pool() {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        let row: (i64,) = sqlx::query_as("SELECT 1")
            .fetch_one(&pool)
            .await
            .expect("Failed to query");
        assert_eq!(row.0, 1);
    }

    #[tokio::test]
    async fn test_foreign_keys_enabled() {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        let row: (i64,) = sqlx::query_as("PRAGMA foreign_keys")
            .fetch_one(&pool)
            .await
            .expect("Failed to query pragma");
        assert_eq!(row.0, 1);
    }
}
