//! # Catalog Database
//!
//! SQLite connection pool for the track catalog.
//!
//! File databases run in WAL mode so listing requests can read while an
//! import writes. Migrations from `migrations/` are embedded at compile time
//! and applied before the pool is handed out, followed by a `SELECT 1`
//! health check.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_library::db::{create_pool, DatabaseConfig};
//!
//! let pool = create_pool(DatabaseConfig::new("/var/lib/music/library.db")).await?;
//! let tracks = SqliteTrackRepository::new(pool);
//! ```
//!
//! Tests use [`create_test_pool`], an in-memory catalog with the schema
//! applied.

use crate::{LibraryError, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Pool, Sqlite};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Where the catalog lives and how many connections may reach it
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Database file, `None` for a private in-memory catalog
    pub path: Option<PathBuf>,

    /// Maximum number of pooled connections
    pub max_connections: u32,

    /// Maximum time to wait for a pooled connection
    pub acquire_timeout: Duration,

    /// How long a statement waits on a locked database before failing
    pub busy_timeout: Duration,
}

impl DatabaseConfig {
    /// Catalog stored in `path`, created on first use.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            max_connections: 5,
            acquire_timeout: Duration::from_secs(30),
            busy_timeout: Duration::from_secs(5),
        }
    }

    /// In-memory catalog. Every connection to `:memory:` opens its own empty
    /// database, so the pool is limited to one connection.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            max_connections: 1,
            acquire_timeout: Duration::from_secs(30),
            busy_timeout: Duration::from_secs(5),
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    fn connect_options(&self) -> SqliteConnectOptions {
        let options = match &self.path {
            Some(path) => SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal),
            None => SqliteConnectOptions::new().in_memory(true),
        };

        options
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(self.busy_timeout)
    }
}

/// Open the catalog, apply migrations and verify the connection.
///
/// # Errors
///
/// Returns an error if the database file cannot be opened or created, a
/// migration fails, or the health check query fails.
pub async fn create_pool(config: DatabaseConfig) -> Result<Pool<Sqlite>> {
    let location = config
        .path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| ":memory:".to_string());

    info!(
        database = %location,
        max_connections = config.max_connections,
        "Opening track catalog"
    );

    let pool = SqlitePoolOptions::new()
        .min_connections(1)
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect_with(config.connect_options())
        .await
        .map_err(|e| {
            warn!(database = %location, error = %e, "Failed to open track catalog");
            LibraryError::Database(e)
        })?;

    run_migrations(&pool).await?;
    health_check(&pool).await?;

    Ok(pool)
}

/// In-memory catalog with the schema applied
pub async fn create_test_pool() -> Result<Pool<Sqlite>> {
    create_pool(DatabaseConfig::in_memory()).await
}

async fn run_migrations(pool: &Pool<Sqlite>) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Migration failed");
            LibraryError::Migration(e.to_string())
        })?;

    debug!("Catalog schema up to date");
    Ok(())
}

async fn health_check(pool: &Pool<Sqlite>) -> Result<()> {
    sqlx::query("SELECT 1").fetch_one(pool).await.map_err(|e| {
        warn!(error = %e, "Database health check failed");
        LibraryError::Database(e)
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_test_pool() {
        let pool = create_test_pool().await;
        assert!(pool.is_ok(), "Should create test pool successfully");
    }

    #[tokio::test]
    async fn test_health_check() {
        let pool = create_test_pool().await.unwrap();
        assert!(health_check(&pool).await.is_ok());
    }

    #[test]
    fn test_database_config_builder() {
        let config = DatabaseConfig::new("/tmp/catalog.db")
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(60))
            .busy_timeout(Duration::from_millis(250));

        assert_eq!(config.path, Some(PathBuf::from("/tmp/catalog.db")));
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.acquire_timeout, Duration::from_secs(60));
        assert_eq!(config.busy_timeout, Duration::from_millis(250));

        let memory = DatabaseConfig::in_memory();
        assert!(memory.path.is_none());
        assert_eq!(memory.max_connections, 1);
    }

    #[tokio::test]
    async fn test_file_catalog_uses_wal() {
        let dir = tempfile::tempdir().unwrap();
        let pool = create_pool(DatabaseConfig::new(dir.path().join("with space.db")))
            .await
            .unwrap();

        let (mode,): (String,) = sqlx::query_as("PRAGMA journal_mode")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");

        pool.close().await;
        assert!(dir.path().join("with space.db").exists());
    }

    #[tokio::test]
    async fn test_file_pool_allows_concurrent_queries() {
        let dir = tempfile::tempdir().unwrap();
        let pool = create_pool(DatabaseConfig::new(dir.path().join("music.db")))
            .await
            .unwrap();

        let handles: Vec<_> = (0..5)
            .map(|_| {
                let pool = pool.clone();
                tokio::spawn(async move {
                    sqlx::query("SELECT COUNT(*) FROM tracks")
                        .fetch_one(&pool)
                        .await
                        .unwrap();
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap();
        }

        pool.close().await;
    }

    #[tokio::test]
    async fn test_missing_parent_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = create_pool(DatabaseConfig::new(dir.path().join("nope").join("music.db"))).await;
        assert!(matches!(result, Err(LibraryError::Database(_))));
    }

    #[tokio::test]
    async fn test_migrations_create_schema() {
        let pool = create_test_pool().await.unwrap();

        let (tables,): (i32,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='tracks'",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(tables, 1, "Tracks table should exist");

        let (indexes,): (i32,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='index' AND name='idx_tracks_path'",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(indexes, 1, "Path index should exist");
    }
}
