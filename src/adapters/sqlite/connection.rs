//! Opening the idea graph database.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use thiserror::Error;

use crate::domain::models::DatabaseConfig;

// Evaluations hold write transactions open only briefly, but concurrent
// loops against one file still need headroom before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(30);
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Error)]
pub enum StoreOpenError {
    #[error("invalid database path '{0}'")]
    InvalidPath(String),
    #[error("failed to create database directory for '{path}'")]
    Directory {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to open database")]
    Open(#[source] sqlx::Error),
    #[error("database did not answer a health query")]
    Ping(#[source] sqlx::Error),
}

/// Open the configured database in WAL mode, creating the file and any
/// missing parent directories on first use, and check it answers queries.
pub async fn open_pool(config: &DatabaseConfig) -> Result<SqlitePool, StoreOpenError> {
    if let Some(file) = database_file(&config.path) {
        create_parent_dirs(file)?;
    }

    let options = SqliteConnectOptions::from_str(&config.path)
        .map_err(|_| StoreOpenError::InvalidPath(config.path.clone()))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(true)
        .busy_timeout(BUSY_TIMEOUT);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect_with(options)
        .await
        .map_err(StoreOpenError::Open)?;

    sqlx::query("SELECT 1")
        .fetch_one(&pool)
        .await
        .map_err(StoreOpenError::Ping)?;

    Ok(pool)
}

/// Single-connection in-memory pool for tests.
pub async fn open_test_pool() -> Result<SqlitePool, StoreOpenError> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .map_err(|_| StoreOpenError::InvalidPath("sqlite::memory:".to_string()))?
        .foreign_keys(true)
        .shared_cache(true);

    SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .map_err(StoreOpenError::Open)
}

/// The on-disk file behind a sqlite path, if any. In-memory databases have
/// no file and need no directory bootstrap.
fn database_file(path: &str) -> Option<&str> {
    let file = path
        .strip_prefix("sqlite://")
        .or_else(|| path.strip_prefix("sqlite:"))
        .unwrap_or(path);
    (file != ":memory:" && !file.is_empty()).then_some(file)
}

fn create_parent_dirs(file: &str) -> Result<(), StoreOpenError> {
    if let Some(parent) = Path::new(file).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|source| StoreOpenError::Directory {
                path: file.to_string(),
                source,
            })?;
        }
    }
    Ok(())
}
