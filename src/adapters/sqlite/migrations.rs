//! Embedded schema migrations for the idea graph.

use sqlx::SqlitePool;
use thiserror::Error;
use tracing::debug;

/// Every schema migration the binary ships with, oldest first. New schema
/// changes append an entry with the next version.
const MIGRATIONS: &[EmbeddedMigration] = &[EmbeddedMigration {
    version: 1,
    label: "idea graph schema",
    sql: include_str!("../../../migrations/001_initial_schema.sql"),
}];

#[derive(Debug, Clone, Copy)]
struct EmbeddedMigration {
    version: i64,
    label: &'static str,
    sql: &'static str,
}

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("migration {version} ({label}) failed")]
    Apply {
        version: i64,
        label: &'static str,
        #[source]
        source: sqlx::Error,
    },
    #[error("failed to read schema version")]
    Version(#[source] sqlx::Error),
}

/// Bring the schema up to date with the embedded migrations. Returns the
/// number of migrations applied; zero means the schema was already current.
pub async fn migrate(pool: &SqlitePool) -> Result<usize, MigrationError> {
    ensure_version_table(pool).await?;
    let current = current_version(pool).await?;

    let mut applied = 0;
    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        apply(pool, migration).await?;
        debug!(version = migration.version, label = migration.label, "applied migration");
        applied += 1;
    }
    Ok(applied)
}

async fn ensure_version_table(pool: &SqlitePool) -> Result<(), MigrationError> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            label TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
    )
    .execute(pool)
    .await
    .map_err(MigrationError::Version)?;
    Ok(())
}

async fn current_version(pool: &SqlitePool) -> Result<i64, MigrationError> {
    let (version,): (i64,) = sqlx::query_as("SELECT COALESCE(MAX(version), 0) FROM schema_migrations")
        .fetch_one(pool)
        .await
        .map_err(MigrationError::Version)?;
    Ok(version)
}

async fn apply(pool: &SqlitePool, migration: &EmbeddedMigration) -> Result<(), MigrationError> {
    let fail = |source| MigrationError::Apply {
        version: migration.version,
        label: migration.label,
        source,
    };

    sqlx::raw_sql(migration.sql).execute(pool).await.map_err(fail)?;

    sqlx::query("INSERT INTO schema_migrations (version, label) VALUES (?, ?)")
        .bind(migration.version)
        .bind(migration.label)
        .execute(pool)
        .await
        .map_err(fail)?;
    Ok(())
}
