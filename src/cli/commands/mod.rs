//! CLI command implementations.

pub mod idea;
pub mod init;
pub mod mcts;
pub mod run;

use anyhow::{Context as _, Result};

use crate::adapters::sqlite::{self, SqliteMemoryStore};
use crate::domain::models::Config;

/// Open the configured database, apply pending migrations, and hand back a
/// store ready for use.
pub async fn open_store(config: &Config) -> Result<SqliteMemoryStore> {
    let pool = sqlite::open_pool(&config.database)
        .await
        .context("Failed to open database")?;
    sqlite::migrate(&pool)
        .await
        .context("Failed to run migrations")?;

    Ok(SqliteMemoryStore::new(pool))
}
