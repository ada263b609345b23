//! SQLite adapters for the persistence ports.

pub mod connection;
pub mod memory_store;
pub mod migrations;

pub use connection::{open_pool, open_test_pool, StoreOpenError};
pub use memory_store::SqliteMemoryStore;
pub use migrations::{migrate, MigrationError};
