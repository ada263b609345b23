//! Adapters implementing the domain ports.

pub mod http;
pub mod memory;
pub mod sqlite;

pub use http::HttpEvaluator;
pub use memory::InMemoryStore;
pub use sqlite::SqliteMemoryStore;
