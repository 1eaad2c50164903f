//! Persistence layer: SQLite schema and the transactional storage backend.

pub mod schema;
pub mod sqlite;

pub use schema::{apply_schema, CURRENT_SCHEMA_VERSION};
pub use sqlite::{MutationContext, SqliteStorage};
