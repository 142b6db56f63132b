//! storage-adapters
//!
//! Concrete implementations of the domain ports. Each backend sits behind a
//! cargo feature so a deployment only compiles what it wires up.
//!
//! - `db-sqlite`: primary post store and identity directory on SQLite.
//! - `search-memory`: process-local search index.

#[cfg(feature = "db-sqlite")]
pub mod sqlite;

#[cfg(feature = "search-memory")]
pub mod memory_index;

#[cfg(feature = "db-sqlite")]
pub use sqlite::{SqliteIdentityDirectory, SqlitePostRepository};

#[cfg(feature = "search-memory")]
pub use memory_index::InMemorySearchIndex;
