//! SQLite backend for the daybook store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. One table per tracker; the schema is
//! versioned through `PRAGMA user_version` (see [`schema`]).

mod encode;
mod store;

pub mod error;
pub mod schema;
pub mod table;

pub use error::{Error, Result};
pub use schema::SCHEMA_VERSION;
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
