//! Error type for `daybook-store-sqlite`.
//!
//! Variants fall into three groups: validation (`Core`), persistence
//! (`Database`, `RecordNotFound`, `Decode`) and the fatal `Migration`.

use daybook_core::record::RecordId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] daybook_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  /// A schema step failed; the store must not be used.
  #[error("migration to schema v{version} ({description}) failed: {source}")]
  Migration {
    version:     u32,
    description: &'static str,
    source:      tokio_rusqlite::Error,
  },

  /// An edit named an id that is not in the table.
  #[error("{entity} {id} not found")]
  RecordNotFound {
    entity: &'static str,
    id:     RecordId,
  },

  #[error("cannot decode stored {column}: {message}")]
  Decode {
    column:  &'static str,
    message: String,
  },
}

impl Error {
  pub fn is_validation(&self) -> bool {
    matches!(self, Self::Core(e) if e.is_validation())
  }

  pub fn is_persistence(&self) -> bool {
    matches!(self, Self::Database(_) | Self::RecordNotFound { .. } | Self::Decode { .. })
  }

  pub fn is_migration(&self) -> bool { matches!(self, Self::Migration { .. }) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
