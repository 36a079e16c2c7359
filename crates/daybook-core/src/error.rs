//! Error types for `daybook-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A draft failed the pre-write validation gate. Nothing was persisted.
  #[error("invalid {entity}: {field} {problem}")]
  Validation {
    entity:  &'static str,
    field:   &'static str,
    problem: &'static str,
  },

  #[error("invalid bucket boundaries: {0}")]
  InvalidBoundaries(&'static str),

  #[error("invalid month: {year}-{month:02}")]
  InvalidMonth { year: i32, month: u32 },

  #[error("unknown tracker kind: {0:?}")]
  UnknownTracker(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  pub fn is_validation(&self) -> bool {
    matches!(
      self,
      Self::Validation { .. } | Self::InvalidBoundaries(_) | Self::InvalidMonth { .. }
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
