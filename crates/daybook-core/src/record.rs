//! The record envelope shared by every tracker.
//!
//! A record is a typed payload plus a store-assigned integer id and an
//! occurrence key. The key type decides how the store treats dates:
//!
//! | key             | keying      | date semantics                          |
//! |-----------------|-------------|-----------------------------------------|
//! | `NaiveDate`     | `Day`       | at most one record per calendar date    |
//! | `NaiveDateTime` | `Sample`    | any number of samples per date          |
//! | `()`            | `Unkeyed`   | no date; ordered by insertion           |

use std::fmt::{self, Debug};

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::Result;

// ─── Identity ────────────────────────────────────────────────────────────────

/// Surrogate key assigned by the store on creation. Never reused.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RecordId(pub i64);

impl fmt::Display for RecordId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { fmt::Display::fmt(&self.0, f) }
}

// ─── Keying ──────────────────────────────────────────────────────────────────

/// How a tracker's records relate to the calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keying {
  /// One record per calendar date; saving on an occupied date edits it.
  Day,
  /// Free timestamps; many records may share a date.
  Sample,
  /// Not time-ordered at all.
  Unkeyed,
}

/// An occurrence key. Implemented for the three shapes in the table above.
pub trait RecordKey:
  Clone + Debug + PartialEq + Send + Sync + Serialize + for<'de> Deserialize<'de> + 'static
{
  const KEYING: Keying;

  /// The calendar date this key falls on, if it has one.
  fn date(&self) -> Option<NaiveDate>;
}

impl RecordKey for NaiveDate {
  const KEYING: Keying = Keying::Day;

  fn date(&self) -> Option<NaiveDate> { Some(*self) }
}

impl RecordKey for NaiveDateTime {
  const KEYING: Keying = Keying::Sample;

  fn date(&self) -> Option<NaiveDate> { Some(NaiveDateTime::date(self)) }
}

impl RecordKey for () {
  const KEYING: Keying = Keying::Unkeyed;

  fn date(&self) -> Option<NaiveDate> { None }
}

// ─── Payload ─────────────────────────────────────────────────────────────────

/// The kind-specific part of a record.
pub trait Payload: Clone + Debug + PartialEq + Send + Sync + 'static {
  /// Human-readable entity name used in errors and logs.
  const ENTITY: &'static str;

  type Key: RecordKey;

  /// The pre-write gate. A payload that fails here is never persisted.
  fn validate(&self) -> Result<()>;
}

// ─── Record / Draft ──────────────────────────────────────────────────────────

/// A committed row, as returned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(
  serialize = "P: Serialize",
  deserialize = "P: Deserialize<'de>"
))]
pub struct Record<P: Payload> {
  pub id:          RecordId,
  pub occurred_at: P::Key,
  #[serde(flatten)]
  pub payload:     P,
}

impl<P: Payload> Record<P> {
  pub fn date(&self) -> Option<NaiveDate> { self.occurred_at.date() }
}

/// Input to [`crate::store::RecordStore::save`].
///
/// `id` is `Some` when editing an existing row; the store then overwrites that
/// row in place. When `id` is `None` the tracker's keying decides between
/// insert and update-by-date.
#[derive(Debug, Clone, PartialEq)]
pub struct Draft<P: Payload> {
  pub id:          Option<RecordId>,
  pub occurred_at: P::Key,
  pub payload:     P,
}

impl<P: Payload> Draft<P> {
  pub fn new(occurred_at: P::Key, payload: P) -> Self {
    Self { id: None, occurred_at, payload }
  }

  pub fn editing(id: RecordId, occurred_at: P::Key, payload: P) -> Self {
    Self { id: Some(id), occurred_at, payload }
  }

  pub fn validate(&self) -> Result<()> { self.payload.validate() }

  /// Attach the id the store assigned, producing the committed record.
  pub fn commit(self, id: RecordId) -> Record<P> {
    Record { id, occurred_at: self.occurred_at, payload: self.payload }
  }
}

impl<P: Payload> From<Record<P>> for Draft<P> {
  fn from(record: Record<P>) -> Self {
    Self::editing(record.id, record.occurred_at, record.payload)
  }
}

// ─── Validation helpers ──────────────────────────────────────────────────────

pub(crate) fn require_text(
  entity: &'static str,
  field: &'static str,
  value: &str,
) -> Result<()> {
  if value.trim().is_empty() {
    return Err(crate::Error::Validation { entity, field, problem: "is required" });
  }
  Ok(())
}

pub(crate) fn require_positive(
  entity: &'static str,
  field: &'static str,
  value: f64,
) -> Result<()> {
  if !value.is_finite() {
    return Err(crate::Error::Validation { entity, field, problem: "must be a number" });
  }
  if value <= 0.0 {
    return Err(crate::Error::Validation {
      entity,
      field,
      problem: "must be greater than zero",
    });
  }
  Ok(())
}
