//! The `RecordStore` trait.
//!
//! Implemented by storage backends (e.g. `daybook-store-sqlite`) once per
//! payload type. Consumers such as `daybook-cli` depend on this abstraction,
//! not on a concrete backend.
//!
//! The store is passive: it never pushes change notifications. Callers
//! re-fetch with [`RecordStore::list_all`] or [`RecordStore::find_by_date`]
//! after every successful mutation.

use std::future::Future;

use chrono::NaiveDate;

use crate::record::{Draft, Payload, Record, RecordId};

/// CRUD over one tracker's records.
///
/// All methods return `Send` futures so a store can be shared across tasks of
/// a multi-threaded runtime.
pub trait RecordStore<P: Payload>: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Snapshot of every record, ordered by occurrence ascending (id breaks
  /// ties). Unkeyed entities come back in insertion order.
  fn list_all(&self) -> impl Future<Output = Result<Vec<Record<P>>, Self::Error>> + Send + '_;

  /// Records on `date`: an exact match for day-keyed trackers, the half-open
  /// range `[date 00:00, date+1 00:00)` for sample-based ones. Always empty
  /// for unkeyed entities.
  fn find_by_date(
    &self,
    date: NaiveDate,
  ) -> impl Future<Output = Result<Vec<Record<P>>, Self::Error>> + Send + '_;

  /// Validate and persist `draft`, returning the committed record.
  ///
  /// - `draft.id` set: overwrite that row (payload and occurrence).
  /// - day-keyed, no id: update the record already on that date, keeping its
  ///   id, or insert a new one.
  /// - otherwise: insert.
  fn save(&self, draft: Draft<P>) -> impl Future<Output = Result<Record<P>, Self::Error>> + Send + '_;

  /// Remove the record with `id`. Returns `false` (not an error) if there was
  /// no such record. Irreversible; callers confirm with the user first.
  fn delete_by_id(&self, id: RecordId) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Distinct dates that carry at least one record, ascending. Drives
  /// calendar marking.
  fn dates_with_records(
    &self,
  ) -> impl Future<Output = Result<Vec<NaiveDate>, Self::Error>> + Send + '_;
}
