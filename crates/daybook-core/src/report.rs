//! The data contract handed to report formatters.
//!
//! The core hands a formatter a read-only, ordered [`ReportData`]; layout and
//! file emission are the formatter's business.

use chrono::NaiveDate;
use serde::Serialize;

use crate::{Result, aggregate::DayBuckets, tracker::TrackedRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
  #[default]
  Ascending,
  Descending,
}

/// What a report shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum ReportData {
  /// Raw records, date-sorted.
  Records(Vec<TrackedRecord>),
  /// One day's hour buckets.
  Buckets(DayBuckets),
}

impl ReportData {
  /// Sort `records` by date (undated records keep insertion order, ahead of
  /// dated ones) and wrap them.
  pub fn records(records: impl IntoIterator<Item = TrackedRecord>, order: SortOrder) -> Self {
    let mut records: Vec<TrackedRecord> = records.into_iter().collect();
    records.sort_by_key(|r| (r.date(), r.id()));
    if order == SortOrder::Descending {
      records.reverse();
    }
    Self::Records(records)
  }

  pub fn is_empty(&self) -> bool {
    match self {
      Self::Records(r) => r.is_empty(),
      Self::Buckets(b) => !b.has_data(),
    }
  }
}

/// Turns report data into a document.
pub trait ReportFormatter {
  fn format(&self, title: &str, data: &ReportData) -> Result<Vec<u8>>;
}

/// Pretty-printed JSON: `{"title", "generated_on", "report"}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormatter {
  pub generated_on: Option<NaiveDate>,
}

#[derive(Serialize)]
struct JsonDocument<'a> {
  title:        &'a str,
  #[serde(skip_serializing_if = "Option::is_none")]
  generated_on: Option<NaiveDate>,
  report:       &'a ReportData,
}

impl ReportFormatter for JsonFormatter {
  fn format(&self, title: &str, data: &ReportData) -> Result<Vec<u8>> {
    let doc = JsonDocument { title, generated_on: self.generated_on, report: data };
    Ok(serde_json::to_vec_pretty(&doc)?)
  }
}
