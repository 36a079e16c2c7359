//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Calendar dates are stored as `YYYY-MM-DD`, sample timestamps as local
//! `YYYY-MM-DDTHH:MM:SS`. Both sort lexically in time order, which the range
//! queries rely on.

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::Value;

use crate::{Error, Result};

const DAY_FORMAT: &str = "%Y-%m-%d";
const STAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
/// SQLite's own `CURRENT_TIMESTAMP` shape; accepted on read.
const SQLITE_STAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_day(d: NaiveDate) -> String { d.format(DAY_FORMAT).to_string() }

pub fn decode_day(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, DAY_FORMAT).map_err(|e| Error::Decode {
    column:  "day",
    message: format!("{s:?}: {e}"),
  })
}

// ─── NaiveDateTime ───────────────────────────────────────────────────────────

pub fn encode_stamp(dt: NaiveDateTime) -> String { dt.format(STAMP_FORMAT).to_string() }

pub fn decode_stamp(s: &str) -> Result<NaiveDateTime> {
  NaiveDateTime::parse_from_str(s, STAMP_FORMAT)
    .or_else(|_| NaiveDateTime::parse_from_str(s, SQLITE_STAMP_FORMAT))
    .map_err(|e| Error::Decode {
      column:  "taken_at",
      message: format!("{s:?}: {e}"),
    })
}

/// Bounds of the half-open range `[date, date + 1)` over encoded timestamps.
///
/// Bare dates are used as bounds: every stamp on `date` sorts at or after
/// `YYYY-MM-DD` and before the next day's `YYYY-MM-DD`, whichever separator
/// it uses.
pub fn day_range(date: NaiveDate) -> (String, String) {
  let end = date
    .succ_opt()
    .map(encode_day)
    // NaiveDate::MAX has no successor; nothing sorts after this.
    .unwrap_or_else(|| "\u{10FFFF}".to_owned());
  (encode_day(date), end)
}

// ─── Columns ─────────────────────────────────────────────────────────────────

/// Read a numeric column leniently, the way a form field is parsed: integers
/// and reals pass through, text is parsed, anything else is NaN. Consumers
/// treat NaN as "contributes nothing".
pub fn decode_amount(v: &Value) -> f64 {
  match v {
    Value::Integer(i) => *i as f64,
    Value::Real(r) => *r,
    Value::Text(t) => t.trim().parse().unwrap_or(f64::NAN),
    Value::Null | Value::Blob(_) => f64::NAN,
  }
}

pub fn decode_text(column: &'static str, v: &Value) -> Result<String> {
  match v {
    Value::Text(t) => Ok(t.clone()),
    other => Err(Error::Decode {
      column,
      message: format!("expected text, found {:?}", other.data_type()),
    }),
  }
}

pub fn decode_opt_text(column: &'static str, v: &Value) -> Result<Option<String>> {
  match v {
    Value::Null => Ok(None),
    other => decode_text(column, other).map(Some),
  }
}

pub fn encode_opt_text(s: &Option<String>) -> Value {
  s.as_ref().map_or(Value::Null, |s| Value::Text(s.clone()))
}

// ─── Row type ────────────────────────────────────────────────────────────────

/// A row read directly from a tracker table: the id, the raw occurrence key
/// (if the table has one), and the payload columns in declaration order.
pub struct RawRow {
  pub id:     i64,
  pub key:    Option<String>,
  pub values: Vec<Value>,
}

impl RawRow {
  pub fn read(row: &rusqlite::Row<'_>, keyed: bool, width: usize) -> rusqlite::Result<Self> {
    let id = row.get(0)?;
    let (key, offset) = if keyed { (Some(row.get(1)?), 2) } else { (None, 1) };
    let values = (offset..offset + width)
      .map(|i| row.get::<_, Value>(i))
      .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(Self { id, key, values })
  }
}
