//! Column mappings for every payload this backend stores.
//!
//! A [`Table`] names its SQLite table and payload columns and converts the
//! payload to and from column values. A [`SqlKey`] does the same for the
//! occurrence key, which lives in its own column (`day` or `taken_at`) or,
//! for unkeyed entities, nowhere.

use chrono::{NaiveDate, NaiveDateTime};
use daybook_core::{
  record::{Payload, Record, RecordId, RecordKey},
  tracker::{Contact, FluidSample, SymptomEntry, UserProfile, WeightEntry},
};
use rusqlite::types::Value;

use crate::{
  Result,
  encode::{
    RawRow, decode_amount, decode_day, decode_opt_text, decode_stamp, decode_text,
    encode_day, encode_opt_text, encode_stamp,
  },
};

// ─── Keys ────────────────────────────────────────────────────────────────────

pub trait SqlKey: RecordKey {
  /// The occurrence column, or `None` for unkeyed tables.
  const COLUMN: Option<&'static str>;

  fn encode(&self) -> Option<String>;

  fn decode(raw: Option<&str>) -> Result<Self>;
}

impl SqlKey for NaiveDate {
  const COLUMN: Option<&'static str> = Some("day");

  fn encode(&self) -> Option<String> { Some(encode_day(*self)) }

  fn decode(raw: Option<&str>) -> Result<Self> { decode_day(raw.unwrap_or_default()) }
}

impl SqlKey for NaiveDateTime {
  const COLUMN: Option<&'static str> = Some("taken_at");

  fn encode(&self) -> Option<String> { Some(encode_stamp(*self)) }

  fn decode(raw: Option<&str>) -> Result<Self> { decode_stamp(raw.unwrap_or_default()) }
}

impl SqlKey for () {
  const COLUMN: Option<&'static str> = None;

  fn encode(&self) -> Option<String> { None }

  fn decode(_raw: Option<&str>) -> Result<Self> { Ok(()) }
}

// ─── Tables ──────────────────────────────────────────────────────────────────

pub trait Table: Payload {
  const NAME: &'static str;

  /// Payload columns, in the order [`Table::encode`] produces values.
  const COLUMNS: &'static [&'static str];

  fn encode(&self) -> Vec<Value>;

  fn decode(values: &[Value]) -> Result<Self>;
}

/// Rebuild a committed record from a raw row.
pub(crate) fn decode_record<P>(raw: RawRow) -> Result<Record<P>>
where
  P: Table,
  P::Key: SqlKey,
{
  Ok(Record {
    id:          RecordId(raw.id),
    occurred_at: <P::Key as SqlKey>::decode(raw.key.as_deref())?,
    payload:     P::decode(&raw.values)?,
  })
}

impl Table for Contact {
  const NAME: &'static str = "contacts";
  const COLUMNS: &'static [&'static str] = &["name", "phone", "email", "kind", "icon"];

  fn encode(&self) -> Vec<Value> {
    vec![
      Value::Text(self.name.clone()),
      Value::Text(self.phone.clone()),
      encode_opt_text(&self.email),
      encode_opt_text(&self.kind),
      encode_opt_text(&self.icon),
    ]
  }

  fn decode(values: &[Value]) -> Result<Self> {
    Ok(Self {
      name:  decode_text("name", &values[0])?,
      phone: decode_text("phone", &values[1])?,
      email: decode_opt_text("email", &values[2])?,
      kind:  decode_opt_text("kind", &values[3])?,
      icon:  decode_opt_text("icon", &values[4])?,
    })
  }
}

impl Table for FluidSample {
  const NAME: &'static str = "fluid_intake";
  const COLUMNS: &'static [&'static str] = &["amount"];

  fn encode(&self) -> Vec<Value> { vec![Value::Real(self.amount)] }

  fn decode(values: &[Value]) -> Result<Self> {
    Ok(Self { amount: decode_amount(&values[0]) })
  }
}

impl Table for WeightEntry {
  const NAME: &'static str = "weight_log";
  const COLUMNS: &'static [&'static str] = &["weight"];

  fn encode(&self) -> Vec<Value> { vec![Value::Real(self.weight)] }

  fn decode(values: &[Value]) -> Result<Self> {
    Ok(Self { weight: decode_amount(&values[0]) })
  }
}

impl Table for SymptomEntry {
  const NAME: &'static str = "symptom_log";
  const COLUMNS: &'static [&'static str] = &["symptom", "description"];

  fn encode(&self) -> Vec<Value> {
    vec![Value::Text(self.symptom.clone()), encode_opt_text(&self.description)]
  }

  fn decode(values: &[Value]) -> Result<Self> {
    Ok(Self {
      symptom:     decode_text("symptom", &values[0])?,
      description: decode_opt_text("description", &values[1])?,
    })
  }
}

impl Table for UserProfile {
  const NAME: &'static str = "user_profile";
  const COLUMNS: &'static [&'static str] =
    &["full_name", "contact", "blood_type", "email", "date_of_birth"];

  fn encode(&self) -> Vec<Value> {
    vec![
      Value::Text(self.full_name.clone()),
      Value::Text(self.contact.clone()),
      Value::Text(self.blood_type.clone()),
      Value::Text(self.email.clone()),
      Value::Text(encode_day(self.date_of_birth)),
    ]
  }

  fn decode(values: &[Value]) -> Result<Self> {
    Ok(Self {
      full_name:     decode_text("full_name", &values[0])?,
      contact:       decode_text("contact", &values[1])?,
      blood_type:    decode_text("blood_type", &values[2])?,
      email:         decode_text("email", &values[3])?,
      date_of_birth: decode_day(&decode_text("date_of_birth", &values[4])?)?,
    })
  }
}
