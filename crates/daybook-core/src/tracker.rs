//! Tracker payloads and the [`TrackedRecord`] union over them.

use std::{fmt, str::FromStr};

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  record::{Payload, Record, RecordId, require_positive, require_text},
};

// ─── Contact ─────────────────────────────────────────────────────────────────

/// An entry in the user's care contacts (doctor, pharmacy, next of kin...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
  pub name:  String,
  pub phone: String,
  pub email: Option<String>,
  /// Free-text category, e.g. "doctor" or "family".
  pub kind:  Option<String>,
  /// Icon identifier chosen by the UI; opaque to the store.
  pub icon:  Option<String>,
}

impl Contact {
  pub fn new(name: impl Into<String>, phone: impl Into<String>) -> Self {
    Self {
      name:  name.into(),
      phone: phone.into(),
      email: None,
      kind:  None,
      icon:  None,
    }
  }
}

impl Payload for Contact {
  const ENTITY: &'static str = "contact";

  type Key = ();

  fn validate(&self) -> Result<()> {
    require_text(Self::ENTITY, "name", &self.name)?;
    require_text(Self::ENTITY, "phone", &self.phone)
  }
}

// ─── Fluid intake ────────────────────────────────────────────────────────────

/// One drink, in millilitres. Many samples may be logged per day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FluidSample {
  pub amount: f64,
}

impl Payload for FluidSample {
  const ENTITY: &'static str = "fluid sample";

  type Key = NaiveDateTime;

  fn validate(&self) -> Result<()> { require_positive(Self::ENTITY, "amount", self.amount) }
}

// ─── Weight ──────────────────────────────────────────────────────────────────

/// Body weight in kilograms; one entry per day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightEntry {
  pub weight: f64,
}

impl Payload for WeightEntry {
  const ENTITY: &'static str = "weight entry";

  type Key = NaiveDate;

  fn validate(&self) -> Result<()> { require_positive(Self::ENTITY, "weight", self.weight) }
}

// ─── Symptom ─────────────────────────────────────────────────────────────────

/// A symptom label with an optional free-text note; one entry per day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymptomEntry {
  pub symptom:     String,
  pub description: Option<String>,
}

impl Payload for SymptomEntry {
  const ENTITY: &'static str = "symptom entry";

  type Key = NaiveDate;

  fn validate(&self) -> Result<()> { require_text(Self::ENTITY, "symptom", &self.symptom) }
}

// ─── Profile ─────────────────────────────────────────────────────────────────

/// The account holder's details captured at registration. Not a tracker; the
/// most recently saved row is the current profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
  pub full_name:     String,
  pub contact:       String,
  pub blood_type:    String,
  pub email:         String,
  pub date_of_birth: NaiveDate,
}

impl Payload for UserProfile {
  const ENTITY: &'static str = "user profile";

  type Key = ();

  fn validate(&self) -> Result<()> {
    require_text(Self::ENTITY, "full_name", &self.full_name)?;
    require_text(Self::ENTITY, "contact", &self.contact)?;
    require_text(Self::ENTITY, "blood_type", &self.blood_type)?;
    require_text(Self::ENTITY, "email", &self.email)
  }
}

// ─── Tracker kind ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackerKind {
  Contact,
  Fluid,
  Weight,
  Symptom,
}

impl TrackerKind {
  pub const ALL: [TrackerKind; 4] = [Self::Contact, Self::Fluid, Self::Weight, Self::Symptom];

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Contact => "contact",
      Self::Fluid => "fluid",
      Self::Weight => "weight",
      Self::Symptom => "symptom",
    }
  }
}

impl fmt::Display for TrackerKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for TrackerKind {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "contact" | "contacts" => Ok(Self::Contact),
      "fluid" | "fluids" | "water" => Ok(Self::Fluid),
      "weight" | "weights" => Ok(Self::Weight),
      "symptom" | "symptoms" => Ok(Self::Symptom),
      other => Err(Error::UnknownTracker(other.to_owned())),
    }
  }
}

// ─── TrackedRecord ───────────────────────────────────────────────────────────

/// Any committed tracker record, tagged by kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tracker", content = "record", rename_all = "lowercase")]
pub enum TrackedRecord {
  Contact(Record<Contact>),
  Fluid(Record<FluidSample>),
  Weight(Record<WeightEntry>),
  Symptom(Record<SymptomEntry>),
}

impl TrackedRecord {
  pub fn kind(&self) -> TrackerKind {
    match self {
      Self::Contact(_) => TrackerKind::Contact,
      Self::Fluid(_) => TrackerKind::Fluid,
      Self::Weight(_) => TrackerKind::Weight,
      Self::Symptom(_) => TrackerKind::Symptom,
    }
  }

  pub fn id(&self) -> RecordId {
    match self {
      Self::Contact(r) => r.id,
      Self::Fluid(r) => r.id,
      Self::Weight(r) => r.id,
      Self::Symptom(r) => r.id,
    }
  }

  /// The calendar date the record falls on; `None` for contacts.
  pub fn date(&self) -> Option<NaiveDate> {
    match self {
      Self::Contact(r) => r.date(),
      Self::Fluid(r) => r.date(),
      Self::Weight(r) => r.date(),
      Self::Symptom(r) => r.date(),
    }
  }
}

impl From<Record<Contact>> for TrackedRecord {
  fn from(r: Record<Contact>) -> Self { Self::Contact(r) }
}

impl From<Record<FluidSample>> for TrackedRecord {
  fn from(r: Record<FluidSample>) -> Self { Self::Fluid(r) }
}

impl From<Record<WeightEntry>> for TrackedRecord {
  fn from(r: Record<WeightEntry>) -> Self { Self::Weight(r) }
}

impl From<Record<SymptomEntry>> for TrackedRecord {
  fn from(r: Record<SymptomEntry>) -> Self { Self::Symptom(r) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn contact_requires_name_and_phone() {
    assert!(Contact::new("Dr. Ng", "+61 400 000 000").validate().is_ok());

    let err = Contact::new("   ", "+61 400 000 000").validate().unwrap_err();
    assert!(matches!(err, Error::Validation { field: "name", .. }));

    let err = Contact::new("Dr. Ng", "").validate().unwrap_err();
    assert!(matches!(err, Error::Validation { field: "phone", .. }));
  }

  #[test]
  fn amounts_must_be_positive_and_finite() {
    assert!(FluidSample { amount: 250.0 }.validate().is_ok());
    assert!(FluidSample { amount: 0.0 }.validate().is_err());
    assert!(FluidSample { amount: f64::NAN }.validate().is_err());
    assert!(WeightEntry { weight: f64::INFINITY }.validate().is_err());
    assert!(WeightEntry { weight: -70.0 }.validate().is_err());
  }

  #[test]
  fn symptom_description_is_optional() {
    let entry = SymptomEntry { symptom: "headache".into(), description: None };
    assert!(entry.validate().is_ok());

    let blank = SymptomEntry { symptom: " ".into(), description: Some("bad".into()) };
    assert!(blank.validate().unwrap_err().is_validation());
  }

  #[test]
  fn tracker_kind_parses_plurals() {
    assert_eq!("Weights".parse::<TrackerKind>().unwrap(), TrackerKind::Weight);
    assert_eq!("fluid".parse::<TrackerKind>().unwrap(), TrackerKind::Fluid);
    assert!(matches!(
      "mood".parse::<TrackerKind>(),
      Err(Error::UnknownTracker(s)) if s == "mood"
    ));
  }

  #[test]
  fn tracked_record_serializes_with_tag() {
    let record = TrackedRecord::from(Record {
      id:          RecordId(7),
      occurred_at: NaiveDate::from_ymd_opt(2025, 4, 14).unwrap(),
      payload:     WeightEntry { weight: 71.5 },
    });
    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(json["tracker"], "weight");
    assert_eq!(json["record"]["id"], 7);
    assert_eq!(json["record"]["occurred_at"], "2025-04-14");
    assert_eq!(json["record"]["weight"], 71.5);
  }
}
