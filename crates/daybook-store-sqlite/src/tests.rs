//! Integration tests for `SqliteStore` against in-memory and on-disk
//! databases.

use chrono::{NaiveDate, NaiveDateTime};
use daybook_core::{
  aggregate::{BucketBoundaries, aggregate},
  record::{Draft, Payload, Record, RecordId},
  store::RecordStore,
  tracker::{Contact, FluidSample, SymptomEntry, UserProfile, WeightEntry},
};

use crate::{
  Error, SCHEMA_VERSION, SqliteStore,
  schema::{self, Migration},
  table::{SqlKey, Table},
};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn day(d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(2025, 4, d).unwrap() }

fn at(d: u32, hour: u32, minute: u32) -> NaiveDateTime {
  day(d).and_hms_opt(hour, minute, 0).unwrap()
}

async fn all<P>(s: &SqliteStore) -> Vec<Record<P>>
where
  P: Table,
  P::Key: SqlKey,
{
  RecordStore::<P>::list_all(s).await.unwrap()
}

async fn on<P>(s: &SqliteStore, date: NaiveDate) -> Vec<Record<P>>
where
  P: Table,
  P::Key: SqlKey,
{
  RecordStore::<P>::find_by_date(s, date).await.unwrap()
}

fn symptom(label: &str, note: Option<&str>) -> SymptomEntry {
  SymptomEntry { symptom: label.into(), description: note.map(Into::into) }
}

// ─── Schema ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn open_migrates_to_latest() {
  let s = store().await;
  assert_eq!(s.schema_version().await.unwrap(), SCHEMA_VERSION);
}

#[tokio::test]
async fn ensure_schema_is_idempotent() {
  let s = store().await;
  let before = s.schema_version().await.unwrap();

  assert_eq!(s.ensure_schema().await.unwrap(), 0);
  assert_eq!(s.ensure_schema().await.unwrap(), 0);
  assert_eq!(s.schema_version().await.unwrap(), before);
}

const BROKEN: &[Migration] = &[
  Migration {
    version:     1,
    description: "first",
    up:          "CREATE TABLE first (x INTEGER);",
  },
  Migration {
    version:     2,
    description: "half written",
    up:          "CREATE TABLE second (y INTEGER); CREATE TABLE oops (",
  },
];

#[tokio::test]
async fn failed_migration_step_rolls_back_whole_step() {
  let conn = tokio_rusqlite::Connection::open_in_memory().await.unwrap();

  let err = schema::migrate(&conn, BROKEN).await.unwrap_err();
  assert!(err.is_migration());
  assert!(matches!(err, Error::Migration { version: 2, .. }));

  // Step 1 committed, step 2 left nothing behind.
  assert_eq!(schema::current_version(&conn).await.unwrap(), 1);
  let tables: Vec<String> = conn
    .call(|c| {
      let mut stmt = c.prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")?;
      let names = stmt
        .query_map([], |r| r.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
      Ok(names)
    })
    .await
    .unwrap();
  assert_eq!(tables, vec!["first".to_string()]);
}

#[tokio::test]
async fn reopening_a_file_keeps_data_and_skips_migrations() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("daybook.db");

  let saved = {
    let s = SqliteStore::open(&path).await.unwrap();
    s.save(Draft::new(day(14), WeightEntry { weight: 72.4 }))
      .await
      .unwrap()
  };

  let s = SqliteStore::open(&path).await.unwrap();
  assert_eq!(s.ensure_schema().await.unwrap(), 0);
  assert_eq!(s.schema_version().await.unwrap(), SCHEMA_VERSION);
  assert_eq!(all::<WeightEntry>(&s).await, vec![saved]);
}

// ─── Day-keyed trackers ──────────────────────────────────────────────────────

#[tokio::test]
async fn day_keyed_save_then_resave_keeps_one_record() {
  let s = store().await;

  let first = s
    .save(Draft::new(day(14), WeightEntry { weight: 72.0 }))
    .await
    .unwrap();
  let found = on::<WeightEntry>(&s, day(14)).await;
  assert_eq!(found, vec![first.clone()]);

  let second = s
    .save(Draft::new(day(14), WeightEntry { weight: 71.2 }))
    .await
    .unwrap();
  let found = on::<WeightEntry>(&s, day(14)).await;
  assert_eq!(found.len(), 1);
  assert_eq!(found[0].payload.weight, 71.2);
  // Updating by date keeps the row's identity.
  assert_eq!(second.id, first.id);
  assert_eq!(found[0].id, first.id);
}

#[tokio::test]
async fn symptom_upsert_replaces_label_and_note() {
  let s = store().await;

  s.save(Draft::new(day(3), symptom("headache", Some("after lunch"))))
    .await
    .unwrap();
  s.save(Draft::new(day(3), symptom("nausea", None)))
    .await
    .unwrap();

  let found = on::<SymptomEntry>(&s, day(3)).await;
  assert_eq!(found.len(), 1);
  assert_eq!(found[0].payload, symptom("nausea", None));
  assert_eq!(all::<SymptomEntry>(&s).await.len(), 1);
}

#[tokio::test]
async fn editing_by_id_can_move_the_date() {
  let s = store().await;

  let entry = s
    .save(Draft::new(day(1), symptom("cough", None)))
    .await
    .unwrap();
  let moved = s
    .save(Draft::editing(entry.id, day(2), symptom("cough", Some("dry"))))
    .await
    .unwrap();

  assert_eq!(moved.id, entry.id);
  assert!(on::<SymptomEntry>(&s, day(1)).await.is_empty());
  assert_eq!(on::<SymptomEntry>(&s, day(2)).await, vec![moved]);
}

#[tokio::test]
async fn editing_onto_an_occupied_date_is_a_persistence_error() {
  let s = store().await;

  let a = s
    .save(Draft::new(day(1), WeightEntry { weight: 70.0 }))
    .await
    .unwrap();
  s.save(Draft::new(day(2), WeightEntry { weight: 70.5 }))
    .await
    .unwrap();

  let err = s
    .save(Draft::editing(a.id, day(2), WeightEntry { weight: 69.9 }))
    .await
    .unwrap_err();
  assert!(err.is_persistence());

  // Nothing changed.
  assert_eq!(on::<WeightEntry>(&s, day(1)).await, vec![a]);
  assert_eq!(on::<WeightEntry>(&s, day(2)).await[0].payload.weight, 70.5);
}

#[tokio::test]
async fn editing_a_missing_id_reports_not_found() {
  let s = store().await;

  let err = s
    .save(Draft::editing(RecordId(99), day(5), WeightEntry { weight: 70.0 }))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::RecordNotFound { id: RecordId(99), .. }));
  assert!(all::<WeightEntry>(&s).await.is_empty());
}

#[tokio::test]
async fn day_keyed_list_is_date_ordered() {
  let s = store().await;
  for (d, kg) in [(20, 70.0), (2, 72.0), (11, 71.0)] {
    s.save(Draft::new(day(d), WeightEntry { weight: kg }))
      .await
      .unwrap();
  }

  let dates: Vec<NaiveDate> = all::<WeightEntry>(&s)
    .await
    .into_iter()
    .map(|r| r.occurred_at)
    .collect();
  assert_eq!(dates, vec![day(2), day(11), day(20)]);
}

// ─── Sample-based tracker ────────────────────────────────────────────────────

#[tokio::test]
async fn samples_on_the_same_day_are_never_merged() {
  let s = store().await;

  for (hour, ml) in [(8, 250.0), (8, 100.0), (13, 300.0), (23, 50.0)] {
    s.save(Draft::new(at(14, hour, 0), FluidSample { amount: ml }))
      .await
      .unwrap();
  }
  s.save(Draft::new(at(15, 0, 0), FluidSample { amount: 500.0 }))
    .await
    .unwrap();

  let today = on::<FluidSample>(&s, day(14)).await;
  assert_eq!(today.len(), 4);
  assert!(today.windows(2).all(|w| w[0].occurred_at <= w[1].occurred_at));

  let totals = aggregate(&today, &BucketBoundaries::default());
  assert_eq!(totals, vec![350.0, 0.0, 300.0, 0.0, 0.0, 50.0]);

  assert_eq!(on::<FluidSample>(&s, day(15)).await.len(), 1);
  assert!(on::<FluidSample>(&s, day(16)).await.is_empty());
}

#[tokio::test]
async fn editing_a_sample_changes_its_time() {
  let s = store().await;

  let sample = s
    .save(Draft::new(at(14, 9, 0), FluidSample { amount: 200.0 }))
    .await
    .unwrap();
  s.save(Draft::editing(sample.id, at(14, 17, 30), FluidSample { amount: 250.0 }))
    .await
    .unwrap();

  let today = on::<FluidSample>(&s, day(14)).await;
  assert_eq!(today.len(), 1);
  assert_eq!(today[0].occurred_at, at(14, 17, 30));
  assert_eq!(today[0].payload.amount, 250.0);
}

#[tokio::test]
async fn saved_sample_matches_what_reads_back() {
  let s = store().await;
  let half_past = at(14, 9, 0) + chrono::Duration::milliseconds(500);

  let saved = s
    .save(Draft::new(half_past, FluidSample { amount: 120.0 }))
    .await
    .unwrap();
  assert_eq!(saved.occurred_at, at(14, 9, 0));
  assert_eq!(on::<FluidSample>(&s, day(14)).await, vec![saved.clone()]);
  assert_eq!(all::<FluidSample>(&s).await, vec![saved]);
}

#[tokio::test]
async fn unparseable_stored_amounts_contribute_nothing() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("daybook.db");

  let s = SqliteStore::open(&path).await.unwrap();
  s.save(Draft::new(at(14, 9, 0), FluidSample { amount: 250.0 }))
    .await
    .unwrap();

  // A row written by an older client that stored the raw form text.
  {
    let raw = rusqlite::Connection::open(&path).unwrap();
    raw
      .execute(
        "INSERT INTO fluid_intake (amount, taken_at) VALUES ('a glass', '2025-04-14T10:15:00')",
        [],
      )
      .unwrap();
  }

  let today = on::<FluidSample>(&s, day(14)).await;
  assert_eq!(today.len(), 2);
  assert!(today[1].payload.amount.is_nan());

  let totals = aggregate(&today, &BucketBoundaries::default());
  assert_eq!(totals, vec![250.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
}

// ─── Validation ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn invalid_drafts_are_never_persisted() {
  let s = store().await;

  let err = s
    .save(Draft::new(day(1), symptom("  ", Some("no label"))))
    .await
    .unwrap_err();
  assert!(err.is_validation());

  let err = s
    .save(Draft::new(at(1, 9, 0), FluidSample { amount: f64::NAN }))
    .await
    .unwrap_err();
  assert!(err.is_validation());

  let err = s.save(Draft::new((), Contact::new("", ""))).await.unwrap_err();
  assert!(err.is_validation());

  assert!(all::<SymptomEntry>(&s).await.is_empty());
  assert!(all::<FluidSample>(&s).await.is_empty());
  assert!(all::<Contact>(&s).await.is_empty());
}

#[tokio::test]
async fn invalid_edit_leaves_existing_record_alone() {
  let s = store().await;
  let kept = s
    .save(Draft::new(day(9), WeightEntry { weight: 70.0 }))
    .await
    .unwrap();

  let err = s
    .save(Draft::editing(kept.id, day(9), WeightEntry { weight: 0.0 }))
    .await
    .unwrap_err();
  assert!(err.is_validation());
  assert_eq!(all::<WeightEntry>(&s).await, vec![kept]);
}

// ─── Delete ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn delete_by_id_is_idempotent() {
  let s = store().await;

  let gone = s
    .save(Draft::new(day(4), WeightEntry { weight: 70.0 }))
    .await
    .unwrap();
  let kept = s
    .save(Draft::new(day(5), WeightEntry { weight: 70.2 }))
    .await
    .unwrap();

  assert!(RecordStore::<WeightEntry>::delete_by_id(&s, gone.id).await.unwrap());
  assert!(on::<WeightEntry>(&s, day(4)).await.is_empty());
  assert_eq!(all::<WeightEntry>(&s).await, vec![kept]);

  assert!(!RecordStore::<WeightEntry>::delete_by_id(&s, gone.id).await.unwrap());
}

#[tokio::test]
async fn ids_are_not_reused_after_delete() {
  let s = store().await;

  let first = s
    .save(Draft::new(at(1, 8, 0), FluidSample { amount: 100.0 }))
    .await
    .unwrap();
  RecordStore::<FluidSample>::delete_by_id(&s, first.id)
    .await
    .unwrap();
  let second = s
    .save(Draft::new(at(1, 8, 0), FluidSample { amount: 100.0 }))
    .await
    .unwrap();

  assert!(second.id > first.id);
}

// ─── Contacts ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn contacts_keep_insertion_order_and_edit_in_place() {
  let s = store().await;

  let mut gp = Contact::new("Dr. Ng", "+61 400 111 222");
  gp.kind = Some("doctor".into());
  let gp = s.save(Draft::new((), gp)).await.unwrap();

  let mut sister = Contact::new("Ana", "+61 400 333 444");
  sister.email = Some("ana@example.com".into());
  sister.icon = Some("heart".into());
  let sister = s.save(Draft::new((), sister)).await.unwrap();

  let mut edited = gp.payload.clone();
  edited.phone = "+61 400 999 000".into();
  s.save(Draft::editing(gp.id, (), edited.clone()))
    .await
    .unwrap();

  let contacts = all::<Contact>(&s).await;
  assert_eq!(contacts.len(), 2);
  assert_eq!(contacts[0].id, gp.id);
  assert_eq!(contacts[0].payload, edited);
  assert_eq!(contacts[1], sister);

  // Contacts have no date.
  assert!(on::<Contact>(&s, day(1)).await.is_empty());
}

// ─── Calendar marking ────────────────────────────────────────────────────────

#[tokio::test]
async fn dates_with_records_are_distinct_and_sorted() {
  let s = store().await;

  for (d, hour) in [(9, 8), (2, 9), (9, 18)] {
    s.save(Draft::new(at(d, hour, 0), FluidSample { amount: 100.0 }))
      .await
      .unwrap();
  }
  s.save(Draft::new(day(7), symptom("fatigue", None)))
    .await
    .unwrap();

  let fluid = RecordStore::<FluidSample>::dates_with_records(&s).await.unwrap();
  assert_eq!(fluid, vec![day(2), day(9)]);

  let symptoms = RecordStore::<SymptomEntry>::dates_with_records(&s).await.unwrap();
  assert_eq!(symptoms, vec![day(7)]);

  assert!(RecordStore::<Contact>::dates_with_records(&s).await.unwrap().is_empty());
}

// ─── Profile ─────────────────────────────────────────────────────────────────

fn profile(name: &str) -> UserProfile {
  UserProfile {
    full_name:     name.into(),
    contact:       "+61 400 000 000".into(),
    blood_type:    "O+".into(),
    email:         "me@example.com".into(),
    date_of_birth: NaiveDate::from_ymd_opt(1990, 6, 1).unwrap(),
  }
}

#[tokio::test]
async fn current_profile_is_the_latest_saved() {
  let s = store().await;
  assert!(s.current_profile().await.unwrap().is_none());

  s.save(Draft::new((), profile("Jo Citizen"))).await.unwrap();
  let latest = s.save(Draft::new((), profile("Jo Q. Citizen"))).await.unwrap();

  assert_eq!(s.current_profile().await.unwrap(), Some(latest));
}

#[tokio::test]
async fn profile_requires_every_field() {
  let s = store().await;
  let mut incomplete = profile("Jo Citizen");
  incomplete.blood_type.clear();

  assert!(incomplete.validate().is_err());
  let err = s.save(Draft::new((), incomplete)).await.unwrap_err();
  assert!(err.is_validation());
  assert!(s.current_profile().await.unwrap().is_none());
}
