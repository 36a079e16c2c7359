//! Versioned schema for the daybook SQLite store.
//!
//! The applied version lives in `PRAGMA user_version`. Each [`Migration`]
//! runs in its own transaction together with the version bump, so a step is
//! either fully applied or not at all.

use tracing::{debug, info};

use crate::{Error, Result};

/// One schema step.
#[derive(Debug, Clone, Copy)]
pub struct Migration {
  pub version:     u32,
  pub description: &'static str,
  pub up:          &'static str,
}

/// Every migration, ascending by version.
pub const MIGRATIONS: &[Migration] = &[
  Migration {
    version:     1,
    description: "tracker tables",
    up:          V1_TRACKERS,
  },
  Migration {
    version:     2,
    description: "contact details and user profile",
    up:          V2_CONTACT_DETAILS_AND_PROFILE,
  },
];

/// The version a fully migrated store reports.
pub const SCHEMA_VERSION: u32 = MIGRATIONS[MIGRATIONS.len() - 1].version;

const V1_TRACKERS: &str = "
CREATE TABLE IF NOT EXISTS contacts (
    id    INTEGER PRIMARY KEY AUTOINCREMENT,
    name  TEXT NOT NULL,
    phone TEXT NOT NULL
);

-- Sample-based: many rows per day, local timestamps.
CREATE TABLE IF NOT EXISTS fluid_intake (
    id       INTEGER PRIMARY KEY AUTOINCREMENT,
    amount   REAL NOT NULL,   -- millilitres
    taken_at TEXT NOT NULL    -- YYYY-MM-DDTHH:MM:SS
);

CREATE INDEX IF NOT EXISTS fluid_intake_taken_idx ON fluid_intake(taken_at);

-- Day-keyed: at most one row per date.
CREATE TABLE IF NOT EXISTS weight_log (
    id     INTEGER PRIMARY KEY AUTOINCREMENT,
    weight REAL NOT NULL,     -- kilograms
    day    TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS symptom_log (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    day         TEXT NOT NULL UNIQUE,
    symptom     TEXT NOT NULL,
    description TEXT
);
";

const V2_CONTACT_DETAILS_AND_PROFILE: &str = "
ALTER TABLE contacts ADD COLUMN email TEXT;
ALTER TABLE contacts ADD COLUMN kind  TEXT;
ALTER TABLE contacts ADD COLUMN icon  TEXT;

CREATE TABLE IF NOT EXISTS user_profile (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    full_name     TEXT NOT NULL,
    contact       TEXT NOT NULL,
    blood_type    TEXT NOT NULL,
    email         TEXT NOT NULL,
    date_of_birth TEXT NOT NULL
);
";

/// Connection-level settings; cannot run inside a transaction.
pub(crate) async fn configure(conn: &tokio_rusqlite::Connection) -> Result<()> {
  let mode = conn
    .call(|conn| {
      let mode: String =
        conn.pragma_update_and_check(None, "journal_mode", "wal", |row| row.get(0))?;
      Ok(mode)
    })
    .await?;
  debug!(journal_mode = %mode, "connection configured");
  Ok(())
}

pub(crate) async fn current_version(conn: &tokio_rusqlite::Connection) -> Result<u32> {
  let version = conn
    .call(|conn| Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?))
    .await?;
  Ok(version)
}

/// Apply every step of `migrations` newer than the stored version. Returns
/// how many steps ran; zero when the store is already current.
pub(crate) async fn migrate(
  conn: &tokio_rusqlite::Connection,
  migrations: &'static [Migration],
) -> Result<u32> {
  let current = current_version(conn).await?;
  let target = migrations.last().map_or(0, |m| m.version);

  if current >= target {
    debug!(current, target, "schema up to date");
    return Ok(0);
  }

  let mut applied = 0;
  for step in migrations.iter().filter(|m| m.version > current) {
    info!(version = step.version, description = step.description, "applying migration");

    conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute_batch(step.up)?;
        tx.pragma_update(None, "user_version", step.version)?;
        tx.commit()?;
        Ok(())
      })
      .await
      .map_err(|source| Error::Migration {
        version: step.version,
        description: step.description,
        source,
      })?;

    applied += 1;
  }

  info!(from = current, to = target, applied, "schema migrated");
  Ok(applied)
}
