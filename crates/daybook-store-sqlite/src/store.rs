//! [`SqliteStore`], the SQLite implementation of [`RecordStore`].

use std::path::Path;

use chrono::NaiveDate;
use daybook_core::{
  record::{Draft, Keying, Record, RecordId, RecordKey},
  store::RecordStore,
  tracker::UserProfile,
};
use rusqlite::{OptionalExtension as _, types::Value};
use tracing::debug;

use crate::{
  Error, Result,
  encode::{RawRow, day_range, decode_day, encode_day},
  schema::{self, MIGRATIONS},
  table::{SqlKey, Table, decode_record},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A daybook store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. Opening a
/// store runs the schema migrator before the handle is returned, so every
/// CRUD call happens against a fully migrated schema.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and bring its schema up to date.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::init(conn).await
  }

  /// Open an in-memory store, mostly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::init(conn).await
  }

  async fn init(conn: tokio_rusqlite::Connection) -> Result<Self> {
    schema::configure(&conn).await?;
    let store = Self { conn };
    store.ensure_schema().await?;
    Ok(store)
  }

  /// Apply pending migrations. Idempotent; returns how many steps ran.
  pub async fn ensure_schema(&self) -> Result<u32> {
    schema::migrate(&self.conn, MIGRATIONS).await
  }

  /// The schema version persisted in the database file.
  pub async fn schema_version(&self) -> Result<u32> {
    schema::current_version(&self.conn).await
  }

  /// The most recently saved profile, if any.
  pub async fn current_profile(&self) -> Result<Option<Record<UserProfile>>> {
    let profiles = RecordStore::<UserProfile>::list_all(self).await?;
    Ok(profiles.into_iter().next_back())
  }

  async fn select<P>(&self, filter: &'static str, params: Vec<Value>) -> Result<Vec<Record<P>>>
  where
    P: Table,
    P::Key: SqlKey,
  {
    let key_col = <P::Key as SqlKey>::COLUMN;
    let width = P::COLUMNS.len();
    let order = match key_col {
      Some(col) => format!("{col}, id"),
      None => "id".to_owned(),
    };
    let sql = format!(
      "SELECT {} FROM {} {filter} ORDER BY {order}",
      select_list::<P>(),
      P::NAME,
    );

    let raws: Vec<RawRow> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params.iter()), |row| {
            RawRow::read(row, key_col.is_some(), width)
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(decode_record::<P>).collect()
  }
}

/// `id[, key], col1, col2, ...`: the column order [`RawRow::read`] expects.
fn select_list<P>() -> String
where
  P: Table,
  P::Key: SqlKey,
{
  let mut cols = vec!["id"];
  cols.extend(<P::Key as SqlKey>::COLUMN);
  cols.extend_from_slice(P::COLUMNS);
  cols.join(", ")
}

// ─── Save ────────────────────────────────────────────────────────────────────

enum SaveOutcome {
  Inserted(i64),
  Updated(i64),
  Missing(i64),
}

/// `UPDATE <table> SET col = ?1, ... [, key = ?n] WHERE id = ?last`, with
/// `set_key` deciding whether the occurrence column is rewritten.
fn update_sql<P>(set_key: bool) -> String
where
  P: Table,
  P::Key: SqlKey,
{
  let mut cols: Vec<&str> = P::COLUMNS.to_vec();
  if set_key {
    cols.extend(<P::Key as SqlKey>::COLUMN);
  }
  let assignments: Vec<String> = cols
    .iter()
    .enumerate()
    .map(|(i, col)| format!("{col} = ?{}", i + 1))
    .collect();
  format!(
    "UPDATE {} SET {} WHERE id = ?{}",
    P::NAME,
    assignments.join(", "),
    cols.len() + 1,
  )
}

fn insert_sql<P>() -> String
where
  P: Table,
  P::Key: SqlKey,
{
  let mut cols: Vec<&str> = P::COLUMNS.to_vec();
  cols.extend(<P::Key as SqlKey>::COLUMN);
  let placeholders: Vec<String> = (1..=cols.len()).map(|i| format!("?{i}")).collect();
  format!(
    "INSERT INTO {} ({}) VALUES ({})",
    P::NAME,
    cols.join(", "),
    placeholders.join(", "),
  )
}

// ─── RecordStore impl ────────────────────────────────────────────────────────

impl<P> RecordStore<P> for SqliteStore
where
  P: Table,
  P::Key: SqlKey,
{
  type Error = Error;

  async fn list_all(&self) -> Result<Vec<Record<P>>> { self.select::<P>("", Vec::new()).await }

  async fn find_by_date(&self, date: NaiveDate) -> Result<Vec<Record<P>>> {
    match <P::Key as RecordKey>::KEYING {
      Keying::Day => {
        self
          .select::<P>("WHERE day = ?1", vec![Value::Text(encode_day(date))])
          .await
      }
      Keying::Sample => {
        let (start, end) = day_range(date);
        self
          .select::<P>(
            "WHERE taken_at >= ?1 AND taken_at < ?2",
            vec![Value::Text(start), Value::Text(end)],
          )
          .await
      }
      Keying::Unkeyed => Ok(Vec::new()),
    }
  }

  async fn save(&self, mut draft: Draft<P>) -> Result<Record<P>> {
    draft.validate()?;

    let keying = <P::Key as RecordKey>::KEYING;
    let key = SqlKey::encode(&draft.occurred_at);
    // Commit the key as it will read back (timestamps keep whole seconds).
    draft.occurred_at = <P::Key as SqlKey>::decode(key.as_deref())?;
    let edit_id = draft.id.map(|id| id.0);

    let mut values = draft.payload.encode();
    let payload_only = values.clone();
    values.extend(key.clone().map(Value::Text));

    let update_with_key = update_sql::<P>(true);
    let update_payload = update_sql::<P>(false);
    let insert = insert_sql::<P>();
    let find_day = format!("SELECT id FROM {} WHERE day = ?1", P::NAME);

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let outcome = match (edit_id, keying, key) {
          // Editing: overwrite payload and occurrence of that row.
          (Some(id), ..) => {
            let mut params = values;
            params.push(Value::Integer(id));
            let changed =
              tx.execute(&update_with_key, rusqlite::params_from_iter(params.iter()))?;
            if changed == 0 { SaveOutcome::Missing(id) } else { SaveOutcome::Updated(id) }
          }
          // Day-keyed: the record already on that date keeps its id.
          (None, Keying::Day, Some(day)) => {
            let existing: Option<i64> = tx
              .query_row(&find_day, rusqlite::params![day], |row| row.get(0))
              .optional()?;
            match existing {
              Some(id) => {
                let mut params = payload_only;
                params.push(Value::Integer(id));
                tx.execute(&update_payload, rusqlite::params_from_iter(params.iter()))?;
                SaveOutcome::Updated(id)
              }
              None => {
                tx.execute(&insert, rusqlite::params_from_iter(values.iter()))?;
                SaveOutcome::Inserted(tx.last_insert_rowid())
              }
            }
          }
          _ => {
            tx.execute(&insert, rusqlite::params_from_iter(values.iter()))?;
            SaveOutcome::Inserted(tx.last_insert_rowid())
          }
        };

        tx.commit()?;
        Ok(outcome)
      })
      .await?;

    let id = match outcome {
      SaveOutcome::Inserted(id) => {
        debug!(entity = P::ENTITY, id, "record inserted");
        id
      }
      SaveOutcome::Updated(id) => {
        debug!(entity = P::ENTITY, id, "record updated");
        id
      }
      SaveOutcome::Missing(id) => {
        return Err(Error::RecordNotFound { entity: P::ENTITY, id: RecordId(id) });
      }
    };

    Ok(draft.commit(RecordId(id)))
  }

  async fn delete_by_id(&self, id: RecordId) -> Result<bool> {
    let sql = format!("DELETE FROM {} WHERE id = ?1", P::NAME);
    let removed = self
      .conn
      .call(move |conn| Ok(conn.execute(&sql, rusqlite::params![id.0])?))
      .await?;

    debug!(entity = P::ENTITY, %id, removed, "delete by id");
    Ok(removed > 0)
  }

  async fn dates_with_records(&self) -> Result<Vec<NaiveDate>> {
    let sql = match <P::Key as SqlKey>::COLUMN {
      Some("day") => format!("SELECT DISTINCT day FROM {} ORDER BY day", P::NAME),
      Some(col) => format!(
        "SELECT DISTINCT substr({col}, 1, 10) AS d FROM {} ORDER BY d",
        P::NAME
      ),
      None => return Ok(Vec::new()),
    };

    let raws: Vec<String> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map([], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(rows)
      })
      .await?;

    raws.iter().map(|s| decode_day(s)).collect()
  }
}
