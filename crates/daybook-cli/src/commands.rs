//! Subcommands and their handlers.

use std::{
  io::{self, BufRead, Write},
  path::PathBuf,
  str::FromStr,
};

use anyhow::{Context as _, Result, bail};
use chrono::{Local, NaiveDate, NaiveDateTime, Timelike};
use clap::{Args, Subcommand};
use daybook_core::{
  aggregate::{DayBuckets, monthly_series},
  record::{Draft, Record, RecordId},
  report::{JsonFormatter, ReportData, ReportFormatter, SortOrder},
  store::RecordStore,
  tracker::{
    Contact, FluidSample, SymptomEntry, TrackedRecord, TrackerKind, UserProfile, WeightEntry,
  },
};
use daybook_store_sqlite::{
  SqliteStore,
  table::{SqlKey, Table},
};
use serde::Serialize;
use tracing::info;

use crate::settings::Settings;

/// What every handler runs against.
pub struct Session {
  pub store:    SqliteStore,
  pub settings: Settings,
  /// Print listings as JSON instead of text.
  pub json:     bool,
}

// ─── Command tree ────────────────────────────────────────────────────────────

#[derive(Subcommand, Debug)]
pub enum Command {
  /// Open the store, apply pending migrations and print the schema version.
  Migrate,
  /// Care contacts.
  #[command(subcommand)]
  Contact(ContactCommand),
  /// Fluid intake samples.
  #[command(subcommand)]
  Fluid(FluidCommand),
  /// Daily weight.
  #[command(subcommand)]
  Weight(WeightCommand),
  /// Daily symptom notes.
  #[command(subcommand)]
  Symptom(SymptomCommand),
  /// The account holder's details.
  #[command(subcommand)]
  Profile(ProfileCommand),
  /// Write a JSON report.
  Report(ReportArgs),
  /// List the dates that have records for a tracker.
  Marked {
    tracker: TrackerKind,
  },
}

#[derive(Subcommand, Debug)]
pub enum ContactCommand {
  Add {
    name:  String,
    phone: String,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    kind:  Option<String>,
    #[arg(long)]
    icon:  Option<String>,
  },
  /// Change fields of an existing contact. Omitted fields are kept; an empty
  /// `--email`, `--kind` or `--icon` clears that field.
  Edit {
    id:    i64,
    #[arg(long)]
    name:  Option<String>,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    kind:  Option<String>,
    #[arg(long)]
    icon:  Option<String>,
  },
  List,
  Delete(DeleteArgs),
}

#[derive(Subcommand, Debug)]
pub enum FluidCommand {
  /// Log one drink.
  Add {
    /// When it was taken (`YYYY-MM-DDTHH:MM[:SS]`); defaults to now.
    #[arg(long, value_parser = parse_stamp)]
    at:     Option<NaiveDateTime>,
    /// Millilitres.
    #[arg(long)]
    amount: f64,
  },
  /// Show one day's intake per hour bucket.
  Day { date: NaiveDate },
  List,
  Delete(DeleteArgs),
}

#[derive(Subcommand, Debug)]
pub enum WeightCommand {
  /// Record the weight for a day, replacing any earlier value on that day.
  Set {
    /// Defaults to today.
    #[arg(long)]
    date: Option<NaiveDate>,
    #[arg(long)]
    kg:   f64,
    /// Edit this record instead, possibly moving it to `--date`.
    #[arg(long)]
    id:   Option<i64>,
  },
  Day { date: NaiveDate },
  /// One point per recorded day of `YYYY-MM`.
  Month { month: YearMonth },
  List,
  Delete(DeleteArgs),
}

#[derive(Subcommand, Debug)]
pub enum SymptomCommand {
  /// Record the symptom for a day, replacing any earlier note on that day.
  Set {
    #[arg(long)]
    date:        Option<NaiveDate>,
    #[arg(long)]
    symptom:     String,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    id:          Option<i64>,
  },
  Day { date: NaiveDate },
  List,
  Delete(DeleteArgs),
}

#[derive(Subcommand, Debug)]
pub enum ProfileCommand {
  Set {
    #[arg(long)]
    full_name:     String,
    #[arg(long)]
    contact:       String,
    #[arg(long)]
    blood_type:    String,
    #[arg(long)]
    email:         String,
    #[arg(long)]
    date_of_birth: NaiveDate,
  },
  Show,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
  id:  i64,
  /// Skip the confirmation prompt.
  #[arg(short, long)]
  yes: bool,
}

#[derive(Args, Debug)]
pub struct ReportArgs {
  /// Write here instead of stdout.
  #[arg(short, long, global = true)]
  output: Option<PathBuf>,
  #[command(subcommand)]
  kind:   ReportKind,
}

#[derive(Subcommand, Debug)]
pub enum ReportKind {
  Weight {
    #[arg(long)]
    newest_first: bool,
  },
  Symptom {
    #[arg(long)]
    newest_first: bool,
  },
  Contacts {
    #[arg(long)]
    newest_first: bool,
  },
  /// Hour buckets for one day.
  Fluid { date: NaiveDate },
}

// ─── Argument types ──────────────────────────────────────────────────────────

/// A calendar month written `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearMonth {
  pub year:  i32,
  pub month: u32,
}

impl FromStr for YearMonth {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let (year, month) = s
      .split_once('-')
      .ok_or_else(|| format!("expected YYYY-MM, got {s:?}"))?;
    let year = year.parse().map_err(|_| format!("bad year in {s:?}"))?;
    let month = month.parse().map_err(|_| format!("bad month in {s:?}"))?;
    Ok(Self { year, month })
  }
}

const STAMP_FORMATS: &[&str] =
  &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];

fn parse_stamp(s: &str) -> Result<NaiveDateTime, String> {
  STAMP_FORMATS
    .iter()
    .find_map(|f| NaiveDateTime::parse_from_str(s.trim(), f).ok())
    .ok_or_else(|| format!("expected YYYY-MM-DDTHH:MM[:SS], got {s:?}"))
}

fn today() -> NaiveDate { Local::now().date_naive() }

fn now() -> NaiveDateTime {
  let now = Local::now().naive_local();
  now.with_nanosecond(0).unwrap_or(now)
}

// ─── Dispatch ────────────────────────────────────────────────────────────────

impl Command {
  pub async fn run(self, session: &Session) -> Result<()> {
    match self {
      Self::Migrate => {
        let version = session.store.schema_version().await?;
        println!("schema version {version}");
        Ok(())
      }
      Self::Contact(cmd) => cmd.run(session).await,
      Self::Fluid(cmd) => cmd.run(session).await,
      Self::Weight(cmd) => cmd.run(session).await,
      Self::Symptom(cmd) => cmd.run(session).await,
      Self::Profile(cmd) => cmd.run(session).await,
      Self::Report(args) => args.run(session).await,
      Self::Marked { tracker } => {
        let store = &session.store;
        let dates = match tracker {
          TrackerKind::Contact => marked::<Contact>(store).await?,
          TrackerKind::Fluid => marked::<FluidSample>(store).await?,
          TrackerKind::Weight => marked::<WeightEntry>(store).await?,
          TrackerKind::Symptom => marked::<SymptomEntry>(store).await?,
        };
        if session.json {
          println!("{}", serde_json::to_string_pretty(&dates)?);
        } else {
          dates.iter().for_each(|d| println!("{d}"));
        }
        Ok(())
      }
    }
  }
}

impl ContactCommand {
  async fn run(self, session: &Session) -> Result<()> {
    let store = &session.store;
    match self {
      Self::Add { name, phone, email, kind, icon } => {
        let contact = Contact { name, phone, email, kind, icon };
        let saved = save(store, Draft::new((), contact)).await?;
        print_one(saved, session.json)
      }
      Self::Edit { id, name, phone, email, kind, icon } => {
        let id = RecordId(id);
        let Some(mut record) = all::<Contact>(store)
          .await?
          .into_iter()
          .find(|r| r.id == id)
        else {
          bail!("no contact with id {id}");
        };
        let c = &mut record.payload;
        if let Some(name) = name {
          c.name = name;
        }
        if let Some(phone) = phone {
          c.phone = phone;
        }
        patch_optional(&mut c.email, email);
        patch_optional(&mut c.kind, kind);
        patch_optional(&mut c.icon, icon);

        let saved = save(store, Draft::from(record)).await?;
        print_one(saved, session.json)
      }
      Self::List => print_all(all::<Contact>(store).await?, session.json),
      Self::Delete(args) => delete::<Contact>(store, args).await,
    }
  }
}

impl FluidCommand {
  async fn run(self, session: &Session) -> Result<()> {
    let store = &session.store;
    match self {
      Self::Add { at, amount } => {
        let at = at.unwrap_or_else(now);
        let saved = save(store, Draft::new(at, FluidSample { amount })).await?;
        print_one(saved, session.json)
      }
      Self::Day { date } => {
        let samples = on_day::<FluidSample>(store, date).await?;
        let day = DayBuckets::for_day(date, &samples, &session.settings.fluid_slots);
        if session.json {
          println!("{}", serde_json::to_string_pretty(&day)?);
        } else {
          print!("{}", describe_buckets(&day));
        }
        Ok(())
      }
      Self::List => print_all(all::<FluidSample>(store).await?, session.json),
      Self::Delete(args) => delete::<FluidSample>(store, args).await,
    }
  }
}

impl WeightCommand {
  async fn run(self, session: &Session) -> Result<()> {
    let store = &session.store;
    match self {
      Self::Set { date, kg, id } => {
        let date = date.unwrap_or_else(today);
        let entry = WeightEntry { weight: kg };
        let draft = match id {
          Some(id) => Draft::editing(RecordId(id), date, entry),
          None => Draft::new(date, entry),
        };
        print_one(save(store, draft).await?, session.json)
      }
      Self::Day { date } => print_all(on_day::<WeightEntry>(store, date).await?, session.json),
      Self::Month { month } => {
        let records = all::<WeightEntry>(store).await?;
        let points = monthly_series(&records, month.year, month.month)?;
        if session.json {
          println!("{}", serde_json::to_string_pretty(&points)?);
        } else {
          for p in &points {
            println!("{:>2}  {} kg", p.day, p.value);
          }
        }
        Ok(())
      }
      Self::List => print_all(all::<WeightEntry>(store).await?, session.json),
      Self::Delete(args) => delete::<WeightEntry>(store, args).await,
    }
  }
}

impl SymptomCommand {
  async fn run(self, session: &Session) -> Result<()> {
    let store = &session.store;
    match self {
      Self::Set { date, symptom, description, id } => {
        let date = date.unwrap_or_else(today);
        let entry = SymptomEntry { symptom, description };
        let draft = match id {
          Some(id) => Draft::editing(RecordId(id), date, entry),
          None => Draft::new(date, entry),
        };
        print_one(save(store, draft).await?, session.json)
      }
      Self::Day { date } => print_all(on_day::<SymptomEntry>(store, date).await?, session.json),
      Self::List => print_all(all::<SymptomEntry>(store).await?, session.json),
      Self::Delete(args) => delete::<SymptomEntry>(store, args).await,
    }
  }
}

impl ProfileCommand {
  async fn run(self, session: &Session) -> Result<()> {
    let store = &session.store;
    let profile = match self {
      Self::Set { full_name, contact, blood_type, email, date_of_birth } => {
        let profile = UserProfile { full_name, contact, blood_type, email, date_of_birth };
        Some(save(store, Draft::new((), profile)).await?)
      }
      Self::Show => store.current_profile().await?,
    };

    match profile {
      Some(p) if session.json => println!("{}", serde_json::to_string_pretty(&p)?),
      Some(p) => {
        let p = p.payload;
        println!("{}", p.full_name);
        println!("  contact:       {}", p.contact);
        println!("  email:         {}", p.email);
        println!("  blood type:    {}", p.blood_type);
        println!("  date of birth: {}", p.date_of_birth);
      }
      None => println!("no profile saved"),
    }
    Ok(())
  }
}

impl ReportArgs {
  async fn run(self, session: &Session) -> Result<()> {
    let store = &session.store;
    let order = |newest_first: bool| {
      if newest_first { SortOrder::Descending } else { SortOrder::Ascending }
    };

    let (title, data) = match self.kind {
      ReportKind::Weight { newest_first } => {
        let records = all::<WeightEntry>(store).await?;
        let data = ReportData::records(records.into_iter().map(Into::into), order(newest_first));
        ("Weight log".to_owned(), data)
      }
      ReportKind::Symptom { newest_first } => {
        let records = all::<SymptomEntry>(store).await?;
        let data = ReportData::records(records.into_iter().map(Into::into), order(newest_first));
        ("Symptom log".to_owned(), data)
      }
      ReportKind::Contacts { newest_first } => {
        let records = all::<Contact>(store).await?;
        let data = ReportData::records(records.into_iter().map(Into::into), order(newest_first));
        ("Contacts".to_owned(), data)
      }
      ReportKind::Fluid { date } => {
        let samples = on_day::<FluidSample>(store, date).await?;
        let day = DayBuckets::for_day(date, &samples, &session.settings.fluid_slots);
        (format!("Fluid intake {date}"), ReportData::Buckets(day))
      }
    };

    let formatter = JsonFormatter { generated_on: Some(today()) };
    let mut bytes = formatter.format(&title, &data)?;
    bytes.push(b'\n');

    match &self.output {
      Some(path) => {
        std::fs::write(path, &bytes)
          .with_context(|| format!("failed to write report to {}", path.display()))?;
        info!(path = %path.display(), empty = data.is_empty(), "report written");
      }
      None => io::stdout().write_all(&bytes)?,
    }
    Ok(())
  }
}

/// `None` keeps the current value; a blank update clears it.
fn patch_optional(field: &mut Option<String>, update: Option<String>) {
  if let Some(value) = update {
    *field = (!value.trim().is_empty()).then_some(value);
  }
}

// ─── Store helpers ───────────────────────────────────────────────────────────

async fn all<P>(store: &SqliteStore) -> Result<Vec<Record<P>>>
where
  P: Table,
  P::Key: SqlKey,
{
  RecordStore::<P>::list_all(store)
    .await
    .with_context(|| format!("failed to list {} records", P::ENTITY))
}

async fn on_day<P>(store: &SqliteStore, date: NaiveDate) -> Result<Vec<Record<P>>>
where
  P: Table,
  P::Key: SqlKey,
{
  RecordStore::<P>::find_by_date(store, date)
    .await
    .with_context(|| format!("failed to read {} records for {date}", P::ENTITY))
}

async fn save<P>(store: &SqliteStore, draft: Draft<P>) -> Result<Record<P>>
where
  P: Table,
  P::Key: SqlKey,
{
  let record = RecordStore::<P>::save(store, draft)
    .await
    .with_context(|| format!("failed to save {}", P::ENTITY))?;
  info!(entity = P::ENTITY, id = %record.id, "saved");
  Ok(record)
}

async fn marked<P>(store: &SqliteStore) -> Result<Vec<NaiveDate>>
where
  P: Table,
  P::Key: SqlKey,
{
  RecordStore::<P>::dates_with_records(store)
    .await
    .with_context(|| format!("failed to read {} dates", P::ENTITY))
}

async fn delete<P>(store: &SqliteStore, args: DeleteArgs) -> Result<()>
where
  P: Table,
  P::Key: SqlKey,
{
  let id = RecordId(args.id);
  if !confirm(&format!("Delete {} {id}?", P::ENTITY), args.yes)? {
    println!("cancelled");
    return Ok(());
  }

  let removed = RecordStore::<P>::delete_by_id(store, id)
    .await
    .with_context(|| format!("failed to delete {} {id}", P::ENTITY))?;
  if removed {
    println!("deleted {} {id}", P::ENTITY);
  } else {
    println!("no {} with id {id}", P::ENTITY);
  }
  Ok(())
}

/// Ask on stderr, read the answer from stdin. `--yes` skips the question.
fn confirm(prompt: &str, yes: bool) -> Result<bool> {
  if yes {
    return Ok(true);
  }
  eprint!("{prompt} [y/N] ");
  io::stderr().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(is_yes(&line))
}

fn is_yes(answer: &str) -> bool {
  matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

// ─── Output ──────────────────────────────────────────────────────────────────

fn print_one<P>(record: Record<P>, json: bool) -> Result<()>
where
  P: Table + Serialize,
  Record<P>: Into<TrackedRecord>,
{
  print_all(vec![record], json)
}

fn print_all<P>(records: Vec<Record<P>>, json: bool) -> Result<()>
where
  P: Table + Serialize,
  Record<P>: Into<TrackedRecord>,
{
  if json {
    println!("{}", serde_json::to_string_pretty(&records)?);
    return Ok(());
  }
  for record in records {
    println!("{}", describe(&record.into()));
  }
  Ok(())
}

fn describe(record: &TrackedRecord) -> String {
  match record {
    TrackedRecord::Contact(r) => {
      let c = &r.payload;
      let mut line = format!("#{}  {}  {}", r.id, c.name, c.phone);
      if let Some(email) = &c.email {
        line.push_str(&format!("  {email}"));
      }
      if let Some(kind) = &c.kind {
        line.push_str(&format!("  ({kind})"));
      }
      line
    }
    TrackedRecord::Fluid(r) => {
      format!("#{}  {}  {} ml", r.id, r.occurred_at.format("%Y-%m-%d %H:%M"), r.payload.amount)
    }
    TrackedRecord::Weight(r) => format!("#{}  {}  {} kg", r.id, r.occurred_at, r.payload.weight),
    TrackedRecord::Symptom(r) => match &r.payload.description {
      Some(d) => format!("#{}  {}  {}: {d}", r.id, r.occurred_at, r.payload.symptom),
      None => format!("#{}  {}  {}", r.id, r.occurred_at, r.payload.symptom),
    },
  }
}

fn describe_buckets(day: &DayBuckets) -> String {
  if !day.has_data() {
    return format!("no fluid logged on {}\n", day.date);
  }
  let mut out = String::new();
  for b in &day.buckets {
    out.push_str(&format!("{:02}:00-{:02}:00  {} ml\n", b.start_hour, b.end_hour, b.total));
  }
  out.push_str(&format!("total        {} ml ({} samples)\n", day.day_total(), day.samples));
  out
}
