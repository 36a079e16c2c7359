//! `daybook`: command-line front end for the health journal.
//!
//! # Usage
//!
//! ```
//! daybook fluid add --amount 250
//! daybook fluid day 2025-04-14
//! daybook weight set --kg 71.4
//! daybook --config ~/.config/daybook/daybook.toml report weight --newest-first
//! ```
//!
//! Settings come from the TOML file, then `DAYBOOK_*` environment variables
//! (`DAYBOOK_STORE_PATH`, `DAYBOOK_FLUID_SLOTS=8,10,12`), then flags.

mod commands;
mod settings;

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use commands::{Command, Session};
use daybook_store_sqlite::SqliteStore;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::settings::Settings;

#[derive(Parser, Debug)]
#[command(name = "daybook", author, version, about = "Personal health journal")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "daybook.toml")]
  config: PathBuf,

  /// SQLite file to use, overriding the configured `store_path`.
  #[arg(long, value_name = "PATH")]
  store: Option<PathBuf>,

  /// Print listings as JSON.
  #[arg(long, global = true)]
  json: bool,

  #[command(subcommand)]
  command: Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Logs go to stderr; stdout carries command output.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();

  let mut settings = Settings::load(&cli.config)?;
  if let Some(store) = cli.store {
    settings.store_path = store;
  }

  let store_path = settings.resolved_store_path();
  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {}", parent.display()))?;
  }

  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  tracing::debug!(path = %store_path.display(), "store open");

  let session = Session { store, settings, json: cli.json };
  cli.command.run(&session).await
}
