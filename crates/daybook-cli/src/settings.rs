//! Layered settings: defaults, then the TOML file, then `DAYBOOK_*`
//! environment variables. Command-line flags are applied by the caller.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use daybook_core::aggregate::BucketBoundaries;
use serde::Deserialize;

const DEFAULT_STORE_PATH: &str = "~/.local/share/daybook/daybook.db";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
  /// SQLite file backing the store. A leading `~/` is expanded.
  pub store_path:  PathBuf,
  /// Hour-of-day bucket starts for the fluid chart.
  pub fluid_slots: BucketBoundaries,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      store_path:  PathBuf::from(DEFAULT_STORE_PATH),
      fluid_slots: BucketBoundaries::default(),
    }
  }
}

impl Settings {
  /// Read `file` (optional) and the process environment.
  pub fn load(file: &Path) -> anyhow::Result<Self> { Self::load_from(file, environment()) }

  fn load_from(file: &Path, env: config::Environment) -> anyhow::Result<Self> {
    let raw = config::Config::builder()
      .add_source(config::File::from(file).required(false))
      .add_source(env)
      .build()
      .with_context(|| format!("failed to read config file {}", file.display()))?;

    raw
      .try_deserialize()
      .context("failed to deserialise settings")
  }

  /// The store path with `~` expanded.
  pub fn resolved_store_path(&self) -> PathBuf { expand_tilde(&self.store_path) }
}

/// `DAYBOOK_STORE_PATH`, `DAYBOOK_FLUID_SLOTS=8,10,12`, ...
fn environment() -> config::Environment {
  config::Environment::with_prefix("DAYBOOK")
    .try_parsing(true)
    .list_separator(",")
    .with_list_parse_key("fluid_slots")
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
