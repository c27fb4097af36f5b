//! `pitlane cache` subcommands.

use std::fmt;
use std::path::PathBuf;

use pitlane_core::cache::race_directory;
use pitlane_core::{Error, KeyParams, KeyValue, TableStore};
use serde::Serialize;

use crate::args::{CacheCmd, EntryArgs};

/// Result of a cache subcommand.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum CacheOutput {
    Path { path: PathBuf },
    Exists { path: PathBuf, exists: bool },
    Clear { path: PathBuf, removed: bool },
    ClearRace { dir: PathBuf, removed: bool },
}

impl fmt::Display for CacheOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheOutput::Path { path } => write!(f, "{}", path.display()),
            CacheOutput::Exists { path, exists } => {
                write!(f, "{} {}", if *exists { "present" } else { "absent" }, path.display())
            }
            CacheOutput::Clear { path, removed } => {
                write!(f, "{} {}", if *removed { "removed" } else { "not cached" }, path.display())
            }
            CacheOutput::ClearRace { dir, removed } => {
                write!(f, "{} {}", if *removed { "cleared" } else { "nothing cached in" }, dir.display())
            }
        }
    }
}

fn params(entry: &EntryArgs) -> KeyParams {
    entry.params.iter().map(|(name, value)| (name.as_str(), value.as_str())).collect()
}

/// Run a cache subcommand against `store`, using its default format.
pub fn run(store: &TableStore, cmd: CacheCmd) -> Result<CacheOutput, Error> {
    match cmd {
        CacheCmd::Path(entry) => Ok(CacheOutput::Path { path: store.path_for(&entry.key, None, &params(&entry))? }),
        CacheCmd::Exists(entry) => {
            let params = params(&entry);
            let path = store.path_for(&entry.key, None, &params)?;
            let exists = store.exists(&entry.key, None, &params)?;
            Ok(CacheOutput::Exists { path, exists })
        }
        CacheCmd::Clear(entry) => {
            let params = params(&entry);
            let path = store.path_for(&entry.key, None, &params)?;
            let removed = store.clear(&entry.key, None, &params)?;
            Ok(CacheOutput::Clear { path, removed })
        }
        CacheCmd::ClearRace { year, series_id, race_id } => {
            let (year, series_id, race_id) = (KeyValue::from(year), KeyValue::from(series_id), KeyValue::from(race_id));
            let dir = race_directory(store.root(), Some(&year), Some(&series_id), Some(&race_id))?;
            let removed = store.clear_race(year, series_id, race_id)?;
            Ok(CacheOutput::ClearRace { dir, removed })
        }
    }
}
