//! File-backed table store.
//!
//! One interface over both layouts: the parameters passed with a key decide
//! whether the entry lives flat under the root or inside a race directory
//! (see [`Layout::select`](super::layout::Layout::select)).
//!
//! Every call is synchronous and single-attempt. Nothing coordinates
//! concurrent writers; the last rename wins.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::codec::{read_table, write_table};
use super::format::{TableFormat, resolve_format};
use super::key::{KeyParams, KeyValue};
use super::layout::{Layout, ensure_race_directory, entry_path, race_directory};
use crate::config::CacheConfig;
use crate::{Error, Table};

/// Levels above a race directory pruned by [`TableStore::clear_race`] (series, year).
const PRUNE_PARENT_LEVELS: usize = 2;

/// Persistent table cache rooted at `CacheConfig::cache_dir`.
#[derive(Debug, Clone)]
pub struct TableStore {
    config: CacheConfig,
}

impl TableStore {
    pub fn new(config: CacheConfig) -> Self {
        Self { config }
    }

    /// Same store with different settings; later calls see the new values.
    pub fn with_config(&self, config: CacheConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn root(&self) -> &Path {
        &self.config.cache_dir
    }

    fn resolve(&self, format: Option<&str>) -> Result<Option<TableFormat>, Error> {
        resolve_format(format, &self.config.default_format)
    }

    fn require_format(&self, format: Option<&str>) -> Result<TableFormat, Error> {
        self.resolve(format)?
            .ok_or_else(|| Error::UnsupportedFormat(format.unwrap_or(&self.config.default_format).to_string()))
    }

    /// Path backing `key` for the given format and parameters. Pure.
    pub fn path_for(&self, key: &str, format: Option<&str>, params: &KeyParams) -> Result<PathBuf, Error> {
        let format = self.require_format(format)?;
        entry_path(self.root(), key, params, format)
    }

    /// Write `table` under `key`, overwriting any previous entry.
    ///
    /// With caching switched off nothing is written, but the returned path is
    /// still the one a write would have used.
    ///
    /// # Errors
    ///
    /// - `UnsupportedFormat` for a format other than csv/parquet
    /// - `MissingSegment` / `InvalidInput` for an incomplete or unusable race key
    /// - `MissingCodec` when parquet is requested without the codec; no file is created
    /// - `Codec` / `Io` when encoding or writing fails
    pub fn save(&self, key: &str, table: &Table, format: Option<&str>, params: &KeyParams) -> Result<PathBuf, Error> {
        let format = self.require_format(format)?;
        let path = entry_path(self.root(), key, params, format)?;

        if !self.config.is_active() {
            tracing::debug!(path = %path.display(), "table cache disabled; skipping write");
            return Ok(path);
        }

        format.require_codec()?;
        if Layout::select(params) == Layout::Race {
            ensure_race_directory(self.root(), params.get("year"), params.get("series_id"), params.get("race_id"))?;
        }

        write_table(&path, table, format)?;
        tracing::debug!(path = %path.display(), rows = table.num_rows(), "saved table to cache");

        Ok(path)
    }

    /// Read the table stored under `key`.
    ///
    /// Returns `Ok(None)` when caching is off, when no format resolves, or
    /// when no entry exists. Never creates directories.
    pub fn load(&self, key: &str, format: Option<&str>, params: &KeyParams) -> Result<Option<Table>, Error> {
        if !self.config.is_active() {
            return Ok(None);
        }

        let Some(format) = self.resolve(format)? else {
            return Ok(None);
        };

        let path = entry_path(self.root(), key, params, format)?;
        if !path.is_file() {
            tracing::debug!(path = %path.display(), "table cache miss");
            return Ok(None);
        }

        let table = read_table(&path, format)?;
        tracing::debug!(path = %path.display(), rows = table.num_rows(), "loaded table from cache");

        Ok(Some(table))
    }

    /// Whether an entry exists on disk, regardless of the enabled switches.
    pub fn exists(&self, key: &str, format: Option<&str>, params: &KeyParams) -> Result<bool, Error> {
        Ok(self.path_for(key, format, params)?.is_file())
    }

    /// Delete one entry. Returns whether a file was removed.
    ///
    /// An absent entry is not an error. A failed delete is logged and
    /// reported as `false`.
    pub fn clear(&self, key: &str, format: Option<&str>, params: &KeyParams) -> Result<bool, Error> {
        let path = self.path_for(key, format, params)?;
        Ok(remove_file_best_effort(&path))
    }

    /// Delete every table of one race, then prune emptied directories.
    ///
    /// Removes each file directly inside `<root>/<year>/<series>/<race>`,
    /// then tries to remove the race, series and year directories in turn,
    /// stopping at the first one that is non-empty or missing. Returns
    /// whether any file was removed.
    ///
    /// # Errors
    ///
    /// `MissingSegment` for an absent segment and `InvalidInput` for one
    /// that would not name a directory under the root. Filesystem failures
    /// here are swallowed.
    pub fn clear_race(
        &self, year: impl Into<KeyValue>, series_id: impl Into<KeyValue>, race_id: impl Into<KeyValue>,
    ) -> Result<bool, Error> {
        let (year, series_id, race_id) = (year.into(), series_id.into(), race_id.into());
        let dir = race_directory(self.root(), Some(&year), Some(&series_id), Some(&race_id))?;

        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!(dir = %dir.display(), error = %e, "race directory not readable; nothing to clear");
                return Ok(false);
            }
        };

        let mut removed_any = false;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_file() {
                removed_any |= remove_file_best_effort(&path);
            }
        }

        prune_empty_ancestors(&dir, PRUNE_PARENT_LEVELS);

        if removed_any {
            tracing::debug!(dir = %dir.display(), "cleared race tables");
        }
        Ok(removed_any)
    }
}

/// Remove a file, reporting whether it was there to remove.
fn remove_file_best_effort(path: &Path) -> bool {
    match fs::remove_file(path) {
        Ok(()) => true,
        Err(e) if e.kind() == io::ErrorKind::NotFound => false,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "failed to remove cached table");
            false
        }
    }
}

/// Remove `dir`, then up to `levels` of its parents, while each is empty.
///
/// Best-effort: the walk ends quietly at the first directory that cannot be
/// removed (non-empty, already gone, or refused).
fn prune_empty_ancestors(dir: &Path, levels: usize) {
    let mut current = Some(dir);
    for _ in 0..=levels {
        let Some(path) = current else { break };
        if let Err(e) = fs::remove_dir(path) {
            tracing::debug!(dir = %path.display(), error = %e, "stopped pruning cache directories");
            break;
        }
        current = path.parent();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use crate::table::{rows_to_table, schema};
    use arrow::datatypes::DataType;
    use serde::Serialize;
    use tempfile::TempDir;

    #[derive(Serialize)]
    struct LapRow {
        driver: String,
        lap: i64,
        lap_speed: f64,
    }

    fn lap_times() -> Table {
        let schema = schema(&[("driver", DataType::Utf8), ("lap", DataType::Int64), ("lap_speed", DataType::Float64)]);
        let rows = vec![
            LapRow { driver: "Kyle Larson".into(), lap: 1, lap_speed: 178.512 },
            LapRow { driver: "Kyle Larson".into(), lap: 2, lap_speed: 179.004 },
            LapRow { driver: "Chase Elliott".into(), lap: 1, lap_speed: 177.883 },
        ];
        rows_to_table(schema, &rows).unwrap()
    }

    fn create_temp_store() -> (TableStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = TableStore::new(CacheConfig::at(temp_dir.path()));
        (store, temp_dir)
    }

    fn race() -> KeyParams {
        KeyParams::race(2024, 1, 5314)
    }

    #[test]
    fn test_save_and_load_race_entry() {
        let (store, temp) = create_temp_store();
        let table = lap_times();

        let path = store.save("lap_times", &table, Some("csv"), &race()).unwrap();
        assert_eq!(path, temp.path().join("2024").join("1").join("5314").join("lap_times.csv"));
        assert!(path.is_file());

        let loaded = store.load("lap_times", None, &race()).unwrap().unwrap();
        assert_eq!(loaded.schema().fields(), table.schema().fields());
        assert_eq!(loaded.columns(), table.columns());
    }

    #[test]
    fn test_save_flat_entry() {
        let (store, temp) = create_temp_store();
        let params = KeyParams::new().with("series", "cup").with("year", 2024);

        let path = store.save("lap_times", &lap_times(), None, &params).unwrap();
        assert_eq!(path, temp.path().join("lap_times__series-cup__year-2024.csv"));
        assert!(store.exists("lap_times", None, &params).unwrap());
    }

    #[cfg(feature = "parquet")]
    #[test]
    fn test_parquet_round_trip() {
        let (store, _temp) = create_temp_store();
        let table = lap_times();

        let path = store.save("lap_times", &table, Some("PARQUET"), &race()).unwrap();
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("parquet"));

        let loaded = store.load("lap_times", Some("parquet"), &race()).unwrap().unwrap();
        assert_eq!(loaded.schema().fields(), table.schema().fields());
        assert_eq!(loaded.columns(), table.columns());
    }

    #[cfg(feature = "parquet")]
    #[test]
    fn test_default_format_from_config() {
        let temp = TempDir::new().unwrap();
        let config = CacheConfig { default_format: "parquet".into(), ..CacheConfig::at(temp.path()) };
        let store = TableStore::new(config);

        let path = store.save("results", &lap_times(), None, &race()).unwrap();
        assert!(path.ends_with("2024/1/5314/results.parquet"));
    }

    #[cfg(not(feature = "parquet"))]
    #[test]
    fn test_parquet_without_codec() {
        let (store, temp) = create_temp_store();

        let err = store.save("lap_times", &lap_times(), Some("parquet"), &race()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Dependency);
        assert!(!store.exists("lap_times", Some("parquet"), &race()).unwrap());
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_save_is_idempotent() {
        let (store, _temp) = create_temp_store();
        let table = lap_times();

        let path = store.save("lap_times", &table, None, &race()).unwrap();
        let first = fs::read(&path).unwrap();
        store.save("lap_times", &table, None, &race()).unwrap();
        let second = fs::read(&path).unwrap();

        assert_eq!(first, second);
        assert_eq!(fs::read_dir(path.parent().unwrap()).unwrap().count(), 1);
    }

    #[test]
    fn test_unsupported_format() {
        let (store, _temp) = create_temp_store();

        let err = store.save("lap_times", &lap_times(), Some("xlsx"), &race()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));

        let err = store.load("lap_times", Some("xlsx"), &race()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_disabled_cache_returns_path_without_writing() {
        let temp = TempDir::new().unwrap();
        let config = CacheConfig { cache_enabled: false, ..CacheConfig::at(temp.path()) };
        let store = TableStore::new(config);

        let path = store.save("lap_times", &lap_times(), None, &race()).unwrap();
        assert_eq!(path, temp.path().join("2024").join("1").join("5314").join("lap_times.csv"));
        assert!(!path.exists());
        assert!(store.load("lap_times", None, &race()).unwrap().is_none());
    }

    #[test]
    fn test_table_cache_switch_alone_disables() {
        let temp = TempDir::new().unwrap();
        let config = CacheConfig { table_cache_enabled: false, ..CacheConfig::at(temp.path()) };
        let store = TableStore::new(config);

        store.save("lap_times", &lap_times(), None, &race()).unwrap();
        assert!(!store.exists("lap_times", None, &race()).unwrap());
    }

    #[test]
    fn test_exists_ignores_switches() {
        let (store, _temp) = create_temp_store();
        store.save("lap_times", &lap_times(), None, &race()).unwrap();

        let disabled = store.with_config(CacheConfig { cache_enabled: false, ..store.config().clone() });
        assert!(disabled.exists("lap_times", None, &race()).unwrap());
        assert!(disabled.load("lap_times", None, &race()).unwrap().is_none());

        assert!(disabled.clear("lap_times", None, &race()).unwrap());
        assert!(!store.exists("lap_times", None, &race()).unwrap());
    }

    #[test]
    fn test_load_missing_entry() {
        let (store, temp) = create_temp_store();
        assert!(store.load("results", None, &race()).unwrap().is_none());
        // load never creates directories
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_load_with_blank_format_is_a_miss() {
        let temp = TempDir::new().unwrap();
        let config = CacheConfig { default_format: String::new(), ..CacheConfig::at(temp.path()) };
        let store = TableStore::new(config);

        assert!(store.load("results", None, &race()).unwrap().is_none());
        assert!(store.save("results", &lap_times(), None, &race()).is_err());
    }

    #[test]
    fn test_clear_entry() {
        let (store, _temp) = create_temp_store();
        store.save("lap_times", &lap_times(), None, &race()).unwrap();

        assert!(store.clear("lap_times", None, &race()).unwrap());
        assert!(!store.exists("lap_times", None, &race()).unwrap());
        assert!(!store.clear("lap_times", None, &race()).unwrap());
    }

    #[test]
    fn test_clear_missing_entry() {
        let (store, _temp) = create_temp_store();
        assert!(!store.clear("never_saved", None, &KeyParams::new()).unwrap());
    }

    #[test]
    fn test_missing_race_segment() {
        let (store, _temp) = create_temp_store();
        let params = KeyParams::new().with("year", 2024).with("race_id", 5314);

        let err = store.save("results", &lap_times(), None, &params).unwrap_err();
        assert!(matches!(err, Error::MissingSegment("series_id")));

        let err = store.clear_race(2024, None::<i32>, 5314).unwrap_err();
        assert!(matches!(err, Error::MissingSegment("series_id")));
    }

    #[test]
    fn test_clear_race_rejects_dot_segments() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("a/b/c/cache");
        fs::create_dir_all(&root).unwrap();
        let outside = temp.path().join("a/victim.csv");
        fs::write(&outside, "lap\n1\n").unwrap();
        let store = TableStore::new(CacheConfig::at(&root));

        let err = store.clear_race("..", "..", "..").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(outside.is_file());
        assert!(root.is_dir());
    }

    #[test]
    fn test_empty_race_segment_never_touches_root() {
        let (store, temp) = create_temp_store();
        let params = KeyParams::race("///", 1, 5314);

        let err = store.save("lap_times", &lap_times(), None, &params).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(store.exists("lap_times", None, &params).is_err());
        assert!(store.clear_race("///", 1, 5314).is_err());

        assert!(temp.path().is_dir());
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_save_creates_race_directory() {
        let (store, temp) = create_temp_store();
        let dir = temp.path().join("2024").join("1").join("5314");
        assert!(!dir.exists());

        store.save("lap_times", &lap_times(), None, &race()).unwrap();
        assert!(dir.is_dir());
    }

    #[test]
    fn test_clear_race_prunes_empty_tree() {
        let (store, temp) = create_temp_store();
        store.save("lap_times", &lap_times(), None, &race()).unwrap();
        store.save("results", &lap_times(), None, &race()).unwrap();

        assert!(store.clear_race(2024, 1, 5314).unwrap());

        assert!(!temp.path().join("2024").exists());
        assert!(temp.path().exists());
    }

    #[test]
    fn test_clear_race_keeps_non_empty_parents() {
        let (store, temp) = create_temp_store();
        store.save("lap_times", &lap_times(), None, &race()).unwrap();
        store
            .save("lap_times", &lap_times(), None, &KeyParams::race(2024, 1, 5315))
            .unwrap();
        store
            .save("schedule", &lap_times(), None, &KeyParams::new().with("year", 2024))
            .unwrap();

        assert!(store.clear_race(2024, 1, 5314).unwrap());

        assert!(!temp.path().join("2024/1/5314").exists());
        assert!(temp.path().join("2024/1/5315/lap_times.csv").is_file());
        assert!(temp.path().join("schedule__year-2024.csv").is_file());
    }

    #[test]
    fn test_clear_race_stops_at_non_empty_series() {
        let (store, temp) = create_temp_store();
        store.save("lap_times", &lap_times(), None, &race()).unwrap();
        fs::write(temp.path().join("2024/1/notes.txt"), "keep").unwrap();

        assert!(store.clear_race(2024, 1, 5314).unwrap());
        assert!(!temp.path().join("2024/1/5314").exists());
        assert!(temp.path().join("2024/1").is_dir());
    }

    #[test]
    fn test_clear_race_missing_tree() {
        let (store, _temp) = create_temp_store();
        assert!(!store.clear_race(1999, 3, 1).unwrap());
    }

    #[test]
    fn test_clear_race_leaves_subdirectories() {
        let (store, temp) = create_temp_store();
        store.save("lap_times", &lap_times(), None, &race()).unwrap();
        fs::create_dir_all(temp.path().join("2024/1/5314/archive")).unwrap();

        assert!(store.clear_race(2024, 1, 5314).unwrap());
        assert!(temp.path().join("2024/1/5314/archive").is_dir());
        assert!(!temp.path().join("2024/1/5314/lap_times.csv").exists());
    }
}
