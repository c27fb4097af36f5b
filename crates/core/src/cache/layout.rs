//! Cache path construction.
//!
//! Two layouts share one cache root:
//!
//! ```text
//! <cache_dir>/<composite_key>.<ext>                  (flat)
//! <cache_dir>/<year>/<series_id>/<race_id>/<key>.<ext>   (race)
//! ```
//!
//! The race layout is chosen whenever `series_id` or `race_id` is among the
//! parameters. It then needs all three race segments; any other parameters
//! are folded into the file stem.

use std::fs;
use std::path::{Path, PathBuf};

use super::format::TableFormat;
use super::key::{KeyParams, KeyValue, compose_key, sanitize_key};
use crate::Error;

/// Parameter names that form the race directory, outermost first.
pub const RACE_SEGMENTS: [&str; 3] = ["year", "series_id", "race_id"];

/// Key-derivation strategy for a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Flat,
    Race,
}

impl Layout {
    /// Pick the layout implied by the supplied parameters.
    pub fn select(params: &KeyParams) -> Self {
        if params.contains("series_id") || params.contains("race_id") { Layout::Race } else { Layout::Flat }
    }
}

/// Full path of the file backing `key` under `cache_dir`.
///
/// Pure: nothing is created on disk.
pub fn entry_path(cache_dir: &Path, key: &str, params: &KeyParams, format: TableFormat) -> Result<PathBuf, Error> {
    match Layout::select(params) {
        Layout::Flat => {
            let stem = sanitize_key(&compose_key(key, params));
            Ok(cache_dir.join(format!("{stem}.{}", format.extension())))
        }
        Layout::Race => {
            let dir = race_directory(
                cache_dir,
                params.get("year"),
                params.get("series_id"),
                params.get("race_id"),
            )?;
            let stem = sanitize_key(&compose_key(key, &params.without(&RACE_SEGMENTS)));
            Ok(dir.join(format!("{stem}.{}", format.extension())))
        }
    }
}

/// Directory holding every table of one race.
///
/// # Errors
///
/// Returns `Error::MissingSegment` naming the first of year, series_id and
/// race_id that is absent or null, and `Error::InvalidInput` for a segment
/// that sanitizes to nothing or to dots only.
pub fn race_directory(
    cache_dir: &Path, year: Option<&KeyValue>, series_id: Option<&KeyValue>, race_id: Option<&KeyValue>,
) -> Result<PathBuf, Error> {
    let mut dir = cache_dir.to_path_buf();
    for (name, value) in RACE_SEGMENTS.into_iter().zip([year, series_id, race_id]) {
        match value {
            Some(v) if !v.is_null() => dir.push(race_segment(name, v)?),
            _ => return Err(Error::MissingSegment(name)),
        }
    }
    Ok(dir)
}

/// One directory level of a race path. Must stay a real child of its parent.
fn race_segment(name: &str, value: &KeyValue) -> Result<String, Error> {
    let raw = value.flatten();
    let segment = sanitize_key(&raw);
    if segment.chars().all(|c| c == '.') {
        return Err(Error::InvalidInput(format!("{name} {raw:?} is not a usable directory name")));
    }
    Ok(segment)
}

/// Like [`race_directory`], creating the directory and its parents.
///
/// Safe to call repeatedly.
pub fn ensure_race_directory(
    cache_dir: &Path, year: Option<&KeyValue>, series_id: Option<&KeyValue>, race_id: Option<&KeyValue>,
) -> Result<PathBuf, Error> {
    let dir = race_directory(cache_dir, year, series_id, race_id)?;
    fs::create_dir_all(&dir)?;
    Ok(dir)
}
