//! Season schedule for one series.
//!
//! Built from `race_list_basic.json`. When the list reports winners at all,
//! a race counts as finished exactly when it has one. A list without any
//! winner field falls back to the scheduled start having passed.

use arrow::datatypes::DataType;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use pitlane_core::table::{rows_to_table, schema};
use pitlane_core::{Error, KeyParams, Table, TableStore};
use serde::Serialize;

use crate::api::response::RaceListEntry;
use crate::api::{FeedSource, RaceListFeed, RaceRef};
use crate::tables::{self, float_column, int_column, string_column};

const RACE_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Parse a feed timestamp. Zone-less values are taken as UTC.
pub fn parse_race_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// One race on the calendar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduledRace {
    pub race_id: i64,
    pub series_id: Option<i64>,
    pub race_season: Option<i64>,
    pub race_name: Option<String>,
    pub track_name: Option<String>,
    #[serde(serialize_with = "ser_race_date")]
    pub race_date: Option<DateTime<Utc>>,
    pub scheduled_laps: Option<i64>,
    pub scheduled_distance: Option<f64>,
    pub winner_driver_id: Option<i64>,
    pub television_broadcaster: Option<String>,
}

fn ser_race_date<S: serde::Serializer>(date: &Option<DateTime<Utc>>, s: S) -> Result<S::Ok, S::Error> {
    match date {
        Some(d) => s.serialize_str(&d.format(RACE_DATE_FORMAT).to_string()),
        None => s.serialize_none(),
    }
}

impl ScheduledRace {
    fn from_entry(entry: &RaceListEntry) -> Option<Self> {
        Some(Self {
            race_id: entry.race_id?,
            series_id: entry.series_id,
            race_season: entry.race_season,
            race_name: entry.race_name.clone(),
            track_name: entry.track_name.clone(),
            race_date: entry.race_date.as_deref().and_then(parse_race_date),
            scheduled_laps: entry.scheduled_laps,
            scheduled_distance: entry.scheduled_distance,
            winner_driver_id: entry.winner_driver_id.flatten(),
            television_broadcaster: entry.television_broadcaster.clone(),
        })
    }

    /// Reference for loading this race's tables.
    pub fn race_ref(&self, year: i32) -> Option<RaceRef> {
        Some(RaceRef::new(year, self.series_id?, self.race_id))
    }
}

/// Races of one series in one season, in feed order.
#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    pub year: i32,
    pub series_id: i64,
    races: Vec<ScheduledRace>,
    reports_winners: bool,
}

impl Schedule {
    /// Races listed under `series_<id>` whose own series id matches.
    /// Entries without a race id are dropped.
    pub fn from_race_list(year: i32, series_id: i64, feed: &RaceListFeed) -> Self {
        let entries = feed.get(&format!("series_{series_id}")).map(Vec::as_slice).unwrap_or_default();
        let reports_winners = entries.iter().any(|e| e.winner_driver_id.is_some());
        let races = entries
            .iter()
            .filter(|e| e.series_id == Some(series_id))
            .filter_map(ScheduledRace::from_entry)
            .collect();
        Self { year, series_id, races, reports_winners }
    }

    /// Rebuild from a table written by [`Schedule::to_table`].
    pub fn from_table(year: i32, series_id: i64, table: &Table) -> Result<Self, Error> {
        let rows = table.num_rows();
        let ints = |name| int_column(table, name).map(|c| c.unwrap_or_else(|| vec![None; rows]));
        let floats = |name| float_column(table, name).map(|c| c.unwrap_or_else(|| vec![None; rows]));
        let strings = |name| string_column(table, name).map(|c| c.unwrap_or_else(|| vec![None; rows]));

        let race_id = ints("race_id")?;
        let series = ints("series_id")?;
        let season = ints("race_season")?;
        let name = strings("race_name")?;
        let track = strings("track_name")?;
        let date = strings("race_date")?;
        let laps = ints("scheduled_laps")?;
        let distance = floats("scheduled_distance")?;
        let reports_winners = int_column(table, "winner_driver_id")?.is_some();
        let winner = ints("winner_driver_id")?;
        let tv = strings("television_broadcaster")?;

        let races = (0..rows)
            .filter_map(|i| {
                Some(ScheduledRace {
                    race_id: race_id[i]?,
                    series_id: series[i],
                    race_season: season[i],
                    race_name: name[i].clone(),
                    track_name: track[i].clone(),
                    race_date: date[i].as_deref().and_then(parse_race_date),
                    scheduled_laps: laps[i],
                    scheduled_distance: distance[i],
                    winner_driver_id: winner[i],
                    television_broadcaster: tv[i].clone(),
                })
            })
            .collect();
        Ok(Self { year, series_id, races, reports_winners })
    }

    pub fn races(&self) -> &[ScheduledRace] {
        &self.races
    }

    /// Whether the source listed winners; decides how races are classified.
    pub fn reports_winners(&self) -> bool {
        self.reports_winners
    }

    /// By winner when the schedule reports winners, else by start time.
    pub fn is_finished_at(&self, race: &ScheduledRace, now: DateTime<Utc>) -> bool {
        if self.reports_winners {
            race.winner_driver_id.is_some()
        } else {
            race.race_date.is_some_and(|d| d <= now)
        }
    }

    /// Finished races as of `now`, newest first.
    pub fn finished_at(&self, now: DateTime<Utc>) -> Vec<&ScheduledRace> {
        let mut done: Vec<_> = self.races.iter().filter(|r| self.is_finished_at(r, now)).collect();
        done.sort_by(|a, b| b.race_date.cmp(&a.race_date));
        done
    }

    /// Races still to run as of `now`, soonest first; undated races last.
    pub fn remaining_at(&self, now: DateTime<Utc>) -> Vec<&ScheduledRace> {
        let mut left: Vec<_> = self.races.iter().filter(|r| !self.is_finished_at(r, now)).collect();
        left.sort_by_key(|r| (r.race_date.is_none(), r.race_date));
        left
    }

    pub fn finished(&self) -> Vec<&ScheduledRace> {
        self.finished_at(Utc::now())
    }

    pub fn remaining(&self) -> Vec<&ScheduledRace> {
        self.remaining_at(Utc::now())
    }

    pub fn most_recent(&self) -> Option<&ScheduledRace> {
        self.finished().into_iter().next()
    }

    pub fn next_race(&self) -> Option<&ScheduledRace> {
        self.remaining().into_iter().next()
    }

    /// The winner column is written only when winners are reported, so a
    /// reloaded schedule classifies races the same way.
    pub fn to_table(&self) -> Result<Table, Error> {
        let columns = [
            ("race_id", DataType::Int64),
            ("series_id", DataType::Int64),
            ("race_season", DataType::Int64),
            ("race_name", DataType::Utf8),
            ("track_name", DataType::Utf8),
            ("race_date", DataType::Utf8),
            ("scheduled_laps", DataType::Int64),
            ("scheduled_distance", DataType::Float64),
            ("winner_driver_id", DataType::Int64),
            ("television_broadcaster", DataType::Utf8),
        ];
        let columns: Vec<_> = columns
            .into_iter()
            .filter(|(name, _)| self.reports_winners || *name != "winner_driver_id")
            .collect();
        rows_to_table(schema(&columns), &self.races)
    }
}

/// Cache parameters of a season schedule. Named `series`, not `series_id`,
/// so the entry stays flat under the cache root.
pub fn schedule_params(year: i32, series_id: i64) -> KeyParams {
    KeyParams::new().with("series", series_id).with("year", year)
}

/// Loads schedules through the table store.
///
/// A cached schedule is never refreshed on its own; pass `reload` to pick
/// up results of races run since it was stored.
#[derive(Debug, Clone)]
pub struct ScheduleLoader<S> {
    source: S,
    store: TableStore,
    format: Option<String>,
}

impl<S: FeedSource> ScheduleLoader<S> {
    pub fn new(source: S, store: TableStore) -> Self {
        Self { source, store, format: None }
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// # Errors
    ///
    /// Upstream failures (there is nothing partial to return) and table
    /// store failures.
    pub async fn load(&self, year: i32, series_id: i64, reload: bool) -> Result<Schedule, Error> {
        let params = schedule_params(year, series_id);
        let format = self.format.as_deref();

        if !reload {
            if let Some(table) = self.store.load(tables::SCHEDULE, format, &params)? {
                tracing::debug!("schedule {} series {} served from cache", year, series_id);
                return Schedule::from_table(year, series_id, &table);
            }
        }

        let feed = self.source.race_list(year).await?;
        let schedule = Schedule::from_race_list(year, series_id, &feed);
        self.store.save(tables::SCHEDULE, &schedule.to_table()?, format, &params)?;

        tracing::debug!("schedule {} series {}: {} races", year, series_id, schedule.races().len());
        Ok(schedule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FixtureSource, RACE_LIST_JSON};
    use chrono::TimeZone;
    use pitlane_core::CacheConfig;
    use tempfile::TempDir;

    fn schedule() -> Schedule {
        let feed: RaceListFeed = serde_json::from_str(RACE_LIST_JSON).unwrap();
        Schedule::from_race_list(2024, 1, &feed)
    }

    fn ids(races: &[&ScheduledRace]) -> Vec<i64> {
        races.iter().map(|r| r.race_id).collect()
    }

    #[test]
    fn test_parse_race_date_forms() {
        let expected = Utc.with_ymd_and_hms(2024, 2, 18, 14, 30, 0).unwrap();
        assert_eq!(parse_race_date("2024-02-18T14:30:00"), Some(expected));
        assert_eq!(parse_race_date("2024-02-18 14:30:00"), Some(expected));
        assert_eq!(parse_race_date("2024-02-18T09:30:00-05:00"), Some(expected));
        assert_eq!(parse_race_date("2024-02-18T14:30:00.000"), Some(expected));
        assert_eq!(
            parse_race_date("2024-02-18"),
            Some(Utc.with_ymd_and_hms(2024, 2, 18, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_race_date("TBD"), None);
    }

    #[test]
    fn test_filters_by_series() {
        let schedule = schedule();
        assert_eq!(schedule.races().len(), 4);
        assert!(schedule.races().iter().all(|r| r.series_id == Some(1)));

        let feed: RaceListFeed = serde_json::from_str(RACE_LIST_JSON).unwrap();
        assert!(Schedule::from_race_list(2024, 3, &feed).races().is_empty());
    }

    #[test]
    fn test_finished_and_remaining() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let schedule = schedule();

        assert_eq!(ids(&schedule.finished_at(now)), vec![5315, 5314]);
        assert_eq!(ids(&schedule.remaining_at(now)), vec![5329, 5330]);
    }

    #[test]
    fn test_past_race_without_winner_is_remaining() {
        let now = Utc.with_ymd_and_hms(2100, 1, 1, 0, 0, 0).unwrap();
        let schedule = schedule();
        assert!(schedule.reports_winners());

        assert_eq!(ids(&schedule.finished_at(now)), vec![5315, 5314]);
        assert_eq!(ids(&schedule.remaining_at(now)), vec![5329, 5330]);
    }

    const UNDECIDED_LIST_JSON: &str = r#"{"series_1": [
        {"race_id": 1, "series_id": 1, "race_date": "2024-02-18T14:30:00"},
        {"race_id": 2, "series_id": 1, "race_date": "2024-02-25T15:00:00"},
        {"race_id": 3, "series_id": 1, "race_date": "2024-03-03T15:30:00"}
    ]}"#;

    fn undecided() -> Schedule {
        let feed: RaceListFeed = serde_json::from_str(UNDECIDED_LIST_JSON).unwrap();
        Schedule::from_race_list(2024, 1, &feed)
    }

    #[test]
    fn test_without_winner_field_uses_race_date() {
        let now = Utc.with_ymd_and_hms(2024, 2, 26, 0, 0, 0).unwrap();
        let schedule = undecided();
        assert!(!schedule.reports_winners());

        assert_eq!(ids(&schedule.finished_at(now)), vec![2, 1]);
        assert_eq!(ids(&schedule.remaining_at(now)), vec![3]);
    }

    #[test]
    fn test_table_round_trip_keeps_date_rule() {
        let schedule = undecided();
        let table = schedule.to_table().unwrap();
        assert!(table.schema().column_with_name("winner_driver_id").is_none());

        let reloaded = Schedule::from_table(2024, 1, &table).unwrap();
        assert!(!reloaded.reports_winners());
        assert_eq!(reloaded, schedule);
    }

    #[test]
    fn test_most_recent_and_next() {
        let schedule = schedule();
        assert_eq!(schedule.most_recent().map(|r| r.race_id), Some(5315));
        assert_eq!(schedule.next_race().map(|r| r.race_id), Some(5329));
    }

    #[test]
    fn test_race_ref() {
        let schedule = schedule();
        let race = schedule.races()[0].race_ref(2024).unwrap();
        assert_eq!(race, RaceRef::new(2024, 1, 5314));
    }

    #[test]
    fn test_table_round_trip() {
        let schedule = schedule();
        let table = schedule.to_table().unwrap();
        assert_eq!(table.num_rows(), 4);
        assert_eq!(Schedule::from_table(2024, 1, &table).unwrap(), schedule);
    }

    #[test]
    fn test_schedule_params_stay_flat() {
        let store = TableStore::new(CacheConfig::at("/cache"));
        let path = store.path_for("schedule", None, &schedule_params(2024, 1)).unwrap();
        assert_eq!(path, std::path::PathBuf::from("/cache/schedule__series-1__year-2024.csv"));
    }

    #[tokio::test]
    async fn test_loader_caches_schedule() {
        let temp = TempDir::new().unwrap();
        let loader = ScheduleLoader::new(FixtureSource::new(), TableStore::new(CacheConfig::at(temp.path())));

        let first = loader.load(2024, 1, false).await.unwrap();
        assert!(temp.path().join("schedule__series-1__year-2024.csv").is_file());

        let second = loader.load(2024, 1, false).await.unwrap();
        assert_eq!(loader.source().race_list_calls(), 1);
        assert_eq!(second, first);

        loader.load(2024, 1, true).await.unwrap();
        assert_eq!(loader.source().race_list_calls(), 2);
    }

    #[tokio::test]
    async fn test_loader_series_are_cached_apart() {
        let temp = TempDir::new().unwrap();
        let loader = ScheduleLoader::new(FixtureSource::new(), TableStore::new(CacheConfig::at(temp.path())));

        let cup = loader.load(2024, 1, false).await.unwrap();
        let xfinity = loader.load(2024, 2, false).await.unwrap();

        assert_eq!(loader.source().race_list_calls(), 2);
        assert_eq!(cup.races().len(), 4);
        assert_eq!(xfinity.races().len(), 1);
    }
}
