//! Cache-through loading of one race.
//!
//! Each feed produces a fixed set of tables. A feed is served from the
//! table store when every one of its tables is cached there; otherwise it
//! is fetched, normalized, and its tables written back under the race
//! directory. Live races bypass the store in both directions.

use std::collections::BTreeMap;
use std::fmt;

use pitlane_core::{Error, KeyParams, Table, TableStore};

use crate::api::{
    ApiError, FeedSource, LapNotesFeed, LapTimesFeed, LoopStatsRace, PitStopEntry, RaceRef, WeekendFeed,
};
use crate::tables::{self, filter_eq_int};

/// An upstream feed of race data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feed {
    LapTimes,
    PitStops,
    LapNotes,
    Weekend,
    LoopStats,
}

const WEEKEND_TABLES: [&str; 9] = [
    tables::RACE_INFO,
    tables::RESULTS,
    tables::CAUTIONS,
    tables::LEAD_CHANGES,
    tables::STAGE_RESULTS[0],
    tables::STAGE_RESULTS[1],
    tables::STAGE_RESULTS[2],
    tables::PRACTICE,
    tables::QUALIFYING,
];

impl Feed {
    /// Load order. Loop stats come after the weekend feed, whose results
    /// supply driver names.
    pub const ALL: [Feed; 5] = [Feed::LapTimes, Feed::PitStops, Feed::LapNotes, Feed::Weekend, Feed::LoopStats];

    pub fn name(&self) -> &'static str {
        match self {
            Feed::LapTimes => "lap-times",
            Feed::PitStops => "live-pit-data",
            Feed::LapNotes => "lap-notes",
            Feed::Weekend => "weekend-feed",
            Feed::LoopStats => "loopstats",
        }
    }

    /// Tables this feed produces.
    pub fn tables(&self) -> &'static [&'static str] {
        match self {
            Feed::LapTimes => &[tables::LAP_TIMES],
            Feed::PitStops => &[tables::PIT_STOPS],
            Feed::LapNotes => &[tables::LAP_NOTES],
            Feed::Weekend => &WEEKEND_TABLES,
            Feed::LoopStats => &[tables::DRIVER_STATS],
        }
    }
}

impl fmt::Display for Feed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

enum Payload {
    LapTimes(LapTimesFeed),
    PitStops(Vec<PitStopEntry>),
    LapNotes(LapNotesFeed),
    Weekend(WeekendFeed),
    LoopStats(Vec<LoopStatsRace>),
}

/// Tables of one race, keyed by table name.
#[derive(Debug, Clone)]
pub struct RaceData {
    race: RaceRef,
    tables: BTreeMap<&'static str, Table>,
    cached: Vec<Feed>,
    failed: Vec<Feed>,
}

impl RaceData {
    fn new(race: RaceRef) -> Self {
        Self { race, tables: BTreeMap::new(), cached: Vec::new(), failed: Vec::new() }
    }

    pub fn race(&self) -> &RaceRef {
        &self.race
    }

    pub fn get(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    /// Tables in name order.
    pub fn tables(&self) -> impl Iterator<Item = (&'static str, &Table)> {
        self.tables.iter().map(|(name, table)| (*name, table))
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Feeds served from the table store.
    pub fn cached_feeds(&self) -> &[Feed] {
        &self.cached
    }

    /// Feeds that could not be fetched; their tables are absent.
    pub fn failed_feeds(&self) -> &[Feed] {
        &self.failed
    }

    /// Lead changes: one fewer than the leader segments.
    pub fn lead_change_count(&self) -> Option<usize> {
        self.get(tables::LEAD_CHANGES).map(|t| t.num_rows().saturating_sub(1))
    }

    /// Results of practice session `number` (4 is final practice).
    pub fn practice_session(&self, number: i64) -> Result<Option<Table>, Error> {
        self.get(tables::PRACTICE)
            .map(|t| filter_eq_int(t, "practice_number", number))
            .transpose()
    }

    /// Results of qualifying round `round`.
    pub fn qualifying_round(&self, round: i64) -> Result<Option<Table>, Error> {
        self.get(tables::QUALIFYING)
            .map(|t| filter_eq_int(t, "qualifying_round", round))
            .transpose()
    }
}

/// Loads race tables through the table store.
#[derive(Debug, Clone)]
pub struct RaceLoader<S> {
    source: S,
    store: TableStore,
    format: Option<String>,
}

impl<S: FeedSource> RaceLoader<S> {
    /// Tables are stored in the store's default format.
    pub fn new(source: S, store: TableStore) -> Self {
        Self { source, store, format: None }
    }

    /// Store tables as `format` instead of the store default.
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn store(&self) -> &TableStore {
        &self.store
    }

    /// Load every table of `race`.
    ///
    /// With `reload`, cached tables are ignored and every feed is fetched
    /// again; fresh tables still overwrite the cached ones. A feed that
    /// fails to fetch is logged and skipped.
    ///
    /// # Errors
    ///
    /// Table store failures (bad format, codec, filesystem) and tables that
    /// cannot be built from a payload. Upstream failures never surface here.
    pub async fn load(&self, race: &RaceRef, reload: bool) -> Result<RaceData, Error> {
        let params = race.key_params();
        let use_store = !race.live;
        let mut data = RaceData::new(race.clone());

        for feed in Feed::ALL {
            if use_store && !reload {
                if let Some(cached) = self.load_cached(feed, &params)? {
                    tracing::debug!("race {}: {} served from cache", race.race_id, feed);
                    data.tables.extend(cached);
                    data.cached.push(feed);
                    continue;
                }
            }

            let payload = match self.fetch(feed, race).await {
                Ok(payload) => payload,
                Err(e) => {
                    tracing::warn!("race {}: failed to fetch {}: {}", race.race_id, feed, e);
                    data.failed.push(feed);
                    continue;
                }
            };

            let fresh = normalize(payload, race, &data)?;
            if use_store {
                for (name, table) in &fresh {
                    self.store.save(name, table, self.format.as_deref(), &params)?;
                }
            }
            data.tables.extend(fresh);
        }

        tracing::debug!(
            "race {}: {} tables ({} feeds cached, {} failed)",
            race.race_id,
            data.len(),
            data.cached.len(),
            data.failed.len()
        );
        Ok(data)
    }

    /// All of `feed`'s tables from the store, or `None` if any is missing.
    fn load_cached(&self, feed: Feed, params: &KeyParams) -> Result<Option<Vec<(&'static str, Table)>>, Error> {
        let mut found = Vec::with_capacity(feed.tables().len());
        for name in feed.tables() {
            match self.store.load(name, self.format.as_deref(), params)? {
                Some(table) => found.push((*name, table)),
                None => return Ok(None),
            }
        }
        Ok(Some(found))
    }

    async fn fetch(&self, feed: Feed, race: &RaceRef) -> Result<Payload, ApiError> {
        Ok(match feed {
            Feed::LapTimes => Payload::LapTimes(self.source.lap_times(race).await?),
            Feed::PitStops => Payload::PitStops(self.source.pit_stops(race).await?),
            Feed::LapNotes => Payload::LapNotes(self.source.lap_notes(race).await?),
            Feed::Weekend => Payload::Weekend(self.source.weekend_feed(race).await?),
            Feed::LoopStats => Payload::LoopStats(self.source.loop_stats(race).await?),
        })
    }
}

/// Build a feed's tables. `data` holds whatever loaded before this feed.
fn normalize(payload: Payload, race: &RaceRef, data: &RaceData) -> Result<Vec<(&'static str, Table)>, Error> {
    Ok(match payload {
        Payload::LapTimes(feed) => vec![(tables::LAP_TIMES, tables::lap_times(&feed)?)],
        Payload::PitStops(stops) => vec![(tables::PIT_STOPS, tables::pit_stops(&stops)?)],
        Payload::LapNotes(feed) => vec![(tables::LAP_NOTES, tables::lap_notes(&feed)?)],
        Payload::Weekend(feed) => {
            let mut out = vec![
                (tables::RACE_INFO, tables::race_info(race, &feed)?),
                (tables::RESULTS, tables::results(&feed)?),
                (tables::CAUTIONS, tables::cautions(&feed)?),
                (tables::LEAD_CHANGES, tables::lead_changes(&feed)?),
            ];
            for (stage, name) in (1..).zip(tables::STAGE_RESULTS) {
                out.push((name, tables::stage_results(&feed, stage)?));
            }
            out.push((tables::PRACTICE, tables::practice(&feed)?));
            out.push((tables::QUALIFYING, tables::qualifying(&feed)?));
            out
        }
        Payload::LoopStats(feed) => {
            let names = data
                .get(tables::RESULTS)
                .map(tables::driver_names)
                .transpose()?
                .unwrap_or_default();
            vec![(tables::DRIVER_STATS, tables::driver_stats(&feed, &names)?)]
        }
    })
}
