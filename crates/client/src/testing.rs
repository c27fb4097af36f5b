//! Offline [`FeedSource`] serving canned payloads.

use std::sync::Mutex;

use crate::api::{
    ApiError, FeedSource, LapNotesFeed, LapTimesFeed, LoopStatsRace, PitStopEntry, RaceListFeed, RaceRef, WeekendFeed,
};
use crate::race::Feed;
use crate::tables::laps::tests::{LAP_TIMES_JSON, NOTES_JSON, PIT_JSON};
use crate::tables::loops::tests::LOOP_JSON;
use crate::tables::weekend::tests::WEEKEND_JSON;

pub(crate) const RACE_LIST_JSON: &str = r#"{
    "series_1": [
        {"race_id": 5314, "series_id": 1, "race_season": 2024, "race_name": "DAYTONA 500",
         "track_name": "Daytona International Speedway", "race_date": "2024-02-18T14:30:00",
         "scheduled_laps": 200, "scheduled_distance": 500.0, "winner_driver_id": 4030,
         "television_broadcaster": "FOX"},
        {"race_id": 5315, "series_id": 1, "race_season": 2024, "race_name": "Ambetter Health 400",
         "track_name": "Atlanta Motor Speedway", "race_date": "2024-02-25T15:00:00",
         "scheduled_laps": 260, "scheduled_distance": 400.4, "winner_driver_id": 4062},
        {"race_id": 5330, "series_id": 1, "race_season": 2024, "race_name": "Championship Race",
         "track_name": "Phoenix Raceway", "race_date": "2099-11-10T15:00:00",
         "scheduled_laps": 312, "scheduled_distance": 312.0, "winner_driver_id": null},
        {"race_id": 5329, "series_id": 1, "race_season": 2024, "race_name": "Xfinity 500",
         "track_name": "Martinsville Speedway", "race_date": "2099-11-03T14:00:00",
         "scheduled_laps": 500, "scheduled_distance": 263.0},
        {"race_id": 9001, "series_id": 4, "race_name": "Exhibition", "race_date": "2024-02-04T20:00:00"}
    ],
    "series_2": [
        {"race_id": 5350, "series_id": 2, "race_name": "United Rentals 300", "race_date": "2024-02-17T17:00:00",
         "winner_driver_id": 4183}
    ]
}"#;

/// Serves fixture JSON and records which feeds were requested.
#[derive(Default)]
pub(crate) struct FixtureSource {
    calls: Mutex<Vec<Feed>>,
    race_list_calls: Mutex<usize>,
    failing: Mutex<Vec<Feed>>,
}

impl FixtureSource {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Make `feed` answer with a 500 until changed.
    pub(crate) fn fail(&self, feed: Feed) {
        self.failing.lock().unwrap().push(feed);
    }

    pub(crate) fn heal(&self) {
        self.failing.lock().unwrap().clear();
    }

    /// Feeds requested so far, draining the log.
    pub(crate) fn take_calls(&self) -> Vec<Feed> {
        std::mem::take(&mut *self.calls.lock().unwrap())
    }

    pub(crate) fn race_list_calls(&self) -> usize {
        *self.race_list_calls.lock().unwrap()
    }

    fn serve<T: serde::de::DeserializeOwned>(&self, feed: Feed, json: &str) -> Result<T, ApiError> {
        self.calls.lock().unwrap().push(feed);
        if self.failing.lock().unwrap().contains(&feed) {
            return Err(ApiError::HttpError { status: 500 });
        }
        serde_json::from_str(json).map_err(|e| ApiError::Parse(e.to_string()))
    }
}

#[async_trait::async_trait]
impl FeedSource for FixtureSource {
    async fn race_list(&self, _year: i32) -> Result<RaceListFeed, ApiError> {
        *self.race_list_calls.lock().unwrap() += 1;
        serde_json::from_str(RACE_LIST_JSON).map_err(|e| ApiError::Parse(e.to_string()))
    }

    async fn lap_times(&self, _race: &RaceRef) -> Result<LapTimesFeed, ApiError> {
        self.serve(Feed::LapTimes, LAP_TIMES_JSON)
    }

    async fn pit_stops(&self, _race: &RaceRef) -> Result<Vec<PitStopEntry>, ApiError> {
        self.serve(Feed::PitStops, PIT_JSON)
    }

    async fn lap_notes(&self, _race: &RaceRef) -> Result<LapNotesFeed, ApiError> {
        self.serve(Feed::LapNotes, NOTES_JSON)
    }

    async fn weekend_feed(&self, _race: &RaceRef) -> Result<WeekendFeed, ApiError> {
        self.serve(Feed::Weekend, WEEKEND_JSON)
    }

    async fn loop_stats(&self, _race: &RaceRef) -> Result<Vec<LoopStatsRace>, ApiError> {
        self.serve(Feed::LoopStats, LOOP_JSON)
    }
}
