//! Raw feed payloads.
//!
//! The feeds are loosely typed: numbers arrive as strings, strings as
//! numbers, and any field may be missing or null. Every scalar goes through
//! a lenient deserializer in [`de`] and ends up as an `Option`.

use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;

/// `lap-times.json`
#[derive(Debug, Default, Deserialize)]
pub struct LapTimesFeed {
    #[serde(default)]
    pub laps: Vec<DriverLaps>,
}

/// Every lap of one car.
#[derive(Debug, Deserialize)]
pub struct DriverLaps {
    #[serde(rename = "FullName", default, deserialize_with = "de::opt_string")]
    pub full_name: Option<String>,
    #[serde(rename = "Number", default, deserialize_with = "de::opt_string")]
    pub number: Option<String>,
    #[serde(rename = "Manufacturer", default, deserialize_with = "de::opt_string")]
    pub manufacturer: Option<String>,
    #[serde(rename = "Laps", default)]
    pub laps: Vec<LapEntry>,
}

#[derive(Debug, Deserialize)]
pub struct LapEntry {
    #[serde(rename = "Lap", default, deserialize_with = "de::opt_i64")]
    pub lap: Option<i64>,
    /// Seconds.
    #[serde(rename = "LapTime", default, deserialize_with = "de::opt_f64")]
    pub lap_time: Option<f64>,
    #[serde(rename = "LapSpeed", default, deserialize_with = "de::opt_f64")]
    pub lap_speed: Option<f64>,
    #[serde(rename = "RunningPos", default, deserialize_with = "de::opt_i64")]
    pub running_pos: Option<i64>,
}

/// One entry of `live-pit-data.json`, which is a bare array.
#[derive(Debug, Deserialize)]
pub struct PitStopEntry {
    #[serde(default, deserialize_with = "de::opt_string")]
    pub driver_name: Option<String>,
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub lap_count: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub vehicle_manufacturer: Option<String>,
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub pit_in_flag_status: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub pit_out_flag_status: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub pit_in_race_time: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub pit_out_race_time: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub total_duration: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub box_stop_race_time: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub box_leave_race_time: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub pit_stop_duration: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub in_travel_duration: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub out_travel_duration: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub pit_stop_type: Option<String>,
    #[serde(default, deserialize_with = "de::opt_bool")]
    pub left_front_tire_changed: Option<bool>,
    #[serde(default, deserialize_with = "de::opt_bool")]
    pub left_rear_tire_changed: Option<bool>,
    #[serde(default, deserialize_with = "de::opt_bool")]
    pub right_front_tire_changed: Option<bool>,
    #[serde(default, deserialize_with = "de::opt_bool")]
    pub right_rear_tire_changed: Option<bool>,
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub previous_lap_time: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub next_lap_time: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub pit_in_rank: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub pit_out_rank: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub positions_gained_lost: Option<i64>,
}

/// `lap-notes.json`: notes grouped under their lap number.
#[derive(Debug, Default, Deserialize)]
pub struct LapNotesFeed {
    #[serde(default)]
    pub laps: BTreeMap<String, Vec<LapNote>>,
}

#[derive(Debug, Deserialize)]
pub struct LapNote {
    #[serde(rename = "FlagState", default, deserialize_with = "de::opt_i64")]
    pub flag_state: Option<i64>,
    #[serde(rename = "Note", default, deserialize_with = "de::opt_string")]
    pub note: Option<String>,
    #[serde(rename = "DriverIDs", default)]
    pub driver_ids: Option<Vec<i64>>,
}

/// `weekend-feed.json`
#[derive(Debug, Default, Deserialize)]
pub struct WeekendFeed {
    #[serde(default)]
    pub weekend_race: Vec<WeekendRace>,
    #[serde(default)]
    pub weekend_runs: Vec<WeekendRun>,
}

impl WeekendFeed {
    /// The race of the weekend; the feed wraps it in a one-element array.
    pub fn race(&self) -> Option<&WeekendRace> {
        self.weekend_race.first()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct WeekendRace {
    #[serde(default, deserialize_with = "de::opt_string")]
    pub race_name: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub track_name: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub total_race_time: Option<String>,
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub scheduled_distance: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub scheduled_laps: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub stage_1_laps: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub stage_2_laps: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub stage_3_laps: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub number_of_cars_in_field: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_bool")]
    pub restrictor_plate: Option<bool>,
    #[serde(default)]
    pub results: Vec<ResultEntry>,
    #[serde(default)]
    pub caution_segments: Vec<CautionSegment>,
    #[serde(default)]
    pub race_leaders: Vec<LeaderSegment>,
    #[serde(default)]
    pub stage_results: Vec<StageResults>,
}

#[derive(Debug, Deserialize)]
pub struct ResultEntry {
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub driver_id: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub driver_fullname: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub car_number: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub car_make: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub sponsor: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub team_name: Option<String>,
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub team_id: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub qualifying_order: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub qualifying_position: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub qualifying_speed: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub starting_position: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub finishing_position: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub laps_completed: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub points_earned: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub playoff_points_earned: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CautionSegment {
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub start_lap: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub end_lap: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub reason: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub comment: Option<String>,
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub flag_state: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct LeaderSegment {
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub start_lap: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub end_lap: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub car_number: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StageResults {
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub stage_number: Option<i64>,
    #[serde(default)]
    pub results: Vec<StageEntry>,
}

#[derive(Debug, Deserialize)]
pub struct StageEntry {
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub driver_id: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub driver_fullname: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub car_number: Option<String>,
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub finishing_position: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub stage_points: Option<i64>,
}

/// A practice or qualifying session.
#[derive(Debug, Deserialize)]
pub struct WeekendRun {
    #[serde(default, deserialize_with = "de::opt_string")]
    pub run_name: Option<String>,
    #[serde(default)]
    pub results: Vec<RunEntry>,
}

#[derive(Debug, Deserialize)]
pub struct RunEntry {
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub driver_id: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub driver_name: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub manufacturer: Option<String>,
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub finishing_position: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub best_lap_time: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub best_lap_speed: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub laps_completed: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub delta_leader: Option<f64>,
}

/// One element of the loopstats array.
#[derive(Debug, Default, Deserialize)]
pub struct LoopStatsRace {
    #[serde(default)]
    pub drivers: Vec<LoopStatsDriver>,
}

#[derive(Debug, Deserialize)]
pub struct LoopStatsDriver {
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub driver_id: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub start_ps: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub mid_ps: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub ps: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub closing_ps: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub closing_laps_diff: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub best_ps: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub worst_ps: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub avg_ps: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub passes_gf: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub passing_diff: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub passed_gf: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub quality_passes: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub fast_laps: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub top15_laps: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub lead_laps: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub laps: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub rating: Option<f64>,
}

/// `race_list_basic.json`: races of every series, keyed `series_<id>`.
pub type RaceListFeed = HashMap<String, Vec<RaceListEntry>>;

#[derive(Debug, Clone, Deserialize)]
pub struct RaceListEntry {
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub race_id: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub series_id: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub race_season: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub race_name: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub track_name: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub race_date: Option<String>,
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub scheduled_laps: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub scheduled_distance: Option<f64>,
    /// Outer `None` when the feed has no winner field at all.
    #[serde(default, deserialize_with = "de::present_i64")]
    pub winner_driver_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub television_broadcaster: Option<String>,
}

/// Lenient scalar deserializers.
///
/// Anything that cannot be read as the target type becomes `None` instead
/// of failing the whole payload.
pub(crate) mod de {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn opt_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        Ok(match Option::<Value>::deserialize(d)? {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        })
    }

    pub fn opt_i64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
        Ok(match Option::<Value>::deserialize(d)? {
            Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Some(Value::String(s)) => {
                let s = s.trim();
                s.parse().ok().or_else(|| s.parse::<f64>().ok().map(|f| f as i64))
            }
            _ => None,
        })
    }

    /// Only runs for a field that is present, so a null comes back as `Some(None)`.
    pub fn present_i64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Option<i64>>, D::Error> {
        opt_i64(d).map(Some)
    }

    pub fn opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(match Option::<Value>::deserialize(d)? {
            Some(Value::String(s)) => Some(s),
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(Value::Bool(b)) => Some(b.to_string()),
            _ => None,
        })
    }

    pub fn opt_bool<'de, D: Deserializer<'de>>(d: D) -> Result<Option<bool>, D::Error> {
        Ok(match Option::<Value>::deserialize(d)? {
            Some(Value::Bool(b)) => Some(b),
            Some(Value::Number(n)) => n.as_i64().map(|v| v != 0),
            Some(Value::String(s)) => match s.trim().to_lowercase().as_str() {
                "true" | "1" | "yes" => Some(true),
                "false" | "0" | "no" => Some(false),
                _ => None,
            },
            _ => None,
        })
    }
}
