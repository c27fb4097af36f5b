//! Tables derived from `weekend-feed.json`.
//!
//! The weekend feed carries the race summary, official results, caution
//! and leader segments, stage results, and every practice and qualifying
//! session of the weekend.

use std::collections::HashMap;

use arrow::datatypes::DataType;
use pitlane_core::table::{rows_to_table, schema};
use pitlane_core::{Error, Table};
use serde::Serialize;

use super::columns::{int_column, string_column};
use crate::api::response::{ResultEntry, RunEntry, WeekendRace, WeekendRun};
use crate::api::{RaceRef, WeekendFeed};
use crate::codes::flag_name;

/// Number of lead changes: one fewer than the leader segments.
pub fn lead_change_count(race: &WeekendRace) -> i64 {
    (race.race_leaders.len() as i64 - 1).max(0)
}

#[derive(Serialize)]
struct RaceInfoRow<'a> {
    year: i32,
    series_id: i64,
    race_id: i64,
    race_name: Option<&'a str>,
    track_name: Option<&'a str>,
    scheduled_laps: Option<i64>,
    scheduled_distance: Option<f64>,
    stage_1_laps: Option<i64>,
    stage_2_laps: Option<i64>,
    stage_3_laps: Option<i64>,
    total_race_time: Option<&'a str>,
    entrants: Option<i64>,
    superspeedway: Option<bool>,
    lead_changes: Option<i64>,
    winner: Option<&'a str>,
}

/// Single-row race summary. Ids always come from `race`, the rest from the
/// feed when it has a race entry.
pub fn race_info(race: &RaceRef, feed: &WeekendFeed) -> Result<Table, Error> {
    let weekend = feed.race();
    let winner = weekend.and_then(|w| {
        w.results
            .iter()
            .find(|r| r.finishing_position == Some(1))
            .and_then(|r| r.driver_fullname.as_deref())
    });

    let row = RaceInfoRow {
        year: race.year,
        series_id: race.series_id,
        race_id: race.race_id,
        race_name: weekend.and_then(|w| w.race_name.as_deref()),
        track_name: weekend.and_then(|w| w.track_name.as_deref()),
        scheduled_laps: weekend.and_then(|w| w.scheduled_laps),
        scheduled_distance: weekend.and_then(|w| w.scheduled_distance),
        stage_1_laps: weekend.and_then(|w| w.stage_1_laps),
        stage_2_laps: weekend.and_then(|w| w.stage_2_laps),
        stage_3_laps: weekend.and_then(|w| w.stage_3_laps),
        total_race_time: weekend.and_then(|w| w.total_race_time.as_deref()),
        entrants: weekend.and_then(|w| w.number_of_cars_in_field),
        superspeedway: weekend.and_then(|w| w.restrictor_plate),
        lead_changes: weekend.map(lead_change_count),
        winner,
    };

    let schema = schema(&[
        ("year", DataType::Int64),
        ("series_id", DataType::Int64),
        ("race_id", DataType::Int64),
        ("race_name", DataType::Utf8),
        ("track_name", DataType::Utf8),
        ("scheduled_laps", DataType::Int64),
        ("scheduled_distance", DataType::Float64),
        ("stage_1_laps", DataType::Int64),
        ("stage_2_laps", DataType::Int64),
        ("stage_3_laps", DataType::Int64),
        ("total_race_time", DataType::Utf8),
        ("entrants", DataType::Int64),
        ("superspeedway", DataType::Boolean),
        ("lead_changes", DataType::Int64),
        ("winner", DataType::Utf8),
    ]);
    rows_to_table(schema, &[row])
}

#[derive(Serialize)]
struct ResultRow<'a> {
    driver_id: Option<i64>,
    driver: Option<&'a str>,
    car_number: Option<&'a str>,
    manufacturer: Option<&'a str>,
    sponsor: Option<&'a str>,
    team: Option<&'a str>,
    team_id: Option<i64>,
    qualifying_order: Option<i64>,
    qualifying_position: Option<i64>,
    qualifying_speed: Option<f64>,
    starting_position: Option<i64>,
    finishing_position: Option<i64>,
    laps_completed: Option<i64>,
    points: Option<i64>,
    playoff_points: Option<i64>,
}

impl<'a> From<&'a ResultEntry> for ResultRow<'a> {
    fn from(r: &'a ResultEntry) -> Self {
        Self {
            driver_id: r.driver_id,
            driver: r.driver_fullname.as_deref(),
            car_number: r.car_number.as_deref(),
            manufacturer: r.car_make.as_deref(),
            sponsor: r.sponsor.as_deref(),
            team: r.team_name.as_deref(),
            team_id: r.team_id,
            qualifying_order: r.qualifying_order,
            qualifying_position: r.qualifying_position,
            qualifying_speed: r.qualifying_speed,
            starting_position: r.starting_position,
            finishing_position: r.finishing_position,
            laps_completed: r.laps_completed,
            points: r.points_earned,
            playoff_points: r.playoff_points_earned,
        }
    }
}

/// Official finishing order, one row per car.
pub fn results(feed: &WeekendFeed) -> Result<Table, Error> {
    let rows: Vec<ResultRow<'_>> = feed
        .race()
        .map(|w| w.results.iter().map(ResultRow::from).collect())
        .unwrap_or_default();

    let schema = schema(&[
        ("driver_id", DataType::Int64),
        ("driver", DataType::Utf8),
        ("car_number", DataType::Utf8),
        ("manufacturer", DataType::Utf8),
        ("sponsor", DataType::Utf8),
        ("team", DataType::Utf8),
        ("team_id", DataType::Int64),
        ("qualifying_order", DataType::Int64),
        ("qualifying_position", DataType::Int64),
        ("qualifying_speed", DataType::Float64),
        ("starting_position", DataType::Int64),
        ("finishing_position", DataType::Int64),
        ("laps_completed", DataType::Int64),
        ("points", DataType::Int64),
        ("playoff_points", DataType::Int64),
    ]);
    rows_to_table(schema, &rows)
}

#[derive(Serialize)]
struct CautionRow<'a> {
    start_lap: Option<i64>,
    end_lap: Option<i64>,
    duration: Option<i64>,
    reason: Option<&'a str>,
    comment: Option<&'a str>,
    flag_state: Option<i64>,
    flag: Option<String>,
}

/// Caution segments. `duration` is `end_lap - start_lap`, in laps.
pub fn cautions(feed: &WeekendFeed) -> Result<Table, Error> {
    let rows: Vec<CautionRow<'_>> = feed
        .race()
        .map(|w| {
            w.caution_segments
                .iter()
                .map(|c| CautionRow {
                    start_lap: c.start_lap,
                    end_lap: c.end_lap,
                    duration: c.end_lap.zip(c.start_lap).map(|(end, start)| end - start),
                    reason: c.reason.as_deref(),
                    comment: c.comment.as_deref(),
                    flag_state: c.flag_state,
                    flag: flag_name(c.flag_state),
                })
                .collect()
        })
        .unwrap_or_default();

    let schema = schema(&[
        ("start_lap", DataType::Int64),
        ("end_lap", DataType::Int64),
        ("duration", DataType::Int64),
        ("reason", DataType::Utf8),
        ("comment", DataType::Utf8),
        ("flag_state", DataType::Int64),
        ("flag", DataType::Utf8),
    ]);
    rows_to_table(schema, &rows)
}

#[derive(Serialize)]
struct LeaderRow<'a> {
    start_lap: Option<i64>,
    end_lap: Option<i64>,
    car_number: Option<&'a str>,
    driver_name: Option<&'a str>,
}

/// Leader segments with the leader's name looked up by car number in the
/// results.
pub fn lead_changes(feed: &WeekendFeed) -> Result<Table, Error> {
    let rows: Vec<LeaderRow<'_>> = feed
        .race()
        .map(|w| {
            let by_car: HashMap<&str, &str> = w
                .results
                .iter()
                .filter_map(|r| Some((r.car_number.as_deref()?, r.driver_fullname.as_deref()?)))
                .collect();
            w.race_leaders
                .iter()
                .map(|l| LeaderRow {
                    start_lap: l.start_lap,
                    end_lap: l.end_lap,
                    car_number: l.car_number.as_deref(),
                    driver_name: l.car_number.as_deref().and_then(|car| by_car.get(car).copied()),
                })
                .collect()
        })
        .unwrap_or_default();

    let schema = schema(&[
        ("start_lap", DataType::Int64),
        ("end_lap", DataType::Int64),
        ("car_number", DataType::Utf8),
        ("driver_name", DataType::Utf8),
    ]);
    rows_to_table(schema, &rows)
}

#[derive(Serialize)]
struct StageRow<'a> {
    driver_id: Option<i64>,
    driver_name: Option<&'a str>,
    car_number: Option<&'a str>,
    position: Option<i64>,
    stage_points: Option<i64>,
}

/// Results of stage `stage` (1-based). The feed lists only the
/// point-paying positions.
pub fn stage_results(feed: &WeekendFeed, stage: i64) -> Result<Table, Error> {
    let rows: Vec<StageRow<'_>> = feed
        .race()
        .into_iter()
        .flat_map(|w| w.stage_results.iter())
        .filter(|s| s.stage_number == Some(stage))
        .flat_map(|s| s.results.iter())
        .map(|e| StageRow {
            driver_id: e.driver_id,
            driver_name: e.driver_fullname.as_deref(),
            car_number: e.car_number.as_deref(),
            position: e.finishing_position,
            stage_points: e.stage_points,
        })
        .collect();

    let schema = schema(&[
        ("driver_id", DataType::Int64),
        ("driver_name", DataType::Utf8),
        ("car_number", DataType::Utf8),
        ("position", DataType::Int64),
        ("stage_points", DataType::Int64),
    ]);
    rows_to_table(schema, &rows)
}

#[derive(Serialize)]
struct SessionRow<'a> {
    driver_id: Option<i64>,
    driver_name: Option<&'a str>,
    manufacturer: Option<&'a str>,
    position: Option<i64>,
    lap_time: Option<f64>,
    speed: Option<f64>,
    total_laps: Option<i64>,
    delta_to_leader: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    practice_number: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    qualifying_round: Option<i64>,
}

fn session_rows<'a>(
    run: &'a WeekendRun, practice_number: Option<i64>, qualifying_round: Option<i64>,
) -> Vec<SessionRow<'a>> {
    let mut entries: Vec<&RunEntry> = run.results.iter().collect();
    entries.sort_by_key(|e| e.finishing_position.unwrap_or(i64::MAX));
    entries
        .into_iter()
        .map(|e| SessionRow {
            driver_id: e.driver_id,
            driver_name: e.driver_name.as_deref(),
            manufacturer: e.manufacturer.as_deref(),
            position: e.finishing_position,
            lap_time: e.best_lap_time,
            speed: e.best_lap_speed,
            total_laps: e.laps_completed,
            delta_to_leader: e.delta_leader,
            practice_number,
            qualifying_round,
        })
        .collect()
}

fn run_name(run: &WeekendRun) -> String {
    run.run_name.as_deref().unwrap_or_default().to_lowercase()
}

/// Practice session number from a run name: `practice 1`..`practice 3`
/// map to 1..3 and `final practice` to 4. Any other practice run is 1.
pub fn practice_number(name: &str) -> i64 {
    let name = name.to_lowercase();
    if name.contains("final practice") {
        4
    } else if name.contains("practice 3") {
        3
    } else if name.contains("practice 2") {
        2
    } else {
        1
    }
}

/// Qualifying round from a run name: 1 for `round 1`, 2 for `final round`.
pub fn qualifying_round(name: &str) -> Option<i64> {
    let name = name.to_lowercase();
    if name.contains("round 1") {
        Some(1)
    } else if name.contains("final round") {
        Some(2)
    } else {
        None
    }
}

const SESSION_COLUMNS: [(&str, DataType); 8] = [
    ("driver_id", DataType::Int64),
    ("driver_name", DataType::Utf8),
    ("manufacturer", DataType::Utf8),
    ("position", DataType::Int64),
    ("lap_time", DataType::Float64),
    ("speed", DataType::Float64),
    ("total_laps", DataType::Int64),
    ("delta_to_leader", DataType::Float64),
];

/// Every practice session of the weekend, each sorted by position.
pub fn practice(feed: &WeekendFeed) -> Result<Table, Error> {
    let rows: Vec<SessionRow<'_>> = feed
        .weekend_runs
        .iter()
        .filter(|run| run_name(run).contains("practice"))
        .flat_map(|run| session_rows(run, Some(practice_number(&run_name(run))), None))
        .collect();

    let mut columns = SESSION_COLUMNS.to_vec();
    columns.push(("practice_number", DataType::Int64));
    rows_to_table(schema(&columns), &rows)
}

/// Every qualifying session of the weekend, each sorted by position.
pub fn qualifying(feed: &WeekendFeed) -> Result<Table, Error> {
    let rows: Vec<SessionRow<'_>> = feed
        .weekend_runs
        .iter()
        .filter(|run| run_name(run).contains("qualifying"))
        .flat_map(|run| session_rows(run, None, qualifying_round(&run_name(run))))
        .collect();

    let mut columns = SESSION_COLUMNS.to_vec();
    columns.push(("qualifying_round", DataType::Int64));
    rows_to_table(schema(&columns), &rows)
}

/// Driver id to name, read back from a `results` table.
pub fn driver_names(results: &Table) -> Result<HashMap<i64, String>, Error> {
    let (Some(ids), Some(names)) = (int_column(results, "driver_id")?, string_column(results, "driver")?) else {
        return Ok(HashMap::new());
    };
    Ok(ids
        .into_iter()
        .zip(names)
        .filter_map(|(id, name)| Some((id?, name?)))
        .collect())
}
