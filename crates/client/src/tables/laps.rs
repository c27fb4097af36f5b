//! Per-lap feeds: lap times, pit stops and lap notes.

use arrow::datatypes::DataType;
use pitlane_core::table::{rows_to_table, schema};
use pitlane_core::{Error, Table};
use serde::Serialize;

use crate::api::{LapNotesFeed, LapTimesFeed, PitStopEntry};
use crate::codes::flag_name;

#[derive(Serialize)]
struct LapTimeRow<'a> {
    driver: Option<&'a str>,
    car_number: Option<&'a str>,
    manufacturer: Option<&'a str>,
    lap: Option<i64>,
    lap_time: Option<f64>,
    lap_speed: Option<f64>,
    position: Option<i64>,
}

/// One row per car per lap. `lap_time` is in seconds.
pub fn lap_times(feed: &LapTimesFeed) -> Result<Table, Error> {
    let rows: Vec<LapTimeRow<'_>> = feed
        .laps
        .iter()
        .flat_map(|car| {
            car.laps.iter().map(move |lap| LapTimeRow {
                driver: car.full_name.as_deref(),
                car_number: car.number.as_deref(),
                manufacturer: car.manufacturer.as_deref(),
                lap: lap.lap,
                lap_time: lap.lap_time,
                lap_speed: lap.lap_speed,
                position: lap.running_pos,
            })
        })
        .collect();

    let schema = schema(&[
        ("driver", DataType::Utf8),
        ("car_number", DataType::Utf8),
        ("manufacturer", DataType::Utf8),
        ("lap", DataType::Int64),
        ("lap_time", DataType::Float64),
        ("lap_speed", DataType::Float64),
        ("position", DataType::Int64),
    ]);
    rows_to_table(schema, &rows)
}

#[derive(Serialize)]
struct PitStopRow<'a> {
    driver: Option<&'a str>,
    lap: Option<i64>,
    manufacturer: Option<&'a str>,
    pit_in_flag_status: Option<i64>,
    pit_out_flag_status: Option<i64>,
    pit_in_race_time: Option<f64>,
    pit_out_race_time: Option<f64>,
    total_duration: Option<f64>,
    box_stop_race_time: Option<f64>,
    box_leave_race_time: Option<f64>,
    pit_stop_duration: Option<f64>,
    in_travel_duration: Option<f64>,
    out_travel_duration: Option<f64>,
    pit_stop_type: Option<&'a str>,
    left_front_tire_changed: Option<bool>,
    left_rear_tire_changed: Option<bool>,
    right_front_tire_changed: Option<bool>,
    right_rear_tire_changed: Option<bool>,
    previous_lap_time: Option<f64>,
    next_lap_time: Option<f64>,
    pit_in_rank: Option<i64>,
    pit_out_rank: Option<i64>,
    positions_gained_lost: Option<i64>,
}

impl<'a> From<&'a PitStopEntry> for PitStopRow<'a> {
    fn from(e: &'a PitStopEntry) -> Self {
        Self {
            driver: e.driver_name.as_deref(),
            lap: e.lap_count,
            manufacturer: e.vehicle_manufacturer.as_deref(),
            pit_in_flag_status: e.pit_in_flag_status,
            pit_out_flag_status: e.pit_out_flag_status,
            pit_in_race_time: e.pit_in_race_time,
            pit_out_race_time: e.pit_out_race_time,
            total_duration: e.total_duration,
            box_stop_race_time: e.box_stop_race_time,
            box_leave_race_time: e.box_leave_race_time,
            pit_stop_duration: e.pit_stop_duration,
            in_travel_duration: e.in_travel_duration,
            out_travel_duration: e.out_travel_duration,
            pit_stop_type: e.pit_stop_type.as_deref(),
            left_front_tire_changed: e.left_front_tire_changed,
            left_rear_tire_changed: e.left_rear_tire_changed,
            right_front_tire_changed: e.right_front_tire_changed,
            right_rear_tire_changed: e.right_rear_tire_changed,
            previous_lap_time: e.previous_lap_time,
            next_lap_time: e.next_lap_time,
            pit_in_rank: e.pit_in_rank,
            pit_out_rank: e.pit_out_rank,
            positions_gained_lost: e.positions_gained_lost,
        }
    }
}

/// One row per stop, in feed order. Durations and race times are seconds.
pub fn pit_stops(stops: &[PitStopEntry]) -> Result<Table, Error> {
    let rows: Vec<PitStopRow<'_>> = stops.iter().map(PitStopRow::from).collect();

    let schema = schema(&[
        ("driver", DataType::Utf8),
        ("lap", DataType::Int64),
        ("manufacturer", DataType::Utf8),
        ("pit_in_flag_status", DataType::Int64),
        ("pit_out_flag_status", DataType::Int64),
        ("pit_in_race_time", DataType::Float64),
        ("pit_out_race_time", DataType::Float64),
        ("total_duration", DataType::Float64),
        ("box_stop_race_time", DataType::Float64),
        ("box_leave_race_time", DataType::Float64),
        ("pit_stop_duration", DataType::Float64),
        ("in_travel_duration", DataType::Float64),
        ("out_travel_duration", DataType::Float64),
        ("pit_stop_type", DataType::Utf8),
        ("left_front_tire_changed", DataType::Boolean),
        ("left_rear_tire_changed", DataType::Boolean),
        ("right_front_tire_changed", DataType::Boolean),
        ("right_rear_tire_changed", DataType::Boolean),
        ("previous_lap_time", DataType::Float64),
        ("next_lap_time", DataType::Float64),
        ("pit_in_rank", DataType::Int64),
        ("pit_out_rank", DataType::Int64),
        ("positions_gained_lost", DataType::Int64),
    ]);
    rows_to_table(schema, &rows)
}

#[derive(Serialize)]
struct LapNoteRow<'a> {
    lap: Option<i64>,
    flag_state: Option<i64>,
    flag: Option<String>,
    note: Option<&'a str>,
    driver_ids: Option<String>,
}

/// One row per note, ordered by lap. `driver_ids` is comma-joined.
pub fn lap_notes(feed: &LapNotesFeed) -> Result<Table, Error> {
    let mut rows: Vec<LapNoteRow<'_>> = feed
        .laps
        .iter()
        .flat_map(|(lap, notes)| {
            let lap = lap.trim().parse::<i64>().ok();
            notes.iter().map(move |n| LapNoteRow {
                lap,
                flag_state: n.flag_state,
                flag: flag_name(n.flag_state),
                note: n.note.as_deref(),
                driver_ids: n
                    .driver_ids
                    .as_ref()
                    .map(|ids| ids.iter().map(i64::to_string).collect::<Vec<_>>().join(",")),
            })
        })
        .collect();
    // map keys sort as text ("10" < "2")
    rows.sort_by_key(|r| r.lap.unwrap_or(i64::MAX));

    let schema = schema(&[
        ("lap", DataType::Int64),
        ("flag_state", DataType::Int64),
        ("flag", DataType::Utf8),
        ("note", DataType::Utf8),
        ("driver_ids", DataType::Utf8),
    ]);
    rows_to_table(schema, &rows)
}
