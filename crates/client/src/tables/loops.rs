//! Loop data: per-driver position and passing statistics for one race.

use std::collections::HashMap;

use arrow::datatypes::DataType;
use pitlane_core::table::{rows_to_table, schema};
use pitlane_core::{Error, Table};
use serde::Serialize;

use crate::api::LoopStatsRace;

#[derive(Serialize)]
struct DriverStatsRow<'a> {
    driver_id: Option<i64>,
    driver_name: Option<&'a str>,
    start_position: Option<i64>,
    mid_position: Option<i64>,
    position: Option<i64>,
    closing_position: Option<i64>,
    closing_laps_diff: Option<i64>,
    best_position: Option<i64>,
    worst_position: Option<i64>,
    avg_position: Option<f64>,
    passes_green_flag: Option<i64>,
    passing_diff: Option<i64>,
    passed_green_flag: Option<i64>,
    quality_passes: Option<i64>,
    fast_laps: Option<i64>,
    top15_laps: Option<i64>,
    lead_laps: Option<i64>,
    laps: Option<i64>,
    rating: Option<f64>,
}

/// One row per driver. Names come from `names` (driver id to name), since
/// the loop feed carries ids only.
pub fn driver_stats(feed: &[LoopStatsRace], names: &HashMap<i64, String>) -> Result<Table, Error> {
    let rows: Vec<DriverStatsRow<'_>> = feed
        .first()
        .map(|race| {
            race.drivers
                .iter()
                .map(|d| DriverStatsRow {
                    driver_id: d.driver_id,
                    driver_name: d.driver_id.and_then(|id| names.get(&id)).map(String::as_str),
                    start_position: d.start_ps,
                    mid_position: d.mid_ps,
                    position: d.ps,
                    closing_position: d.closing_ps,
                    closing_laps_diff: d.closing_laps_diff,
                    best_position: d.best_ps,
                    worst_position: d.worst_ps,
                    avg_position: d.avg_ps,
                    passes_green_flag: d.passes_gf,
                    passing_diff: d.passing_diff,
                    passed_green_flag: d.passed_gf,
                    quality_passes: d.quality_passes,
                    fast_laps: d.fast_laps,
                    top15_laps: d.top15_laps,
                    lead_laps: d.lead_laps,
                    laps: d.laps,
                    rating: d.rating,
                })
                .collect()
        })
        .unwrap_or_default();

    let schema = schema(&[
        ("driver_id", DataType::Int64),
        ("driver_name", DataType::Utf8),
        ("start_position", DataType::Int64),
        ("mid_position", DataType::Int64),
        ("position", DataType::Int64),
        ("closing_position", DataType::Int64),
        ("closing_laps_diff", DataType::Int64),
        ("best_position", DataType::Int64),
        ("worst_position", DataType::Int64),
        ("avg_position", DataType::Float64),
        ("passes_green_flag", DataType::Int64),
        ("passing_diff", DataType::Int64),
        ("passed_green_flag", DataType::Int64),
        ("quality_passes", DataType::Int64),
        ("fast_laps", DataType::Int64),
        ("top15_laps", DataType::Int64),
        ("lead_laps", DataType::Int64),
        ("laps", DataType::Int64),
        ("rating", DataType::Float64),
    ]);
    rows_to_table(schema, &rows)
}
