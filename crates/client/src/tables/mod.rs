//! Feed payloads to tables.
//!
//! One pure function per cached artifact. Column names are snake_case and
//! every column is nullable; types are fixed per artifact so a table
//! fetched today and one fetched next season line up.

pub mod columns;
pub mod laps;
pub mod loops;
pub mod weekend;

pub use columns::{filter_eq_int, float_column, int_column, string_column};
pub use laps::{lap_notes, lap_times, pit_stops};
pub use loops::driver_stats;
pub use weekend::{cautions, driver_names, lead_changes, practice, qualifying, race_info, results, stage_results};

pub const LAP_TIMES: &str = "lap_times";
pub const PIT_STOPS: &str = "pit_stops";
pub const LAP_NOTES: &str = "lap_notes";
pub const RACE_INFO: &str = "race_info";
pub const RESULTS: &str = "results";
pub const CAUTIONS: &str = "cautions";
pub const LEAD_CHANGES: &str = "lead_changes";
pub const STAGE_RESULTS: [&str; 3] = ["stage_1_results", "stage_2_results", "stage_3_results"];
pub const PRACTICE: &str = "practice";
pub const QUALIFYING: &str = "qualifying";
pub const DRIVER_STATS: &str = "driver_stats";
pub const SCHEDULE: &str = "schedule";
