//! `pitlane race`

use std::fmt;

use pitlane_client::{FeedSource, RaceData, RaceLoader, RaceRef};
use pitlane_core::Error;
use serde::Serialize;

use crate::args::RaceArgs;

#[derive(Debug, Clone, Serialize)]
pub struct TableSummary {
    pub name: String,
    pub rows: usize,
    pub columns: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RaceOutput {
    pub year: i32,
    pub series_id: i64,
    pub race_id: i64,
    pub live: bool,
    pub tables: Vec<TableSummary>,
    pub cached_feeds: Vec<String>,
    pub failed_feeds: Vec<String>,
}

impl From<&RaceData> for RaceOutput {
    fn from(data: &RaceData) -> Self {
        let race = data.race();
        Self {
            year: race.year,
            series_id: race.series_id,
            race_id: race.race_id,
            live: race.live,
            tables: data
                .tables()
                .map(|(name, t)| TableSummary { name: name.to_string(), rows: t.num_rows(), columns: t.num_columns() })
                .collect(),
            cached_feeds: data.cached_feeds().iter().map(ToString::to_string).collect(),
            failed_feeds: data.failed_feeds().iter().map(ToString::to_string).collect(),
        }
    }
}

impl fmt::Display for RaceOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "race {} (series {}, {})", self.race_id, self.series_id, self.year)?;
        let width = self.tables.iter().map(|t| t.name.len()).max().unwrap_or(0);
        for table in &self.tables {
            writeln!(f, "  {:<width$}  {:>6} rows  {:>3} cols", table.name, table.rows, table.columns)?;
        }
        if !self.cached_feeds.is_empty() {
            writeln!(f, "cached: {}", self.cached_feeds.join(", "))?;
        }
        if !self.failed_feeds.is_empty() {
            writeln!(f, "failed: {}", self.failed_feeds.join(", "))?;
        }
        Ok(())
    }
}

pub async fn run<S: FeedSource>(loader: &RaceLoader<S>, args: &RaceArgs) -> Result<RaceOutput, Error> {
    let race = RaceRef::new(args.year, args.series, args.race_id).live(args.live);
    let data = loader.load(&race, args.reload).await?;
    Ok(RaceOutput::from(&data))
}
