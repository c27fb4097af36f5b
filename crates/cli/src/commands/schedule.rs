//! `pitlane schedule`

use std::fmt;

use pitlane_client::{FeedSource, Schedule, ScheduleLoader, ScheduledRace};
use pitlane_core::Error;
use serde::Serialize;

use crate::args::ScheduleArgs;

#[derive(Debug, Clone, Serialize)]
pub struct RaceLine {
    pub race_id: i64,
    pub race_name: Option<String>,
    pub track_name: Option<String>,
    pub race_date: Option<String>,
}

impl From<&ScheduledRace> for RaceLine {
    fn from(race: &ScheduledRace) -> Self {
        Self {
            race_id: race.race_id,
            race_name: race.race_name.clone(),
            track_name: race.track_name.clone(),
            race_date: race.race_date.map(|d| d.format("%Y-%m-%d %H:%M UTC").to_string()),
        }
    }
}

impl fmt::Display for RaceLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>6}  {:<20}  {} @ {}",
            self.race_id,
            self.race_date.as_deref().unwrap_or("TBD"),
            self.race_name.as_deref().unwrap_or("?"),
            self.track_name.as_deref().unwrap_or("?")
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScheduleOutput {
    pub year: i32,
    pub series_id: i64,
    pub finished: Vec<RaceLine>,
    pub remaining: Vec<RaceLine>,
}

impl From<&Schedule> for ScheduleOutput {
    fn from(schedule: &Schedule) -> Self {
        Self {
            year: schedule.year,
            series_id: schedule.series_id,
            finished: schedule.finished().into_iter().map(RaceLine::from).collect(),
            remaining: schedule.remaining().into_iter().map(RaceLine::from).collect(),
        }
    }
}

impl fmt::Display for ScheduleOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} series {}: {} finished, {} remaining", self.year, self.series_id, self.finished.len(), self.remaining.len())?;
        for (title, races) in [("finished", &self.finished), ("remaining", &self.remaining)] {
            if races.is_empty() {
                continue;
            }
            writeln!(f, "{title}:")?;
            for race in races {
                writeln!(f, "  {race}")?;
            }
        }
        Ok(())
    }
}

pub async fn run<S: FeedSource>(loader: &ScheduleLoader<S>, args: &ScheduleArgs) -> Result<ScheduleOutput, Error> {
    let schedule = loader.load(args.year, args.series, args.reload).await?;
    Ok(ScheduleOutput::from(&schedule))
}
