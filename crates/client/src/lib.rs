//! Client code for pitlane.
//!
//! This crate provides the NASCAR feed client, normalization of feed
//! payloads into tables, and cache-through loaders for races and season
//! schedules. Caching itself lives in `pitlane-core`.

pub mod api;
pub mod codes;
pub mod race;
pub mod schedule;
pub mod tables;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{ApiError, CacherClient, ClientConfig, FeedSource, RaceRef};
pub use codes::{FlagState, Series};
pub use race::{Feed, RaceData, RaceLoader};
pub use schedule::{Schedule, ScheduleLoader, ScheduledRace};
