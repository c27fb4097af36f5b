//! Subcommand implementations.
//!
//! Each returns a serializable output; `main` prints it as text or JSON.

pub mod cache;
pub mod race;
pub mod schedule;

pub use cache::CacheOutput;
pub use race::RaceOutput;
pub use schedule::ScheduleOutput;
