//! Command-line surface for `pitlane`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use pitlane_client::Series;

#[derive(Parser, Debug)]
#[command(name = "pitlane", version, about = "NASCAR race data with a local table cache", long_about = None)]
pub struct Cli {
    /// Cache root directory
    #[arg(long, global = true)]
    pub cache_dir: Option<PathBuf>,

    /// Table format for cache reads and writes (csv or parquet)
    #[arg(long, global = true)]
    pub format: Option<String>,

    /// Bypass the table cache entirely
    #[arg(long, global = true, default_value_t = false)]
    pub no_cache: bool,

    /// Print JSON instead of text
    #[arg(long, global = true, default_value_t = false)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load every table of one race through the cache
    Race(RaceArgs),
    /// Finished and remaining races of one season
    Schedule(ScheduleArgs),
    /// Inspect or clear cached tables
    Cache(CacheArgs),
}

#[derive(Args, Debug)]
pub struct RaceArgs {
    pub year: i32,
    /// Series id or name (cup, xfinity, truck)
    #[arg(value_parser = parse_series)]
    pub series: i64,
    pub race_id: i64,
    /// Ignore cached tables and fetch every feed again
    #[arg(long, default_value_t = false)]
    pub reload: bool,
    /// Read the live feeds of a race in progress (never cached)
    #[arg(long, default_value_t = false)]
    pub live: bool,
}

#[derive(Args, Debug)]
pub struct ScheduleArgs {
    pub year: i32,
    /// Series id or name (cup, xfinity, truck)
    #[arg(value_parser = parse_series)]
    pub series: i64,
    /// Ignore the cached schedule
    #[arg(long, default_value_t = false)]
    pub reload: bool,
}

#[derive(Args, Debug)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub action: CacheCmd,
}

/// A cache entry: logical key plus disambiguating parameters.
#[derive(Args, Debug, Clone)]
pub struct EntryArgs {
    pub key: String,
    /// Parameter as name=value; repeatable. year, series_id and race_id
    /// together select the race layout.
    #[arg(long = "param", value_parser = parse_param)]
    pub params: Vec<(String, String)>,
}

#[derive(Subcommand, Debug)]
pub enum CacheCmd {
    /// Print the file path backing an entry
    Path(EntryArgs),
    /// Report whether an entry is on disk
    Exists(EntryArgs),
    /// Delete one entry
    Clear(EntryArgs),
    /// Delete every table of one race and prune emptied directories
    ClearRace { year: String, series_id: String, race_id: String },
}

fn parse_series(raw: &str) -> Result<i64, String> {
    raw.parse::<Series>().map(|s| s.id())
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("parameter name is empty in '{raw}'"));
    }
    Ok((name.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_param() {
        assert_eq!(parse_param("year=2024").unwrap(), ("year".into(), "2024".into()));
        assert_eq!(parse_param("note=a=b").unwrap(), ("note".into(), "a=b".into()));
        assert!(parse_param("year").is_err());
        assert!(parse_param("=2024").is_err());
    }

    #[test]
    fn test_race_command() {
        let cli = Cli::try_parse_from(["pitlane", "race", "2024", "cup", "5314", "--reload"]).unwrap();
        match cli.command {
            Commands::Race(args) => {
                assert_eq!((args.year, args.series, args.race_id), (2024, 1, 5314));
                assert!(args.reload);
                assert!(!args.live);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_series_rejected() {
        assert!(Cli::try_parse_from(["pitlane", "schedule", "2024", "arca"]).is_err());
    }

    #[test]
    fn test_cache_path_with_params_and_global_format() {
        let cli = Cli::try_parse_from([
            "pitlane", "cache", "path", "results", "--param", "year=2024", "--param", "series_id=1", "--format",
            "parquet",
        ])
        .unwrap();
        assert_eq!(cli.format.as_deref(), Some("parquet"));
        match cli.command {
            Commands::Cache(CacheArgs { action: CacheCmd::Path(entry) }) => {
                assert_eq!(entry.key, "results");
                assert_eq!(entry.params.len(), 2);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
