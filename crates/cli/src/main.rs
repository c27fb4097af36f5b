//! pitlane command-line entry point.
//!
//! Loads configuration, builds the table store and feed client, and runs
//! one subcommand. Logging goes to stderr so stdout carries only command
//! output.

use anyhow::{Context, Result};
use clap::Parser;
use pitlane_client::{CacherClient, ClientConfig, RaceLoader, ScheduleLoader};
use pitlane_core::{AppConfig, TableStore};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

mod args;
mod commands;

use args::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();
    let config = settings(&cli)?;
    let store = TableStore::new(config.cache());

    tracing::debug!("cache root {} (active: {})", store.root().display(), store.config().is_active());

    match cli.command {
        Commands::Race(args) => {
            let loader = RaceLoader::new(client(&config)?, store);
            print(cli.json, &commands::race::run(&loader, &args).await?)?;
        }
        Commands::Schedule(args) => {
            let loader = ScheduleLoader::new(client(&config)?, store);
            print(cli.json, &commands::schedule::run(&loader, &args).await?)?;
        }
        Commands::Cache(args) => {
            print(cli.json, &commands::cache::run(&store, args.action)?)?;
        }
    }

    Ok(())
}

/// Layered configuration with command-line overrides on top.
fn settings(cli: &Cli) -> Result<AppConfig> {
    let mut config = AppConfig::load().context("failed to load configuration")?;
    if let Some(dir) = &cli.cache_dir {
        config.cache_dir = dir.clone();
    }
    if let Some(format) = &cli.format {
        config.default_format = format.clone();
    }
    if cli.no_cache {
        config.cache_enabled = false;
    }
    Ok(config)
}

fn client(config: &AppConfig) -> Result<CacherClient> {
    CacherClient::new(ClientConfig::from(config)).context("failed to build feed client")
}

fn print<T: Serialize + std::fmt::Display>(json: bool, output: &T) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(output)?);
    } else {
        let text = output.to_string();
        if text.ends_with('\n') { print!("{text}") } else { println!("{text}") }
    }
    Ok(())
}
