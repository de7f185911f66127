//! Conquest CLI - Command-line interface
//!
//! Commands:
//! - play: Run one match and print the winner
//! - series: Play many seeded games with one lineup
//! - tournament: Round-robin between agent kinds
//!
//! Logs go to stderr so stdout stays clean for events and JSON reports.

use std::path::Path;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use conquest_core::{MapDefinition, World};
use tracing_subscriber::EnvFilter;

mod play_cmd;
mod series_cmd;
mod tournament_cmd;

#[derive(Parser)]
#[command(name = "conquest")]
#[command(about = "Territory-conquest match runner")]
struct Cli {
    /// Log filter (overrides RUST_LOG), e.g. `debug` or `conquest_core=trace`
    #[arg(long, global = true, value_name = "FILTER")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a single match
    Play(play_cmd::PlayArgs),
    /// Play a series of seeded games
    Series(series_cmd::SeriesArgs),
    /// Round-robin tournament between agent kinds
    Tournament(tournament_cmd::TournamentArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref())?;

    match cli.command {
        Commands::Play(args) => play_cmd::run(args),
        Commands::Series(args) => series_cmd::run(args),
        Commands::Tournament(args) => tournament_cmd::run(args),
    }
}

/// Install the stderr subscriber; `--log-level`, then RUST_LOG, then `info`
fn init_logging(level: Option<&str>) -> Result<()> {
    let filter = match level {
        Some(level) => EnvFilter::try_new(level)
            .with_context(|| format!("Invalid log filter '{}'", level))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

/// Classic world, or the map file given on the command line
pub(crate) fn load_world(map: Option<&Path>) -> Result<World> {
    let definition = match map {
        Some(path) => MapDefinition::load(path)?,
        None => MapDefinition::classic(),
    };
    definition
        .build()
        .with_context(|| match map {
            Some(path) => format!("Invalid map: {}", path.display()),
            None => "Invalid classic map".to_string(),
        })
}
