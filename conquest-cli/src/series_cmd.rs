//! Series command - many seeded games with one lineup
//!
//! - Level 1: run() - orchestration
//! - Level 2: play(), report_text()
//! - Level 4: progress bar

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};

use conquest_core::{PlacementMode, World};
use conquest_tournament::{parse_lineup, play_series_observed, AgentKind, SeriesConfig, SeriesResult};

#[derive(Args)]
pub struct SeriesArgs {
    /// Number of games
    #[arg(short = 'g', long, default_value = "10")]
    pub games: usize,

    /// Seed of the first game; game i uses seed + i
    #[arg(long, default_value = "42")]
    pub seed: u32,

    /// Run games on all cores
    #[arg(long)]
    pub parallel: bool,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,

    /// Deal territories round-robin instead of drafting them
    #[arg(long)]
    pub deal: bool,

    /// JSON map file (defaults to the classic map)
    #[arg(long, value_name = "FILE")]
    pub map: Option<PathBuf>,

    /// Turn cap per game
    #[arg(long, default_value = "100000")]
    pub max_turns: u64,

    /// Agent kinds, one per seat; `stupid*3` repeats a kind
    #[arg(required = true, value_name = "PLAYERS")]
    pub players: Vec<String>,
}

impl SeriesArgs {
    fn series_config(&self) -> SeriesConfig {
        SeriesConfig::new(self.games)
            .with_seed(self.seed)
            .with_parallel(self.parallel)
            .with_max_turns(Some(self.max_turns))
            .with_placement(if self.deal {
                PlacementMode::Deal
            } else {
                PlacementMode::Draft
            })
    }
}

/// Run series command
pub fn run(args: SeriesArgs) -> Result<()> {
    let lineup = parse_lineup(&args.players)?;
    let world = crate::load_world(args.map.as_deref())?;
    let config = args.series_config();

    tracing::info!(
        "Starting series: {} games, seeds {}..",
        config.games,
        config.base_seed
    );

    let result = play(&world, &lineup, &config)?;

    if args.json {
        let json = serde_json::to_string_pretty(&result).context("Failed to encode result")?;
        println!("{}", json);
    } else {
        report_text(&result);
    }
    Ok(())
}

fn play(world: &World, lineup: &[AgentKind], config: &SeriesConfig) -> Result<SeriesResult> {
    let progress = if config.parallel {
        None
    } else {
        Some(progress_bar(config.games as u64)?)
    };

    let result = play_series_observed(world, lineup, config, |_| {
        if let Some(pb) = &progress {
            pb.inc(1);
        }
    })?;

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }
    Ok(result)
}

fn report_text(result: &SeriesResult) {
    println!("{} games, average {:.1} turns", result.games_played, result.avg_turns);
    for (seat, name) in result.names.iter().enumerate() {
        println!(
            "  {:<20} {:>5} wins ({:.1}%)",
            name,
            result.seat_wins[seat],
            result.win_rate(seat) * 100.0
        );
    }
    println!(
        "  {:<20} {:>5}      ({:.1}%)",
        "no winner",
        result.no_winner,
        result.no_winner_rate() * 100.0
    );
}

fn progress_bar(games: u64) -> Result<ProgressBar> {
    let pb = ProgressBar::new(games);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} games")
            .context("Invalid progress template")?
            .progress_chars("=>-"),
    );
    Ok(pb)
}
