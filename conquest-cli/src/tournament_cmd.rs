//! Tournament command - round-robin between agent kinds

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;

use conquest_tournament::{parse_lineup, run_tournament, SeriesConfig, TournamentConfig, TournamentResult};

#[derive(Args)]
pub struct TournamentArgs {
    /// Games per pairing
    #[arg(short = 'g', long, default_value = "10")]
    pub games: usize,

    /// Seed of each pairing's first game
    #[arg(long, default_value = "42")]
    pub seed: u32,

    /// Play pairings one after another
    #[arg(long)]
    pub sequential: bool,

    /// JSON map file (defaults to the classic map)
    #[arg(long, value_name = "FILE")]
    pub map: Option<PathBuf>,

    /// Turn cap per game
    #[arg(long, default_value = "100000")]
    pub max_turns: u64,

    /// Participating agent kinds; `stupid*2` enters a kind twice
    #[arg(required = true, value_name = "KINDS")]
    pub kinds: Vec<String>,
}

/// Run tournament command
pub fn run(args: TournamentArgs) -> Result<()> {
    let kinds = parse_lineup(&args.kinds)?;
    if kinds.len() < 2 {
        bail!("A tournament needs at least two participants");
    }
    let world = crate::load_world(args.map.as_deref())?;

    let config = TournamentConfig::round_robin(args.games).with_series(
        SeriesConfig::default()
            .with_seed(args.seed)
            .with_parallel(!args.sequential)
            .with_max_turns(Some(args.max_turns)),
    );

    let result = run_tournament(&world, &kinds, &config)?;
    print_standings(&result);
    Ok(())
}

fn print_standings(result: &TournamentResult) {
    println!(
        "{:<4} {:<16} {:>6} {:>6} {:>6} {:>8} {:>10}",
        "#", "agent", "wins", "losses", "draws", "win %", "avg turns"
    );
    for (rank, standing) in result.standings.iter().enumerate() {
        println!(
            "{:<4} {:<16} {:>6} {:>6} {:>6} {:>7.1}% {:>10.1}",
            rank + 1,
            format!("{}-{}", standing.kind, standing.index + 1),
            standing.wins,
            standing.losses,
            standing.draws,
            standing.win_rate() * 100.0,
            standing.avg_turns
        );
    }
}
