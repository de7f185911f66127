//! Play command - run one match
//!
//! - Level 1: run() - orchestration
//! - Level 2: play_match(), report_outcome()

use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use conquest_core::{JsonLinesSink, MatchConfig, MatchOutcome, PlacementMode, TurnDriver, World};
use conquest_tournament::{parse_lineup, seat_names, AgentKind};

// ============================================================================
// COMMAND ARGUMENTS
// ============================================================================

#[derive(Args)]
pub struct PlayArgs {
    /// Match seed (drawn from entropy when omitted)
    #[arg(long)]
    pub seed: Option<u32>,

    /// Deal territories round-robin instead of drafting them
    #[arg(long)]
    pub deal: bool,

    /// Stream events to stdout as JSON lines
    #[arg(long)]
    pub events: bool,

    /// JSON map file (defaults to the classic map)
    #[arg(long, value_name = "FILE")]
    pub map: Option<PathBuf>,

    /// Stop after this many turns, placement included
    #[arg(long)]
    pub max_turns: Option<u64>,

    /// Agent kinds, one per seat; `stupid*3` repeats a kind
    #[arg(required = true, value_name = "PLAYERS")]
    pub players: Vec<String>,
}

impl PlayArgs {
    fn match_config(&self) -> MatchConfig {
        MatchConfig {
            seed: self.seed,
            placement: if self.deal {
                PlacementMode::Deal
            } else {
                PlacementMode::Draft
            },
            max_turns: self.max_turns,
            ..Default::default()
        }
    }
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run play command
pub fn run(args: PlayArgs) -> Result<()> {
    let lineup = parse_lineup(&args.players)?;
    let world = crate::load_world(args.map.as_deref())?;

    let outcome = play_match(world, &lineup, &args)?;
    report_outcome(&outcome, args.events);
    Ok(())
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

fn play_match(world: World, lineup: &[AgentKind], args: &PlayArgs) -> Result<MatchOutcome> {
    let mut driver = TurnDriver::new(world, seat_names(lineup), args.match_config(), |seat| {
        lineup[seat.player.0].build(seat)
    })
    .context("Failed to set up match")?;

    if !args.events {
        return Ok(driver.play());
    }

    let stdout = std::io::stdout();
    let mut sink = JsonLinesSink::new(BufWriter::new(stdout.lock()));
    let outcome = driver.play_with(&mut sink);
    sink.into_inner()
        .flush()
        .context("Failed to flush event stream")?;
    Ok(outcome)
}

/// Print the result; with an event stream on stdout it goes to the log instead
fn report_outcome(outcome: &MatchOutcome, events: bool) {
    let line = match &outcome.winner {
        Some(name) => format!(
            "Winner: {} after {} turns (seed {})",
            name, outcome.turns, outcome.seed
        ),
        None => format!(
            "No winner after {} turns (seed {})",
            outcome.turns, outcome.seed
        ),
    };

    if events {
        tracing::info!("{}", line);
    } else {
        println!("{}", line);
    }
}
