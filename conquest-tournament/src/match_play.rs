//! Series play - many seeded games with a fixed lineup
//!
//! Level 2 - Phase-level implementation

use conquest_core::World;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::{seat_names, AgentKind, SeriesConfig};
use crate::game_runner::{GameOutcome, GameRunner};

/// Result of a series (multiple games, same lineup)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SeriesResult {
    /// Agent kind per seat
    pub lineup: Vec<AgentKind>,
    /// Seat names as shown in events
    pub names: Vec<String>,
    /// Wins per seat
    pub seat_wins: Vec<u32>,
    /// Games that ended without a winner
    pub no_winner: u32,
    /// Average game length in turns
    pub avg_turns: f32,
    /// Total games played
    pub games_played: u32,
    /// Individual game outcomes, in seed order
    pub game_outcomes: Vec<GameOutcome>,
}

impl SeriesResult {
    /// Create empty result for a lineup
    pub fn empty(lineup: &[AgentKind]) -> Self {
        Self {
            lineup: lineup.to_vec(),
            names: seat_names(lineup),
            seat_wins: vec![0; lineup.len()],
            no_winner: 0,
            avg_turns: 0.0,
            games_played: 0,
            game_outcomes: Vec::new(),
        }
    }

    /// Tally outcomes in the order given
    pub fn from_outcomes(lineup: &[AgentKind], outcomes: Vec<GameOutcome>) -> Self {
        let mut result = Self::empty(lineup);
        let mut total_turns = 0u64;

        for outcome in &outcomes {
            match outcome.winner {
                Some(seat) if seat < result.seat_wins.len() => result.seat_wins[seat] += 1,
                _ => result.no_winner += 1,
            }
            total_turns += outcome.turns;
        }

        result.games_played = outcomes.len() as u32;
        if result.games_played > 0 {
            result.avg_turns = total_turns as f32 / result.games_played as f32;
        }
        result.game_outcomes = outcomes;
        result
    }

    /// Combine two results for the same lineup
    pub fn combine(&self, other: &SeriesResult) -> SeriesResult {
        let total_games = self.games_played + other.games_played;
        let avg_turns = if total_games > 0 {
            (self.avg_turns * self.games_played as f32
                + other.avg_turns * other.games_played as f32)
                / total_games as f32
        } else {
            0.0
        };

        let seat_wins = self
            .seat_wins
            .iter()
            .zip(&other.seat_wins)
            .map(|(a, b)| a + b)
            .collect();

        let mut game_outcomes = self.game_outcomes.clone();
        game_outcomes.extend(other.game_outcomes.iter().cloned());

        SeriesResult {
            lineup: self.lineup.clone(),
            names: self.names.clone(),
            seat_wins,
            no_winner: self.no_winner + other.no_winner,
            avg_turns,
            games_played: total_games,
            game_outcomes,
        }
    }

    /// Win rate for a seat
    pub fn win_rate(&self, seat: usize) -> f32 {
        if self.games_played == 0 {
            0.0
        } else {
            self.seat_wins.get(seat).copied().unwrap_or(0) as f32 / self.games_played as f32
        }
    }

    /// Share of games that ended without a winner
    pub fn no_winner_rate(&self) -> f32 {
        if self.games_played == 0 {
            0.0
        } else {
            self.no_winner as f32 / self.games_played as f32
        }
    }
}

/// Play a series with one lineup (Level 2 phase)
///
/// Game `i` is seeded with `base_seed + i`. Parallel and sequential runs
/// produce identical results.
pub fn play_series(
    world: &World,
    lineup: &[AgentKind],
    config: &SeriesConfig,
) -> anyhow::Result<SeriesResult> {
    play_series_observed(world, lineup, config, |_| {})
}

/// Play a series, calling `observe` with every finished game
///
/// Sequential runs report each game as it ends. Parallel runs report all
/// games in seed order once the batch is done.
pub fn play_series_observed<F>(
    world: &World,
    lineup: &[AgentKind],
    config: &SeriesConfig,
    mut observe: F,
) -> anyhow::Result<SeriesResult>
where
    F: FnMut(&GameOutcome),
{
    if config.games == 0 {
        return Ok(SeriesResult::empty(lineup));
    }

    let runner = GameRunner::new(world.clone(), lineup.to_vec(), config.clone());
    let seeds = game_seeds(config);

    let outcomes = if config.parallel {
        let outcomes = execute_games_parallel(&runner, &seeds)?;
        outcomes.iter().for_each(&mut observe);
        outcomes
    } else {
        execute_games(&runner, &seeds, &mut observe)?
    };

    let result = SeriesResult::from_outcomes(lineup, outcomes);
    info!(
        games = result.games_played,
        no_winner = result.no_winner,
        avg_turns = result.avg_turns,
        "Series complete"
    );
    Ok(result)
}

/// Seeds for each game of a series (Level 4 utility)
fn game_seeds(config: &SeriesConfig) -> Vec<u32> {
    (0..config.games)
        .map(|i| config.base_seed.wrapping_add(i as u32))
        .collect()
}

/// Execute games sequentially (Level 3 step)
fn execute_games<F>(
    runner: &GameRunner,
    seeds: &[u32],
    observe: &mut F,
) -> anyhow::Result<Vec<GameOutcome>>
where
    F: FnMut(&GameOutcome),
{
    seeds
        .iter()
        .map(|&seed| {
            let outcome = runner.play_seeded(seed)?;
            observe(&outcome);
            Ok(outcome)
        })
        .collect()
}

/// Execute games in parallel (Level 3 step)
///
/// `collect` on an indexed parallel iterator keeps seed order.
fn execute_games_parallel(runner: &GameRunner, seeds: &[u32]) -> anyhow::Result<Vec<GameOutcome>> {
    seeds
        .par_iter()
        .map(|&seed| runner.play_seeded(seed))
        .collect()
}
