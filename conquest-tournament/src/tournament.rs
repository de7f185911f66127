//! Tournament execution - round-robin between agent kinds
//!
//! Level 1 - Orchestration and Level 2 - Phases

use conquest_core::World;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::{AgentKind, TournamentConfig};
use crate::match_play::{play_series, SeriesResult};

/// Standing of a participant in the tournament
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Standing {
    /// Index of the participant in the original list
    pub index: usize,
    pub kind: AgentKind,
    /// Total score (wins + 0.5 * draws)
    pub score: f32,
    pub wins: u32,
    pub losses: u32,
    /// Games without a winner
    pub draws: u32,
    pub games_played: u32,
    /// Average game length in turns
    pub avg_turns: f32,
}

impl Standing {
    /// Win rate
    pub fn win_rate(&self) -> f32 {
        if self.games_played == 0 {
            0.0
        } else {
            self.wins as f32 / self.games_played as f32
        }
    }

    /// Normalized score (0.0 to 1.0)
    pub fn normalized_score(&self) -> f32 {
        if self.games_played == 0 {
            0.0
        } else {
            self.score / self.games_played as f32
        }
    }
}

/// One head-to-head series; `first` sat in seat 0
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pairing {
    pub first: usize,
    pub second: usize,
    pub result: SeriesResult,
}

/// Result of a tournament
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TournamentResult {
    /// Final standings, most wins first
    pub standings: Vec<Standing>,
    /// Every pairing in schedule order
    pub pairings: Vec<Pairing>,
}

impl TournamentResult {
    /// Get winner (top standing)
    pub fn winner(&self) -> Option<&Standing> {
        self.standings.first()
    }

    /// Get top N performers
    pub fn top_n(&self, n: usize) -> &[Standing] {
        let n = n.min(self.standings.len());
        &self.standings[..n]
    }

    /// Get standing for a participant index
    pub fn standing_for(&self, index: usize) -> Option<&Standing> {
        self.standings.iter().find(|s| s.index == index)
    }
}

// ============================================================================
// Level 1 - Orchestration
// ============================================================================

/// Run a round-robin tournament (Level 1 orchestration)
///
/// Every pair of participants plays `games_per_match` two-player games.
/// A kind may appear more than once; each appearance is its own participant.
pub fn run_tournament(
    world: &World,
    kinds: &[AgentKind],
    config: &TournamentConfig,
) -> anyhow::Result<TournamentResult> {
    let schedule = generate_round_robin_pairings(kinds.len());
    info!(
        participants = kinds.len(),
        pairings = schedule.len(),
        games_per_match = config.games_per_match,
        "Starting tournament"
    );

    let pairings = execute_all_matches(world, kinds, &schedule, config)?;
    let standings = compute_standings(kinds, &pairings);

    if let Some(top) = standings.first() {
        info!(winner = %top.kind, wins = top.wins, "Tournament complete");
    }

    Ok(TournamentResult {
        standings,
        pairings,
    })
}

// ============================================================================
// Level 2 - Phases
// ============================================================================

/// Play every scheduled pairing, in parallel when configured
fn execute_all_matches(
    world: &World,
    kinds: &[AgentKind],
    schedule: &[(usize, usize)],
    config: &TournamentConfig,
) -> anyhow::Result<Vec<Pairing>> {
    if config.series.parallel {
        schedule
            .par_iter()
            .map(|&(i, j)| execute_match(world, kinds, i, j, config))
            .collect()
    } else {
        schedule
            .iter()
            .map(|&(i, j)| execute_match(world, kinds, i, j, config))
            .collect()
    }
}

// ============================================================================
// Level 3 - Steps
// ============================================================================

/// Generate all pairings for round-robin
fn generate_round_robin_pairings(n: usize) -> Vec<(usize, usize)> {
    let mut pairings = Vec::new();
    for i in 0..n {
        for j in (i + 1)..n {
            pairings.push((i, j));
        }
    }
    pairings
}

/// Play one head-to-head series
fn execute_match(
    world: &World,
    kinds: &[AgentKind],
    first: usize,
    second: usize,
    config: &TournamentConfig,
) -> anyhow::Result<Pairing> {
    let lineup = [kinds[first], kinds[second]];
    let result = play_series(world, &lineup, &config.pairing_series())?;
    Ok(Pairing {
        first,
        second,
        result,
    })
}

/// Compute final standings from pairing results
fn compute_standings(kinds: &[AgentKind], pairings: &[Pairing]) -> Vec<Standing> {
    let mut standings: Vec<Standing> = kinds
        .iter()
        .enumerate()
        .map(|(index, &kind)| Standing {
            index,
            kind,
            score: 0.0,
            wins: 0,
            losses: 0,
            draws: 0,
            games_played: 0,
            avg_turns: 0.0,
        })
        .collect();

    let mut total_turns = vec![0f32; kinds.len()];

    for pairing in pairings {
        let result = &pairing.result;
        let seats = [(pairing.first, 0, 1), (pairing.second, 1, 0)];
        for (participant, own, other) in seats {
            let standing = &mut standings[participant];
            standing.wins += result.seat_wins[own];
            standing.losses += result.seat_wins[other];
            standing.draws += result.no_winner;
            standing.games_played += result.games_played;
            total_turns[participant] += result.avg_turns * result.games_played as f32;
        }
    }

    for standing in &mut standings {
        standing.score = standing.wins as f32 + 0.5 * standing.draws as f32;
        if standing.games_played > 0 {
            standing.avg_turns = total_turns[standing.index] / standing.games_played as f32;
        }
    }

    // Most wins first, then fewer losses; ties keep entry order
    standings.sort_by(|a, b| {
        b.wins
            .cmp(&a.wins)
            .then_with(|| a.losses.cmp(&b.losses))
            .then_with(|| a.index.cmp(&b.index))
    });

    standings
}
