//! Configuration types for series and tournament play
//!
//! Level 4 - Utilities and configuration

use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Context};
use conquest_core::{Agent, DeterministicAi, MatchConfig, PlacementMode, RngMode, Seat, StupidAi};
use serde::{Deserialize, Serialize};

/// Safety net for runaway matches
const DEFAULT_MAX_TURNS: u64 = 100_000;

/// Bundled agent strategies
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    /// Random picks, attacks anything weaker
    #[default]
    Stupid,
    /// Fixed heuristics, no randomness
    Deterministic,
}

impl AgentKind {
    pub const ALL: [AgentKind; 2] = [AgentKind::Stupid, AgentKind::Deterministic];

    pub fn as_str(self) -> &'static str {
        match self {
            AgentKind::Stupid => "stupid",
            AgentKind::Deterministic => "deterministic",
        }
    }

    /// Create an agent for a seat
    pub fn build(self, seat: Seat) -> Box<dyn Agent> {
        match self {
            AgentKind::Stupid => Box::new(StupidAi::new(seat)),
            AgentKind::Deterministic => Box::new(DeterministicAi::new(seat)),
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stupid" | "stupidai" | "random" => Ok(AgentKind::Stupid),
            "deterministic" | "deterministicai" | "det" => Ok(AgentKind::Deterministic),
            other => bail!(
                "Unknown agent '{}' (expected one of: stupid, deterministic)",
                other
            ),
        }
    }
}

/// Expand lineup specs such as `stupid*3 deterministic` into one kind per seat
pub fn parse_lineup<S: AsRef<str>>(specs: &[S]) -> anyhow::Result<Vec<AgentKind>> {
    let mut lineup = Vec::new();
    for spec in specs {
        let spec = spec.as_ref();
        let (name, count) = match spec.split_once('*') {
            Some((name, count)) => {
                let count: usize = count
                    .trim()
                    .parse()
                    .with_context(|| format!("Invalid repeat count in '{}'", spec))?;
                (name, count)
            }
            None => (spec, 1),
        };
        let kind: AgentKind = name.parse()?;
        lineup.extend(std::iter::repeat(kind).take(count));
    }
    Ok(lineup)
}

/// Seat names for a lineup: `stupid-1`, `deterministic-2`, ...
pub fn seat_names(lineup: &[AgentKind]) -> Vec<String> {
    lineup
        .iter()
        .enumerate()
        .map(|(i, kind)| format!("{}-{}", kind, i + 1))
        .collect()
}

/// Settings shared by every game of a series
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesConfig {
    /// Number of games
    pub games: usize,
    /// Game `i` is seeded with `base_seed + i`
    pub base_seed: u32,
    /// Whether to run games in parallel
    pub parallel: bool,
    /// Turn cap per game
    pub max_turns: Option<u64>,
    pub placement: PlacementMode,
    pub rng_mode: RngMode,
}

impl Default for SeriesConfig {
    fn default() -> Self {
        Self {
            games: 10,
            base_seed: 42,
            parallel: true,
            max_turns: Some(DEFAULT_MAX_TURNS),
            placement: PlacementMode::Draft,
            rng_mode: RngMode::Reference,
        }
    }
}

impl SeriesConfig {
    /// Create config with the given number of games
    pub fn new(games: usize) -> Self {
        Self {
            games,
            ..Default::default()
        }
    }

    pub fn with_seed(mut self, base_seed: u32) -> Self {
        self.base_seed = base_seed;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_max_turns(mut self, max_turns: Option<u64>) -> Self {
        self.max_turns = max_turns;
        self
    }

    pub fn with_placement(mut self, placement: PlacementMode) -> Self {
        self.placement = placement;
        self
    }

    /// Match settings for one game, seeded by `seed`
    pub fn match_config(&self, seed: u32) -> MatchConfig {
        MatchConfig {
            seed: Some(seed),
            placement: self.placement,
            rng_mode: self.rng_mode,
            max_turns: self.max_turns,
        }
    }
}

/// Tournament configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TournamentConfig {
    /// Games per head-to-head pairing
    pub games_per_match: usize,
    /// Settings for each pairing's series; `series.games` is ignored
    pub series: SeriesConfig,
}

impl Default for TournamentConfig {
    fn default() -> Self {
        Self {
            games_per_match: 10,
            series: SeriesConfig::default(),
        }
    }
}

impl TournamentConfig {
    /// Create round-robin tournament config
    pub fn round_robin(games_per_match: usize) -> Self {
        Self {
            games_per_match,
            ..Default::default()
        }
    }

    pub fn with_series(mut self, series: SeriesConfig) -> Self {
        self.series = series;
        self
    }

    /// Series settings for one pairing
    pub fn pairing_series(&self) -> SeriesConfig {
        SeriesConfig {
            games: self.games_per_match,
            ..self.series.clone()
        }
    }
}
