//! Game runner - executes single matches
//!
//! Level 3 - Step-level implementation

use anyhow::Context;
use conquest_core::{TurnDriver, World};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{seat_names, AgentKind, SeriesConfig};

/// Outcome of a single game
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameOutcome {
    /// Seed the match was played with
    pub seed: u32,
    /// Winning seat index, `None` when no one won
    pub winner: Option<usize>,
    /// Turns consumed, placement included
    pub turns: u64,
}

impl GameOutcome {
    /// Check if the turn cap ended the game
    pub fn is_draw(&self) -> bool {
        self.winner.is_none()
    }

    pub fn won_by(&self, seat: usize) -> bool {
        self.winner == Some(seat)
    }
}

/// Game runner that plays one lineup on one map
pub struct GameRunner {
    world: World,
    lineup: Vec<AgentKind>,
    names: Vec<String>,
    config: SeriesConfig,
    /// Seed for the next game
    seed_counter: u32,
}

impl GameRunner {
    /// Create a new game runner; seeds start at `config.base_seed`
    pub fn new(world: World, lineup: Vec<AgentKind>, config: SeriesConfig) -> Self {
        let names = seat_names(&lineup);
        let seed_counter = config.base_seed;
        Self {
            world,
            lineup,
            names,
            config,
            seed_counter,
        }
    }

    pub fn lineup(&self) -> &[AgentKind] {
        &self.lineup
    }

    /// Seat names in lineup order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn config(&self) -> &SeriesConfig {
        &self.config
    }

    /// Play the next game, advancing the seed counter
    pub fn play_game(&mut self) -> anyhow::Result<GameOutcome> {
        let seed = self.next_seed();
        self.play_seeded(seed)
    }

    /// Play one game with an explicit seed
    pub fn play_seeded(&self, seed: u32) -> anyhow::Result<GameOutcome> {
        let lineup = &self.lineup;
        let mut driver = TurnDriver::new(
            self.world.clone(),
            self.names.clone(),
            self.config.match_config(seed),
            |seat| lineup[seat.player.0].build(seat),
        )
        .with_context(|| format!("Failed to set up game with seed {}", seed))?;

        let result = driver.play();
        let winner = result
            .winner
            .as_deref()
            .and_then(|name| self.names.iter().position(|n| n == name));

        debug!(seed, turns = result.turns, winner = ?result.winner, "Game finished");

        Ok(GameOutcome {
            seed,
            winner,
            turns: result.turns,
        })
    }

    /// Reset the seed counter
    pub fn reset_seed(&mut self, seed: u32) {
        self.seed_counter = seed;
    }

    fn next_seed(&mut self) -> u32 {
        let seed = self.seed_counter;
        self.seed_counter = self.seed_counter.wrapping_add(1);
        seed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conquest_core::MapDefinition;

    fn classic_world() -> World {
        MapDefinition::classic().build().unwrap()
    }

    #[test]
    fn test_game_runner_creation() {
        let runner = GameRunner::new(
            classic_world(),
            vec![AgentKind::Stupid, AgentKind::Deterministic],
            SeriesConfig::new(3),
        );
        assert_eq!(runner.names(), &["stupid-1", "deterministic-2"]);
        assert_eq!(runner.config().games, 3);
        assert_eq!(runner.lineup().len(), 2);
    }

    #[test]
    fn test_play_game_deterministic() {
        let runner = GameRunner::new(
            classic_world(),
            vec![AgentKind::Deterministic, AgentKind::Deterministic],
            SeriesConfig::new(1),
        );

        let first = runner.play_seeded(42).unwrap();
        let second = runner.play_seeded(42).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.seed, 42);
        assert!(first.turns > 0);
        assert!(first.winner.is_some());
    }

    #[test]
    fn test_game_outcome_winner() {
        let outcome = GameOutcome {
            seed: 1,
            winner: Some(1),
            turns: 90,
        };
        assert!(outcome.won_by(1));
        assert!(!outcome.won_by(0));
        assert!(!outcome.is_draw());

        let capped = GameOutcome {
            seed: 2,
            winner: None,
            turns: 500,
        };
        assert!(capped.is_draw());
    }

    #[test]
    fn test_seed_counter() {
        let mut runner = GameRunner::new(
            classic_world(),
            vec![AgentKind::Stupid, AgentKind::Stupid],
            SeriesConfig::new(2).with_seed(100).with_max_turns(Some(50)),
        );

        assert_eq!(runner.play_game().unwrap().seed, 100);
        assert_eq!(runner.play_game().unwrap().seed, 101);

        runner.reset_seed(100);
        assert_eq!(runner.play_game().unwrap().seed, 100);
    }

    #[test]
    fn test_invalid_lineup_is_an_error() {
        let runner = GameRunner::new(
            classic_world(),
            vec![AgentKind::Stupid],
            SeriesConfig::new(1),
        );
        assert!(runner.play_seeded(1).is_err());
    }
}
