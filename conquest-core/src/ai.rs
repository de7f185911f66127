//! Bundled agents
//!
//! - `StupidAi`: random picks and reckless attacks, driven by its own generator
//! - `DeterministicAi`: no randomness at all, used for reproducible traces

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::agent::{Agent, AttackPlan, ContinueRule, MoveRule, Seat};
use crate::event::Event;
use crate::game::{Game, PlayerId};
use crate::rng::GameRng;
use crate::world::TerritoryId;

/// Territory keys ordered by territory name
fn sorted_by_name(game: &Game, ids: impl IntoIterator<Item = TerritoryId>) -> Vec<TerritoryId> {
    let world = game.world();
    let mut ids: Vec<TerritoryId> = ids.into_iter().collect();
    ids.sort_by(|a, b| world.name_of(*a).cmp(world.name_of(*b)));
    ids
}

/// Owned front-line territories, or every owned territory when none border an enemy
fn reinforce_pool(game: &Game, player: PlayerId) -> Vec<TerritoryId> {
    let owned = game.owned_territories(player);
    let border: Vec<TerritoryId> = owned
        .iter()
        .copied()
        .filter(|&t| game.world().border(t))
        .collect();
    if border.is_empty() {
        owned
    } else {
        border
    }
}

// ============================================================================
// STUPID AI
// ============================================================================

/// Plays at random and attacks wherever it outnumbers a neighbor
#[derive(Clone, Debug)]
pub struct StupidAi {
    player: PlayerId,
    rng: GameRng,
}

impl StupidAi {
    pub fn new(seat: Seat) -> Self {
        Self {
            player: seat.player,
            rng: GameRng::new(seat.seed),
        }
    }
}

impl Agent for StupidAi {
    fn initial_placement(
        &mut self,
        game: &Game,
        candidates: &[TerritoryId],
        _remaining: u32,
    ) -> Option<TerritoryId> {
        let pool = if candidates.is_empty() {
            sorted_by_name(game, game.owned_territories(self.player))
        } else {
            sorted_by_name(game, candidates.iter().copied())
        };
        self.rng.choice(&pool).copied()
    }

    fn reinforce(&mut self, game: &Game, available: u32) -> BTreeMap<TerritoryId, u32> {
        let pool = sorted_by_name(game, reinforce_pool(game, self.player));
        let mut allocations = BTreeMap::new();
        for _ in 0..available {
            match self.rng.choice(&pool) {
                Some(&t) => *allocations.entry(t).or_insert(0) += 1,
                None => break,
            }
        }
        allocations
    }

    fn attack(&mut self, game: &Game) -> Vec<AttackPlan> {
        let world = game.world();
        let mut plans = Vec::new();
        for source in sorted_by_name(game, game.owned_territories(self.player)) {
            let Some(src) = world.get(source) else {
                continue;
            };
            for target in sorted_by_name(game, src.neighbors()) {
                let Some(dst) = world.get(target) else {
                    continue;
                };
                if !dst.is_owned_by(self.player) && src.forces() > dst.forces() {
                    plans.push(AttackPlan::new(source, target));
                }
            }
        }
        plans
    }
}

// ============================================================================
// DETERMINISTIC AI
// ============================================================================

/// Fully predictable strategy; draws no randomness
#[derive(Clone, Debug)]
pub struct DeterministicAi {
    player: PlayerId,
}

impl DeterministicAi {
    pub fn new(seat: Seat) -> Self {
        Self { player: seat.player }
    }

    /// Reinforcement targets, most threatened first
    ///
    /// Ordered by adjacent enemy forces (desc), own forces (desc), then name.
    fn reinforce_targets(&self, game: &Game) -> Vec<TerritoryId> {
        let world = game.world();
        let enemy_forces = |t: TerritoryId| -> u32 {
            world.get(t).map_or(0, |territory| {
                territory
                    .neighbors()
                    .filter_map(|n| world.get(n))
                    .filter(|n| n.owner().is_some_and(|o| o != self.player))
                    .map(|n| n.forces())
                    .sum()
            })
        };

        let mut targets = reinforce_pool(game, self.player);
        targets.sort_by_cached_key(|&t| {
            let forces = world.get(t).map_or(0, |territory| territory.forces());
            (
                std::cmp::Reverse(enemy_forces(t)),
                std::cmp::Reverse(forces),
                world.name_of(t).to_string(),
            )
        });
        targets
    }
}

impl Agent for DeterministicAi {
    fn start(&mut self, game: &Game) {
        debug!(
            player = game.player_name(self.player),
            territories = game.world().len(),
            "Deterministic agent starting"
        );
    }

    fn end(&mut self, game: &Game) {
        debug!(player = game.player_name(self.player), "Deterministic agent finished");
    }

    fn on_event(&mut self, event: &Event) {
        debug!(kind = %event.kind, "Observed");
    }

    fn initial_placement(
        &mut self,
        game: &Game,
        candidates: &[TerritoryId],
        _remaining: u32,
    ) -> Option<TerritoryId> {
        let pool = if candidates.is_empty() {
            game.owned_territories(self.player)
        } else {
            candidates.to_vec()
        };
        sorted_by_name(game, pool).first().copied()
    }

    fn reinforce(&mut self, game: &Game, available: u32) -> BTreeMap<TerritoryId, u32> {
        let targets = self.reinforce_targets(game);
        let mut allocations = BTreeMap::new();
        if targets.is_empty() {
            return allocations;
        }
        for i in 0..available as usize {
            *allocations.entry(targets[i % targets.len()]).or_insert(0) += 1;
        }
        allocations
    }

    fn attack(&mut self, game: &Game) -> Vec<AttackPlan> {
        let world = game.world();
        let mut targeted = BTreeSet::new();
        let mut plans = Vec::new();

        for source in sorted_by_name(game, game.owned_territories(self.player)) {
            let Some(src) = world.get(source) else {
                continue;
            };
            for target in sorted_by_name(game, src.neighbors()) {
                let Some(dst) = world.get(target) else {
                    continue;
                };
                if dst.is_owned_by(self.player) || src.forces() <= dst.forces() + 1 {
                    continue;
                }
                if targeted.insert(target) {
                    plans.push(
                        AttackPlan::new(source, target)
                            .with_continue(ContinueRule::WhileStronger)
                            .with_move(MoveRule::Minimum),
                    );
                }
            }
        }
        plans
    }
}

// ============================================================================
// TESTS
// ============================================================================
