//! Decision-making contract for players
//!
//! An agent sees the match only through `&Game` and answers with plain
//! decision values. The driver validates every answer, so an agent can be
//! wrong but never able to corrupt state.

use std::collections::BTreeMap;

use crate::event::Event;
use crate::game::{Game, PlayerId};
use crate::world::TerritoryId;

/// Multiplier spreading seat indices across the seed space
const SEAT_SEED_STRIDE: u32 = 0x9E37_79B9;

/// Where an agent sits in a match
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Seat {
    pub player: PlayerId,
    /// Seed for the agent's private generator
    pub seed: u32,
}

impl Seat {
    /// Seat for `player`, with a private seed derived from the match seed
    pub fn new(player: PlayerId, match_seed: u32) -> Self {
        let stride = (player.0 as u32).wrapping_add(1).wrapping_mul(SEAT_SEED_STRIDE);
        Self {
            player,
            seed: match_seed ^ stride,
        }
    }
}

/// When to roll another round of an attack
#[derive(Clone, Copy, Debug, Default)]
pub enum ContinueRule {
    /// Keep rolling while the attack is legal
    #[default]
    Always,
    /// Keep rolling while attackers outnumber defenders
    WhileStronger,
    /// Keep rolling while at least this many attackers remain
    WhileAtLeast(u32),
    /// `f(attackers, defenders)`
    Custom(fn(u32, u32) -> bool),
}

impl ContinueRule {
    pub fn allows(self, attackers: u32, defenders: u32) -> bool {
        match self {
            ContinueRule::Always => true,
            ContinueRule::WhileStronger => attackers > defenders,
            ContinueRule::WhileAtLeast(n) => attackers >= n,
            ContinueRule::Custom(f) => f(attackers, defenders),
        }
    }
}

/// How many units advance into a conquered territory
///
/// The rules engine clamps the answer to `[min(a - 1, 3), a - 1]`.
#[derive(Clone, Copy, Debug, Default)]
pub enum MoveRule {
    /// Everything but the unit left behind
    #[default]
    All,
    /// As few as the rules allow
    Minimum,
    Exactly(u32),
    /// `f(attackers)`
    Custom(fn(u32) -> u32),
}

impl MoveRule {
    pub fn amount(self, attackers: u32) -> u32 {
        let movable = attackers.saturating_sub(1);
        match self {
            MoveRule::All => movable,
            MoveRule::Minimum => movable.min(3),
            MoveRule::Exactly(n) => n,
            MoveRule::Custom(f) => f(attackers),
        }
    }
}

/// One attack intent
#[derive(Clone, Copy, Debug)]
pub struct AttackPlan {
    pub source: TerritoryId,
    pub target: TerritoryId,
    pub keep_attacking: ContinueRule,
    pub move_rule: MoveRule,
}

impl AttackPlan {
    /// Attack with default decisions
    pub fn new(source: TerritoryId, target: TerritoryId) -> Self {
        Self {
            source,
            target,
            keep_attacking: ContinueRule::default(),
            move_rule: MoveRule::default(),
        }
    }

    pub fn with_continue(mut self, rule: ContinueRule) -> Self {
        self.keep_attacking = rule;
        self
    }

    pub fn with_move(mut self, rule: MoveRule) -> Self {
        self.move_rule = rule;
        self
    }
}

/// Post-attack repositioning
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MoveOrder {
    pub source: TerritoryId,
    pub destination: TerritoryId,
    pub count: u32,
}

/// A player strategy
pub trait Agent {
    /// Called once after setup, before the first placement
    fn start(&mut self, _game: &Game) {}

    /// Called once when the match is over, whatever the outcome
    fn end(&mut self, _game: &Game) {}

    /// Every committed event, in commit order
    fn on_event(&mut self, _event: &Event) {}

    /// Pick a territory for one unit of the starting budget
    ///
    /// `candidates` holds the unclaimed pool while drafting and is empty once
    /// every territory is owned, when the pick must be one of the agent's own.
    fn initial_placement(
        &mut self,
        game: &Game,
        candidates: &[TerritoryId],
        remaining: u32,
    ) -> Option<TerritoryId>;

    /// Split `available` forces over owned territories
    fn reinforce(&mut self, game: &Game, available: u32) -> BTreeMap<TerritoryId, u32>;

    /// Attacks to run this turn, in order
    fn attack(&mut self, game: &Game) -> Vec<AttackPlan>;

    /// At most one repositioning after attacking
    fn fortify(&mut self, _game: &Game) -> Option<MoveOrder> {
        None
    }
}
