//! Turn driver: runs one full match
//!
//! Phase flow:
//! - Setup: shuffle turn order, assign display indices and markers
//! - InitialPlacement: draft or deal the map, then spend starting budgets
//! - Reinforce, Attack, Fortify for each living player in rotation
//! - GameOver once at most one player holds territory (or the turn cap hits)
//!
//! The driver polls one agent at a time, drops decisions that fail its coarse
//! checks, and forwards the rest to the rules engine, which has the final say.
//! Nothing an agent returns can stall or abort a match.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::agent::{Agent, Seat};
use crate::error::SetupError;
use crate::event::{EventSink, NullSink};
use crate::game::{Game, PlayerId};
use crate::rng::RngMode;
use crate::world::{TerritoryId, World};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Player markers in turn order
pub const PLAYER_MARKERS: [char; 6] = ['\\', '/', '-', '|', '+', '*'];

/// Starting budget before the per-player deduction
const BASE_STARTING_FORCES: u32 = 35;

/// Starting budget shrinks by this much per player
const STARTING_FORCES_PER_PLAYER: u32 = 2;

/// Consecutive ignored placements before the driver places for the agent
const MAX_IGNORED_PLACEMENTS: u32 = 16;

// ============================================================================
// CONFIGURATION
// ============================================================================

/// How territories are first handed out
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlacementMode {
    /// Agents pick unclaimed territories in turn
    #[default]
    Draft,
    /// Territories are shuffled and dealt round-robin
    Deal,
}

/// Per-match settings
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchConfig {
    /// `None` draws a seed from OS entropy
    pub seed: Option<u32>,
    pub placement: PlacementMode,
    pub rng_mode: RngMode,
    /// Stop after this many turns (placement turns included) with no winner
    pub max_turns: Option<u64>,
}

impl MatchConfig {
    pub fn with_seed(mut self, seed: u32) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_placement(mut self, placement: PlacementMode) -> Self {
        self.placement = placement;
        self
    }

    pub fn with_rng_mode(mut self, rng_mode: RngMode) -> Self {
        self.rng_mode = rng_mode;
        self
    }

    pub fn with_max_turns(mut self, max_turns: u64) -> Self {
        self.max_turns = Some(max_turns);
        self
    }
}

/// Current driver state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Setup,
    InitialPlacement,
    Reinforce,
    Attack,
    Fortify,
    GameOver,
}

/// Summary of a finished match
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchOutcome {
    /// `None` when the turn cap hit or nobody survived
    pub winner: Option<String>,
    /// Turns consumed, placement turns included
    pub turns: u64,
    pub seed: u32,
}

// ============================================================================
// DRIVER
// ============================================================================

/// Orchestrates a match between agents
pub struct TurnDriver {
    game: Game,
    /// Indexed by `PlayerId`
    agents: Vec<Box<dyn Agent>>,
    turn_order: Vec<PlayerId>,
    turn: u64,
    phase: Phase,
    config: MatchConfig,
}

impl TurnDriver {
    /// Set up a match; `make_agent` is called once per player in name order
    pub fn new<F>(
        world: World,
        names: Vec<String>,
        config: MatchConfig,
        mut make_agent: F,
    ) -> Result<Self, SetupError>
    where
        F: FnMut(Seat) -> Box<dyn Agent>,
    {
        let game = Game::new(world, names, config.seed, config.rng_mode)?;
        let agents = game
            .player_ids()
            .map(|p| make_agent(Seat::new(p, game.seed())))
            .collect();

        Ok(Self {
            game,
            agents,
            turn_order: Vec::new(),
            turn: 0,
            phase: Phase::Setup,
            config,
        })
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Turns consumed so far
    pub fn turn(&self) -> u64 {
        self.turn
    }

    /// Shuffled rotation, empty before setup
    pub fn turn_order(&self) -> &[PlayerId] {
        &self.turn_order
    }

    /// Play to completion without an external sink
    pub fn play(&mut self) -> MatchOutcome {
        self.play_with(&mut NullSink)
    }

    /// Play to completion, recording every event in `sink`
    pub fn play_with(&mut self, sink: &mut dyn EventSink) -> MatchOutcome {
        info!(
            seed = self.game.seed(),
            players = self.game.players().len(),
            placement = ?self.config.placement,
            "Match starting"
        );

        self.setup_turn_order();
        for agent in &mut self.agents {
            agent.start(&self.game);
        }

        self.initial_placement(sink);
        self.main_loop(sink);

        let alive = self.game.alive_players();
        let winner = match alive.as_slice() {
            [only] => {
                if self.game.victory(*only).is_ok() {
                    self.dispatch(sink);
                }
                Some(self.game.player_name(*only).to_string())
            }
            _ => None,
        };

        self.phase = Phase::GameOver;
        for agent in &mut self.agents {
            agent.end(&self.game);
        }

        info!(winner = ?winner, turns = self.turn, "Match finished");
        MatchOutcome {
            winner,
            turns: self.turn,
            seed: self.game.seed(),
        }
    }

    // ========================================================================
    // SETUP
    // ========================================================================

    fn setup_turn_order(&mut self) {
        self.phase = Phase::Setup;
        let mut order: Vec<PlayerId> = self.game.player_ids().collect();
        self.game.rng_mut().shuffle(&mut order);

        for (i, &player) in order.iter().enumerate() {
            let marker = PLAYER_MARKERS[i.min(PLAYER_MARKERS.len() - 1)];
            self.game.assign_display(player, i + 1, marker);
        }
        debug!(order = ?order, "Turn order");
        self.turn_order = order;
    }

    fn current_player(&self) -> PlayerId {
        self.turn_order[(self.turn % self.turn_order.len() as u64) as usize]
    }

    // ========================================================================
    // INITIAL PLACEMENT
    // ========================================================================

    fn initial_placement(&mut self, sink: &mut dyn EventSink) {
        self.phase = Phase::InitialPlacement;

        let players = self.game.players().len() as u32;
        let budget = BASE_STARTING_FORCES.saturating_sub(STARTING_FORCES_PER_PLAYER * players);
        let mut remaining = vec![budget; players as usize];
        let mut pool: Vec<TerritoryId> = self.game.world().territories().map(|(id, _)| id).collect();

        match self.config.placement {
            PlacementMode::Deal => self.deal(&mut pool, &mut remaining, sink),
            PlacementMode::Draft => self.draft(&mut pool, &mut remaining, sink),
        }
        self.spend_budgets(&mut remaining, sink);
    }

    fn deal(&mut self, pool: &mut Vec<TerritoryId>, remaining: &mut [u32], sink: &mut dyn EventSink) {
        self.game.rng_mut().shuffle(pool);
        while let Some(territory) = pool.pop() {
            let player = self.current_player();
            if self.game.claim(player, territory, 1).is_ok() {
                remaining[player.0] = remaining[player.0].saturating_sub(1);
            }
            self.dispatch(sink);
            self.turn += 1;
        }
    }

    fn draft(&mut self, pool: &mut Vec<TerritoryId>, remaining: &mut [u32], sink: &mut dyn EventSink) {
        let mut ignored = vec![0u32; remaining.len()];

        while !pool.is_empty() {
            let player = self.current_player();
            let choice =
                self.agents[player.0].initial_placement(&self.game, pool.as_slice(), remaining[player.0]);

            let index = match choice.and_then(|t| pool.iter().position(|&p| p == t)) {
                Some(index) => {
                    ignored[player.0] = 0;
                    Some(index)
                }
                None => {
                    debug!(player = player.0, choice = ?choice, "Ignored draft pick");
                    self.strike(&mut ignored[player.0], player).then_some(0)
                }
            };

            if let Some(index) = index {
                let territory = pool.remove(index);
                if self.game.claim(player, territory, 1).is_ok() {
                    remaining[player.0] = remaining[player.0].saturating_sub(1);
                }
                self.dispatch(sink);
            }
            self.turn += 1;
        }
    }

    /// Each player places its leftover budget one unit at a time
    fn spend_budgets(&mut self, remaining: &mut [u32], sink: &mut dyn EventSink) {
        let mut ignored = vec![0u32; remaining.len()];

        while remaining.iter().any(|&r| r > 0) {
            let player = self.current_player();
            if !self.game.is_alive(player) {
                // Nowhere to put it
                remaining[player.0] = 0;
            }

            if remaining[player.0] > 0 {
                let choice = self.agents[player.0].initial_placement(&self.game, &[], remaining[player.0]);
                let owns = |t: TerritoryId| {
                    self.game.world().get(t).is_some_and(|territory| territory.is_owned_by(player))
                };

                let target = match choice.filter(|&t| owns(t)) {
                    Some(t) => {
                        ignored[player.0] = 0;
                        Some(t)
                    }
                    None => {
                        debug!(player = player.0, choice = ?choice, "Ignored placement");
                        if self.strike(&mut ignored[player.0], player) {
                            self.game.owned_territories(player).first().copied()
                        } else {
                            None
                        }
                    }
                };

                if let Some(t) = target {
                    if self.game.reinforce(player, t, 1).is_ok() {
                        remaining[player.0] -= 1;
                    }
                    self.dispatch(sink);
                }
            }
            self.turn += 1;
        }
    }

    /// Count an ignored placement; true once the driver should place instead
    fn strike(&self, count: &mut u32, player: PlayerId) -> bool {
        *count += 1;
        if *count < MAX_IGNORED_PLACEMENTS {
            return false;
        }
        *count = 0;
        warn!(
            player = self.game.player_name(player),
            "Agent keeps ignoring placement rules, placing for it"
        );
        true
    }

    // ========================================================================
    // MAIN LOOP
    // ========================================================================

    fn main_loop(&mut self, sink: &mut dyn EventSink) {
        while self.game.alive_players().len() > 1 {
            if self.config.max_turns.is_some_and(|cap| self.turn >= cap) {
                info!(turns = self.turn, "Turn cap reached");
                break;
            }

            let player = self.current_player();
            if self.game.is_alive(player) {
                debug!(turn = self.turn, player = self.game.player_name(player), "Turn");
                self.reinforce_phase(player, sink);
                self.attack_phase(player, sink);
                self.fortify_phase(player, sink);
            }
            self.turn += 1;
        }
    }

    fn reinforce_phase(&mut self, player: PlayerId, sink: &mut dyn EventSink) {
        self.phase = Phase::Reinforce;
        let entitlement = self.game.reinforcement_count(player);
        let allocations = self.agents[player.0].reinforce(&self.game, entitlement);

        let mut applied = 0u32;
        for (territory, count) in allocations {
            if count == 0 {
                continue;
            }
            match self.game.reinforce(player, territory, count) {
                Ok(()) => applied = applied.saturating_add(count),
                Err(violation) => debug!(%violation, "Discarded reinforcement"),
            }
        }

        if applied < entitlement {
            if let Some(&first) = self.game.owned_territories(player).first() {
                let shortfall = entitlement - applied;
                debug!(shortfall, "Depositing unallocated reinforcements");
                if let Err(violation) = self.game.reinforce(player, first, shortfall) {
                    debug!(%violation, "Shortfall deposit failed");
                }
            }
        }
        self.dispatch(sink);
    }

    fn attack_phase(&mut self, player: PlayerId, sink: &mut dyn EventSink) {
        self.phase = Phase::Attack;
        let plans = self.agents[player.0].attack(&self.game);

        for plan in plans {
            let world = self.game.world();
            let source_ok = world.get(plan.source).is_some_and(|t| t.is_owned_by(player));
            let target_ok = world.get(plan.target).is_some_and(|t| !t.is_owned_by(player));
            if !source_ok || !target_ok || !world.are_adjacent(plan.source, plan.target) {
                debug!(source = ?plan.source, target = ?plan.target, "Skipped attack plan");
                continue;
            }

            let result = self.game.resolve_combat(
                plan.source,
                plan.target,
                |a, d| plan.keep_attacking.allows(a, d),
                |a| plan.move_rule.amount(a),
            );
            if let Err(violation) = result {
                debug!(%violation, "Discarded attack");
            }
            self.dispatch(sink);
        }
    }

    fn fortify_phase(&mut self, player: PlayerId, sink: &mut dyn EventSink) {
        self.phase = Phase::Fortify;
        let Some(order) = self.agents[player.0].fortify(&self.game) else {
            return;
        };

        if !self.game.world().are_adjacent(order.source, order.destination) {
            debug!(?order, "Discarded fortify between unconnected territories");
            return;
        }
        match self.game.move_forces(player, order.source, order.destination, order.count) {
            Ok(()) => self.dispatch(sink),
            Err(violation) => debug!(%violation, "Discarded fortify"),
        }
    }

    /// Fan committed events out to the sink, then to every agent
    fn dispatch(&mut self, sink: &mut dyn EventSink) {
        for event in self.game.take_events() {
            if let Err(error) = sink.record(&event) {
                warn!(%error, event = %event, "Event sink failed");
            }
            for agent in &mut self.agents {
                agent.on_event(&event);
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
