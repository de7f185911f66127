//! Conquest Core - territory-conquest rules engine and match driver
//!
//! This crate provides the core game logic:
//! - World graph of territories, scoring areas and adjacency
//! - Seeded, bit-reproducible pseudorandom source
//! - Rules engine with dice combat and committed-event outbox
//! - Agent contract plus the bundled random and deterministic agents
//! - Turn driver running a full match from setup to victory

pub mod error;
pub mod world;
pub mod map_data;
pub mod rng;
pub mod event;
pub mod game;
pub mod agent;
pub mod ai;
pub mod driver;

// Re-exports for convenient access
pub use error::{RuleViolation, SetupError, SinkError, WorldError};
pub use world::{Area, AreaId, Territory, TerritoryId, World, TERRITORY_MARKERS};
pub use map_data::{AreaDefinition, MapDefinition};
pub use rng::{GameRng, MersenneTwister, RngMode};
pub use event::{Event, EventKind, EventLog, EventSink, EventValue, JsonLinesSink, NullSink};
pub use game::{CombatOutcome, Game, Player, PlayerId, MAX_PLAYERS, MIN_PLAYERS};
pub use agent::{Agent, AttackPlan, ContinueRule, MoveOrder, MoveRule, Seat};
pub use ai::{DeterministicAi, StupidAi};
pub use driver::{MatchConfig, MatchOutcome, Phase, PlacementMode, TurnDriver, PLAYER_MARKERS};
