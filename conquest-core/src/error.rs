//! Error types for world construction, rule checks and event sinks

use crate::game::PlayerId;
use crate::world::TerritoryId;

/// Fatal errors raised while building a world
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    #[error("Unknown territory '{name}' in connection line: {line}")]
    UnknownTerritory { name: String, line: String },

    #[error("Territory '{0}' is connected to itself")]
    SelfConnection(String),

    #[error("Duplicate territory name: {0}")]
    DuplicateTerritory(String),

    #[error("Duplicate area name: {0}")]
    DuplicateArea(String),

    #[error("No marker symbol available for territory: {0}")]
    MarkersExhausted(String),
}

/// Reason a rules-engine operation was refused
///
/// A refused operation leaves the game untouched and emits no event.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RuleViolation {
    #[error("unknown player {0:?}")]
    UnknownPlayer(PlayerId),

    #[error("unknown territory {0:?}")]
    UnknownTerritory(TerritoryId),

    #[error("territory {0:?} is owned by another player")]
    OwnedByOther(TerritoryId),

    #[error("territory {0:?} is not owned by the acting player")]
    NotOwned(TerritoryId),

    #[error("territory {0:?} has no owner")]
    Unowned(TerritoryId),

    #[error("cannot claim an empty territory with zero forces")]
    ZeroForces,

    #[error("moving {requested} forces needs more than {available} on the source")]
    InsufficientForces { available: u32, requested: u32 },

    #[error("territory {0:?} cannot take an empty territory with a single unit")]
    TooFewAttackers(TerritoryId),

    #[error("territories {0:?} and {1:?} share an owner")]
    SameOwner(TerritoryId, TerritoryId),

    #[error("territories {0:?} and {1:?} are not adjacent")]
    NotAdjacent(TerritoryId, TerritoryId),
}

/// Invalid match setup
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("A match needs at least {min} players, got {got}")]
    TooFewPlayers { min: usize, got: usize },

    #[error("At most {max} players are supported, got {got}")]
    TooManyPlayers { max: usize, got: usize },

    #[error("Duplicate player name: {0}")]
    DuplicatePlayer(String),

    #[error("The world has no territories")]
    EmptyWorld,
}

/// Failure inside an event sink
///
/// Sink failures are reported but never roll back or halt a match.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("Event write failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Event encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}
