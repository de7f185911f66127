//! Conquest Tournament - agent comparison through repeated play
//!
//! This crate provides tournament infrastructure:
//! - Single seeded games from a lineup of agent kinds
//! - Series of games with consecutive seeds, optionally in parallel
//! - Round-robin tournaments between agent kinds
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run_tournament (orchestration)
//! - Level 2: play_series (phases)
//! - Level 3: GameRunner::play_seeded (steps)
//! - Level 4: utilities, configuration

mod config;
mod game_runner;
mod match_play;
mod tournament;

pub use config::{parse_lineup, seat_names, AgentKind, SeriesConfig, TournamentConfig};
pub use game_runner::{GameOutcome, GameRunner};
pub use match_play::{play_series, play_series_observed, SeriesResult};
pub use tournament::{run_tournament, Pairing, Standing, TournamentResult};
