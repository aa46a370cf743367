//! Siege Tournament - AI-vs-AI play at scale
//!
//! This crate provides tournament infrastructure:
//! - Single games between two AI configurations, evasions included
//! - Matches with alternating colors, optionally rayon-parallel
//! - Round-robin tournaments between AI entrants
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run_tournament (orchestration)
//! - Level 2: play_match (phases)
//! - Level 3: GameRunner::play_game (steps)
//! - Level 4: utilities, configuration

mod config;
mod game_runner;
mod match_play;
mod tournament;

pub use config::{Entrant, MatchConfig, TournamentConfig};
pub use game_runner::{GameOutcome, GameRunner};
pub use match_play::{play_match, MatchResult};
pub use tournament::{run_tournament, Standing, TournamentResult};
