//! Siege Core - Rules engine and AI
//!
//! This crate provides the core game logic for Siege:
//! - Board geometry (6x6 grid with flank wraparound)
//! - Route cards and the cycling deck
//! - Game state, phase machine and siege resolution
//! - Position evaluation
//! - Random, greedy and alpha-beta AI

pub mod board;
pub mod routes;
pub mod deck;
pub mod game;
pub mod error;
pub mod siege;
pub mod rules;
pub mod economy;
pub mod action;
pub mod invariants;
pub mod eval;
pub mod ai;
pub mod ruleset;

// Re-exports for convenient access
pub use board::{Coord, Direction, NotationError, BOARD_SIZE};
pub use routes::{route_catalog, Route, ROUTE_KINDS};
pub use deck::Deck;
pub use game::{
    GameOver, GameState, LastMove, Location, Phase, Position, Side, SideState, SideStats, Token,
    TokenId, WinReason, QUEUE_SIZE,
};
pub use error::RuleViolation;
pub use siege::{SiegeStatus, FULL_SIEGE, LOCK_THRESHOLD};
pub use action::Action;
pub use invariants::{check_invariants, InvariantViolation};
pub use eval::{evaluate, Heuristics, WIN_VALUE};
pub use ai::{AiConfig, AiTier, SiegeAI};
pub use ruleset::RuleSet;
