//! Structural invariants
//!
//! These never fail in a correct engine. Tests and debug audits call
//! `check_invariants` after every action; a non-empty result is a bug.

use crate::game::{GameState, Location, Phase, Side, QUEUE_SIZE};
use crate::routes::ROUTE_KINDS;
use rustc_hash::FxHashSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    pub message: String,
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invariant violation: {}", self.message)
    }
}

impl std::error::Error for InvariantViolation {}

/// Check every structural invariant. Empty means healthy.
#[must_use]
pub fn check_invariants(state: &GameState) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();
    let mut fail = |message: String| violations.push(InvariantViolation { message });

    let total = state.rules().tokens_per_side();
    for side in Side::BOTH {
        let counters = state.side(side);
        let owned = |pred: &dyn Fn(&Location) -> bool| {
            state
                .tokens()
                .iter()
                .filter(|t| t.owner() == side && pred(&t.location))
                .count() as u32
        };
        let on_board = owned(&|l: &Location| matches!(l, Location::Board(_)));
        let held = owned(&|l: &Location| matches!(l, Location::Captive { .. }));
        let void = owned(&|l: &Location| *l == Location::Void);

        let sum = on_board + counters.reserve + held + void;
        if sum != total {
            fail(format!(
                "{} owns {} tokens (board {}, reserve {}, captive {}, void {}), expected {}",
                side, sum, on_board, counters.reserve, held, void, total
            ));
        }
        if void != counters.void {
            fail(format!("{} void counter {} but {} void tokens", side, counters.void, void));
        }

        let holding = state
            .tokens()
            .iter()
            .filter(|t| t.location == Location::Captive { by: side })
            .count() as u32;
        if holding != counters.captive {
            fail(format!(
                "{} captive counter {} but holds {} tokens",
                side, counters.captive, holding
            ));
        }
        if state
            .tokens()
            .iter()
            .any(|t| t.owner() == side && t.location == Location::Captive { by: side })
        {
            fail(format!("{} holds its own token captive", side));
        }
        if counters.hand.len() > state.rules().hand_cap {
            fail(format!("{} hand of {} exceeds cap", side, counters.hand.len()));
        }
    }

    // One token per square, unique ids
    let mut squares = FxHashSet::default();
    let mut ids = FxHashSet::default();
    for token in state.tokens() {
        if !ids.insert(token.id) {
            fail(format!("duplicate token id {}", token.id));
        }
        if let Location::Board(at) = token.location {
            if !at.is_valid() {
                fail(format!("{} stands off the board at {:?}", token.id, at));
            }
            if !squares.insert(at) {
                fail(format!("two tokens on {}", at));
            }
        }
    }

    // Route conservation
    let cards = state.rules().route_copies * ROUTE_KINDS;
    let counted = state.deck().len()
        + state.queue().len()
        + state.hand(Side::White).len()
        + state.hand(Side::Black).len();
    if counted != cards {
        fail(format!("{} routes in play, expected {}", counted, cards));
    }
    if state.phase() != Phase::Opening && state.queue().len() != QUEUE_SIZE {
        fail(format!("queue holds {} routes", state.queue().len()));
    }

    violations
}
