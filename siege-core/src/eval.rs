//! Position evaluation

use crate::game::{GameState, Side};
use crate::siege::{Grid, SiegeStatus};
use serde::{Deserialize, Serialize};

/// Heuristic weights for position evaluation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Heuristics {
    /// Each token standing on the board
    pub token_value: f32,
    /// Each token still in reserve
    pub reserve_value: f32,
    /// Each enemy token held captive
    pub captive_value: f32,
    /// Per locked token: bonus for enemy locks, penalty for our own
    pub lock_weight: f32,
    /// Per enemy neighbor pressing on an enemy token
    pub pressure_weight: f32,
    /// Weight for closeness to the center block
    pub center_weight: f32,
    /// Weight for usable (token, route) pairs
    pub mobility_weight: f32,
    /// Each route in hand
    pub hand_weight: f32,
}

impl Default for Heuristics {
    fn default() -> Self {
        Self {
            token_value: 10.0,
            reserve_value: 6.0,
            captive_value: 2.0,
            lock_weight: 3.0,
            pressure_weight: 0.5,
            center_weight: 0.4,
            mobility_weight: 0.2,
            hand_weight: 0.5,
        }
    }
}

/// Win value (effectively infinite)
pub const WIN_VALUE: f32 = 100000.0;

/// Evaluate a position from `side`'s point of view
pub fn evaluate(state: &GameState, side: Side, heuristics: &Heuristics) -> f32 {
    if let Some(winner) = state.winner() {
        return if winner == side { WIN_VALUE } else { -WIN_VALUE };
    }

    let grid = state.grid();
    let mut score = side_score(state, &grid, side, heuristics)
        - side_score(state, &grid, side.opponent(), heuristics);

    if heuristics.mobility_weight.abs() > 0.001 {
        let mine = state.mobility(side) as f32;
        let theirs = state.mobility(side.opponent()) as f32;
        score += heuristics.mobility_weight * (mine - theirs);
    }

    score
}

/// Material, position and siege pressure for one side
fn side_score(state: &GameState, grid: &Grid, side: Side, h: &Heuristics) -> f32 {
    let counters = state.side(side);
    let mut score = counters.reserve as f32 * h.reserve_value
        + counters.captive as f32 * h.captive_value
        + counters.hand.len() as f32 * h.hand_weight;

    for token in state.board_tokens(side) {
        let Some(at) = token.square() else { continue };
        score += h.token_value;
        score += h.center_weight * (2 - at.distance_to_center()) as f32;

        let pressed = grid.enemy_neighbors(at, side);
        if SiegeStatus::from_count(pressed) == SiegeStatus::Locked {
            score -= h.lock_weight;
        }
        score -= h.pressure_weight * pressed as f32;
    }

    score
}

/// Evaluate with depth bonus for preferring faster wins
pub fn evaluate_with_depth(state: &GameState, side: Side, heuristics: &Heuristics, depth: i32) -> f32 {
    match state.winner() {
        Some(winner) => {
            let base = if winner == side { WIN_VALUE } else { -WIN_VALUE };
            // Win sooner is better (higher depth = closer to current position)
            base + if base > 0.0 { depth as f32 } else { -(depth as f32) }
        }
        None => evaluate(state, side, heuristics),
    }
}
