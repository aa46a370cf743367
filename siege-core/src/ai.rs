//! AI players: random, greedy and alpha-beta search
//!
//! Every tier looks ahead only through `GameState::apply_action`, which
//! forks the state first. The live game is never touched by search.

use crate::action::Action;
use crate::board::Coord;
use crate::eval::{evaluate, evaluate_with_depth, Heuristics};
use crate::game::{GameState, Phase, Side};
use crate::siege::FULL_SIEGE;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Noise scale for evaluation variety
const NOISE_SCALE: f32 = 0.1;

/// Scores closer than this count as a tie
const TIE_EPSILON: f32 = 1e-3;

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Strength tier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiTier {
    /// Uniform choice among legal actions
    Random,
    /// One-action lookahead
    Greedy,
    /// Alpha-beta over `depth` actions
    Minimax,
}

impl AiTier {
    pub const ALL: [AiTier; 3] = [AiTier::Random, AiTier::Greedy, AiTier::Minimax];

    pub fn name(self) -> &'static str {
        match self {
            AiTier::Random => "random",
            AiTier::Greedy => "greedy",
            AiTier::Minimax => "minimax",
        }
    }
}

impl fmt::Display for AiTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AiTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        AiTier::ALL
            .iter()
            .copied()
            .find(|t| t.name() == lower)
            .ok_or_else(|| format!("unknown AI tier '{}' (expected random, greedy or minimax)", s))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub tier: AiTier,
    /// Search depth in actions (minimax only)
    pub depth: u32,
    /// Beam width after move ordering
    pub max_actions_per_node: usize,
    /// Gain over standing still an evasion must show (greedy and minimax)
    pub evasion_margin: f32,
    pub heuristics: Heuristics,
}

impl AiConfig {
    pub fn tier(tier: AiTier) -> Self {
        Self {
            tier,
            ..Self::default()
        }
    }

    pub fn minimax(depth: u32) -> Self {
        Self {
            tier: AiTier::Minimax,
            depth,
            ..Self::default()
        }
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            tier: AiTier::Greedy,
            depth: 3,
            max_actions_per_node: 10,
            evasion_margin: 1.0,
            heuristics: Heuristics::default(),
        }
    }
}

// ============================================================================
// AI PLAYER
// ============================================================================

/// AI player. Owns its random source so games replay from a seed.
pub struct SiegeAI {
    pub config: AiConfig,
    rng: ChaCha8Rng,
}

impl SiegeAI {
    pub fn new(config: AiConfig) -> Self {
        Self::with_seed(config, 42)
    }

    pub fn with_seed(config: AiConfig, seed: u64) -> Self {
        Self {
            config,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn tier(&self) -> AiTier {
        self.config.tier
    }

    /// Pick the next action for the active side
    pub fn choose_action(&mut self, state: &GameState) -> Option<Action> {
        let actions = state.legal_actions();
        if actions.is_empty() {
            return None;
        }
        let chosen = match self.config.tier {
            AiTier::Random => actions.choose(&mut self.rng).copied(),
            AiTier::Greedy => greedy_action(state, actions, &self.config.heuristics, &mut self.rng),
            AiTier::Minimax => get_best_action(
                state,
                actions,
                self.config.depth as i32,
                &self.config.heuristics,
                self.config.max_actions_per_node,
                &mut self.rng,
                NOISE_SCALE,
            ),
        };
        if let Some(action) = &chosen {
            tracing::trace!(tier = %self.config.tier, side = %state.active(), %action, "ai choice");
        }
        chosen
    }

    /// Decide whether the waiting side should spend its evasion now
    pub fn choose_evasion(&mut self, state: &GameState, side: Side) -> Option<Action> {
        if self.config.tier == AiTier::Random {
            return None;
        }
        let evasions = state.evasion_actions(side);
        if evasions.is_empty() {
            return None;
        }

        let h = &self.config.heuristics;
        let baseline = evaluate(state, side, h);
        let mut best: Option<(Action, f32)> = None;
        for action in evasions {
            let Ok(child) = state.apply_action(&action) else { continue };
            let score = evaluate(&child, side, h);
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((action, score));
            }
        }
        best.filter(|&(_, score)| score > baseline + self.config.evasion_margin)
            .map(|(action, _)| action)
    }

    /// Play a complete game against itself
    pub fn play_game(&mut self, initial: GameState, max_rounds: u32) -> (GameState, Vec<Action>) {
        let mut state = initial;
        let mut history = Vec::new();

        while !state.is_over() && state.round() <= max_rounds {
            let Some(action) = self.choose_action(&state) else { break };
            if state.apply(&action).is_err() {
                break;
            }
            history.push(action);

            let waiting = state.active().opponent();
            if let Some(evasion) = self.choose_evasion(&state, waiting) {
                if state.apply(&evasion).is_ok() {
                    history.push(evasion);
                }
            }
        }

        (state, history)
    }

    /// Evaluate a position for `side`
    pub fn evaluate(&self, state: &GameState, side: Side) -> f32 {
        evaluate(state, side, &self.config.heuristics)
    }
}

// ============================================================================
// GREEDY
// ============================================================================

fn greedy_action(
    state: &GameState,
    actions: Vec<Action>,
    heuristics: &Heuristics,
    rng: &mut ChaCha8Rng,
) -> Option<Action> {
    let side = state.active();
    let mut best_score = f32::NEG_INFINITY;
    let mut tied = Vec::new();

    for action in actions {
        let Ok(child) = state.apply_action(&action) else { continue };
        let score = evaluate(&child, side, heuristics);
        if score > best_score + TIE_EPSILON {
            best_score = score;
            tied.clear();
            tied.push(action);
        } else if (score - best_score).abs() <= TIE_EPSILON {
            tied.push(action);
        }
    }

    tied.choose(rng).copied()
}

// ============================================================================
// MOVE ORDERING
// ============================================================================

/// Score an action for ordering (higher = search first)
fn action_score(state: &GameState, action: &Action, heuristics: &Heuristics) -> f32 {
    let side = state.active();
    match *action {
        Action::UseRoute { token, route } => {
            let Ok(plan) = state.plan_route(token, route) else {
                return -1000.0;
            };
            let mut score = 0.0;

            // Invasion bonus
            if plan.victim.is_some() {
                score += heuristics.token_value * 10.0;
            }

            // Center proximity bonus
            let from_dist = plan.from.distance_to_center();
            let to_dist = plan.to.distance_to_center();
            score += (from_dist - to_dist) as f32 * 0.5;

            score + placement_pressure(state, plan.to, side)
        }
        Action::PlaceOpening { at } | Action::PlaceReinforcement { at } => {
            placement_pressure(state, at, side) - at.distance_to_center() as f32 * 0.5
        }
        Action::ForcedYield => 0.0,
        Action::Swap { .. } => 5.0,
        Action::SkipSwap => 1.0,
        Action::SkipReinforcement => -50.0,
        Action::BuyExtraReinforcement => -5.0,
        Action::EarlySwap { .. } => -10.0,
        _ => -100.0,
    }
}

/// Pressure a friendly token on `at` would add to adjacent enemies, with a
/// large bonus for completing a full siege.
fn placement_pressure(state: &GameState, at: Coord, side: Side) -> f32 {
    let grid = state.grid();
    let mut score = 0.0;
    for n in at.neighbors() {
        if grid.get(n) == Some(side.opponent()) {
            let pressed = grid.enemy_neighbors(n, side.opponent());
            score += 2.0;
            if pressed + 1 >= FULL_SIEGE {
                score += 100.0;
            }
        }
    }
    score
}

fn order_actions(state: &GameState, actions: &mut Vec<Action>, heuristics: &Heuristics, max: usize) {
    actions.sort_by(|a, b| {
        action_score(state, b, heuristics)
            .partial_cmp(&action_score(state, a, heuristics))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    if actions.len() > max {
        actions.truncate(max);
    }
}

// ============================================================================
// NEGAMAX WITH ALPHA-BETA
// ============================================================================

/// Score for the side to act. Depth counts actions; the score flips sign
/// only when the turn passes to the other side.
fn negamax(
    state: &GameState,
    depth: i32,
    mut alpha: f32,
    beta: f32,
    heuristics: &Heuristics,
    max_actions: usize,
    rng: &mut ChaCha8Rng,
    noise_scale: f32,
) -> f32 {
    // Terminal check with depth bonus
    if state.is_over() {
        return evaluate_with_depth(state, state.active(), heuristics, depth);
    }

    if depth <= 0 {
        let base = evaluate(state, state.active(), heuristics);
        let noise = (rng.gen::<f32>() - 0.5) * noise_scale;
        return base + noise;
    }

    let mut actions = state.legal_actions();
    if actions.is_empty() {
        return evaluate(state, state.active(), heuristics);
    }
    order_actions(state, &mut actions, heuristics, max_actions);

    let mover = state.active();
    let mut best = f32::NEG_INFINITY;

    for action in &actions {
        let Ok(child) = state.apply_action(action) else { continue };

        let score = if child.active() != mover && !child.is_over() {
            -negamax(&child, depth - 1, -beta, -alpha, heuristics, max_actions, rng, noise_scale)
        } else if child.is_over() {
            // Score from the mover's side regardless of whose turn it became
            evaluate_with_depth(&child, mover, heuristics, depth)
        } else {
            negamax(&child, depth - 1, alpha, beta, heuristics, max_actions, rng, noise_scale)
        };

        best = best.max(score);
        alpha = alpha.max(score);

        if alpha >= beta {
            break;
        }
    }

    best
}

fn get_best_action(
    state: &GameState,
    mut actions: Vec<Action>,
    depth: i32,
    heuristics: &Heuristics,
    max_actions: usize,
    rng: &mut ChaCha8Rng,
    noise_scale: f32,
) -> Option<Action> {
    if actions.len() == 1 {
        return actions.pop();
    }
    // The opening has no tactics yet; a wide search there buys nothing
    if state.phase() == Phase::Opening {
        return greedy_action(state, actions, heuristics, rng);
    }

    order_actions(state, &mut actions, heuristics, max_actions);

    let mover = state.active();
    let mut best_action = *actions.first()?;
    let mut best_score = f32::NEG_INFINITY;

    for action in actions {
        let Ok(child) = state.apply_action(&action) else { continue };

        let score = if child.is_over() {
            evaluate_with_depth(&child, mover, heuristics, depth)
        } else if child.active() != mover {
            -negamax(
                &child,
                depth - 1,
                f32::NEG_INFINITY,
                f32::INFINITY,
                heuristics,
                max_actions,
                rng,
                noise_scale,
            )
        } else {
            negamax(
                &child,
                depth - 1,
                f32::NEG_INFINITY,
                f32::INFINITY,
                heuristics,
                max_actions,
                rng,
                noise_scale,
            )
        };

        if score > best_score {
            best_score = score;
            best_action = action;
        }
    }

    Some(best_action)
}

// ============================================================================
// TESTS
// ============================================================================
