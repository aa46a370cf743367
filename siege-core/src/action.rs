//! Actions as values
//!
//! Every mutator has a matching `Action` variant so callers (UI, sync layer,
//! search) can pass commands around, serialize them and replay them. The
//! compound variants bundle a multi-step selection into one atomic action.

use crate::board::{Coord, Direction};
use crate::error::RuleViolation;
use crate::game::{GameState, Phase, Side, TokenId};
use crate::routes::Route;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    PlaceOpening { at: Coord },
    UseRoute { token: TokenId, route: Route },
    ForcedYield,
    BuyExtraReinforcement,
    ArmEarlySwap,
    CancelEarlySwap,
    SelectSwapRoute { route: Route },
    SelectSwapSlot { slot: usize },
    ConfirmSwap,
    SkipSwap,
    PlaceReinforcement { at: Coord },
    SkipReinforcement,
    SelectEvasion { side: Side, token: TokenId },
    ConfirmEvasion { side: Side, direction: Direction },
    /// Arm, select and confirm an early swap in one go
    EarlySwap { route: Route, slot: usize },
    /// Select and confirm the end-of-turn swap
    Swap { route: Route, slot: usize },
    /// Select and confirm an evasion
    Evade {
        side: Side,
        token: TokenId,
        direction: Direction,
    },
}

impl Action {
    /// Side that performs the action, if it is not simply the active side
    pub fn actor(&self) -> Option<Side> {
        match self {
            Action::SelectEvasion { side, .. }
            | Action::ConfirmEvasion { side, .. }
            | Action::Evade { side, .. } => Some(*side),
            _ => None,
        }
    }

    fn is_compound(&self) -> bool {
        matches!(
            self,
            Action::EarlySwap { .. } | Action::Swap { .. } | Action::Evade { .. }
        )
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::PlaceOpening { at } => write!(f, "open {}", at),
            Action::UseRoute { token, route } => write!(f, "{} {}", token, route),
            Action::ForcedYield => f.write_str("yield"),
            Action::BuyExtraReinforcement => f.write_str("buy extra"),
            Action::ArmEarlySwap => f.write_str("arm early swap"),
            Action::CancelEarlySwap => f.write_str("cancel early swap"),
            Action::SelectSwapRoute { route } => write!(f, "select {}", route),
            Action::SelectSwapSlot { slot } => write!(f, "select slot {}", slot),
            Action::ConfirmSwap => f.write_str("confirm swap"),
            Action::SkipSwap => f.write_str("skip swap"),
            Action::PlaceReinforcement { at } => write!(f, "reinforce {}", at),
            Action::SkipReinforcement => f.write_str("skip reinforce"),
            Action::SelectEvasion { side, token } => write!(f, "{} selects {} to evade", side, token),
            Action::ConfirmEvasion { side, direction } => {
                write!(f, "{} evades {}", side, direction)
            }
            Action::EarlySwap { route, slot } => write!(f, "early swap {} <-> q{}", route, slot),
            Action::Swap { route, slot } => write!(f, "swap {} <-> q{}", route, slot),
            Action::Evade {
                side,
                token,
                direction,
            } => write!(f, "{} evades {} {}", side, token, direction),
        }
    }
}

impl GameState {
    /// Apply an action in place. On rejection nothing but `warning` changes.
    pub fn apply(&mut self, action: &Action) -> Result<(), RuleViolation> {
        if !action.is_compound() {
            return self.apply_step(action);
        }

        // Roll back a half-applied compound action
        let saved = self.clone();
        let result = self.apply_compound(action);
        if let Err(violation) = result {
            *self = saved;
            self.warning = Some(violation.to_string());
            return Err(violation);
        }
        result
    }

    /// Clone-then-mutate: the successor state, leaving `self` untouched
    pub fn apply_action(&self, action: &Action) -> Result<GameState, RuleViolation> {
        let mut next = self.fork();
        next.apply(action)?;
        Ok(next)
    }

    fn apply_step(&mut self, action: &Action) -> Result<(), RuleViolation> {
        match *action {
            Action::PlaceOpening { at } => self.place_opening(at),
            Action::UseRoute { token, route } => self.use_route(token, route),
            Action::ForcedYield => self.forced_yield(),
            Action::BuyExtraReinforcement => self.buy_extra_reinforcement(),
            Action::ArmEarlySwap => self.arm_early_swap(),
            Action::CancelEarlySwap => self.cancel_early_swap(),
            Action::SelectSwapRoute { route } => self.select_swap_route(route),
            Action::SelectSwapSlot { slot } => self.select_swap_slot(slot),
            Action::ConfirmSwap => self.confirm_swap(),
            Action::SkipSwap => self.skip_swap(),
            Action::PlaceReinforcement { at } => self.place_reinforcement(at),
            Action::SkipReinforcement => self.skip_reinforcement(),
            Action::SelectEvasion { side, token } => self.select_evasion(side, token),
            Action::ConfirmEvasion { side, direction } => self.confirm_evasion(side, direction),
            Action::EarlySwap { .. } | Action::Swap { .. } | Action::Evade { .. } => {
                self.apply_compound(action)
            }
        }
    }

    fn apply_compound(&mut self, action: &Action) -> Result<(), RuleViolation> {
        match *action {
            Action::EarlySwap { route, slot } => {
                self.arm_early_swap()?;
                self.select_swap_route(route)?;
                self.select_swap_slot(slot)?;
                self.confirm_swap()
            }
            Action::Swap { route, slot } => {
                self.ensure_phase(Phase::Swap)?;
                self.select_swap_route(route)?;
                self.select_swap_slot(slot)?;
                self.confirm_swap()
            }
            Action::Evade {
                side,
                token,
                direction,
            } => {
                self.select_evasion(side, token)?;
                self.confirm_evasion(side, direction)
            }
            _ => self.apply_step(action),
        }
    }

    // ========================================================================
    // ENUMERATION
    // ========================================================================

    /// Every complete action open to the active side. Swap and early swap
    /// selections are collapsed into single compound actions.
    pub fn legal_actions(&self) -> Vec<Action> {
        if self.game_over.is_some() {
            return Vec::new();
        }
        let side = self.active;

        match self.phase {
            Phase::Opening => self
                .empty_squares()
                .into_iter()
                .map(|at| Action::PlaceOpening { at })
                .collect(),
            Phase::Action => {
                let mut actions = self.route_actions(side);
                if self.can_forced_yield() {
                    actions.push(Action::ForcedYield);
                }
                if self.can_buy_extra_reinforcement() {
                    actions.push(Action::BuyExtraReinforcement);
                }
                if self.can_afford_early_swap() {
                    for route in self.distinct_available(side) {
                        for slot in 0..self.queue.len() {
                            actions.push(Action::EarlySwap { route, slot });
                        }
                    }
                }
                actions
            }
            Phase::Reinforce => {
                let mut actions: Vec<Action> = self
                    .empty_squares()
                    .into_iter()
                    .map(|at| Action::PlaceReinforcement { at })
                    .collect();
                actions.push(Action::SkipReinforcement);
                actions
            }
            Phase::Swap => {
                let mut hand = self.hand(side).to_vec();
                hand.sort();
                hand.dedup();
                let mut actions = Vec::with_capacity(hand.len() * self.queue.len() + 1);
                for route in hand {
                    for slot in 0..self.queue.len() {
                        actions.push(Action::Swap { route, slot });
                    }
                }
                actions.push(Action::SkipSwap);
                actions
            }
        }
    }

    /// Route uses only, one per (token, distinct route) pair
    pub fn route_actions(&self, side: Side) -> Vec<Action> {
        if self.game_over.is_some() || self.phase != Phase::Action || side != self.active {
            return Vec::new();
        }
        let grid = self.grid();
        let routes = self.distinct_available(side);
        let mut actions = Vec::new();
        for token in self.board_tokens(side) {
            let Some(at) = token.square() else { continue };
            for &route in &routes {
                if grid.route_fits(at, route, side) {
                    actions.push(Action::UseRoute {
                        token: token.id,
                        route,
                    });
                }
            }
        }
        actions
    }

    /// Complete evasions open to the waiting side
    pub fn evasion_actions(&self, side: Side) -> Vec<Action> {
        let mut actions = Vec::new();
        for token in self.evasion_targets(side) {
            let from = match self.token(token).and_then(|t| t.square()) {
                Some(at) => at,
                None => match self.last_invasion {
                    Some(record) if record.victim == token => record.at,
                    _ => continue,
                },
            };
            for direction in Direction::ALL {
                let to = from.flank_step(direction);
                if self.occupant(to).is_none() {
                    actions.push(Action::Evade {
                        side,
                        token,
                        direction,
                    });
                }
            }
        }
        actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Position;
    use crate::ruleset::RuleSet;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn c(s: &str) -> Coord {
        s.parse().unwrap()
    }

    fn r(s: &str) -> Route {
        s.parse().unwrap()
    }

    fn id(s: &str) -> TokenId {
        s.parse().unwrap()
    }

    fn small_game() -> GameState {
        let pos = Position {
            white: vec![c("a1"), c("c1")],
            black: vec![c("a2"), c("f6")],
            white_hand: vec![r("N1"), r("E1")],
            black_hand: vec![r("S3"), r("W2")],
            queue: vec![r("NE1"), r("SW2"), r("E4")],
            captives: [2, 1],
            ..Position::default()
        };
        GameState::with_position(RuleSet::standard(), &pos).unwrap()
    }

    #[test]
    fn test_opening_actions_cover_board() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let game = GameState::new(RuleSet::standard(), &mut rng);
        assert_eq!(game.legal_actions().len(), 36);
    }

    #[test]
    fn test_action_phase_enumeration() {
        let game = small_game();
        let actions = game.legal_actions();
        assert!(actions.contains(&Action::UseRoute { token: id("W1"), route: r("N1") }));
        assert!(actions.contains(&Action::BuyExtraReinforcement));
        assert!(actions.contains(&Action::EarlySwap { route: r("E1"), slot: 2 }));
        assert!(!actions.contains(&Action::ForcedYield));
        // c1 east lands on d1, a1 east lands on b1: both fine
        assert!(actions.contains(&Action::UseRoute { token: id("W2"), route: r("E1") }));
    }

    #[test]
    fn test_every_legal_action_applies() {
        let game = small_game();
        for action in game.legal_actions() {
            let next = game.apply_action(&action);
            assert!(next.is_ok(), "{} rejected: {:?}", action, next.err());
        }
    }

    #[test]
    fn test_apply_action_leaves_original() {
        let game = small_game();
        let before = game.clone();
        let next = game
            .apply_action(&Action::UseRoute { token: id("W1"), route: r("N1") })
            .unwrap();
        assert_eq!(game, before);
        assert_eq!(next.occupant(c("a2")).unwrap().id, id("W1"));
    }

    #[test]
    fn test_failed_compound_rolls_back() {
        let mut game = small_game();
        let before = game.clone();
        let err = game.apply(&Action::EarlySwap { route: r("E1"), slot: 7 });
        assert_eq!(err, Err(RuleViolation::InvalidQueueSlot(7)));
        assert!(!game.pending_swap().early);
        assert_eq!(game.tokens(), before.tokens());
        assert!(game.warning().is_some());
    }

    #[test]
    fn test_swap_phase_enumeration() {
        let mut game = small_game();
        game.phase = Phase::Swap;
        let actions = game.legal_actions();
        assert_eq!(actions.len(), 2 * 3 + 1);
        assert_eq!(actions.last(), Some(&Action::SkipSwap));
    }

    #[test]
    fn test_evasion_actions_for_waiting_side() {
        let game = small_game();
        assert!(game.evasion_actions(Side::White).is_empty());
        let evasions = game.evasion_actions(Side::Black);
        assert!(evasions.contains(&Action::Evade {
            side: Side::Black,
            token: id("B2"),
            direction: Direction::S,
        }));
        // a1 is occupied
        assert!(!evasions.contains(&Action::Evade {
            side: Side::Black,
            token: id("B1"),
            direction: Direction::S,
        }));
        for action in evasions {
            assert!(game.apply_action(&action).is_ok());
        }
    }

    #[test]
    fn test_action_serde() {
        let action = Action::UseRoute { token: id("B3"), route: r("NW2") };
        let json = serde_json::to_string(&action).unwrap();
        assert!(json.contains("\"B3\""));
        assert!(json.contains("\"NW2\""));
        let back: Action = serde_json::from_str(&json).unwrap();
        assert_eq!(back, action);
    }
}
