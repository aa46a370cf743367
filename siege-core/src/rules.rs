//! Turn and phase transitions
//!
//! Every public mutator validates completely before touching the state. A
//! rejected call leaves the board alone and records the violation text in
//! `warning`; a successful one clears it.

use crate::board::Coord;
use crate::error::RuleViolation;
use crate::game::{GameState, InvasionRecord, LastMove, Location, Phase, Side, TokenId, QUEUE_SIZE};
use crate::routes::Route;

impl GameState {
    /// Store the outcome of a mutator for the caller to surface
    pub(crate) fn record(&mut self, result: Result<(), RuleViolation>) -> Result<(), RuleViolation> {
        match &result {
            Ok(()) => self.warning = None,
            Err(violation) => {
                tracing::debug!(%violation, phase = %self.phase, active = %self.active, "action rejected");
                self.warning = Some(violation.to_string());
            }
        }
        result
    }

    pub(crate) fn ensure_live(&self) -> Result<(), RuleViolation> {
        if self.game_over.is_some() {
            return Err(RuleViolation::GameOver);
        }
        Ok(())
    }

    pub(crate) fn ensure_phase(&self, phase: Phase) -> Result<(), RuleViolation> {
        self.ensure_live()?;
        if self.phase != phase {
            return Err(RuleViolation::WrongPhase(self.phase));
        }
        Ok(())
    }

    fn ensure_empty(&self, at: Coord) -> Result<(), RuleViolation> {
        if !at.is_valid() {
            return Err(RuleViolation::OffBoard(at));
        }
        if self.occupant(at).is_some() {
            return Err(RuleViolation::SquareOccupied(at));
        }
        Ok(())
    }

    // ========================================================================
    // OPENING
    // ========================================================================

    /// Place one opening token for the active side
    pub fn place_opening(&mut self, at: Coord) -> Result<(), RuleViolation> {
        let result = self.try_place_opening(at);
        self.record(result)
    }

    fn try_place_opening(&mut self, at: Coord) -> Result<(), RuleViolation> {
        self.ensure_phase(Phase::Opening)?;
        self.ensure_empty(at)?;
        let side = self.active;
        if self.side(side).reserve == 0 {
            return Err(RuleViolation::ReserveEmpty);
        }

        let locked_before = self.locked_tokens();
        let id = self.spawn_token(side, at);
        self.side_mut(side).opening_placed += 1;
        self.last_move = Some(LastMove::Placement { token: id, at });
        self.push_log(format!("{} opens with {} on {}", side, id, at));
        self.settle(side, &locked_before);
        if self.game_over.is_some() {
            return Ok(());
        }

        let opening = self.rules.opening_tokens;
        let done = |s: &GameState, side: Side| s.side(side).opening_placed >= opening;
        if done(self, Side::White) && done(self, Side::Black) {
            self.begin_play();
        } else if !done(self, side.opponent()) {
            self.active = side.opponent();
        }
        Ok(())
    }

    /// Deal hands and the queue, then hand the first action to the first player
    fn begin_play(&mut self) {
        for side in [self.rules.first_player, self.rules.first_player.opponent()] {
            for _ in 0..self.rules.starting_hand {
                let route = self.deck.draw();
                self.side_mut(side).hand.push(route);
            }
        }
        for _ in 0..QUEUE_SIZE {
            let route = self.deck.draw();
            self.queue.push(route);
        }
        self.phase = Phase::Action;
        self.active = self.rules.first_player;
        tracing::debug!(first = %self.active, "opening complete");
        self.push_log(format!("Opening complete: {} to act", self.active));
    }

    // ========================================================================
    // ACTION
    // ========================================================================

    /// Move a token along an unused hand route
    pub fn use_route(&mut self, token: TokenId, route: Route) -> Result<(), RuleViolation> {
        let result = self.try_use_route(token, route);
        self.record(result)
    }

    fn try_use_route(&mut self, id: TokenId, route: Route) -> Result<(), RuleViolation> {
        self.ensure_phase(Phase::Action)?;
        let side = self.active;
        if !self.hand(side).contains(&route) {
            return Err(RuleViolation::RouteNotInHand(route));
        }
        if !self.available_routes(side).contains(&route) {
            return Err(RuleViolation::RouteAlreadyUsed(route));
        }
        if self.token(id).is_none() {
            return Err(RuleViolation::UnknownToken(id));
        }
        if id.owner != side {
            return Err(RuleViolation::NotYourToken(id));
        }
        let plan = self.plan_route(id, route)?;

        let locked_before = self.locked_tokens();
        self.last_invasion = None;
        if let Some(token) = self.token_mut(id) {
            token.location = Location::Board(plan.to);
        }
        self.used_routes.push(route);
        self.push_log(format!("{} uses {}: {} {} -> {}", side, route, id, plan.from, plan.to));

        if let Some(victim) = plan.victim {
            if let Some(token) = self.token_mut(victim) {
                token.location = Location::Captive { by: side };
            }
            let mover = self.side_mut(side);
            mover.captive += 1;
            mover.turn_invades += 1;
            mover.stats.captures += 1;
            mover.stats.invades += 1;
            self.last_invasion = Some(InvasionRecord {
                victim,
                at: plan.to,
                by: side,
            });
            tracing::debug!(%victim, square = %plan.to, "invasion");
            self.push_log(format!("{} invades {} and takes {}", id, plan.to, victim));
        }

        self.last_move = Some(LastMove::Route {
            token: id,
            route,
            from: plan.from,
            trace: plan.trace,
        });
        self.settle(side, &locked_before);

        if self.game_over.is_none() && self.available_routes(side).is_empty() {
            self.complete_action();
        }
        Ok(())
    }

    /// Burn every remaining route when none of them can be used
    pub fn forced_yield(&mut self) -> Result<(), RuleViolation> {
        let result = self.try_forced_yield();
        self.record(result)
    }

    fn try_forced_yield(&mut self) -> Result<(), RuleViolation> {
        self.ensure_phase(Phase::Action)?;
        let side = self.active;
        let burned = self.available_routes(side);
        if burned.is_empty() {
            return Err(RuleViolation::NoUnusedRoutes);
        }
        if self.has_legal_move(side) {
            return Err(RuleViolation::RoutesStillUsable);
        }

        let cost = (burned.len() as u32).min(self.side(side).reserve);
        self.last_invasion = None;
        self.used_routes.extend(burned.iter().copied());
        self.pay_reserve_to_void(side, cost);
        tracing::debug!(%side, burned = burned.len(), cost, "forced yield");
        self.push_log(format!(
            "{} yields {} route(s), {} reserve to void",
            side,
            burned.len(),
            cost
        ));

        self.complete_action();
        Ok(())
    }

    /// All hand routes are spent
    pub(crate) fn complete_action(&mut self) {
        let side = self.active;
        self.pending_swap = Default::default();
        self.resolve_sieges();
        self.draft(side);
        self.check_winner(side);
        if self.game_over.is_some() {
            return;
        }

        let wanted = 1 + u32::from(self.extra_reinforcement_bought);
        self.reinforcements_to_place = wanted.min(self.side(side).reserve);
        self.phase = Phase::Reinforce;
        if self.reinforcements_to_place == 0 {
            self.leave_reinforce();
        }
    }

    // ========================================================================
    // REINFORCE
    // ========================================================================

    /// Place one reinforcement on an empty square. Placement never invades,
    /// but it can still complete a siege.
    pub fn place_reinforcement(&mut self, at: Coord) -> Result<(), RuleViolation> {
        let result = self.try_place_reinforcement(at);
        self.record(result)
    }

    fn try_place_reinforcement(&mut self, at: Coord) -> Result<(), RuleViolation> {
        self.ensure_phase(Phase::Reinforce)?;
        self.ensure_empty(at)?;
        let side = self.active;
        if self.reinforcements_to_place == 0 || self.side(side).reserve == 0 {
            return Err(RuleViolation::ReserveEmpty);
        }

        let locked_before = self.locked_tokens();
        let id = self.spawn_token(side, at);
        self.reinforcements_to_place -= 1;
        self.last_move = Some(LastMove::Placement { token: id, at });
        self.push_log(format!("{} reinforces {} on {}", side, id, at));
        self.settle(side, &locked_before);

        if self.game_over.is_none() && self.reinforcements_to_place == 0 {
            self.leave_reinforce();
        }
        Ok(())
    }

    /// Decline the remaining reinforcements
    pub fn skip_reinforcement(&mut self) -> Result<(), RuleViolation> {
        let result = self
            .ensure_phase(Phase::Reinforce)
            .map(|()| {
                self.reinforcements_to_place = 0;
                self.leave_reinforce();
            });
        self.record(result)
    }

    fn leave_reinforce(&mut self) {
        if self.early_swap_used {
            self.end_turn();
        } else {
            self.phase = Phase::Swap;
        }
    }

    // ========================================================================
    // END OF TURN
    // ========================================================================

    pub(crate) fn end_turn(&mut self) {
        let finished = self.active;
        self.turn += 1;

        if finished != self.rules.first_player {
            self.round += 1;
            let cap = self.rules.hand_cap;
            for side in [self.rules.first_player, finished] {
                if self.hand(side).len() < cap {
                    let route = self.deck.draw();
                    self.side_mut(side).hand.push(route);
                    self.push_log(format!("{} draws {}", side, route));
                }
            }
        }

        self.active = finished.opponent();
        self.phase = Phase::Action;
        self.used_routes.clear();
        for side in Side::BOTH {
            self.side_mut(side).turn_invades = 0;
        }
        self.early_swap_used = false;
        self.extra_reinforcement_bought = false;
        self.reinforcements_to_place = 0;
        self.pending_swap = Default::default();
        self.pending_evasion = None;
        self.last_invasion = None;
        self.push_log(format!("Turn {}: {} to act", self.turn, self.active));
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

    fn position(white: &[&str], black: &[&str], white_hand: &[&str]) -> GameState {
        let pos = Position {
            white: white.iter().map(|s| c(s)).collect(),
            black: black.iter().map(|s| c(s)).collect(),
            white_hand: white_hand.iter().map(|s| r(s)).collect(),
            black_hand: vec![r("S1"), r("S2")],
            ..Position::default()
        };
        GameState::with_position(RuleSet::standard(), &pos).unwrap()
    }

    #[test]
    fn test_opening_alternates_and_deals() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut game = GameState::new(RuleSet::standard(), &mut rng);

        game.place_opening(c("a1")).unwrap();
        assert_eq!(game.side(Side::White).reserve, 14);
        assert_eq!(game.side(Side::White).opening_placed, 1);
        assert_eq!(game.active(), Side::Black);
        assert_eq!(game.occupant(c("a1")).unwrap().id, id("W1"));

        for sq in ["f6", "b1", "e6", "c1"] {
            game.place_opening(c(sq)).unwrap();
            assert_eq!(game.phase(), Phase::Opening);
        }
        game.place_opening(c("d6")).unwrap();

        assert_eq!(game.phase(), Phase::Action);
        assert_eq!(game.active(), Side::White);
        assert_eq!(game.hand(Side::White).len(), 2);
        assert_eq!(game.hand(Side::Black).len(), 2);
        assert_eq!(game.queue().len(), 3);
        assert_eq!(game.deck().len(), 56 - 7);
    }

    #[test]
    fn test_opening_rejects_occupied() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut game = GameState::new(RuleSet::standard(), &mut rng);
        game.place_opening(c("c3")).unwrap();
        let before = game.tokens().to_vec();

        assert_eq!(
            game.place_opening(c("c3")),
            Err(RuleViolation::SquareOccupied(c("c3")))
        );
        assert_eq!(game.tokens(), before.as_slice());
        assert_eq!(game.active(), Side::Black);
        assert!(game.warning().unwrap().contains("occupied"));

        game.place_opening(c("d3")).unwrap();
        assert!(game.warning().is_none());
    }

    #[test]
    fn test_invasion_captures() {
        let mut game = position(&["a1"], &["a2", "f6"], &["N1", "E1"]);
        game.use_route(id("W1"), r("N1")).unwrap();

        assert_eq!(game.occupant(c("a2")).unwrap().id, id("W1"));
        assert_eq!(game.token(id("B1")).unwrap().location, Location::Captive { by: Side::White });
        let white = game.side(Side::White);
        assert_eq!(white.captive, 1);
        assert_eq!(white.turn_invades, 1);
        assert_eq!(white.stats.invades, 1);
        assert_eq!(game.last_invasion().unwrap().victim, id("B1"));
    }

    #[test]
    fn test_route_used_once() {
        let mut game = position(&["a1", "c1"], &["f6"], &["N1", "E1"]);
        game.use_route(id("W1"), r("N1")).unwrap();
        assert_eq!(
            game.use_route(id("W2"), r("N1")),
            Err(RuleViolation::RouteAlreadyUsed(r("N1")))
        );
        assert_eq!(
            game.use_route(id("W2"), r("W3")),
            Err(RuleViolation::RouteNotInHand(r("W3")))
        );
        assert_eq!(
            game.use_route(id("B1"), r("E1")),
            Err(RuleViolation::NotYourToken(id("B1")))
        );
    }

    #[test]
    fn test_last_route_completes_action() {
        let mut game = position(&["a1", "c1"], &["f6"], &["N1", "E1"]);
        game.use_route(id("W1"), r("N1")).unwrap();
        assert_eq!(game.phase(), Phase::Action);
        game.use_route(id("W2"), r("E1")).unwrap();
        assert_eq!(game.phase(), Phase::Reinforce);
        assert_eq!(game.reinforcements_to_place(), 1);

        game.place_reinforcement(c("f1")).unwrap();
        assert_eq!(game.phase(), Phase::Swap);
    }

    #[test]
    fn test_forced_yield_with_scarce_reserve() {
        // The lone white token is locked by four neighbors
        let pos = Position {
            white: vec![c("c3")],
            black: vec![c("c4"), c("d4"), c("d3"), c("d2")],
            white_hand: vec![r("N1"), r("E1")],
            reserve: [Some(1), None],
            ..Position::default()
        };
        let mut game = GameState::with_position(RuleSet::standard(), &pos).unwrap();
        assert!(game.can_forced_yield());
        let void_before = game.side(Side::White).void;

        game.forced_yield().unwrap();

        let white = game.side(Side::White);
        assert_eq!(white.reserve, 0);
        assert_eq!(white.void, void_before + 1);
        assert_eq!(game.used_routes().len(), 2);
        assert!(game.available_routes(Side::White).is_empty());
        // Nothing left to reinforce with, so straight to swap
        assert_eq!(game.phase(), Phase::Swap);
    }

    #[test]
    fn test_forced_yield_rejected_when_moves_exist() {
        let mut game = position(&["a1"], &["f6"], &["N1", "E1"]);
        assert_eq!(game.forced_yield(), Err(RuleViolation::RoutesStillUsable));
        assert_eq!(game.used_routes().len(), 0);
    }

    #[test]
    fn test_reinforcement_locks_without_capture() {
        // Seventh neighbor locks but does not capture
        let mut game = position(&["b2"], &["a1", "a2", "a3", "b3", "c3", "c2", "f6"], &["N2", "E1"]);
        game.active = Side::Black;
        game.phase = Phase::Reinforce;
        game.reinforcements_to_place = 1;

        game.place_reinforcement(c("c1")).unwrap();
        assert_eq!(game.side(Side::Black).captive, 0);
        assert_eq!(game.siege_count(id("W1")), Some(7));
        assert_eq!(game.phase(), Phase::Swap);
    }

    #[test]
    fn test_full_siege_by_placement() {
        let mut game = position(&["b2"], &["a1", "a2", "a3", "b3", "c3", "c2", "c1"], &["N2", "E1"]);
        game.active = Side::Black;
        game.phase = Phase::Reinforce;
        game.reinforcements_to_place = 1;

        game.place_reinforcement(c("b1")).unwrap();
        assert_eq!(game.token(id("W1")).unwrap().location, Location::Captive { by: Side::Black });
        assert_eq!(game.side(Side::Black).captive, 1);
        assert_eq!(game.side(Side::Black).stats.sieges, 1);
    }

    #[test]
    fn test_end_turn_escalates_after_second_mover() {
        let mut game = position(&["a1"], &["f6"], &["N1", "E1"]);
        game.phase = Phase::Swap;
        game.skip_swap().unwrap();
        assert_eq!(game.active(), Side::Black);
        assert_eq!(game.turn(), 2);
        assert_eq!(game.round(), 1);
        assert_eq!(game.hand(Side::White).len(), 2);

        game.phase = Phase::Swap;
        game.skip_swap().unwrap();
        assert_eq!(game.active(), Side::White);
        assert_eq!(game.round(), 2);
        assert_eq!(game.hand(Side::White).len(), 3);
        assert_eq!(game.hand(Side::Black).len(), 3);
    }

    #[test]
    fn test_no_mutation_after_game_over() {
        let mut game = position(&["a1"], &["a2"], &["N1", "E1"]);
        game.sides[Side::Black.index()].reserve = 0;
        game.use_route(id("W1"), r("N1")).unwrap();
        assert_eq!(game.winner(), Some(Side::White));

        let snapshot = game.to_json().unwrap();
        assert_eq!(game.use_route(id("W1"), r("E1")), Err(RuleViolation::GameOver));
        let mut reloaded = GameState::from_json(&snapshot).unwrap();
        reloaded.warning = game.warning.clone();
        assert_eq!(reloaded, game);
    }
}
