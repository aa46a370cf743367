//! Siege, lock and capture resolution, plus the legality queries built on it.
//!
//! Nothing here is cached. Lock state, usable routes and siegemate are all
//! recomputed from the live board, layered as:
//!
//! adjacency -> lock -> route usability -> legal move exists -> siegemate

use crate::board::Coord;
use crate::error::RuleViolation;
use crate::game::{GameOver, GameState, Location, Phase, Side, TokenId, WinReason};
use crate::routes::Route;

/// Enemy neighbors needed to lock a token
pub const LOCK_THRESHOLD: u8 = 4;

/// Enemy neighbors that capture a token outright
pub const FULL_SIEGE: u8 = 8;

/// How adjacency affects a token
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SiegeStatus {
    Free,
    Locked,
    Sieged,
}

impl SiegeStatus {
    pub fn from_count(enemy_neighbors: u8) -> Self {
        if enemy_neighbors >= FULL_SIEGE {
            SiegeStatus::Sieged
        } else if enemy_neighbors >= LOCK_THRESHOLD {
            SiegeStatus::Locked
        } else {
            SiegeStatus::Free
        }
    }
}

/// Occupancy snapshot of the board
#[derive(Clone, Copy, Debug)]
pub struct Grid {
    cells: [Option<Side>; 36],
}

impl Grid {
    pub fn of(state: &GameState) -> Self {
        let mut cells = [None; 36];
        for token in state.tokens() {
            if let Location::Board(c) = token.location {
                cells[c.index()] = Some(token.owner());
            }
        }
        Self { cells }
    }

    pub fn get(&self, at: Coord) -> Option<Side> {
        self.cells[at.index()]
    }

    /// Opposing tokens in the literal 8-neighborhood
    pub fn enemy_neighbors(&self, at: Coord, side: Side) -> u8 {
        at.neighbors()
            .filter(|&n| self.get(n) == Some(side.opponent()))
            .count() as u8
    }

    /// Geometric check for one token using one route
    pub fn route_fits(&self, from: Coord, route: Route, side: Side) -> bool {
        if SiegeStatus::from_count(self.enemy_neighbors(from, side)) != SiegeStatus::Free {
            return false;
        }
        let trace = route.trace(from);
        let Some(&dest) = trace.last() else {
            return false;
        };
        trace.iter().any(|&c| c != from) && (dest == from || self.get(dest) != Some(side))
    }
}

/// Validated route use, ready to apply
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoutePlan {
    pub token: TokenId,
    pub route: Route,
    pub from: Coord,
    pub trace: Vec<Coord>,
    pub to: Coord,
    /// Enemy token on the destination
    pub victim: Option<TokenId>,
}

impl GameState {
    pub fn grid(&self) -> Grid {
        Grid::of(self)
    }

    // ========================================================================
    // ADJACENCY AND LOCKS
    // ========================================================================

    /// Opposing neighbors of an on-board token
    pub fn siege_count(&self, id: TokenId) -> Option<u8> {
        let at = self.token(id)?.square()?;
        Some(self.grid().enemy_neighbors(at, id.owner))
    }

    pub fn siege_status(&self, id: TokenId) -> Option<SiegeStatus> {
        self.siege_count(id).map(SiegeStatus::from_count)
    }

    /// 4 to 7 opposing neighbors
    pub fn is_locked(&self, id: TokenId) -> bool {
        self.siege_status(id) == Some(SiegeStatus::Locked)
    }

    /// Every locked token on the board, both sides
    pub fn locked_tokens(&self) -> Vec<TokenId> {
        let grid = self.grid();
        self.tokens()
            .iter()
            .filter_map(|t| {
                let at = t.square()?;
                let status = SiegeStatus::from_count(grid.enemy_neighbors(at, t.owner()));
                (status == SiegeStatus::Locked).then_some(t.id)
            })
            .collect()
    }

    /// Capture every fully sieged token. All victims are found on one
    /// snapshot before any is removed.
    pub(crate) fn resolve_sieges(&mut self) -> Vec<TokenId> {
        let grid = self.grid();
        let victims: Vec<(TokenId, Coord)> = self
            .tokens()
            .iter()
            .filter_map(|t| {
                let at = t.square()?;
                (grid.enemy_neighbors(at, t.owner()) >= FULL_SIEGE).then_some((t.id, at))
            })
            .collect();

        for &(id, at) in &victims {
            let captor = id.owner.opponent();
            if let Some(token) = self.token_mut(id) {
                token.location = Location::Captive { by: captor };
            }
            let side = self.side_mut(captor);
            side.captive += 1;
            side.stats.captures += 1;
            side.stats.sieges += 1;
            tracing::debug!(token = %id, square = %at, "token fully sieged");
            self.push_log(format!("{} on {} is fully sieged and taken by {}", id, at, captor));
        }

        victims.into_iter().map(|(id, _)| id).collect()
    }

    // ========================================================================
    // ROUTES
    // ========================================================================

    /// Hand routes a side may still use this turn. Only the active side has
    /// spent any; copies are tracked as a multiset.
    pub fn available_routes(&self, side: Side) -> Vec<Route> {
        let mut remaining = self.hand(side).to_vec();
        if side == self.active {
            for used in &self.used_routes {
                if let Some(idx) = remaining.iter().position(|r| r == used) {
                    remaining.remove(idx);
                }
            }
        }
        remaining
    }

    /// Distinct available routes, hand order
    pub(crate) fn distinct_available(&self, side: Side) -> Vec<Route> {
        let mut seen = rustc_hash::FxHashSet::default();
        self.available_routes(side)
            .into_iter()
            .filter(|r| seen.insert(*r))
            .collect()
    }

    /// Check that a token can travel a route, ignoring phase and hand.
    pub fn plan_route(&self, id: TokenId, route: Route) -> Result<RoutePlan, RuleViolation> {
        let token = self.token(id).ok_or(RuleViolation::UnknownToken(id))?;
        let from = token.square().ok_or(RuleViolation::TokenNotOnBoard(id))?;
        if self.siege_status(id) != Some(SiegeStatus::Free) {
            return Err(RuleViolation::TokenLocked(id));
        }

        let trace = route.trace(from);
        let to = *trace.last().ok_or(RuleViolation::EmptyTrace(route))?;
        if trace.iter().all(|&c| c == from) {
            return Err(RuleViolation::TraceStaysHome(route, from));
        }

        let victim = match self.occupant(to) {
            Some(other) if other.id == id => None,
            Some(other) if other.owner() == id.owner => {
                return Err(RuleViolation::FriendlyDestination(to));
            }
            Some(other) => Some(other.id),
            None => None,
        };

        Ok(RoutePlan {
            token: id,
            route,
            from,
            trace,
            to,
            victim,
        })
    }

    pub fn route_usable(&self, id: TokenId, route: Route) -> bool {
        self.plan_route(id, route).is_ok()
    }

    /// Some unlocked token of `side` can use some available route
    pub fn has_legal_move(&self, side: Side) -> bool {
        let grid = self.grid();
        let routes = self.distinct_available(side);
        self.board_tokens(side).any(|t| {
            t.square()
                .is_some_and(|at| routes.iter().any(|&r| grid.route_fits(at, r, side)))
        })
    }

    /// (token, route) pairs a side could play; used by evaluation
    pub fn mobility(&self, side: Side) -> usize {
        let grid = self.grid();
        let mut routes = self.hand(side).to_vec();
        routes.sort();
        routes.dedup();
        self.board_tokens(side)
            .filter_map(|t| t.square())
            .map(|at| routes.iter().filter(|&&r| grid.route_fits(at, r, side)).count())
            .sum()
    }

    /// Forced yield is legal when routes remain but none can be used
    pub fn can_forced_yield(&self) -> bool {
        self.game_over.is_none()
            && self.phase == Phase::Action
            && !self.available_routes(self.active).is_empty()
            && !self.has_legal_move(self.active)
    }

    // ========================================================================
    // WIN DETECTION
    // ========================================================================

    /// No tokens on the board and none in reserve
    pub fn is_eliminated(&self, side: Side) -> bool {
        self.side(side).reserve == 0 && self.on_board_count(side) == 0
    }

    /// Resolve sieges, report lock changes, then look for a winner.
    /// Every board-changing action funnels through here.
    pub(crate) fn settle(&mut self, actor: Side, locked_before: &[TokenId]) {
        self.resolve_sieges();
        self.log_lock_changes(locked_before);
        self.check_winner(actor);
    }

    fn log_lock_changes(&mut self, locked_before: &[TokenId]) {
        let locked_after = self.locked_tokens();
        for id in &locked_after {
            if !locked_before.contains(id) {
                self.push_log(format!("{} is siege-locked", id));
            }
        }
        for id in locked_before {
            let on_board = self.token(*id).is_some_and(|t| t.square().is_some());
            if on_board && !locked_after.contains(id) {
                self.push_log(format!("{} breaks free", id));
            }
        }
    }

    /// Elimination (opponent of the actor first), then siegemate
    pub(crate) fn check_winner(&mut self, actor: Side) {
        if self.game_over.is_some() {
            return;
        }

        for side in [actor.opponent(), actor] {
            if self.is_eliminated(side) {
                self.finish(side.opponent(), WinReason::Elimination);
                return;
            }
        }

        if actor != self.active || self.phase == Phase::Opening {
            return;
        }
        let opponent = actor.opponent();
        if self.side(opponent).reserve == 0 && !self.has_legal_move(opponent) {
            self.finish(actor, WinReason::Siegemate);
        }
    }

    fn finish(&mut self, winner: Side, reason: WinReason) {
        tracing::info!(%winner, %reason, turn = self.turn, "game over");
        self.push_log(format!("{} wins by {}", winner, reason));
        self.game_over = Some(GameOver { winner, reason });
        self.pending_swap = Default::default();
        self.pending_evasion = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Position;
    use crate::ruleset::RuleSet;

    fn c(s: &str) -> Coord {
        s.parse().unwrap()
    }

    fn r(s: &str) -> Route {
        s.parse().unwrap()
    }

    fn ring(center: &str) -> Vec<Coord> {
        c(center).neighbors().collect()
    }

    fn setup(white: Vec<Coord>, black: Vec<Coord>) -> GameState {
        let pos = Position {
            white,
            black,
            white_hand: vec![r("N1"), r("E1")],
            black_hand: vec![r("S1"), r("W1")],
            ..Position::default()
        };
        GameState::with_position(RuleSet::standard(), &pos).unwrap()
    }

    #[test]
    fn test_status_thresholds() {
        assert_eq!(SiegeStatus::from_count(0), SiegeStatus::Free);
        assert_eq!(SiegeStatus::from_count(3), SiegeStatus::Free);
        assert_eq!(SiegeStatus::from_count(4), SiegeStatus::Locked);
        assert_eq!(SiegeStatus::from_count(7), SiegeStatus::Locked);
        assert_eq!(SiegeStatus::from_count(8), SiegeStatus::Sieged);
    }

    #[test]
    fn test_lock_with_four_neighbors() {
        let black: Vec<Coord> = ring("c3").into_iter().take(4).collect();
        let game = setup(vec![c("c3")], black);
        let id = game.occupant(c("c3")).unwrap().id;
        assert_eq!(game.siege_count(id), Some(4));
        assert!(game.is_locked(id));
        assert_eq!(game.plan_route(id, r("N1")), Err(RuleViolation::TokenLocked(id)));
        assert!(game.locked_tokens().contains(&id));
    }

    #[test]
    fn test_adjacency_does_not_wrap() {
        // a3 has five literal neighbors; f-file tokens do not count
        let game = setup(
            vec![c("a3")],
            vec![c("f2"), c("f3"), c("f4"), c("b3"), c("b4"), c("a4")],
        );
        let id = game.occupant(c("a3")).unwrap().id;
        assert_eq!(game.siege_count(id), Some(3));
        assert!(!game.is_locked(id));
    }

    #[test]
    fn test_full_siege_captures() {
        let mut game = setup(vec![c("c3")], ring("c3"));
        let id = game.occupant(c("c3")).unwrap().id;
        let taken = game.resolve_sieges();
        assert_eq!(taken, vec![id]);
        assert_eq!(game.token(id).unwrap().location, Location::Captive { by: Side::Black });
        assert_eq!(game.side(Side::Black).captive, 1);
        assert_eq!(game.side(Side::Black).stats.sieges, 1);
    }

    #[test]
    fn test_siege_is_idempotent() {
        let mut game = setup(vec![c("c3")], ring("c3"));
        game.resolve_sieges();
        assert!(game.resolve_sieges().is_empty());
        assert_eq!(game.side(Side::Black).captive, 1);
    }

    #[test]
    fn test_sieged_token_cannot_plan_route() {
        // Loaded straight into a full ring, before any settle has run
        let game = setup(vec![c("c3")], ring("c3"));
        let id = game.occupant(c("c3")).unwrap().id;
        assert_eq!(game.siege_status(id), Some(SiegeStatus::Sieged));
        assert!(!game.is_locked(id));
        assert_eq!(game.plan_route(id, r("N1")), Err(RuleViolation::TokenLocked(id)));
        assert!(!game.route_usable(id, r("E1")));
    }

    #[test]
    fn test_available_routes_multiset() {
        let pos = Position {
            white: vec![c("a1")],
            black: vec![c("f6")],
            white_hand: vec![r("N1"), r("N1")],
            ..Position::default()
        };
        let mut game = GameState::with_position(RuleSet::standard(), &pos).unwrap();
        game.used_routes.push(r("N1"));
        assert_eq!(game.available_routes(Side::White), vec![r("N1")]);
        game.used_routes.push(r("N1"));
        assert!(game.available_routes(Side::White).is_empty());
    }

    #[test]
    fn test_trace_must_leave_origin() {
        // f1 sits alone on its NE diagonal
        let game = setup(vec![c("f1")], vec![c("a6")]);
        let id = game.occupant(c("f1")).unwrap().id;
        assert_eq!(
            game.plan_route(id, r("NE1")),
            Err(RuleViolation::TraceStaysHome(r("NE1"), c("f1")))
        );
    }

    #[test]
    fn test_friendly_destination_rejected() {
        let game = setup(vec![c("a1"), c("a2")], vec![c("f6")]);
        let id = game.occupant(c("a1")).unwrap().id;
        assert_eq!(
            game.plan_route(id, r("N1")),
            Err(RuleViolation::FriendlyDestination(c("a2")))
        );
    }

    #[test]
    fn test_return_to_origin_is_allowed() {
        // e1 -> f2 -> e1
        let game = setup(vec![c("e1")], vec![c("a6")]);
        let id = game.occupant(c("e1")).unwrap().id;
        let plan = game.plan_route(id, r("NE2")).unwrap();
        assert_eq!(plan.to, c("e1"));
        assert_eq!(plan.victim, None);
    }

    #[test]
    fn test_has_legal_move_and_yield() {
        // The lone white token is locked by four neighbors
        let black: Vec<Coord> = ring("c3").into_iter().take(4).collect();
        let game = setup(vec![c("c3")], black);
        assert!(!game.has_legal_move(Side::White));
        assert!(game.can_forced_yield());
        assert!(game.has_legal_move(Side::Black));
    }

    #[test]
    fn test_elimination_detection() {
        let pos = Position {
            white: vec![],
            black: vec![c("f6")],
            reserve: [Some(0), None],
            ..Position::default()
        };
        let mut game = GameState::with_position(RuleSet::standard(), &pos).unwrap();
        assert!(game.is_eliminated(Side::White));
        game.check_winner(Side::Black);
        assert_eq!(game.winner(), Some(Side::Black));
        assert_eq!(game.game_over().unwrap().reason, WinReason::Elimination);
    }
}
