//! Costs, refunds and card exchange
//!
//! Paying a cost relocates tokens into Void; nothing here creates or
//! destroys a token or a route.

use crate::board::{Coord, Direction};
use crate::error::RuleViolation;
use crate::game::{GameState, LastMove, Location, PendingEvasion, Phase, Side, Token, TokenId};
use crate::routes::Route;

impl GameState {
    // ========================================================================
    // TOKEN MOVEMENT BETWEEN POOLS
    // ========================================================================

    /// Reserve tokens are born straight into Void
    pub(crate) fn pay_reserve_to_void(&mut self, side: Side, count: u32) {
        for _ in 0..count {
            let id = self.next_token_id(side);
            self.tokens.push(Token {
                id,
                location: Location::Void,
            });
        }
        let state = self.side_mut(side);
        state.reserve -= count;
        state.void += count;
    }

    /// Held enemy tokens go to their owner's Void
    pub(crate) fn pay_captives_to_void(&mut self, payer: Side, count: u32) {
        let paid: Vec<TokenId> = self
            .tokens
            .iter()
            .filter(|t| t.location == Location::Captive { by: payer })
            .map(|t| t.id)
            .take(count as usize)
            .collect();
        for id in &paid {
            if let Some(token) = self.token_mut(*id) {
                token.location = Location::Void;
            }
        }
        let n = paid.len() as u32;
        self.side_mut(payer).captive -= n;
        self.side_mut(payer.opponent()).void += n;
    }

    /// Refund Void to Reserve after an invasion-heavy turn
    pub(crate) fn draft(&mut self, side: Side) {
        let state = self.side(side);
        if state.turn_invades < self.rules.draft_threshold || state.void == 0 {
            return;
        }
        let refund = match self.rules.draft_refund_cap {
            Some(cap) => cap.min(state.void),
            None => state.void,
        };

        // Refunded instances go back to the unborn pool
        let mut left = refund;
        self.tokens.retain(|t| {
            if left > 0 && t.owner() == side && t.location == Location::Void {
                left -= 1;
                false
            } else {
                true
            }
        });
        let state = self.side_mut(side);
        state.void -= refund;
        state.reserve += refund;
        state.stats.drafts += 1;
        tracing::debug!(%side, refund, "draft");
        self.push_log(format!("{} drafts {} token(s) back from void", side, refund));
    }

    // ========================================================================
    // EXTRA REINFORCEMENT
    // ========================================================================

    fn extra_reinforcement_check(&self) -> Result<(), RuleViolation> {
        self.ensure_phase(Phase::Action)?;
        if self.extra_reinforcement_bought {
            return Err(RuleViolation::ExtraAlreadyBought);
        }
        let needed = self.rules.extra_reinforcement_cost;
        let available = self.side(self.active).reserve;
        if available < needed {
            return Err(RuleViolation::InsufficientReserve { needed, available });
        }
        Ok(())
    }

    pub fn can_buy_extra_reinforcement(&self) -> bool {
        self.extra_reinforcement_check().is_ok()
    }

    /// Pay reserve into Void for a second reinforcement this turn
    pub fn buy_extra_reinforcement(&mut self) -> Result<(), RuleViolation> {
        let result = self.extra_reinforcement_check().map(|()| {
            let side = self.active;
            let cost = self.rules.extra_reinforcement_cost;
            self.pay_reserve_to_void(side, cost);
            self.extra_reinforcement_bought = true;
            self.push_log(format!("{} buys an extra reinforcement for {} reserve", side, cost));
            self.check_winner(side);
        });
        self.record(result)
    }

    // ========================================================================
    // SWAP
    // ========================================================================

    fn early_swap_check(&self) -> Result<(), RuleViolation> {
        self.ensure_phase(Phase::Action)?;
        if self.early_swap_used {
            return Err(RuleViolation::EarlySwapUsed);
        }
        if self.pending_swap.early {
            return Err(RuleViolation::EarlySwapArmed);
        }
        if self.available_routes(self.active).is_empty() {
            return Err(RuleViolation::NoUnusedRoutes);
        }
        let needed = self.rules.early_swap_cost;
        let available = self.side(self.active).captive;
        if available < needed {
            return Err(RuleViolation::InsufficientCaptives { needed, available });
        }
        Ok(())
    }

    pub fn can_afford_early_swap(&self) -> bool {
        self.early_swap_check().is_ok()
    }

    /// Open the swap selection during the action phase. Nothing is paid
    /// until the swap is confirmed.
    pub fn arm_early_swap(&mut self) -> Result<(), RuleViolation> {
        let result = self.early_swap_check().map(|()| {
            self.pending_swap = Default::default();
            self.pending_swap.early = true;
        });
        self.record(result)
    }

    pub fn cancel_early_swap(&mut self) -> Result<(), RuleViolation> {
        let result = self.ensure_phase(Phase::Action).and_then(|()| {
            if !self.pending_swap.early {
                return Err(RuleViolation::EarlySwapNotArmed);
            }
            self.pending_swap = Default::default();
            Ok(())
        });
        self.record(result)
    }

    /// Whether a swap selection is open; `true` for an early swap
    fn swap_window(&self) -> Result<bool, RuleViolation> {
        self.ensure_live()?;
        match self.phase {
            Phase::Swap => Ok(false),
            Phase::Action if self.pending_swap.early => Ok(true),
            Phase::Action => Err(RuleViolation::EarlySwapNotArmed),
            phase => Err(RuleViolation::WrongPhase(phase)),
        }
    }

    fn swap_route_check(&self, route: Route, early: bool) -> Result<(), RuleViolation> {
        if !self.hand(self.active).contains(&route) {
            return Err(RuleViolation::RouteNotInHand(route));
        }
        // An early swap must give up a route that is still playable
        if early && !self.available_routes(self.active).contains(&route) {
            return Err(RuleViolation::RouteAlreadyUsed(route));
        }
        Ok(())
    }

    pub fn select_swap_route(&mut self, route: Route) -> Result<(), RuleViolation> {
        let result = self.swap_window().and_then(|early| {
            self.swap_route_check(route, early)?;
            self.pending_swap.route = Some(route);
            Ok(())
        });
        self.record(result)
    }

    pub fn select_swap_slot(&mut self, slot: usize) -> Result<(), RuleViolation> {
        let result = self.swap_window().and_then(|_| {
            if slot >= self.queue.len() {
                return Err(RuleViolation::InvalidQueueSlot(slot));
            }
            self.pending_swap.slot = Some(slot);
            Ok(())
        });
        self.record(result)
    }

    /// Exchange the selected hand route with the selected queue slot. A
    /// regular swap ends the turn; an early swap returns to the action phase.
    pub fn confirm_swap(&mut self) -> Result<(), RuleViolation> {
        let result = self.try_confirm_swap();
        self.record(result)
    }

    fn try_confirm_swap(&mut self) -> Result<(), RuleViolation> {
        let early = self.swap_window()?;
        let (Some(route), Some(slot)) = (self.pending_swap.route, self.pending_swap.slot) else {
            return Err(RuleViolation::SwapIncomplete);
        };
        self.swap_route_check(route, early)?;
        if slot >= self.queue.len() {
            return Err(RuleViolation::InvalidQueueSlot(slot));
        }
        let side = self.active;
        if early {
            let needed = self.rules.early_swap_cost;
            let available = self.side(side).captive;
            if available < needed {
                return Err(RuleViolation::InsufficientCaptives { needed, available });
            }
            self.pay_captives_to_void(side, needed);
        }

        let taken = self.swap_cards(side, route, slot);
        self.pending_swap = Default::default();
        self.push_log(format!("{} swaps {} for {}", side, route, taken));
        if early {
            self.early_swap_used = true;
        } else {
            self.end_turn();
        }
        Ok(())
    }

    pub fn skip_swap(&mut self) -> Result<(), RuleViolation> {
        let result = self.ensure_phase(Phase::Swap).map(|()| {
            self.push_log(format!("{} keeps their hand", self.active));
            self.end_turn();
        });
        self.record(result)
    }

    /// Hand route to the deck's back, queue card to the hand, slot refilled
    /// from the deck's front. Returns the route taken from the queue.
    fn swap_cards(&mut self, side: Side, route: Route, slot: usize) -> Route {
        let taken = self.queue[slot];
        let hand = &mut self.sides[side.index()].hand;
        if let Some(idx) = hand.iter().position(|&r| r == route) {
            hand[idx] = taken;
        }
        self.deck.discard(route);
        self.queue[slot] = self.deck.draw();
        taken
    }

    // ========================================================================
    // EVASION
    // ========================================================================

    fn evasion_check(&self, side: Side) -> Result<(), RuleViolation> {
        self.ensure_phase(Phase::Action)?;
        if side == self.active {
            return Err(RuleViolation::EvasionOnOwnTurn(side));
        }
        let state = self.side(side);
        if state.evasion_used {
            return Err(RuleViolation::EvasionUsed);
        }
        let needed = self.rules.evasion_captive_cost;
        if state.captive < needed {
            return Err(RuleViolation::InsufficientCaptives {
                needed,
                available: state.captive,
            });
        }
        let needed = self.rules.evasion_reserve_cost;
        if state.reserve < needed {
            return Err(RuleViolation::InsufficientReserve {
                needed,
                available: state.reserve,
            });
        }
        Ok(())
    }

    /// Square an evading token steps from: its own square, or the square it
    /// was just taken on.
    fn evasion_origin(&self, side: Side, id: TokenId) -> Result<Coord, RuleViolation> {
        let token = self.token(id).ok_or(RuleViolation::UnknownToken(id))?;
        if token.owner() != side {
            return Err(RuleViolation::NotYourToken(id));
        }
        match token.location {
            Location::Board(_) if self.is_locked(id) => Err(RuleViolation::TokenLocked(id)),
            Location::Board(at) => Ok(at),
            Location::Captive { .. } => match self.last_invasion {
                Some(record) if record.victim == id => Ok(record.at),
                _ => Err(RuleViolation::InvalidEvasionTarget(id)),
            },
            Location::Void => Err(RuleViolation::InvalidEvasionTarget(id)),
        }
    }

    /// The waiting side can afford and is allowed an evasion right now
    pub fn can_evade(&self, side: Side) -> bool {
        self.evasion_check(side).is_ok()
    }

    /// Tokens the waiting side could evade with, ignoring destinations
    pub fn evasion_targets(&self, side: Side) -> Vec<TokenId> {
        if !self.can_evade(side) {
            return Vec::new();
        }
        self.tokens
            .iter()
            .filter(|t| t.owner() == side)
            .filter(|t| self.evasion_origin(side, t.id).is_ok())
            .map(|t| t.id)
            .collect()
    }

    pub fn select_evasion(&mut self, side: Side, token: TokenId) -> Result<(), RuleViolation> {
        let result = self.evasion_check(side).and_then(|()| {
            self.evasion_origin(side, token)?;
            self.pending_evasion = Some(PendingEvasion { side, token });
            Ok(())
        });
        self.record(result)
    }

    /// Step the selected token one flank step onto an empty square
    pub fn confirm_evasion(&mut self, side: Side, direction: Direction) -> Result<(), RuleViolation> {
        let result = self.try_confirm_evasion(side, direction);
        self.record(result)
    }

    fn try_confirm_evasion(&mut self, side: Side, direction: Direction) -> Result<(), RuleViolation> {
        self.evasion_check(side)?;
        let pending = self
            .pending_evasion
            .filter(|p| p.side == side)
            .ok_or(RuleViolation::NoEvasionSelected)?;
        let id = pending.token;
        let from = self.evasion_origin(side, id)?;
        let to = from.flank_step(direction);
        if self.occupant(to).is_some() {
            return Err(RuleViolation::SquareOccupied(to));
        }

        let locked_before = self.locked_tokens();
        self.pay_captives_to_void(side, self.rules.evasion_captive_cost);
        self.pay_reserve_to_void(side, self.rules.evasion_reserve_cost);

        let rescued = self
            .token(id)
            .is_some_and(|t| matches!(t.location, Location::Captive { .. }));
        if let Some(token) = self.token_mut(id) {
            token.location = Location::Board(to);
        }
        if rescued {
            let invader = self.side_mut(side.opponent());
            invader.captive -= 1;
            invader.turn_invades = invader.turn_invades.saturating_sub(1);
            self.last_invasion = None;
        }

        let state = self.side_mut(side);
        state.evasion_used = true;
        state.stats.evasions += 1;
        self.pending_evasion = None;
        self.last_move = Some(LastMove::Evasion { token: id, from, to });
        tracing::debug!(%side, token = %id, %from, %to, rescued, "evasion");
        self.push_log(format!("{} evades {} {} -> {}", side, id, from, to));
        self.settle(side, &locked_before);
        Ok(())
    }
}
