//! Game runner - executes single games
//!
//! Level 3 - Step-level implementation

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use siege_core::{Action, AiConfig, GameState, RuleSet, SiegeAI, Side, SideStats, WinReason};

/// Hard stop on actions per game, far above any real game at the round cap
const MAX_ACTIONS: usize = 20_000;

/// Outcome of a single game
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameOutcome {
    /// `None` when the round limit was reached first
    pub winner: Option<Side>,
    pub reason: Option<WinReason>,
    /// Round the game finished in
    pub rounds: u32,
    pub turns: u32,
    /// Every applied action in order, evasions included
    pub actions: Vec<Action>,
    /// Per-side statistics, indexed by `Side::index`
    pub stats: [SideStats; 2],
}

impl GameOutcome {
    pub fn white_wins(&self) -> bool {
        self.winner == Some(Side::White)
    }

    pub fn black_wins(&self) -> bool {
        self.winner == Some(Side::Black)
    }

    /// Check if game is a draw (ongoing at round limit)
    pub fn is_draw(&self) -> bool {
        self.winner.is_none()
    }

    fn from_state(state: &GameState, actions: Vec<Action>) -> Self {
        let over = state.game_over();
        Self {
            winner: over.map(|o| o.winner),
            reason: over.map(|o| o.reason),
            rounds: state.round(),
            turns: state.turn(),
            actions,
            stats: [
                state.side(Side::White).stats,
                state.side(Side::Black).stats,
            ],
        }
    }
}

/// Plays games between two AI configurations
pub struct GameRunner {
    white: AiConfig,
    black: AiConfig,
    rules: RuleSet,
    /// Random seed counter
    seed_counter: u64,
}

impl GameRunner {
    pub fn new(white: AiConfig, black: AiConfig, rules: RuleSet) -> Self {
        Self {
            white,
            black,
            rules,
            seed_counter: 42,
        }
    }

    /// Play a fresh game, seeding the deck and both AIs from the next seed
    pub fn play_game(&mut self, max_rounds: u32) -> GameOutcome {
        let seed = self.next_seed();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let state = GameState::new(self.rules.clone(), &mut rng);
        self.play_from(state, max_rounds, seed)
    }

    /// Play on from an existing position
    pub fn play_from(&self, initial_state: GameState, max_rounds: u32, seed: u64) -> GameOutcome {
        self.play_to_end(initial_state, max_rounds, seed).1
    }

    /// Like `play_from`, also handing back the final position
    pub fn play_to_end(
        &self,
        initial_state: GameState,
        max_rounds: u32,
        seed: u64,
    ) -> (GameState, GameOutcome) {
        let mut white = SiegeAI::with_seed(self.white.clone(), seed);
        let mut black = SiegeAI::with_seed(self.black.clone(), seed.wrapping_add(1));
        let mut state = initial_state;
        let mut actions = Vec::new();

        while !state.is_over() && state.round() <= max_rounds && actions.len() < MAX_ACTIONS {
            let mover = match state.active() {
                Side::White => &mut white,
                Side::Black => &mut black,
            };
            let Some(action) = mover.choose_action(&state) else {
                tracing::warn!(phase = %state.phase(), side = %state.active(), "no legal action");
                break;
            };
            if let Err(violation) = state.apply(&action) {
                tracing::warn!(%action, %violation, "AI chose a rejected action");
                break;
            }
            actions.push(action);

            // The side not on move may answer with its one evasion
            if state.is_over() {
                break;
            }
            let waiting = state.active().opponent();
            let responder = match waiting {
                Side::White => &mut white,
                Side::Black => &mut black,
            };
            if let Some(evasion) = responder.choose_evasion(&state, waiting) {
                if state.apply(&evasion).is_ok() {
                    actions.push(evasion);
                }
            }
        }

        let outcome = GameOutcome::from_state(&state, actions);
        tracing::debug!(
            seed,
            winner = ?outcome.winner,
            reason = ?outcome.reason,
            rounds = outcome.rounds,
            "game finished"
        );
        (state, outcome)
    }

    /// Get next seed and increment counter
    fn next_seed(&mut self) -> u64 {
        let seed = self.seed_counter;
        self.seed_counter = self.seed_counter.wrapping_add(1);
        seed
    }

    /// Reset seed counter
    pub fn reset_seed(&mut self, seed: u64) {
        self.seed_counter = seed;
    }

    pub fn white(&self) -> &AiConfig {
        &self.white
    }

    pub fn black(&self) -> &AiConfig {
        &self.black
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use siege_core::{check_invariants, AiTier, Coord, Position};

    fn greedy_vs_random() -> GameRunner {
        GameRunner::new(
            AiConfig::tier(AiTier::Greedy),
            AiConfig::tier(AiTier::Random),
            RuleSet::standard(),
        )
    }

    fn replay(seed: u64, outcome: &GameOutcome) -> GameState {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut state = GameState::new(RuleSet::standard(), &mut rng);
        for action in &outcome.actions {
            state.apply(action).unwrap();
            assert!(check_invariants(&state).is_empty());
        }
        state
    }

    #[test]
    fn test_play_game_progresses() {
        let mut runner = greedy_vs_random();
        runner.reset_seed(5);
        let outcome = runner.play_game(10);

        // Six opening placements at least
        assert!(outcome.actions.len() >= 6);
        assert!(outcome.rounds >= 1);
        assert!(outcome.is_draw() || outcome.reason.is_some());
    }

    #[test]
    fn test_outcome_replays_from_seed() {
        let mut runner = greedy_vs_random();
        runner.reset_seed(11);
        let outcome = runner.play_game(8);

        let state = replay(11, &outcome);
        assert_eq!(state.winner(), outcome.winner);
        assert_eq!(state.round(), outcome.rounds);
    }

    #[test]
    fn test_same_seed_same_game() {
        let mut a = greedy_vs_random();
        let mut b = greedy_vs_random();
        a.reset_seed(3);
        b.reset_seed(3);
        assert_eq!(a.play_game(6), b.play_game(6));
    }

    #[test]
    fn test_reset_seed_replays() {
        let mut runner = greedy_vs_random();
        runner.reset_seed(100);
        let first = runner.play_game(4);
        runner.reset_seed(100);
        let again = runner.play_game(4);
        assert_eq!(first, again);
    }

    #[test]
    fn test_play_from_winning_position() {
        let c = |s: &str| s.parse::<Coord>().unwrap();
        let pos = Position {
            white: vec![c("a1")],
            black: vec![c("a2")],
            white_hand: vec!["N1".parse().unwrap(), "E1".parse().unwrap()],
            reserve: [None, Some(0)],
            ..Position::default()
        };
        let state = GameState::with_position(RuleSet::standard(), &pos).unwrap();
        let runner = GameRunner::new(
            AiConfig::tier(AiTier::Greedy),
            AiConfig::tier(AiTier::Greedy),
            RuleSet::standard(),
        );

        // Greedy white takes the lone black token and wins on the spot
        let outcome = runner.play_from(state, 5, 0);
        assert!(outcome.white_wins());
        assert_eq!(outcome.reason, Some(WinReason::Elimination));
        assert_eq!(outcome.actions.len(), 1);
        assert_eq!(outcome.stats[Side::White.index()].captures, 1);
    }

    #[test]
    fn test_game_outcome_winner() {
        let outcome = GameOutcome {
            winner: Some(Side::Black),
            reason: Some(WinReason::Siegemate),
            rounds: 10,
            turns: 19,
            actions: vec![],
            stats: Default::default(),
        };
        assert!(outcome.black_wins());
        assert!(!outcome.white_wins());
        assert!(!outcome.is_draw());

        let draw = GameOutcome {
            winner: None,
            reason: None,
            ..outcome
        };
        assert!(draw.is_draw());
    }
}
