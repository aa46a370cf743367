//! Property-based tests for geometry and engine conservation.
//!
//! Run with: cargo test --release prop_

use proptest::prelude::*;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use siege_core::{check_invariants, Coord, Direction, GameState, Route, RuleSet, Side, BOARD_SIZE};

fn coord() -> impl Strategy<Value = Coord> {
    (0..BOARD_SIZE, 0..BOARD_SIZE).prop_map(|(x, y)| Coord::new(x, y))
}

fn direction() -> impl Strategy<Value = Direction> {
    (0..8usize).prop_map(|i| Direction::ALL[i])
}

/// Same row, column or diagonal, chosen by direction
fn on_same_line(a: Coord, b: Coord, dir: Direction) -> bool {
    let (dx, dy) = dir.vector();
    match (dx, dy) {
        (_, 0) => a.y == b.y,
        (0, _) => a.x == b.x,
        _ if dx == dy => a.x - a.y == b.x - b.y,
        _ => a.x + a.y == b.x + b.y,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2000))]

    /// A flank step always lands on the board, on the origin's line.
    #[test]
    fn prop_flank_step_stays_on_line(from in coord(), dir in direction()) {
        let to = from.flank_step(dir);
        prop_assert!(to.is_valid());
        prop_assert!(on_same_line(from, to, dir));

        let (dx, dy) = dir.vector();
        let naive = Coord::new(from.x + dx, from.y + dy);
        if naive.is_valid() {
            prop_assert_eq!(to, naive);
        } else {
            // Far endpoint: stepping back the other way leaves the board
            let (bx, by) = (-dx, -dy);
            let beyond = Coord::new(to.x + bx, to.y + by);
            prop_assert!(!beyond.is_valid());
        }
    }

    /// Route traces have exactly `distance` squares, all on the board.
    #[test]
    fn prop_trace_length(from in coord(), dir in direction(), distance in 1u8..=4) {
        if let Some(route) = Route::new(dir, distance) {
            let trace = route.trace(from);
            prop_assert_eq!(trace.len(), distance as usize);
            prop_assert!(trace.iter().all(Coord::is_valid));
            prop_assert_eq!(trace.last().copied(), Some(route.destination(from)));
        } else {
            prop_assert!(!dir.is_orthogonal() && distance == 4);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Random play, evasions included, never breaks token or route
    /// conservation.
    #[test]
    fn prop_random_playout_conserves(seed in any::<u64>(), tournament in any::<bool>()) {
        let rules = if tournament { RuleSet::tournament() } else { RuleSet::standard() };
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut game = GameState::new(rules, &mut rng);

        for _ in 0..400 {
            if game.is_over() {
                break;
            }
            let waiting = game.active().opponent();
            let evasions = game.evasion_actions(waiting);
            let action = if !evasions.is_empty() && rng.gen_bool(0.3) {
                *evasions.choose(&mut rng).unwrap()
            } else {
                let actions = game.legal_actions();
                prop_assert!(!actions.is_empty(), "no legal action in {:?}", game.phase());
                *actions.choose(&mut rng).unwrap()
            };

            prop_assert!(game.apply(&action).is_ok(), "{} rejected", action);
            let violations = check_invariants(&game);
            prop_assert!(violations.is_empty(), "after {}: {:?}", action, violations);
        }

        if let Some(over) = game.game_over() {
            prop_assert!(game.legal_actions().is_empty());
            prop_assert!(game.evasion_actions(Side::White).is_empty());
            prop_assert!(game.evasion_actions(Side::Black).is_empty());
            let loser = over.winner.opponent();
            prop_assert!(
                game.is_eliminated(loser) || !game.has_legal_move(loser),
                "{} lost without being eliminated or siegemated", loser
            );
        }
    }
}
