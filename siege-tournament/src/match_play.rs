//! Match play - multiple games between two entrants
//!
//! Level 2 - Phase-level implementation

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use siege_core::{Side, WinReason};

use crate::config::{Entrant, MatchConfig};
use crate::game_runner::{GameOutcome, GameRunner};

/// Result of a match (multiple games), from the first entrant's side
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub first: String,
    pub second: String,
    pub first_wins: u32,
    pub second_wins: u32,
    /// Games that hit the round limit
    pub draws: u32,
    /// Wins by whoever played white, regardless of entrant
    pub white_wins: u32,
    pub siegemates: u32,
    pub eliminations: u32,
    /// Average game length in rounds
    pub avg_rounds: f32,
    pub games_played: u32,
    /// Individual game outcomes, in game order
    pub game_outcomes: Vec<GameOutcome>,
}

impl MatchResult {
    pub fn empty(first: &str, second: &str) -> Self {
        Self {
            first: first.to_string(),
            second: second.to_string(),
            ..Default::default()
        }
    }

    /// Combine two results between the same entrants
    pub fn combine(&self, other: &MatchResult) -> MatchResult {
        let total_games = self.games_played + other.games_played;
        let avg_rounds = if total_games > 0 {
            (self.avg_rounds * self.games_played as f32
                + other.avg_rounds * other.games_played as f32)
                / total_games as f32
        } else {
            0.0
        };

        let mut game_outcomes = self.game_outcomes.clone();
        game_outcomes.extend(other.game_outcomes.iter().cloned());

        MatchResult {
            first: self.first.clone(),
            second: self.second.clone(),
            first_wins: self.first_wins + other.first_wins,
            second_wins: self.second_wins + other.second_wins,
            draws: self.draws + other.draws,
            white_wins: self.white_wins + other.white_wins,
            siegemates: self.siegemates + other.siegemates,
            eliminations: self.eliminations + other.eliminations,
            avg_rounds,
            games_played: total_games,
            game_outcomes,
        }
    }

    fn rate(&self, count: u32) -> f32 {
        if self.games_played == 0 {
            0.0
        } else {
            count as f32 / self.games_played as f32
        }
    }

    pub fn first_win_rate(&self) -> f32 {
        self.rate(self.first_wins)
    }

    pub fn second_win_rate(&self) -> f32 {
        self.rate(self.second_wins)
    }

    pub fn draw_rate(&self) -> f32 {
        self.rate(self.draws)
    }

    /// Wins = 1.0, Draws = 0.5, Losses = 0.0
    pub fn score_for_first(&self) -> f32 {
        self.first_wins as f32 + 0.5 * self.draws as f32
    }

    pub fn score_for_second(&self) -> f32 {
        self.second_wins as f32 + 0.5 * self.draws as f32
    }
}

/// Play a match between two entrants (Level 2 phase)
///
/// Colors alternate: the first entrant plays white in even-numbered games.
/// Game `i` is seeded with `config.seed + i`, so a match replays exactly
/// whether or not it runs in parallel.
pub fn play_match(first: &Entrant, second: &Entrant, config: &MatchConfig) -> MatchResult {
    if config.games == 0 {
        return MatchResult::empty(&first.name, &second.name);
    }

    let game_configs = prepare_game_configs(config.games);
    let results: Vec<GameOutcomeWithContext> = if config.parallel {
        game_configs
            .par_iter()
            .map(|gc| play_single_game(first, second, config, gc))
            .collect()
    } else {
        game_configs
            .iter()
            .map(|gc| play_single_game(first, second, config, gc))
            .collect()
    };

    let result = aggregate_results(&first.name, &second.name, results);
    tracing::info!(
        first = %first.name,
        second = %second.name,
        first_wins = result.first_wins,
        second_wins = result.second_wins,
        draws = result.draws,
        "match finished"
    );
    result
}

// ============================================================================
// Level 3 - Steps
// ============================================================================

/// Configuration for a single game in a match
#[derive(Clone, Copy)]
struct GameConfig {
    first_is_white: bool,
    /// Game index (for seeding)
    game_index: usize,
}

fn prepare_game_configs(games: usize) -> Vec<GameConfig> {
    (0..games)
        .map(|i| GameConfig {
            first_is_white: i % 2 == 0,
            game_index: i,
        })
        .collect()
}

/// Outcome with context about which entrant played which color
struct GameOutcomeWithContext {
    outcome: GameOutcome,
    first_is_white: bool,
}

fn play_single_game(
    first: &Entrant,
    second: &Entrant,
    config: &MatchConfig,
    gc: &GameConfig,
) -> GameOutcomeWithContext {
    let (white, black) = if gc.first_is_white {
        (first, second)
    } else {
        (second, first)
    };

    let mut runner = GameRunner::new(white.ai.clone(), black.ai.clone(), config.rules.clone());
    runner.reset_seed(config.seed.wrapping_add(gc.game_index as u64));

    GameOutcomeWithContext {
        outcome: runner.play_game(config.max_rounds),
        first_is_white: gc.first_is_white,
    }
}

fn aggregate_results(first: &str, second: &str, outcomes: Vec<GameOutcomeWithContext>) -> MatchResult {
    let mut result = MatchResult::empty(first, second);
    let mut total_rounds = 0u32;

    for owc in outcomes {
        total_rounds += owc.outcome.rounds;
        match owc.outcome.reason {
            Some(WinReason::Siegemate) => result.siegemates += 1,
            Some(WinReason::Elimination) => result.eliminations += 1,
            None => {}
        }

        // Attribute wins by entrant, not by color
        match owc.outcome.winner {
            Some(winner) => {
                if winner == Side::White {
                    result.white_wins += 1;
                }
                if (winner == Side::White) == owc.first_is_white {
                    result.first_wins += 1;
                } else {
                    result.second_wins += 1;
                }
            }
            None => result.draws += 1,
        }
        result.game_outcomes.push(owc.outcome);
    }

    result.games_played = result.game_outcomes.len() as u32;
    result.avg_rounds = if result.games_played > 0 {
        total_rounds as f32 / result.games_played as f32
    } else {
        0.0
    };
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use siege_core::AiTier;

    fn quick(games: usize) -> MatchConfig {
        MatchConfig {
            games,
            max_rounds: 6,
            ..MatchConfig::default()
        }
    }

    fn outcome(winner: Option<Side>, rounds: u32) -> GameOutcome {
        GameOutcome {
            winner,
            reason: winner.map(|_| WinReason::Elimination),
            rounds,
            turns: rounds * 2,
            actions: vec![],
            stats: Default::default(),
        }
    }

    #[test]
    fn test_match_result_empty() {
        let result = play_match(
            &Entrant::tier(AiTier::Random),
            &Entrant::tier(AiTier::Greedy),
            &quick(0),
        );
        assert_eq!(result.games_played, 0);
        assert_eq!(result.first_win_rate(), 0.0);
        assert_eq!(result.first, "random");
    }

    #[test]
    fn test_aggregate_attributes_by_entrant() {
        let outcomes = vec![
            // first is white and white wins
            GameOutcomeWithContext {
                outcome: outcome(Some(Side::White), 10),
                first_is_white: true,
            },
            // first is black and white wins: second entrant's win
            GameOutcomeWithContext {
                outcome: outcome(Some(Side::White), 20),
                first_is_white: false,
            },
            GameOutcomeWithContext {
                outcome: outcome(None, 30),
                first_is_white: true,
            },
        ];
        let result = aggregate_results("a", "b", outcomes);
        assert_eq!(result.first_wins, 1);
        assert_eq!(result.second_wins, 1);
        assert_eq!(result.draws, 1);
        assert_eq!(result.white_wins, 2);
        assert_eq!(result.eliminations, 2);
        assert_eq!(result.avg_rounds, 20.0);
        assert_eq!(result.score_for_first(), 1.5);
    }

    #[test]
    fn test_combine() {
        let a = aggregate_results(
            "a",
            "b",
            vec![GameOutcomeWithContext {
                outcome: outcome(Some(Side::Black), 10),
                first_is_white: false,
            }],
        );
        let b = aggregate_results(
            "a",
            "b",
            vec![GameOutcomeWithContext {
                outcome: outcome(None, 30),
                first_is_white: true,
            }],
        );
        let both = a.combine(&b);
        assert_eq!(both.games_played, 2);
        assert_eq!(both.first_wins, 1);
        assert_eq!(both.draws, 1);
        assert_eq!(both.avg_rounds, 20.0);
        assert_eq!(both.game_outcomes.len(), 2);
    }

    #[test]
    fn test_colors_alternate() {
        let configs = prepare_game_configs(4);
        let whites: Vec<bool> = configs.iter().map(|gc| gc.first_is_white).collect();
        assert_eq!(whites, vec![true, false, true, false]);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let first = Entrant::tier(AiTier::Greedy);
        let second = Entrant::tier(AiTier::Random);
        let parallel = play_match(&first, &second, &quick(4));
        let sequential = play_match(&first, &second, &quick(4).sequential());
        assert_eq!(parallel, sequential);
        assert_eq!(
            parallel.first_wins + parallel.second_wins + parallel.draws,
            parallel.games_played
        );
    }
}
