//! Round-robin tournaments between AI entrants
//!
//! Level 1 - Orchestration and Level 2 - Phases

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use siege_core::{Side, WinReason};

use crate::config::{Entrant, TournamentConfig};
use crate::match_play::{play_match, MatchResult};

/// One entrant's line in the final table
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Standing {
    /// Position of the entrant in the list passed to `run_tournament`
    pub entrant: usize,
    pub name: String,
    /// Wins plus half the draws
    pub score: f32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub siegemate_wins: u32,
    pub elimination_wins: u32,
    pub games_played: u32,
    pub avg_rounds: f32,
    /// Sum of the scores of everyone this entrant met
    pub buchholz: f32,
}

impl Standing {
    pub fn win_rate(&self) -> f32 {
        self.per_game(self.wins as f32)
    }

    /// Score per game, 0.0 to 1.0
    pub fn points_per_game(&self) -> f32 {
        self.per_game(self.score)
    }

    fn per_game(&self, value: f32) -> f32 {
        match self.games_played {
            0 => 0.0,
            games => value / games as f32,
        }
    }

    fn record_game(&mut self, won: Option<bool>, reason: Option<WinReason>, rounds: u32) {
        self.games_played += 1;
        self.avg_rounds += (rounds as f32 - self.avg_rounds) / self.games_played as f32;
        match won {
            Some(true) => {
                self.wins += 1;
                match reason {
                    Some(WinReason::Siegemate) => self.siegemate_wins += 1,
                    Some(WinReason::Elimination) => self.elimination_wins += 1,
                    None => {}
                }
            }
            Some(false) => self.losses += 1,
            None => self.draws += 1,
        }
        self.score = self.wins as f32 + 0.5 * self.draws as f32;
    }
}

/// Result of a tournament
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TournamentResult {
    /// Best first: by score, then Buchholz
    pub standings: Vec<Standing>,
    /// One result per pairing; the lower-indexed entrant is `first`
    pub matches: Vec<MatchResult>,
}

impl TournamentResult {
    pub fn winner(&self) -> Option<&Standing> {
        self.standings.first()
    }

    pub fn standing_of(&self, name: &str) -> Option<&Standing> {
        self.standings.iter().find(|s| s.name == name)
    }
}

// ============================================================================
// Level 1 - Orchestration
// ============================================================================

/// Every entrant plays every other entrant `games_per_match` games with
/// colors alternating. Pairings run on the rayon pool when `parallel` is set.
pub fn run_tournament(entrants: &[Entrant], config: &TournamentConfig) -> TournamentResult {
    let pairings = round_robin_pairings(entrants.len());
    tracing::info!(
        entrants = entrants.len(),
        pairings = pairings.len(),
        games_per_match = config.games_per_match,
        "tournament starting"
    );

    let play = |(index, &(i, j)): (usize, &(usize, usize))| {
        play_match(&entrants[i], &entrants[j], &config.match_config(index))
    };
    let matches: Vec<MatchResult> = if config.parallel {
        pairings.par_iter().enumerate().map(play).collect()
    } else {
        pairings.iter().enumerate().map(play).collect()
    };

    let standings = tally_standings(entrants, &pairings, &matches);
    TournamentResult { standings, matches }
}

// ============================================================================
// Level 3 - Steps
// ============================================================================

/// Index pairs (i, j) with i < j
fn round_robin_pairings(n: usize) -> Vec<(usize, usize)> {
    (0..n)
        .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
        .collect()
}

/// Credit every game to the entrants that played it, then rank
fn tally_standings(
    entrants: &[Entrant],
    pairings: &[(usize, usize)],
    matches: &[MatchResult],
) -> Vec<Standing> {
    let mut standings: Vec<Standing> = entrants
        .iter()
        .enumerate()
        .map(|(entrant, e)| Standing {
            entrant,
            name: e.name.clone(),
            ..Standing::default()
        })
        .collect();

    for (&(first, second), result) in pairings.iter().zip(matches) {
        for (game, outcome) in result.game_outcomes.iter().enumerate() {
            // The first entrant has white in even-numbered games
            let white = if game % 2 == 0 { first } else { second };
            let white_won = outcome.winner.map(|side| side == Side::White);
            standings[first].record_game(
                white_won.map(|w| w == (white == first)),
                outcome.reason,
                outcome.rounds,
            );
            standings[second].record_game(
                white_won.map(|w| w == (white == second)),
                outcome.reason,
                outcome.rounds,
            );
        }
    }

    let scores: Vec<f32> = standings.iter().map(|s| s.score).collect();
    for &(i, j) in pairings {
        standings[i].buchholz += scores[j];
        standings[j].buchholz += scores[i];
    }

    standings.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then(b.buchholz.total_cmp(&a.buchholz))
    });
    standings
}
