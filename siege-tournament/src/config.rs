//! Configuration types for tournament play
//!
//! Level 4 - Utilities and configuration

use serde::{Deserialize, Serialize};
use siege_core::{AiConfig, AiTier, RuleSet};

/// A named AI configuration taking part in matches
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Entrant {
    pub name: String,
    pub ai: AiConfig,
}

impl Entrant {
    pub fn new(name: impl Into<String>, ai: AiConfig) -> Self {
        Self {
            name: name.into(),
            ai,
        }
    }

    /// Entrant named after its tier, with default settings
    pub fn tier(tier: AiTier) -> Self {
        Self::new(tier.name(), AiConfig::tier(tier))
    }

    /// Minimax entrant at a given depth, named e.g. "minimax-d2"
    pub fn minimax(depth: u32) -> Self {
        Self::new(format!("minimax-d{}", depth), AiConfig::minimax(depth))
    }
}

/// Configuration for a match between two entrants
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Games to play (even numbers give each entrant both colors equally)
    pub games: usize,
    /// Games still running after this round are draws
    pub max_rounds: u32,
    /// Base seed; game `i` uses `seed + i`
    pub seed: u64,
    /// Whether to run games in parallel
    pub parallel: bool,
    pub rules: RuleSet,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            games: 10,
            max_rounds: 40,
            seed: 42,
            parallel: true,
            rules: RuleSet::standard(),
        }
    }
}

impl MatchConfig {
    pub fn new(games: usize) -> Self {
        Self {
            games,
            ..Default::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_rules(mut self, rules: RuleSet) -> Self {
        self.rules = rules;
        self
    }

    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }
}

/// Tournament configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TournamentConfig {
    /// Number of games per pairing (should be even for color alternation)
    pub games_per_match: usize,
    /// Maximum rounds per game
    pub max_rounds: u32,
    pub seed: u64,
    /// Run pairings and games in parallel
    pub parallel: bool,
    pub rules: RuleSet,
}

impl Default for TournamentConfig {
    fn default() -> Self {
        Self {
            games_per_match: 10,
            max_rounds: 40,
            seed: 42,
            parallel: true,
            rules: RuleSet::standard(),
        }
    }
}

impl TournamentConfig {
    /// Create round-robin tournament config
    pub fn round_robin(games_per_match: usize) -> Self {
        Self {
            games_per_match,
            ..Default::default()
        }
    }

    /// Match settings for the pairing at `pairing_index`. Each pairing gets
    /// its own seed block so results do not depend on scheduling order.
    pub fn match_config(&self, pairing_index: usize) -> MatchConfig {
        let stride = self.games_per_match.max(1) as u64;
        MatchConfig {
            games: self.games_per_match,
            max_rounds: self.max_rounds,
            seed: self
                .seed
                .wrapping_add(pairing_index as u64 * stride * 1000),
            parallel: self.parallel,
            rules: self.rules.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_config_defaults() {
        let config = MatchConfig::default();
        assert_eq!(config.games, 10);
        assert_eq!(config.max_rounds, 40);
        assert!(config.parallel);
        assert_eq!(config.rules, RuleSet::standard());
    }

    #[test]
    fn test_match_config_builders() {
        let config = MatchConfig::new(4)
            .with_seed(7)
            .with_rules(RuleSet::tournament())
            .sequential();
        assert_eq!(config.games, 4);
        assert_eq!(config.seed, 7);
        assert_eq!(config.rules.hand_cap, 5);
        assert!(!config.parallel);
    }

    #[test]
    fn test_entrant_names() {
        assert_eq!(Entrant::tier(AiTier::Greedy).name, "greedy");
        let deep = Entrant::minimax(2);
        assert_eq!(deep.name, "minimax-d2");
        assert_eq!(deep.ai.tier, AiTier::Minimax);
        assert_eq!(deep.ai.depth, 2);
    }

    #[test]
    fn test_pairings_get_distinct_seeds() {
        let config = TournamentConfig::round_robin(4);
        let first = config.match_config(0);
        let second = config.match_config(1);
        assert_eq!(first.games, 4);
        assert_eq!(first.seed, 42);
        assert_ne!(first.seed, second.seed);
    }

    #[test]
    fn test_config_from_partial_json() {
        let config: TournamentConfig = serde_json::from_str(r#"{"games_per_match": 6}"#).unwrap();
        assert_eq!(config.games_per_match, 6);
        assert_eq!(config.max_rounds, 40);
    }
}
