//! Shared command arguments and helpers
//!
//! Level 4 - Configuration and formatting utilities

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};

use siege_core::{AiConfig, AiTier, RuleSet};

/// Rule selection shared by every command
#[derive(Args, Clone, Debug)]
pub struct RulesArgs {
    /// Rule set JSON file (overrides --preset)
    #[arg(long, value_name = "FILE")]
    pub rules: Option<PathBuf>,

    /// Built-in rule preset: standard or tournament
    #[arg(long, default_value = "standard")]
    pub preset: String,
}

impl RulesArgs {
    pub fn load(&self) -> Result<RuleSet> {
        match &self.rules {
            Some(path) => RuleSet::load(path)
                .with_context(|| format!("Failed to load rule set: {}", path.display())),
            None => RuleSet::preset(&self.preset)
                .with_context(|| format!("Unknown rule preset '{}'", self.preset)),
        }
    }
}

/// AI settings for one side; depth only matters for minimax
pub fn ai_config(tier: AiTier, depth: u32) -> AiConfig {
    AiConfig {
        depth,
        ..AiConfig::tier(tier)
    }
}

/// Use the given seed or draw a fresh one, logging it so runs can be repeated
pub fn resolve_seed(seed: Option<u64>) -> u64 {
    let seed = seed.unwrap_or_else(rand::random);
    tracing::info!(seed, "using seed");
    seed
}

/// Progress bar over `len` items, hidden when `enabled` is false
pub fn progress_bar(len: u64, unit: &str, enabled: bool) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len);
    let template = format!(
        "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {}",
        unit
    );
    if let Ok(style) = ProgressStyle::default_bar().template(&template) {
        pb.set_style(style.progress_chars("=>-"));
    }
    pb
}

/// Percentage of `count` in `total`, 0 when there is nothing to count
pub fn percent(count: u32, total: u32) -> f32 {
    if total == 0 {
        0.0
    } else {
        count as f32 / total as f32 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rules_preset() {
        let args = RulesArgs {
            rules: None,
            preset: "tournament".to_string(),
        };
        assert_eq!(args.load().unwrap().hand_cap, 5);
    }

    #[test]
    fn test_unknown_preset_is_an_error() {
        let args = RulesArgs {
            rules: None,
            preset: "blitz".to_string(),
        };
        let err = args.load().unwrap_err();
        assert!(err.to_string().contains("blitz"));
    }

    #[test]
    fn test_missing_rules_file() {
        let args = RulesArgs {
            rules: Some(PathBuf::from("/nonexistent/rules.json")),
            preset: "standard".to_string(),
        };
        assert!(args.load().is_err());
    }

    #[test]
    fn test_ai_config_depth() {
        let config = ai_config(AiTier::Minimax, 2);
        assert_eq!(config.tier, AiTier::Minimax);
        assert_eq!(config.depth, 2);
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(1, 4), 25.0);
        assert_eq!(percent(3, 0), 0.0);
    }

    #[test]
    fn test_explicit_seed_is_kept() {
        assert_eq!(resolve_seed(Some(9)), 9);
    }
}
