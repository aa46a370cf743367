//! RuleSet - tunable constants for a game

use crate::game::Side;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Game constants. Every field has an explicit default so older snapshots
/// that predate a field still load.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSet {
    pub name: String,
    /// Tokens each side places during the opening
    pub opening_tokens: u32,
    /// Tokens each side holds in reserve once the opening is done
    pub reserve_tokens: u32,
    /// Hand size dealt when the opening ends
    pub starting_hand: usize,
    /// Escalation stops at this hand size
    pub hand_cap: usize,
    /// Copies of each distinct route in the deck
    pub route_copies: usize,
    /// Reserve paid to Void for one extra reinforcement
    pub extra_reinforcement_cost: u32,
    /// Captives paid for an early swap
    pub early_swap_cost: u32,
    pub evasion_captive_cost: u32,
    pub evasion_reserve_cost: u32,
    /// Invasions in one turn needed to earn a draft
    pub draft_threshold: u32,
    /// Most Void tokens one draft returns; `None` refunds everything
    pub draft_refund_cap: Option<u32>,
    pub first_player: Side,
}

impl RuleSet {
    /// Standard rules
    pub fn standard() -> Self {
        Self::default()
    }

    /// Tournament variant: larger hands
    pub fn tournament() -> Self {
        Self {
            name: "tournament".to_string(),
            hand_cap: 5,
            ..Self::default()
        }
    }

    /// Look up a preset by name
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "standard" | "default" => Some(Self::standard()),
            "tournament" => Some(Self::tournament()),
            _ => None,
        }
    }

    /// Tokens a side owns for the whole game
    pub fn tokens_per_side(&self) -> u32 {
        self.opening_tokens.saturating_add(self.reserve_tokens)
    }

    /// Load from JSON file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading rule set {}", path.display()))?;
        let rules: RuleSet = serde_json::from_str(&content)
            .with_context(|| format!("parsing rule set {}", path.display()))?;
        rules.validate()?;
        Ok(rules)
    }

    /// Save to JSON file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject configurations the engine cannot run
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.starting_hand == 0 {
            anyhow::bail!("starting_hand must be at least 1");
        }
        if self.hand_cap < self.starting_hand {
            anyhow::bail!(
                "hand_cap {} is smaller than starting_hand {}",
                self.hand_cap,
                self.starting_hand
            );
        }
        if self.opening_tokens == 0 {
            anyhow::bail!("opening_tokens must be at least 1");
        }
        let opening_squares = self.opening_tokens.checked_mul(2);
        if opening_squares.map_or(true, |n| n > 36) {
            anyhow::bail!("opening_tokens {} do not fit on the board", self.opening_tokens);
        }
        if self.opening_tokens.checked_add(self.reserve_tokens).is_none() {
            anyhow::bail!("reserve_tokens {} is too large", self.reserve_tokens);
        }
        // Both full hands plus the queue must leave at least one card behind
        let deck_size = self.route_copies.checked_mul(crate::routes::ROUTE_KINDS);
        let dealt = self
            .hand_cap
            .checked_mul(2)
            .and_then(|n| n.checked_add(crate::game::QUEUE_SIZE));
        if deck_size.zip(dealt).map_or(true, |(deck, dealt)| deck <= dealt) {
            anyhow::bail!("route_copies {} leaves the deck too small", self.route_copies);
        }
        Ok(())
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            name: "standard".to_string(),
            opening_tokens: 3,
            reserve_tokens: 12,
            starting_hand: 2,
            hand_cap: 4,
            route_copies: 2,
            extra_reinforcement_cost: 2,
            early_swap_cost: 2,
            evasion_captive_cost: 1,
            evasion_reserve_cost: 1,
            draft_threshold: 3,
            draft_refund_cap: Some(2),
            first_player: Side::White,
        }
    }
}
