//! Tournament command - round-robin between AI tiers
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: build_entrants(), run_with_spinner(), report_results()
//! - Level 3: print_standings(), save_results()
//! - Level 4: formatting utilities

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{ensure, Context, Result};
use clap::Args;
use indicatif::ProgressBar;

use siege_core::AiTier;
use siege_tournament::{run_tournament, Entrant, TournamentConfig, TournamentResult};

use crate::common::{ai_config, percent, resolve_seed, RulesArgs};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct TournamentArgs {
    /// Comma-separated tiers to enter
    #[arg(long, value_delimiter = ',', default_values_t = AiTier::ALL)]
    pub tiers: Vec<AiTier>,

    /// Extra minimax entrants at these depths (e.g. 1,3)
    #[arg(long, value_delimiter = ',')]
    pub minimax_depths: Vec<u32>,

    /// Games per pairing (should be even for color alternation)
    #[arg(long, default_value = "10")]
    pub games_per_match: usize,

    /// Search depth for the plain minimax entrant
    #[arg(long, default_value = "2")]
    pub depth: u32,

    /// Maximum rounds per game
    #[arg(long, default_value = "40")]
    pub max_rounds: u32,

    #[command(flatten)]
    pub rules: RulesArgs,

    /// Run everything on one thread
    #[arg(long)]
    pub sequential: bool,

    /// Show a spinner while games run
    #[arg(long)]
    pub progress: bool,

    /// Print standings as JSON
    #[arg(long)]
    pub json: bool,

    /// Also write the full result (every game) to this JSON file
    #[arg(long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

pub fn run(args: TournamentArgs, seed: Option<u64>) -> Result<()> {
    let entrants = build_entrants(&args);
    ensure!(entrants.len() >= 2, "a tournament needs at least two entrants");

    let config = TournamentConfig {
        games_per_match: args.games_per_match,
        max_rounds: args.max_rounds,
        seed: resolve_seed(seed),
        parallel: !args.sequential,
        rules: args.rules.load()?,
    };

    let start = Instant::now();
    let result = run_with_spinner(&entrants, &config, args.progress);
    tracing::info!(elapsed = ?start.elapsed(), "tournament finished");

    if let Some(path) = &args.output {
        save_results(&result, path)?;
    }
    report_results(&result, &args)
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

/// One entrant per listed tier, then one per extra minimax depth
fn build_entrants(args: &TournamentArgs) -> Vec<Entrant> {
    let mut entrants: Vec<Entrant> = args
        .tiers
        .iter()
        .map(|&tier| {
            let name = match tier {
                AiTier::Minimax => format!("minimax-d{}", args.depth),
                _ => tier.to_string(),
            };
            Entrant::new(name, ai_config(tier, args.depth))
        })
        .collect();
    for &depth in &args.minimax_depths {
        let entrant = Entrant::minimax(depth);
        if !entrants.iter().any(|e| e.name == entrant.name) {
            entrants.push(entrant);
        }
    }
    entrants
}

fn run_with_spinner(entrants: &[Entrant], config: &TournamentConfig, progress: bool) -> TournamentResult {
    let pairings = entrants.len() * entrants.len().saturating_sub(1) / 2;
    let pb = if progress {
        let pb = ProgressBar::new_spinner();
        pb.set_message(format!("{} games", pairings * config.games_per_match));
        pb.enable_steady_tick(Duration::from_millis(120));
        pb
    } else {
        ProgressBar::hidden()
    };

    let result = run_tournament(entrants, config);

    pb.finish_and_clear();
    result
}

fn report_results(result: &TournamentResult, args: &TournamentArgs) -> Result<()> {
    if args.json {
        println!("{}", serde_json::to_string_pretty(&result.standings)?);
    } else {
        print_standings(result);
    }
    Ok(())
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

fn print_standings(result: &TournamentResult) {
    println!("\n=== Standings ===");
    println!(
        "{:<4} {:<14} {:>6} {:>5} {:>5} {:>5} {:>7} {:>10} {:>9}",
        "#", "entrant", "score", "won", "lost", "drawn", "win%", "mate/elim", "avg rnds"
    );
    for (rank, s) in result.standings.iter().enumerate() {
        println!(
            "{:<4} {:<14} {:>6.1} {:>5} {:>5} {:>5} {:>6.1}% {:>10} {:>9.1}",
            rank + 1,
            s.name,
            s.score,
            s.wins,
            s.losses,
            s.draws,
            percent(s.wins, s.games_played),
            format!("{}/{}", s.siegemate_wins, s.elimination_wins),
            s.avg_rounds
        );
    }

    println!("\nPairings:");
    for m in &result.matches {
        println!(
            "  {} vs {}: {}-{} ({} drawn, {} siegemates, {} eliminations)",
            m.first, m.second, m.first_wins, m.second_wins, m.draws, m.siegemates, m.eliminations
        );
    }
}

fn save_results(result: &TournamentResult, path: &Path) -> Result<()> {
    let content = serde_json::to_string_pretty(result)?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write results: {}", path.display()))?;
    tracing::info!(path = %path.display(), "results saved");
    Ok(())
}
