//! Match command - play games between two AI tiers
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: build_entrants(), play_match_with_progress(), report_results()
//! - Level 3: game_records(), print_text_results(), print_json_results()
//! - Level 4: formatting utilities

use anyhow::{ensure, Result};
use clap::Args;

use siege_core::{AiTier, Side, WinReason};
use siege_tournament::{play_match, Entrant, MatchConfig, MatchResult};

use crate::common::{ai_config, percent, progress_bar, resolve_seed, RulesArgs};

/// Games handed to the pool at a time between progress updates. Even, so
/// color alternation is unbroken across chunks.
const CHUNK_GAMES: usize = 8;

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct MatchArgs {
    /// First entrant's tier; plays white in odd-numbered games
    #[arg(long)]
    pub white: AiTier,

    /// Second entrant's tier
    #[arg(long)]
    pub black: AiTier,

    /// Number of games to play (will alternate colors)
    #[arg(long, default_value = "10")]
    pub games: usize,

    /// Minimax search depth in actions
    #[arg(long, default_value = "2")]
    pub depth: u32,

    /// Maximum rounds per game
    #[arg(long, default_value = "40")]
    pub max_rounds: u32,

    #[command(flatten)]
    pub rules: RulesArgs,

    /// Run games one at a time instead of on the thread pool
    #[arg(long)]
    pub sequential: bool,

    /// Show a progress bar
    #[arg(long)]
    pub progress: bool,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

/// Result of a single game, as reported
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
struct GameRecord {
    game_number: usize,
    white: String,
    black: String,
    /// Winning entrant's name
    winner: Option<String>,
    reason: Option<WinReason>,
    rounds: u32,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run match command
///
/// 1. Build both entrants
/// 2. Play the match in chunks, updating progress
/// 3. Report results
pub fn run(args: MatchArgs, seed: Option<u64>) -> Result<()> {
    ensure!(args.games > 0, "--games must be at least 1");
    let rules = args.rules.load()?;
    let (first, second) = build_entrants(&args);

    tracing::info!(
        "Starting match: {} vs {} ({} games, depth={})",
        first.name,
        second.name,
        args.games,
        args.depth
    );

    let config = MatchConfig {
        games: args.games,
        max_rounds: args.max_rounds,
        seed: resolve_seed(seed),
        parallel: !args.sequential,
        rules,
    };
    let result = play_match_with_progress(&first, &second, &config, args.progress);

    report_results(&result, &args)
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

/// Entrants named by tier, told apart when both use the same tier
fn build_entrants(args: &MatchArgs) -> (Entrant, Entrant) {
    let (first_name, second_name) = if args.white == args.black {
        (format!("{}-a", args.white), format!("{}-b", args.black))
    } else {
        (args.white.to_string(), args.black.to_string())
    };
    (
        Entrant::new(first_name, ai_config(args.white, args.depth)),
        Entrant::new(second_name, ai_config(args.black, args.depth)),
    )
}

/// Same games and seeds as one `play_match` call, split so progress shows
fn play_match_with_progress(
    first: &Entrant,
    second: &Entrant,
    config: &MatchConfig,
    progress: bool,
) -> MatchResult {
    let pb = progress_bar(config.games as u64, "games", progress);
    let mut total = MatchResult::empty(&first.name, &second.name);

    let mut start = 0;
    while start < config.games {
        let games = CHUNK_GAMES.min(config.games - start);
        let chunk = MatchConfig {
            games,
            seed: config.seed.wrapping_add(start as u64),
            ..config.clone()
        };
        total = total.combine(&play_match(first, second, &chunk));
        start += games;
        pb.set_position(start as u64);
    }

    pb.finish_and_clear();
    total
}

fn report_results(result: &MatchResult, args: &MatchArgs) -> Result<()> {
    if args.json {
        print_json_results(result)
    } else {
        print_text_results(result);
        Ok(())
    }
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

fn game_records(result: &MatchResult) -> Vec<GameRecord> {
    result
        .game_outcomes
        .iter()
        .enumerate()
        .map(|(i, outcome)| {
            let (white, black) = if i % 2 == 0 {
                (&result.first, &result.second)
            } else {
                (&result.second, &result.first)
            };
            let winner = outcome.winner.map(|side| match side {
                Side::White => white.clone(),
                Side::Black => black.clone(),
            });
            GameRecord {
                game_number: i + 1,
                white: white.clone(),
                black: black.clone(),
                winner,
                reason: outcome.reason,
                rounds: outcome.rounds,
            }
        })
        .collect()
}

fn print_json_results(result: &MatchResult) -> Result<()> {
    #[derive(serde::Serialize)]
    struct JsonOutput<'a> {
        first: &'a str,
        second: &'a str,
        total_games: u32,
        first_wins: u32,
        second_wins: u32,
        draws: u32,
        white_wins: u32,
        siegemates: u32,
        eliminations: u32,
        avg_rounds: f32,
        first_win_rate: f32,
        games: Vec<GameRecord>,
    }

    let output = JsonOutput {
        first: &result.first,
        second: &result.second,
        total_games: result.games_played,
        first_wins: result.first_wins,
        second_wins: result.second_wins,
        draws: result.draws,
        white_wins: result.white_wins,
        siegemates: result.siegemates,
        eliminations: result.eliminations,
        avg_rounds: result.avg_rounds,
        first_win_rate: result.first_win_rate(),
        games: game_records(result),
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_text_results(result: &MatchResult) {
    let total = result.games_played;

    println!("\n=== Match Results ===");
    println!("Total games:  {}", total);
    println!(
        "{:<13} {} ({:.1}%)",
        format!("{} wins:", result.first),
        result.first_wins,
        percent(result.first_wins, total)
    );
    println!(
        "{:<13} {} ({:.1}%)",
        format!("{} wins:", result.second),
        result.second_wins,
        percent(result.second_wins, total)
    );
    println!("Draws:        {} ({:.1}%)", result.draws, percent(result.draws, total));
    println!("White wins:   {} ({:.1}%)", result.white_wins, percent(result.white_wins, total));
    println!("Siegemates:   {}", result.siegemates);
    println!("Eliminations: {}", result.eliminations);
    println!("Avg rounds:   {:.1}", result.avg_rounds);

    println!("\nGame details:");
    for game in game_records(result) {
        let verdict = match (&game.winner, game.reason) {
            (Some(winner), Some(reason)) => format!("{} by {}", winner, reason),
            _ => "draw".to_string(),
        };
        println!(
            "  Game {}: {} (W) vs {} (B): {} in {} rounds",
            game.game_number, game.white, game.black, verdict, game.rounds
        );
    }
}

// ============================================================================
// TESTS
// ============================================================================
