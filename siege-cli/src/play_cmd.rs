//! Play command - one AI-vs-AI game, shown in full
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: play_game(), report_game()
//! - Level 3: print_text_report(), print_json_report()
//! - Level 4: render_board()

use anyhow::Result;
use clap::Args;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use siege_core::{AiTier, Coord, GameState, Side, BOARD_SIZE};
use siege_tournament::{GameOutcome, GameRunner};

use crate::common::{ai_config, resolve_seed, RulesArgs};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct PlayArgs {
    /// AI tier for white: random, greedy or minimax
    #[arg(long, default_value = "greedy")]
    pub white: AiTier,

    /// AI tier for black
    #[arg(long, default_value = "greedy")]
    pub black: AiTier,

    /// Minimax search depth in actions
    #[arg(long, default_value = "2")]
    pub depth: u32,

    /// Stop after this round; an unfinished game is a draw
    #[arg(long, default_value = "40")]
    pub max_rounds: u32,

    #[command(flatten)]
    pub rules: RulesArgs,

    /// Print the outcome and final snapshot as JSON
    #[arg(long)]
    pub json: bool,

    /// Print the in-game log
    #[arg(long)]
    pub show_log: bool,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

pub fn run(args: PlayArgs, seed: Option<u64>) -> Result<()> {
    let rules = args.rules.load()?;
    let seed = resolve_seed(seed);

    tracing::info!(
        white = %args.white,
        black = %args.black,
        depth = args.depth,
        rules = %rules.name,
        "starting game"
    );

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let initial = GameState::new(rules.clone(), &mut rng);
    let (state, outcome) = play_game(&args, initial, seed);

    report_game(&args, seed, &state, &outcome)
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

fn play_game(args: &PlayArgs, initial: GameState, seed: u64) -> (GameState, GameOutcome) {
    let runner = GameRunner::new(
        ai_config(args.white, args.depth),
        ai_config(args.black, args.depth),
        initial.rules().clone(),
    );
    runner.play_to_end(initial, args.max_rounds, seed)
}

fn report_game(args: &PlayArgs, seed: u64, state: &GameState, outcome: &GameOutcome) -> Result<()> {
    if args.json {
        print_json_report(seed, state, outcome)
    } else {
        print_text_report(args, seed, state, outcome);
        Ok(())
    }
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

fn print_json_report(seed: u64, state: &GameState, outcome: &GameOutcome) -> Result<()> {
    #[derive(serde::Serialize)]
    struct JsonOutput<'a> {
        seed: u64,
        outcome: &'a GameOutcome,
        final_state: &'a GameState,
    }

    let output = JsonOutput {
        seed,
        outcome,
        final_state: state,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_text_report(args: &PlayArgs, seed: u64, state: &GameState, outcome: &GameOutcome) {
    if args.show_log {
        println!("=== Game Log ===");
        for line in state.log() {
            println!("  {}", line);
        }
        println!();
    }

    println!("=== Final Position ===");
    print!("{}", render_board(state));
    println!();

    println!("White ({}) vs Black ({}), seed {}", args.white, args.black, seed);
    match (outcome.winner, outcome.reason) {
        (Some(winner), Some(reason)) => {
            println!("Result:  {} wins by {} in round {}", winner, reason, outcome.rounds)
        }
        _ => println!("Result:  no winner after {} rounds", args.max_rounds),
    }
    println!("Actions: {}", outcome.actions.len());
    for side in [Side::White, Side::Black] {
        let counters = state.side(side);
        let stats = counters.stats;
        println!(
            "{:<6} board {:>2}  reserve {:>2}  captive {:>2}  void {:>2}  | captures {} sieges {} drafts {} evasions {}",
            side.to_string(),
            state.on_board_count(side),
            counters.reserve,
            counters.captive,
            counters.void,
            stats.captures,
            stats.sieges,
            stats.drafts,
            stats.evasions,
        );
    }
}

// ============================================================================
// LEVEL 4 - UTILITIES
// ============================================================================

/// Text diagram, rank 6 at the top. Locked tokens carry a `*`.
fn render_board(state: &GameState) -> String {
    let mut out = String::new();
    for y in (0..BOARD_SIZE).rev() {
        out.push_str(&format!("{} ", y + 1));
        for x in 0..BOARD_SIZE {
            let cell = match state.occupant(Coord::new(x, y)) {
                Some(token) => {
                    let lock = if state.is_locked(token.id) { "*" } else { "" };
                    format!("{}{}", token.id, lock)
                }
                None => ".".to_string(),
            };
            out.push_str(&format!("{:>5}", cell));
        }
        out.push('\n');
    }
    out.push_str("  ");
    for file in siege_core::board::FILES.chars() {
        out.push_str(&format!("{:>5}", file));
    }
    out.push('\n');
    out
}
