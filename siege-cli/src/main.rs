//! Siege CLI - Command-line interface
//!
//! Commands:
//! - play: Play a single AI-vs-AI game and show how it went
//! - match: Play a series of games between two AI tiers
//! - tournament: Round-robin between several AI tiers

mod common;
mod match_cmd;
mod play_cmd;
mod tournament_cmd;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "siege")]
#[command(about = "Siege rules engine and AI harness")]
struct Cli {
    /// Random seed (omit for a fresh one each run)
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a single game
    Play(play_cmd::PlayArgs),
    /// Play a match between two AI tiers
    Match(match_cmd::MatchArgs),
    /// Run a round-robin tournament
    Tournament(tournament_cmd::TournamentArgs),
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so --json output stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Play(args) => play_cmd::run(args, cli.seed),
        Commands::Match(args) => match_cmd::run(args, cli.seed),
        Commands::Tournament(args) => tournament_cmd::run(args, cli.seed),
    }
}
