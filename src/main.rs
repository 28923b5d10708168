use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use knightfall::board::Color;
use knightfall::protocol::{ProtocolConfig, ProtocolHandler};
use knightfall::selector::Difficulty;

/// Play chess on the command line, optionally against the built-in selector.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Side the computer plays (white or black).
    #[arg(long)]
    ai: Option<Color>,

    /// easy, medium or hard.
    #[arg(short, long, default_value = "medium")]
    difficulty: Difficulty,

    /// Seed for reproducible computer moves.
    #[arg(long)]
    seed: Option<u64>,

    /// Pause before the computer replies, in milliseconds.
    #[arg(long, default_value_t = 500)]
    delay_ms: u64,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut handler = ProtocolHandler::new(ProtocolConfig {
        ai_color: cli.ai,
        difficulty: cli.difficulty,
        seed: cli.seed,
        ai_delay: Duration::from_millis(cli.delay_ms),
    });
    handler.run()
}
