//! embalign command-line tool

use anyhow::Result;
use clap::Parser;
use embalign_cli::commands::Commands;

/// Word alignment between parallel sentences from contextual embeddings
#[derive(Debug, Parser)]
#[command(name = "embalign", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

fn main() -> Result<()> {
    Cli::parse().command.execute()
}
