//! CLI command implementations

use anyhow::Result;
use clap::Subcommand;

pub mod align;
pub mod generate_config;
pub mod list;
pub mod validate;

/// Available CLI commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Align parallel sentences word by word
    Align(align::AlignArgs),

    /// List available components
    List {
        #[command(subcommand)]
        subcommand: ListCommands,
    },

    /// Write a commented configuration template
    GenerateConfig(generate_config::GenerateConfigArgs),

    /// Check a configuration file
    Validate(validate::ValidateArgs),
}

/// List subcommands
#[derive(Debug, Clone, Copy, Subcommand)]
pub enum ListCommands {
    /// List matching methods
    Methods,

    /// List alignment modes
    Modes,

    /// List output formats
    Formats,
}

impl Commands {
    /// Run the selected command
    pub fn execute(&self) -> Result<()> {
        match self {
            Commands::Align(args) => args.execute(),
            Commands::List { subcommand } => subcommand.execute(),
            Commands::GenerateConfig(args) => args.execute(),
            Commands::Validate(args) => args.execute(),
        }
    }
}
