//! List command implementation

use std::io::Write;

use anyhow::Result;
use embalign_core::{AlignmentMode, MatchingMethod};

use super::ListCommands;

impl ListCommands {
    /// Print the requested listing to stdout
    pub fn execute(&self) -> Result<()> {
        self.write_to(&mut std::io::stdout())
    }

    /// Write the requested listing
    pub fn write_to(&self, out: &mut impl Write) -> Result<()> {
        match self {
            ListCommands::Methods => {
                writeln!(out, "Matching methods (direct mode):")?;
                for method in MatchingMethod::ALL {
                    writeln!(
                        out,
                        "  {:<8} {}  {}",
                        method.key(),
                        method.code(),
                        method.description()
                    )?;
                }
            }
            ListCommands::Modes => {
                writeln!(out, "Alignment modes:")?;
                for mode in AlignmentMode::ALL {
                    writeln!(out, "  {:<11} {}", mode.key(), mode.description())?;
                }
            }
            ListCommands::Formats => {
                writeln!(out, "Output formats:")?;
                writeln!(out, "  text   one line of i-j links per sentence pair")?;
                writeln!(out, "  json   links with scores and processing metadata")?;
            }
        }
        Ok(())
    }
}
