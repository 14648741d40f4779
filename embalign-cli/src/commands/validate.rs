//! Validate command implementation

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use crate::config::CliConfig;

/// Arguments for the validate command
#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// Path to the configuration file to validate
    #[arg(short = 'c', long, value_name = "FILE", required = true)]
    pub config: PathBuf,
}

impl ValidateArgs {
    /// Execute the validate command
    pub fn execute(&self) -> Result<()> {
        println!("Validating configuration: {}", self.config.display());

        let checked = CliConfig::from_file(&self.config)
            .and_then(|settings| settings.core_config().map(|core| (settings, core)));

        match checked {
            Ok((settings, core)) => {
                println!("✓ Configuration is valid!");
                println!("  Mode: {}", core.mode());
                println!("  Token type: {}", core.token_type());
                let methods: Vec<&str> = core.methods().iter().map(|m| m.key()).collect();
                println!("  Methods: {}", methods.join(", "));
                match &settings.alignment.embeddings {
                    Some(path) => println!("  Embeddings: {}", path.display()),
                    None => println!("  Embeddings: hashing (dim {})", settings.alignment.hash_dim),
                }
                Ok(())
            }
            Err(e) => {
                println!("✗ Configuration is invalid!");
                println!("  Error: {e:#}");
                Err(anyhow::anyhow!("Validation failed: {:#}", e))
            }
        }
    }
}
