//! Generate config command implementation

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use crate::config::CliConfig;

/// Arguments for the generate-config command
#[derive(Debug, Args)]
pub struct GenerateConfigArgs {
    /// Output file path
    #[arg(short, long, value_name = "FILE", required = true)]
    pub output: PathBuf,
}

impl GenerateConfigArgs {
    /// Execute the generate-config command
    pub fn execute(&self) -> Result<()> {
        use std::fs;

        println!("Generating configuration template...");
        println!("  Output file: {}", self.output.display());

        let template = Self::generate_template();

        fs::write(&self.output, template)
            .with_context(|| format!("Failed to write to {}", self.output.display()))?;

        println!("✓ Configuration template generated successfully!");
        println!();
        println!("Next steps:");
        println!("1. Edit the configuration file");
        println!("2. Validate your configuration:");
        println!("   embalign validate -c {}", self.output.display());
        println!("3. Use it for alignment:");
        println!(
            "   embalign align -p pairs.txt -c {}",
            self.output.display()
        );

        Ok(())
    }

    /// Generate template configuration content
    fn generate_template() -> String {
        let defaults = CliConfig::default();
        let alignment = &defaults.alignment;
        let output = &defaults.output;
        let performance = &defaults.performance;

        format!(
            r#"# embalign configuration
# Flags given on the command line override these values.

[alignment]
# direct | span-iter | span-freq | span-bidir
mode = "{mode}"

# bpe: compare sub-words and fold links back to words
# word: average sub-words into one vector per word first
token_type = "{token_type}"

# Matching methods for direct mode, as keys or single-letter codes:
#   fwd (f), rev (r), inter (a), mwmf (m), itermax (i)
# The first method gives the primary alignment.
methods = "{methods}"

# Positional prior in [0, 1]; 0 disables it
distortion = {distortion:?}

# Entropy threshold in [0, 1]; 1 keeps every link
null_align = {null_align:?}

# Longest span for the span modes (1 to 3 words)
max_span_len = {max_span_len}

# Round budget of the itermax method
itermax_rounds = {itermax_rounds}

# Precomputed embeddings in JSON Lines format; without it the built-in
# hashing provider is used
# embeddings = "embeddings.jsonl"

# Vector width of the hashing provider
hash_dim = {hash_dim}

[output]
# text | json
format = "{format}"

# Text output: append the mean similarity to each link
include_scores = {include_scores}

# Text output: one line per configured method
show_methods = {show_methods}

pretty_json = {pretty_json}

[performance]
# Sentence pairs per embedding call
batch_size = {batch_size}

# Number of worker threads (0 = auto)
worker_threads = {worker_threads}
"#,
            mode = alignment.mode,
            token_type = alignment.token_type,
            methods = alignment.methods,
            distortion = alignment.distortion,
            null_align = alignment.null_align,
            max_span_len = alignment.max_span_len,
            itermax_rounds = alignment.itermax_rounds,
            hash_dim = alignment.hash_dim,
            format = output.format,
            include_scores = output.include_scores,
            show_methods = output.show_methods,
            pretty_json = output.pretty_json,
            batch_size = performance.batch_size,
            worker_threads = performance.worker_threads,
        )
    }
}
