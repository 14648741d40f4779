//! Plain text output formatter

use super::OutputFormatter;
use anyhow::Result;
use embalign_core::{AlignmentLink, ProcessingMetadata, SentenceAlignment};
use std::io::{self, Write};

/// Plain text formatter - outputs one `i-j` line per sentence pair
pub struct TextFormatter<W: Write> {
    writer: W,
    include_scores: bool,
    show_methods: bool,
}

impl<W: Write> TextFormatter<W> {
    /// Create a new text formatter
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            include_scores: false,
            show_methods: false,
        }
    }

    /// Append `:score` to every link
    pub fn with_scores(mut self, include: bool) -> Self {
        self.include_scores = include;
        self
    }

    /// Print `index<TAB>method<TAB>links` for every configured method instead
    pub fn with_methods(mut self, show: bool) -> Self {
        self.show_methods = show;
        self
    }

    fn scored(links: &[AlignmentLink]) -> String {
        links
            .iter()
            .map(|link| match link.mean_score() {
                Some(score) => format!("{link}:{score:.3}"),
                None => link.to_string(),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl TextFormatter<io::Stdout> {
    /// Create a formatter that writes to stdout
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send + Sync> OutputFormatter for TextFormatter<W> {
    fn format_pair(&mut self, pair: &SentenceAlignment) -> Result<()> {
        if self.show_methods && !pair.by_method.is_empty() {
            for method in &pair.by_method {
                writeln!(
                    self.writer,
                    "{}\t{}\t{}",
                    pair.index,
                    method.method.key(),
                    method.alignment
                )?;
            }
        } else if self.include_scores {
            writeln!(self.writer, "{}", Self::scored(&pair.links))?;
        } else {
            writeln!(self.writer, "{}", pair.alignment)?;
        }
        Ok(())
    }

    fn finish(&mut self, _metadata: &ProcessingMetadata) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
