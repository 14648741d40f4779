//! JSON output formatter

use super::OutputFormatter;
use anyhow::Result;
use embalign_core::{ProcessingMetadata, SentenceAlignment};
use serde::Serialize;
use std::io::Write;

/// JSON formatter - outputs all pairs and the run metadata as one document
pub struct JsonFormatter<W: Write> {
    writer: W,
    pretty: bool,
    alignments: Vec<SentenceAlignment>,
}

/// Data structure for JSON output
#[derive(Debug, Serialize)]
struct Document<'a> {
    alignments: &'a [SentenceAlignment],
    metadata: &'a ProcessingMetadata,
}

impl<W: Write> JsonFormatter<W> {
    /// Create a new JSON formatter
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            pretty: true,
            alignments: Vec::new(),
        }
    }

    /// Toggle pretty printing
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

impl<W: Write + Send + Sync> OutputFormatter for JsonFormatter<W> {
    fn format_pair(&mut self, pair: &SentenceAlignment) -> Result<()> {
        self.alignments.push(pair.clone());
        Ok(())
    }

    fn finish(&mut self, metadata: &ProcessingMetadata) -> Result<()> {
        let document = Document {
            alignments: &self.alignments,
            metadata,
        };
        if self.pretty {
            serde_json::to_writer_pretty(&mut self.writer, &document)?;
        } else {
            serde_json::to_writer(&mut self.writer, &document)?;
        }
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(())
    }
}
