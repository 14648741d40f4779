//! File reading utilities

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// File reader with UTF-8 validation
pub struct FileReader;

impl FileReader {
    /// Read a file as UTF-8 text
    pub fn read_text(path: &Path) -> Result<String> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;

        Ok(content)
    }

    /// Read a file as one sentence per line
    pub fn read_lines(path: &Path) -> Result<Vec<String>> {
        Ok(Self::read_text(path)?
            .lines()
            .map(|line| line.trim_end_matches('\r').to_string())
            .collect())
    }
}
