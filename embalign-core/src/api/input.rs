//! Input abstraction for the alignment API

use std::path::{Path, PathBuf};

use crate::api::Error;

/// Separator between source and target in the single-file parallel format
pub const PARALLEL_SEPARATOR: &str = "|||";

/// Parallel corpus from various sources
pub enum Input {
    /// Sentence pairs
    Pairs(Vec<(String, String)>),
    /// Two sentence lists of equal length
    Corpus { source: Vec<String>, target: Vec<String> },
    /// Two files, one sentence per line
    Files { source: PathBuf, target: PathBuf },
    /// Text in `source ||| target` lines
    Text(String),
    /// File in `source ||| target` lines
    File(PathBuf),
}

impl std::fmt::Debug for Input {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Input::Pairs(pairs) => f
                .debug_struct("Input::Pairs")
                .field("count", &pairs.len())
                .finish(),
            Input::Corpus { source, target } => f
                .debug_struct("Input::Corpus")
                .field("source", &source.len())
                .field("target", &target.len())
                .finish(),
            Input::Files { source, target } => f
                .debug_struct("Input::Files")
                .field("source", source)
                .field("target", target)
                .finish(),
            Input::Text(text) => f
                .debug_struct("Input::Text")
                .field("length", &text.len())
                .finish(),
            Input::File(path) => f.debug_struct("Input::File").field("path", path).finish(),
        }
    }
}

impl Input {
    /// Create input from sentence pairs
    pub fn from_pairs<S: Into<String>>(pairs: impl IntoIterator<Item = (S, S)>) -> Self {
        Input::Pairs(
            pairs
                .into_iter()
                .map(|(s, t)| (s.into(), t.into()))
                .collect(),
        )
    }

    /// Create input from two sentence lists
    pub fn from_corpus<S: Into<String>>(
        source: impl IntoIterator<Item = S>,
        target: impl IntoIterator<Item = S>,
    ) -> Self {
        Input::Corpus {
            source: source.into_iter().map(Into::into).collect(),
            target: target.into_iter().map(Into::into).collect(),
        }
    }

    /// Create input from a source file and a target file
    pub fn from_files(source: impl AsRef<Path>, target: impl AsRef<Path>) -> Self {
        Input::Files {
            source: source.as_ref().to_path_buf(),
            target: target.as_ref().to_path_buf(),
        }
    }

    /// Create input from `source ||| target` text
    pub fn from_text(text: impl Into<String>) -> Self {
        Input::Text(text.into())
    }

    /// Create input from a `source ||| target` file
    pub fn from_file(path: impl AsRef<Path>) -> Self {
        Input::File(path.as_ref().to_path_buf())
    }

    /// Resolve the input into source and target sentence lists
    pub(crate) fn into_corpus(self) -> Result<(Vec<String>, Vec<String>), Error> {
        match self {
            Input::Pairs(pairs) => Ok(pairs.into_iter().unzip()),
            Input::Corpus { source, target } => Ok((source, target)),
            Input::Files { source, target } => {
                let source = read_lines(&source)?;
                let target = read_lines(&target)?;
                Ok((source, target))
            }
            Input::Text(text) => parse_parallel(&text),
            Input::File(path) => parse_parallel(&read_text(&path)?),
        }
    }
}

fn read_text(path: &Path) -> Result<String, Error> {
    std::fs::read_to_string(path).map_err(|e| {
        Error::Infrastructure(format!("Failed to read file {}: {}", path.display(), e))
    })
}

fn read_lines(path: &Path) -> Result<Vec<String>, Error> {
    Ok(read_text(path)?.lines().map(String::from).collect())
}

/// Split `source ||| target` lines; blank lines are skipped
fn parse_parallel(text: &str) -> Result<(Vec<String>, Vec<String>), Error> {
    let mut source = Vec::new();
    let mut target = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let (src, tgt) = line.split_once(PARALLEL_SEPARATOR).ok_or_else(|| {
            Error::InvalidInput(format!(
                "line {} has no '{}' separator",
                idx + 1,
                PARALLEL_SEPARATOR
            ))
        })?;
        source.push(src.trim().to_string());
        target.push(tgt.trim().to_string());
    }

    Ok((source, target))
}
