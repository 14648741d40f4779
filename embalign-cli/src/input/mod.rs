//! Input handling module

pub mod file_reader;

pub use file_reader::FileReader;

use std::path::Path;

use anyhow::Result;
use embalign_core::Input;

use crate::error::CliError;

/// Build the corpus input from either two aligned files or one parallel file
pub fn resolve_input(
    source: Option<&Path>,
    target: Option<&Path>,
    parallel: Option<&Path>,
) -> Result<Input> {
    match (source, target, parallel) {
        (Some(source), Some(target), None) => {
            let source_lines = FileReader::read_lines(existing(source)?)?;
            let target_lines = FileReader::read_lines(existing(target)?)?;
            log::info!(
                "read {} source and {} target sentences",
                source_lines.len(),
                target_lines.len()
            );
            Ok(Input::from_corpus(source_lines, target_lines))
        }
        (None, None, Some(parallel)) => {
            let text = FileReader::read_text(existing(parallel)?)?;
            Ok(Input::from_text(text))
        }
        _ => Err(CliError::MissingInput.into()),
    }
}

fn existing(path: &Path) -> Result<&Path> {
    if path.is_file() {
        Ok(path)
    } else {
        Err(CliError::FileNotFound(path.display().to_string()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_reported() {
        let err = resolve_input(None, None, Some(Path::new("/nonexistent/pairs.txt"))).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CliError>(),
            Some(CliError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_incomplete_arguments() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("src.txt");
        std::fs::write(&path, "a\n").unwrap();

        let err = resolve_input(Some(&path), None, None).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CliError>(),
            Some(CliError::MissingInput)
        ));
    }

    #[test]
    fn test_resolves_both_layouts() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("src.txt");
        let tgt = temp_dir.path().join("tgt.txt");
        let pairs = temp_dir.path().join("pairs.txt");
        std::fs::write(&src, "a b\n").unwrap();
        std::fs::write(&tgt, "x y\n").unwrap();
        std::fs::write(&pairs, "a b ||| x y\n").unwrap();

        assert!(matches!(
            resolve_input(Some(&src), Some(&tgt), None).unwrap(),
            Input::Corpus { .. }
        ));
        assert!(matches!(
            resolve_input(None, None, Some(&pairs)).unwrap(),
            Input::Text(_)
        ));
    }
}
