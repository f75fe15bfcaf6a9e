//! Batch manifests for the response builder.
//!
//! One batch per line: `<csv path> [generated]`. Blank lines and `#` comments
//! are ignored; relative paths resolve against the manifest's directory.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchEntry {
    pub path: PathBuf,
    /// Events thrown to produce this batch. Required unless `--ngen` is given.
    pub generated: Option<u64>,
}

pub fn read_manifest(path: &Path) -> Result<Vec<BatchEntry>, AppError> {
    let text = fs::read_to_string(path)
        .map_err(|e| AppError::new(2, format!("Failed to read manifest '{}': {e}", path.display())))?;
    let base = path.parent().unwrap_or_else(|| Path::new(""));
    parse_manifest(&text, base)
}

pub fn parse_manifest(text: &str, base: &Path) -> Result<Vec<BatchEntry>, AppError> {
    let mut entries = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }

        let mut fields = line.split_whitespace();
        let Some(file) = fields.next() else { continue };
        let generated = match fields.next() {
            None => None,
            Some(raw) => Some(raw.parse::<u64>().map_err(|_| {
                AppError::new(
                    2,
                    format!("Manifest line {}: generated count '{raw}' is not a non-negative integer.", lineno + 1),
                )
            })?),
        };
        if fields.next().is_some() {
            return Err(AppError::new(
                2,
                format!("Manifest line {}: expected `<path> [generated]`.", lineno + 1),
            ));
        }

        let file = PathBuf::from(file);
        let path = if file.is_absolute() { file } else { base.join(file) };
        entries.push(BatchEntry { path, generated });
    }

    if entries.is_empty() {
        return Err(AppError::new(2, "Manifest lists no batches."));
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_paths_counts_and_comments() {
        let text = "# MC batches\nrun1.csv 1000\n\n  /abs/run2.csv   # no count\nrun3.csv 0 # empty\n";
        let entries = parse_manifest(text, Path::new("/data/mc")).unwrap();
        assert_eq!(
            entries,
            vec![
                BatchEntry {
                    path: PathBuf::from("/data/mc/run1.csv"),
                    generated: Some(1000)
                },
                BatchEntry {
                    path: PathBuf::from("/abs/run2.csv"),
                    generated: None
                },
                BatchEntry {
                    path: PathBuf::from("/data/mc/run3.csv"),
                    generated: Some(0)
                },
            ]
        );
    }

    #[test]
    fn rejects_bad_lines() {
        let base = Path::new(".");
        assert!(parse_manifest("a.csv -3\n", base).is_err());
        assert!(parse_manifest("a.csv 3 extra\n", base).is_err());
        assert!(parse_manifest("# nothing\n", base).is_err());
    }
}
