//! Grant dataset providers.
//!
//! This module defines the interface for sourcing historical grant records and
//! includes implementations for the two export formats in use (JSON and TSV).
//!
//! Providers are read once at startup. Rows that cannot be turned into a
//! usable [`GrantRecord`] are skipped and counted in [`LoadStats`]; only an
//! unreadable file or an unusable header is an error.

pub mod json;
pub mod tsv;

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{parse_authors, GrantRecord};

pub use json::JsonFileGrantProvider;
pub use tsv::TsvFileGrantProvider;

/// Errors that can occur when loading grant records.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Failed to read from the data source
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse the data format
    #[error("Parse error: {0}")]
    ParseError(String),

    /// File extension not recognised
    #[error("Unsupported dataset format: {0}")]
    UnsupportedFormat(String),
}

/// Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Outcome counts of one load.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadStats {
    pub loaded: usize,
    pub skipped: usize,
}

/// Trait for sourcing grant records.
#[async_trait]
pub trait GrantProvider: Send + Sync {
    /// Fetch every usable record, in source order.
    async fn fetch_records(&self) -> ProviderResult<Vec<GrantRecord>>;

    /// Load outcome counts.
    fn stats(&self) -> LoadStats;

    /// Human-readable name for logging.
    fn name(&self) -> &str;
}

/// Open a provider for `path`, choosing the format by extension.
pub async fn open_provider(path: &Path) -> ProviderResult<Box<dyn GrantProvider>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "json" => Ok(Box::new(JsonFileGrantProvider::from_file(path).await?)),
        "tsv" | "txt" => Ok(Box::new(TsvFileGrantProvider::from_file(path).await?)),
        other => Err(ProviderError::UnsupportedFormat(format!(
            "{} (extension '{}')",
            path.display(),
            other
        ))),
    }
}

/// Trim a raw field and strip the quote characters spreadsheet exports wrap
/// around values.
pub(crate) fn clean_field(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim()
        .to_string()
}

/// Parse a year that may have been exported as `2021`, `"2021"` or `2021.0`.
pub(crate) fn parse_year(raw: &str) -> Option<i32> {
    let cleaned = clean_field(raw);
    cleaned.parse::<i32>().ok().or_else(|| {
        cleaned
            .parse::<f64>()
            .ok()
            .filter(|y| y.is_finite() && y.fract() == 0.0)
            .map(|y| y as i32)
    })
}

/// Assemble a record from cleaned fields, or `None` if it is unusable.
pub(crate) fn build_record(
    code: &str,
    year: Option<i32>,
    theme: &str,
    title: &str,
    authors: Vec<String>,
) -> Option<GrantRecord> {
    let title = clean_field(title);
    let theme = clean_field(theme);
    if title.is_empty() || theme.is_empty() || authors.is_empty() {
        return None;
    }
    Some(GrantRecord {
        code: clean_field(code),
        year: year?,
        theme,
        title,
        authors,
    })
}

/// Split an authors field after stripping its outer quotes.
pub(crate) fn split_authors(raw: &str) -> Vec<String> {
    parse_authors(&clean_field(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_field() {
        assert_eq!(clean_field("  \"Quantum\" "), "Quantum");
        assert_eq!(clean_field("'Title, with comma'"), "Title, with comma");
    }

    #[test]
    fn test_parse_year() {
        assert_eq!(parse_year("2021"), Some(2021));
        assert_eq!(parse_year("\"2019\""), Some(2019));
        assert_eq!(parse_year("2020.0"), Some(2020));
        assert_eq!(parse_year("2020.5"), None);
        assert_eq!(parse_year("n/a"), None);
    }

    #[test]
    fn test_build_record_rejects_missing_fields() {
        let authors = vec!["A".to_string()];
        assert!(build_record("P", Some(2020), "Quantum", "  ", authors.clone()).is_none());
        assert!(build_record("P", None, "Quantum", "Title", authors.clone()).is_none());
        assert!(build_record("P", Some(2020), "Quantum", "Title", vec![]).is_none());
        assert!(build_record("P", Some(2020), "Quantum", "Title", authors).is_some());
    }

    #[test]
    fn test_split_authors_with_outer_quotes() {
        assert_eq!(split_authors("\"A. One,B. Two\""), vec!["A. One", "B. Two"]);
    }

    #[tokio::test]
    async fn test_open_provider_rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grants.xlsx");
        std::fs::write(&path, "").unwrap();
        assert!(matches!(
            open_provider(&path).await,
            Err(ProviderError::UnsupportedFormat(_))
        ));
    }
}
