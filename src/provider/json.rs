//! JSON dataset provider.
//!
//! Expects a top-level array of objects with `code`, `time` (or `year`),
//! `theme`, `title`, and `authors` fields. `authors` may be a comma-delimited
//! string or a list of names; the year may be a number or a string.

use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, warn};

use super::{build_record, clean_field, parse_year, split_authors, GrantProvider, LoadStats, ProviderError, ProviderResult};
use crate::models::GrantRecord;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum YearField {
    Number(f64),
    Text(String),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AuthorsField {
    List(Vec<String>),
    Text(String),
}

#[derive(Debug, Deserialize)]
struct RawGrant {
    #[serde(default, alias = "Code", alias = "ProposalNo")]
    code: String,

    #[serde(alias = "time", alias = "Time", alias = "Year")]
    year: YearField,

    #[serde(default, alias = "Theme")]
    theme: String,

    #[serde(default, alias = "Title")]
    title: String,

    #[serde(alias = "Authors", alias = "Researchers")]
    authors: AuthorsField,
}

impl RawGrant {
    fn into_record(self) -> Option<GrantRecord> {
        let year = match self.year {
            YearField::Number(y) if y.is_finite() && y.fract() == 0.0 => Some(y as i32),
            YearField::Number(_) => None,
            YearField::Text(s) => parse_year(&s),
        };
        let authors = match self.authors {
            AuthorsField::List(names) => names
                .iter()
                .map(|n| clean_field(n))
                .filter(|n| !n.is_empty())
                .collect(),
            AuthorsField::Text(s) => split_authors(&s),
        };
        build_record(&self.code, year, &self.theme, &self.title, authors)
    }
}

/// Provider backed by a JSON file, parsed eagerly on construction.
#[derive(Debug, Clone)]
pub struct JsonFileGrantProvider {
    name: String,
    records: Vec<GrantRecord>,
    stats: LoadStats,
}

impl JsonFileGrantProvider {
    /// Read and parse `path`.
    pub async fn from_file(path: &Path) -> ProviderResult<Self> {
        let raw = tokio::fs::read_to_string(path).await?;
        let provider = Self::from_content(&path.display().to_string(), &raw)?;
        info!(
            source = %provider.name,
            loaded = provider.stats.loaded,
            skipped = provider.stats.skipped,
            "loaded grant records"
        );
        Ok(provider)
    }

    /// Parse an in-memory JSON document.
    pub fn from_content(name: &str, raw: &str) -> ProviderResult<Self> {
        let rows: Vec<serde_json::Value> = serde_json::from_str(raw)
            .map_err(|e| ProviderError::ParseError(format!("expected a JSON array of records: {}", e)))?;

        let mut records = Vec::with_capacity(rows.len());
        let mut stats = LoadStats::default();
        for (idx, row) in rows.into_iter().enumerate() {
            let record = serde_json::from_value::<RawGrant>(row)
                .ok()
                .and_then(RawGrant::into_record);
            match record {
                Some(r) => {
                    records.push(r);
                    stats.loaded += 1;
                }
                None => {
                    warn!(row = idx, "skipping unusable grant record");
                    stats.skipped += 1;
                }
            }
        }

        Ok(Self {
            name: name.to_string(),
            records,
            stats,
        })
    }
}

#[async_trait]
impl GrantProvider for JsonFileGrantProvider {
    async fn fetch_records(&self) -> ProviderResult<Vec<GrantRecord>> {
        Ok(self.records.clone())
    }

    fn stats(&self) -> LoadStats {
        self.stats
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[
        {"code": "P-1", "time": 2024, "theme": "Quantum", "title": "Quantum Sensing", "authors": "A. One, B. Two"},
        {"Code": "P-2", "Time": "2023", "Theme": "Healthcare / Biomedical", "Title": "'Clinical AI'", "Authors": ["C. Three", " "]},
        {"code": "P-3", "time": 2022, "theme": "Quantum", "title": "", "authors": "D"},
        {"code": "P-4", "theme": "Quantum", "title": "No year", "authors": "E"}
    ]"#;

    #[test]
    fn test_parses_both_field_styles() {
        let p = JsonFileGrantProvider::from_content("sample", SAMPLE).unwrap();
        assert_eq!(p.stats(), LoadStats { loaded: 2, skipped: 2 });
        assert_eq!(p.records[0].authors, vec!["A. One", "B. Two"]);
        assert_eq!(p.records[1].title, "Clinical AI");
        assert_eq!(p.records[1].year, 2023);
        assert_eq!(p.records[1].authors, vec!["C. Three"]);
    }

    #[test]
    fn test_non_array_is_parse_error() {
        assert!(matches!(
            JsonFileGrantProvider::from_content("bad", r#"{"code": "x"}"#),
            Err(ProviderError::ParseError(_))
        ));
    }

    #[tokio::test]
    async fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grants.json");
        tokio::fs::write(&path, SAMPLE).await.unwrap();

        let p = JsonFileGrantProvider::from_file(&path).await.unwrap();
        let records = p.fetch_records().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].code, "P-1");
        assert!(p.name().ends_with("grants.json"));
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = JsonFileGrantProvider::from_file(&dir.path().join("none.json")).await;
        assert!(matches!(err, Err(ProviderError::IoError(_))));
    }
}
