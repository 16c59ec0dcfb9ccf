//! Tab-separated dataset provider.
//!
//! The first line is a header naming the columns; order does not matter.
//! Recognised names (case-insensitive): `Code`/`ProposalNo`, `Time`/`Year`,
//! `Theme`, `Title`, `Authors`/`Researchers`.

use std::path::Path;

use async_trait::async_trait;
use csv::{ReaderBuilder, StringRecord};
use tracing::{info, warn};

use super::{build_record, parse_year, split_authors, GrantProvider, LoadStats, ProviderError, ProviderResult};
use crate::models::GrantRecord;

#[derive(Debug, Clone, Copy)]
struct Columns {
    code: Option<usize>,
    year: usize,
    theme: usize,
    title: usize,
    authors: usize,
}

impl Columns {
    fn from_header(header: &StringRecord) -> ProviderResult<Self> {
        let names: Vec<String> = header
            .iter()
            .map(|h| super::clean_field(h).to_ascii_lowercase())
            .collect();
        let find = |aliases: &[&str]| names.iter().position(|n| aliases.contains(&n.as_str()));
        let require = |aliases: &[&str]| {
            find(aliases).ok_or_else(|| {
                ProviderError::ParseError(format!("header is missing a '{}' column", aliases[0]))
            })
        };

        Ok(Self {
            code: find(&["code", "proposalno"]),
            year: require(&["time", "year"])?,
            theme: require(&["theme"])?,
            title: require(&["title"])?,
            authors: require(&["authors", "researchers"])?,
        })
    }

    fn parse_row(&self, row: &StringRecord) -> Option<GrantRecord> {
        build_record(
            self.code.and_then(|i| row.get(i)).unwrap_or(""),
            row.get(self.year).and_then(parse_year),
            row.get(self.theme)?,
            row.get(self.title)?,
            split_authors(row.get(self.authors)?),
        )
    }
}

fn is_blank(row: &StringRecord) -> bool {
    row.iter().all(|f| f.trim().is_empty())
}

/// Provider backed by a TSV file, parsed eagerly on construction.
///
/// Fields follow the usual delimited-text quoting rules: a double-quoted
/// field may contain tabs, and `""` inside it is a literal quote.
#[derive(Debug, Clone)]
pub struct TsvFileGrantProvider {
    name: String,
    records: Vec<GrantRecord>,
    stats: LoadStats,
}

impl TsvFileGrantProvider {
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

    pub fn from_content(name: &str, raw: &str) -> ProviderResult<Self> {
        let mut reader = ReaderBuilder::new()
            .delimiter(b'\t')
            .flexible(true)
            .from_reader(raw.as_bytes());

        let header = reader
            .headers()
            .map_err(|e| ProviderError::ParseError(format!("failed to read header: {}", e)))?
            .clone();
        if is_blank(&header) {
            return Err(ProviderError::ParseError("empty file".to_string()));
        }
        let columns = Columns::from_header(&header)?;

        let mut records = Vec::new();
        let mut stats = LoadStats::default();
        for row in reader.records() {
            let row = match row {
                Ok(row) => row,
                Err(e) => {
                    warn!(error = %e, "skipping unreadable grant row");
                    stats.skipped += 1;
                    continue;
                }
            };
            if is_blank(&row) {
                continue;
            }

            match columns.parse_row(&row) {
                Some(r) => {
                    records.push(r);
                    stats.loaded += 1;
                }
                None => {
                    let line = row.position().map(|p| p.line()).unwrap_or_default();
                    warn!(line, "skipping unusable grant row");
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
impl GrantProvider for TsvFileGrantProvider {
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
    use crate::provider::open_provider;

    const SAMPLE: &str = "Code\tTime\tTheme\tTitle\tAuthors\n\
        \"P-1\"\t2024\t\"Quantum\"\t'Quantum Sensing'\t\"A. One,B. Two\"\n\
        \"P-2\"\t2023.0\t\"Healthcare / Biomedical\"\t'Clinical AI'\t\"C. Three\"\n\
        \"P-3\"\tunknown\t\"Quantum\"\t'Bad Year'\t\"D\"\n\
        \"P-4\"\t2022\t\"Quantum\"\n";

    #[test]
    fn test_parses_quoted_rows() {
        let p = TsvFileGrantProvider::from_content("sample", SAMPLE).unwrap();
        assert_eq!(p.stats(), LoadStats { loaded: 2, skipped: 2 });

        let first = &p.records[0];
        assert_eq!(first.code, "P-1");
        assert_eq!(first.theme, "Quantum");
        assert_eq!(first.title, "Quantum Sensing");
        assert_eq!(first.authors, vec!["A. One", "B. Two"]);
        assert_eq!(p.records[1].year, 2023);
    }

    #[test]
    fn test_header_aliases_and_order() {
        let raw = "Title\tResearchers\tYear\tTheme\nRobotics\tA, B\t2020\tAutomation\n";
        let p = TsvFileGrantProvider::from_content("aliases", raw).unwrap();
        assert_eq!(p.records.len(), 1);
        assert_eq!(p.records[0].code, "");
        assert_eq!(p.records[0].authors, vec!["A", "B"]);
    }

    #[test]
    fn test_quoted_fields_keep_tabs_and_escaped_quotes() {
        let raw = "Code\tTime\tTheme\tTitle\tAuthors\n\
            P-2\t2023\tQuantum\t\"Title with\ttab\"\tC. Three\n\
            P-3\t2024\tQuantum\t\"A \"\"Quantum\"\" Sensor\"\tD. Four\n";
        let p = TsvFileGrantProvider::from_content("quoted", raw).unwrap();
        assert_eq!(p.stats(), LoadStats { loaded: 2, skipped: 0 });

        assert_eq!(p.records[0].title, "Title with\ttab");
        assert_eq!(p.records[0].authors, vec!["C. Three"]);
        assert_eq!(p.records[1].title, "A \"Quantum\" Sensor");
        assert_eq!(p.records[1].authors, vec!["D. Four"]);
    }

    #[test]
    fn test_blank_lines_are_ignored() {
        let raw = "Title\tAuthors\tYear\tTheme\n\nRobotics\tA\t2020\tAutomation\n   \n";
        let p = TsvFileGrantProvider::from_content("blank", raw).unwrap();
        assert_eq!(p.stats(), LoadStats { loaded: 1, skipped: 0 });
    }

    #[test]
    fn test_missing_column_is_parse_error() {
        let raw = "Code\tTime\tTitle\tAuthors\nP\t2020\tT\tA\n";
        assert!(matches!(
            TsvFileGrantProvider::from_content("no-theme", raw),
            Err(ProviderError::ParseError(_))
        ));
        assert!(TsvFileGrantProvider::from_content("empty", "").is_err());
    }

    #[tokio::test]
    async fn test_open_provider_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grants_final.tsv");
        tokio::fs::write(&path, SAMPLE).await.unwrap();

        let provider = open_provider(&path).await.unwrap();
        assert_eq!(provider.fetch_records().await.unwrap().len(), 2);
        assert!(provider.name().ends_with("grants_final.tsv"));
    }
}
