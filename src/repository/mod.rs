//! In-memory grant repository.
//!
//! The repository is loaded once at startup and never mutated afterwards;
//! the recommendation path only reads from it.

use std::collections::BTreeSet;

use crate::models::GrantRecord;

/// Read-only collection of historical grant records.
#[derive(Debug, Clone, Default)]
pub struct GrantRepository {
    records: Vec<GrantRecord>,
    themes: BTreeSet<String>,
}

impl GrantRepository {
    pub fn new(records: Vec<GrantRecord>) -> Self {
        let themes = records.iter().map(|r| r.theme.clone()).collect();
        Self { records, themes }
    }

    pub fn records(&self) -> &[GrantRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct themes present in the dataset, sorted.
    pub fn themes(&self) -> impl Iterator<Item = &str> {
        self.themes.iter().map(String::as_str)
    }

    pub fn contains_theme(&self, theme: &str) -> bool {
        self.themes.contains(theme)
    }

    /// Every title in dataset order.
    pub fn titles(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.title.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo() -> GrantRepository {
        GrantRepository::new(vec![
            GrantRecord::new("P1", 2019, "Quantum", "Quantum Sensing", "A, B"),
            GrantRecord::new("P2", 2023, "Healthcare / Biomedical", "Clinical AI", "B"),
            GrantRecord::new("P3", 2025, "Quantum", "Quantum Networks", "C"),
        ])
    }

    #[test]
    fn test_themes_are_distinct_and_sorted() {
        let repo = repo();
        let themes: Vec<&str> = repo.themes().collect();
        assert_eq!(themes, vec!["Healthcare / Biomedical", "Quantum"]);
        assert!(repo.contains_theme("Quantum"));
        assert!(!repo.contains_theme("quantum"));
    }

    #[test]
    fn test_titles_in_dataset_order() {
        let repo = repo();
        assert_eq!(repo.titles(), vec!["Quantum Sensing", "Clinical AI", "Quantum Networks"]);
        assert_eq!(repo.len(), 3);
    }

    #[test]
    fn test_empty_repository() {
        let repo = GrantRepository::default();
        assert!(repo.is_empty());
        assert_eq!(repo.themes().count(), 0);
        assert!(repo.titles().is_empty());
    }
}
