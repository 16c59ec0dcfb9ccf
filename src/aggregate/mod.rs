//! Per-researcher statistics derived from the grant repository.

use std::collections::BTreeMap;

use tracing::debug;

use crate::models::ResearcherProfile;
use crate::repository::GrantRepository;

/// Builds [`ResearcherProfile`]s scoped to one theme.
pub struct ResearcherAggregator<'a> {
    repository: &'a GrantRepository,
}

impl<'a> ResearcherAggregator<'a> {
    pub fn new(repository: &'a GrantRepository) -> Self {
        Self { repository }
    }

    /// Profiles of every researcher with at least one record in `theme`.
    ///
    /// Theme matching is exact. Every record counts toward each listed
    /// author's `total_project_count` regardless of theme; only in-theme
    /// records count toward `theme_project_count`, `theme_titles`, and
    /// `most_recent_year`. An author listed twice on one record is counted
    /// once for that record.
    pub fn aggregate(&self, theme: &str) -> BTreeMap<String, ResearcherProfile> {
        let mut profiles: BTreeMap<String, ResearcherProfile> = BTreeMap::new();

        for record in self.repository.records() {
            let in_theme = record.theme == theme;
            let mut seen: Vec<&str> = Vec::with_capacity(record.authors.len());

            for author in &record.authors {
                let name = author.trim();
                if name.is_empty() || seen.contains(&name) {
                    continue;
                }
                seen.push(name);

                let profile = profiles
                    .entry(name.to_string())
                    .or_insert_with(|| ResearcherProfile::new(name));
                profile.total_project_count += 1;

                if in_theme {
                    profile.theme_project_count += 1;
                    profile.theme_titles.push(record.title.clone());
                    profile.theme_years.push(record.year);
                    profile.most_recent_year = Some(
                        profile
                            .most_recent_year
                            .map_or(record.year, |y| y.max(record.year)),
                    );
                }
            }
        }

        profiles.retain(|_, p| p.theme_project_count > 0);
        debug!(theme, researchers = profiles.len(), "aggregated researcher profiles");
        profiles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GrantRecord;

    fn repo() -> GrantRepository {
        GrantRepository::new(vec![
            GrantRecord::new("P1", 2019, "Quantum", "Quantum Sensing", "A, B"),
            GrantRecord::new("P2", 2023, "Healthcare", "Clinical AI", "B, C"),
            GrantRecord::new("P3", 2025, "Quantum", "Quantum Networks", "A"),
            GrantRecord::new("P4", 2021, "Healthcare", "Hospital Robotics", "A, A"),
        ])
    }

    #[test]
    fn test_theme_and_total_counts() {
        let repo = repo();
        let profiles = ResearcherAggregator::new(&repo).aggregate("Quantum");

        let a = &profiles["A"];
        assert_eq!(a.theme_project_count, 2);
        assert_eq!(a.total_project_count, 3);
        assert_eq!(a.theme_titles, vec!["Quantum Sensing", "Quantum Networks"]);
        assert_eq!(a.most_recent_year, Some(2025));

        let b = &profiles["B"];
        assert_eq!(b.theme_project_count, 1);
        assert_eq!(b.total_project_count, 2);
        assert_eq!(b.most_recent_year, Some(2019));
    }

    #[test]
    fn test_researchers_without_theme_records_are_excluded() {
        let repo = repo();
        let profiles = ResearcherAggregator::new(&repo).aggregate("Quantum");
        assert!(!profiles.contains_key("C"));
    }

    #[test]
    fn test_most_recent_year_is_theme_scoped() {
        let repo = repo();
        let profiles = ResearcherAggregator::new(&repo).aggregate("Healthcare");
        // B's 2023 Healthcare record, not the 2019 Quantum one
        assert_eq!(profiles["B"].most_recent_year, Some(2023));
        // duplicate author entry on one record counts once
        assert_eq!(profiles["A"].theme_project_count, 1);
    }

    #[test]
    fn test_unknown_theme_yields_nobody() {
        let repo = repo();
        assert!(ResearcherAggregator::new(&repo).aggregate("Astronomy").is_empty());
        assert!(ResearcherAggregator::new(&repo).aggregate("quantum").is_empty());
    }
}
