//! Core data models for the researcher recommendation system.
//!
//! This module contains the fundamental data structures shared across the
//! crate: historical grant records, the per-query researcher profiles derived
//! from them, and the ranked recommendation returned to callers.

use serde::{Deserialize, Serialize};

/// Absolute tolerance used when checking that a breakdown total equals the
/// sum of its components.
pub const SCORE_EPSILON: f64 = 1e-9;

/// One historical project entry.
///
/// Records are immutable once loaded. Researchers are identified purely by
/// the exact (trimmed) author string; two spellings of the same person are
/// two different researchers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GrantRecord {
    /// Proposal / grant code
    pub code: String,

    /// Year the project was submitted
    pub year: i32,

    /// Research theme label
    pub theme: String,

    /// Project title
    pub title: String,

    /// Ordered author list (trimmed, no empty entries)
    pub authors: Vec<String>,
}

impl GrantRecord {
    /// Build a record, parsing `authors` from a comma-delimited field.
    pub fn new(
        code: impl Into<String>,
        year: i32,
        theme: impl Into<String>,
        title: impl Into<String>,
        authors: &str,
    ) -> Self {
        Self {
            code: code.into(),
            year,
            theme: theme.into(),
            title: title.into(),
            authors: parse_authors(authors),
        }
    }
}

/// Split a delimited author field into trimmed, non-empty names.
///
/// Surrounding quote characters left over from spreadsheet exports are
/// stripped from each name.
pub fn parse_authors(field: &str) -> Vec<String> {
    field
        .split(',')
        .map(|a| a.trim().trim_matches(|c| c == '"' || c == '\'').trim())
        .filter(|a| !a.is_empty())
        .map(str::to_string)
        .collect()
}

/// Per-query aggregate of one researcher's history.
///
/// Rebuilt for every recommendation call and discarded afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResearcherProfile {
    pub name: String,

    /// Number of records in the queried theme
    pub theme_project_count: usize,

    /// Number of records across all themes
    pub total_project_count: usize,

    /// Titles of the in-theme records, in dataset order
    pub theme_titles: Vec<String>,

    /// Years of the in-theme records, parallel to `theme_titles`
    pub theme_years: Vec<i32>,

    /// Latest in-theme year, `None` when the researcher has no in-theme record
    pub most_recent_year: Option<i32>,
}

impl ResearcherProfile {
    /// Create an empty profile for `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            theme_project_count: 0,
            total_project_count: 0,
            theme_titles: Vec::new(),
            theme_years: Vec::new(),
            most_recent_year: None,
        }
    }

    /// Count of in-theme records whose year is at least `since`.
    pub fn theme_projects_since(&self, since: i32) -> usize {
        self.theme_years.iter().filter(|&&y| y >= since).count()
    }
}

/// Four-component additive decomposition of a researcher's rank score.
///
/// `total` is always the sum of the four components; construct through
/// [`ScoreBreakdown::new`] to keep it that way.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct ScoreBreakdown {
    pub theme_score: f64,
    pub keyword_score: f64,
    pub contribution_score: f64,
    pub recency_score: f64,
    pub total: f64,
}

impl ScoreBreakdown {
    pub fn new(
        theme_score: f64,
        keyword_score: f64,
        contribution_score: f64,
        recency_score: f64,
    ) -> Self {
        Self {
            theme_score,
            keyword_score,
            contribution_score,
            recency_score,
            total: theme_score + keyword_score + contribution_score + recency_score,
        }
    }

    /// Check the sum invariant within [`SCORE_EPSILON`].
    pub fn is_consistent(&self) -> bool {
        let sum =
            self.theme_score + self.keyword_score + self.contribution_score + self.recency_score;
        (self.total - sum).abs() <= SCORE_EPSILON
    }
}

/// One entry of the ranked output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankedResearcher {
    pub researcher: String,
    pub score: ScoreBreakdown,

    /// Records in the target theme
    pub theme_projects: usize,

    /// Records across all themes
    pub total_projects: usize,

    /// The researcher's past titles in the target theme
    pub related_titles: Vec<String>,
}

impl RankedResearcher {
    /// Take ownership of a scored profile.
    pub fn from_profile(profile: ResearcherProfile, score: ScoreBreakdown) -> Self {
        Self {
            researcher: profile.name,
            score,
            theme_projects: profile.theme_project_count,
            total_projects: profile.total_project_count,
            related_titles: profile.theme_titles,
        }
    }
}

/// Result of one recommendation call.
///
/// `ranked` is sorted by total score descending, ties broken by researcher
/// name ascending.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendationResult {
    pub project_title: String,
    pub predicted_theme: String,

    /// Classifier confidence in [0, 1]; 1.0 for a manual theme override
    pub confidence: f64,

    #[serde(rename = "recommendations")]
    pub ranked: Vec<RankedResearcher>,

    /// Candidates scored before truncation to `top_n`
    pub total_researchers_scored: usize,
}

impl RecommendationResult {
    /// A well-formed result with nobody to recommend.
    pub fn empty(project_title: impl Into<String>, theme: impl Into<String>, confidence: f64) -> Self {
        Self {
            project_title: project_title.into(),
            predicted_theme: theme.into(),
            confidence,
            ranked: Vec::new(),
            total_researchers_scored: 0,
        }
    }
}
