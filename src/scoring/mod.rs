//! Multi-factor researcher scoring.
//!
//! Four additive factors: in-theme track record, title similarity to past
//! in-theme work (tiered), capped overall contribution volume, and recent
//! in-theme activity.

use serde::{Deserialize, Serialize};

use crate::models::{ResearcherProfile, ScoreBreakdown};
use crate::similarity::{
    keyword_score, QuerySimilarity, TierMultipliers, TitleSimilarityScorer, HIGH_SIMILARITY_THRESHOLD,
};

pub const THEME_WEIGHT: f64 = 10.0;
pub const HIGH_MULTIPLIER: f64 = 200.0;
pub const MID_MULTIPLIER: f64 = 50.0;
pub const CONTRIB_WEIGHT: f64 = 5.0;
pub const CONTRIB_CAP: f64 = 25.0;
pub const RECENCY_WEIGHT: f64 = 5.0;
pub const RECENCY_WINDOW_YEARS: i32 = 3;

/// Scoring constants. Defaults are the canonical set; any of them can be
/// overridden from configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScoringWeights {
    /// Points per past project in the target theme
    pub theme_weight: f64,

    /// Multiplier for a near-exact title match (similarity >= 0.85)
    pub high_multiplier: f64,

    /// Multiplier for a partial title match (0.20 < similarity < 0.85)
    pub mid_multiplier: f64,

    /// Points per project in any theme, before the cap
    pub contrib_weight: f64,
    pub contrib_cap: f64,

    /// Points per in-theme project inside the recency window
    pub recency_weight: f64,

    /// Width of the recency window in years (inclusive)
    pub recency_window_years: i32,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            theme_weight: THEME_WEIGHT,
            high_multiplier: HIGH_MULTIPLIER,
            mid_multiplier: MID_MULTIPLIER,
            contrib_weight: CONTRIB_WEIGHT,
            contrib_cap: CONTRIB_CAP,
            recency_weight: RECENCY_WEIGHT,
            recency_window_years: RECENCY_WINDOW_YEARS,
        }
    }
}

impl ScoringWeights {
    pub fn tiers(&self) -> TierMultipliers {
        TierMultipliers {
            high: self.high_multiplier,
            mid: self.mid_multiplier,
        }
    }

    /// Lowest keyword score a high-tier match can produce.
    pub fn high_tier_floor(&self) -> f64 {
        HIGH_SIMILARITY_THRESHOLD * self.high_multiplier
    }

    /// Name of the first weight that is negative or not finite, if any.
    pub fn invalid_field(&self) -> Option<&'static str> {
        [
            ("theme_weight", self.theme_weight),
            ("high_multiplier", self.high_multiplier),
            ("mid_multiplier", self.mid_multiplier),
            ("contrib_weight", self.contrib_weight),
            ("contrib_cap", self.contrib_cap),
            ("recency_weight", self.recency_weight),
        ]
        .into_iter()
        .find(|(_, v)| !v.is_finite() || *v < 0.0)
        .map(|(name, _)| name)
        .or((self.recency_window_years < 0).then_some("recency_window_years"))
    }
}

/// Stateless scorer; a pure function of its inputs.
#[derive(Debug, Clone, Default)]
pub struct ScoringEngine {
    weights: ScoringWeights,
}

impl ScoringEngine {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Score `profile` against an input title.
    pub fn score(
        &self,
        profile: &ResearcherProfile,
        scorer: &TitleSimilarityScorer,
        input_title: &str,
        current_year: i32,
    ) -> ScoreBreakdown {
        let mut query = scorer.for_query(input_title);
        self.score_with(profile, &mut query, current_year)
    }

    /// Score `profile` reusing a per-request similarity memo.
    pub fn score_with(
        &self,
        profile: &ResearcherProfile,
        query: &mut QuerySimilarity<'_>,
        current_year: i32,
    ) -> ScoreBreakdown {
        let w = &self.weights;

        let theme_score = profile.theme_project_count as f64 * w.theme_weight;

        let keyword = keyword_score(query.max_similarity(&profile.theme_titles), w.tiers());

        let contribution =
            (profile.total_project_count as f64 * w.contrib_weight).min(w.contrib_cap);

        let since = current_year.saturating_sub(w.recency_window_years);
        let recency = w.recency_weight * profile.theme_projects_since(since) as f64;

        let breakdown = ScoreBreakdown::new(theme_score, keyword, contribution, recency);
        debug_assert!(breakdown.is_consistent());
        breakdown
    }
}
