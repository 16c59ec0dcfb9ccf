//! Recommendation orchestration.
//!
//! [`EngineContext`] bundles everything loaded once at startup (the grant
//! repository, the shared title-similarity space, the theme classifier and
//! the scoring weights). It is immutable after construction and is borrowed
//! by a [`RecommendationOrchestrator`] for each request.
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::path::Path;
//! use researcher_recommend::classifier::LinearThemeClassifier;
//! use researcher_recommend::config::EngineConfig;
//! use researcher_recommend::models::GrantRecord;
//! use researcher_recommend::recommend::EngineContext;
//! use researcher_recommend::repository::GrantRepository;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let records = vec![GrantRecord::new("P-1", 2024, "Quantum", "Quantum Sensing", "A. One")];
//! let classifier = LinearThemeClassifier::load(Path::new("model.json"))?;
//! let context = EngineContext::new(GrantRepository::new(records), classifier, &EngineConfig::default());
//!
//! let result = context.orchestrator().recommend("Quantum Sensing for Robotics", None, 5, 2026)?;
//! for entry in result.ranked {
//!     println!("{} - {:.1}", entry.researcher, entry.score.total);
//! }
//! # Ok(())
//! # }
//! ```

use thiserror::Error;
use tracing::{debug, info};

use crate::aggregate::ResearcherAggregator;
use crate::classifier::{validate_title, ClassifierError, ThemeClassifier};
use crate::config::EngineConfig;
use crate::models::{RankedResearcher, RecommendationResult};
use crate::repository::GrantRepository;
use crate::scoring::ScoringEngine;
use crate::similarity::TitleSimilarityScorer;

/// Errors surfaced by [`RecommendationOrchestrator::recommend`].
#[derive(Debug, Error)]
pub enum RecommendError {
    /// Empty title or non-positive result count
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The classifier could not produce a prediction
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    /// A theme override names a theme the dataset does not contain
    #[error("Unknown theme: {0}")]
    UnknownTheme(String),
}

impl From<ClassifierError> for RecommendError {
    fn from(err: ClassifierError) -> Self {
        match err {
            ClassifierError::InvalidInput(msg) => RecommendError::InvalidInput(msg),
            ClassifierError::ModelUnavailable(msg) => RecommendError::ModelUnavailable(msg),
        }
    }
}

pub type RecommendResult<T> = Result<T, RecommendError>;

/// Read-only state shared by every request.
pub struct EngineContext<C> {
    repository: GrantRepository,
    similarity: TitleSimilarityScorer,
    classifier: C,
    scoring: ScoringEngine,
}

impl<C: ThemeClassifier> EngineContext<C> {
    /// Fit the title-similarity space over every dataset title and take
    /// ownership of the loaded components.
    pub fn new(repository: GrantRepository, classifier: C, config: &EngineConfig) -> Self {
        let similarity = TitleSimilarityScorer::fit(&repository.titles(), &config.similarity);
        info!(
            records = repository.len(),
            themes = repository.themes().count(),
            vocabulary = similarity.vectorizer().vocabulary_size(),
            "engine context ready"
        );
        Self {
            repository,
            similarity,
            classifier,
            scoring: ScoringEngine::new(config.scoring.clone()),
        }
    }

    pub fn repository(&self) -> &GrantRepository {
        &self.repository
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    pub fn similarity(&self) -> &TitleSimilarityScorer {
        &self.similarity
    }

    pub fn scoring(&self) -> &ScoringEngine {
        &self.scoring
    }

    pub fn orchestrator(&self) -> RecommendationOrchestrator<'_, C> {
        RecommendationOrchestrator::new(self)
    }
}

/// Single entry point: validate, classify, aggregate, score, rank.
pub struct RecommendationOrchestrator<'a, C> {
    context: &'a EngineContext<C>,
}

impl<'a, C: ThemeClassifier> RecommendationOrchestrator<'a, C> {
    pub fn new(context: &'a EngineContext<C>) -> Self {
        Self { context }
    }

    /// Recommend up to `top_n` researchers for `title`.
    ///
    /// A `target_theme` skips classification and is reported with
    /// confidence 1.0; a blank override counts as absent. A valid theme with
    /// no researchers yields an empty ranking, not an error.
    ///
    /// # Errors
    /// - `InvalidInput` for an empty title or `top_n == 0`
    /// - `UnknownTheme` if the override is not a dataset theme
    /// - `ModelUnavailable` if the classifier fails
    pub fn recommend(
        &self,
        title: &str,
        target_theme: Option<&str>,
        top_n: usize,
        current_year: i32,
    ) -> RecommendResult<RecommendationResult> {
        validate_title(title)?;
        if top_n == 0 {
            return Err(RecommendError::InvalidInput(
                "top_n must be a positive integer".to_string(),
            ));
        }

        let target_theme = target_theme.map(str::trim).filter(|t| !t.is_empty());
        let (theme, confidence) = match target_theme {
            Some(theme) => {
                if !self.context.repository.contains_theme(theme) {
                    return Err(RecommendError::UnknownTheme(theme.to_string()));
                }
                (theme.to_string(), 1.0)
            }
            None => {
                let prediction = self.context.classifier.predict(title)?;
                (prediction.theme, prediction.confidence)
            }
        };
        info!(theme = %theme, confidence, overridden = target_theme.is_some(), "theme selected");

        let profiles = ResearcherAggregator::new(&self.context.repository).aggregate(&theme);
        if profiles.is_empty() {
            return Ok(RecommendationResult::empty(title, theme, confidence));
        }

        let mut query = self.context.similarity.for_query(title);
        let mut ranked: Vec<RankedResearcher> = profiles
            .into_values()
            .map(|profile| {
                let score = self.context.scoring.score_with(&profile, &mut query, current_year);
                RankedResearcher::from_profile(profile, score)
            })
            .collect();
        let scored = ranked.len();
        debug!(candidates = scored, memoized = query.memoized(), "candidates scored");

        ranked.sort_by(|a, b| {
            b.score
                .total
                .total_cmp(&a.score.total)
                .then_with(|| a.researcher.cmp(&b.researcher))
        });
        ranked.truncate(top_n);

        Ok(RecommendationResult {
            project_title: title.to_string(),
            predicted_theme: theme,
            confidence,
            ranked,
            total_researchers_scored: scored,
        })
    }
}
