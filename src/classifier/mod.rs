//! Theme classification from a project title.
//!
//! The classifier is trained offline and loaded once at startup. At runtime it
//! maps a non-empty title to one label of a fixed, closed set together with a
//! confidence in [0, 1].

pub mod linear;
pub mod train;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use linear::{LinearThemeClassifier, ModelArtifact, OutputKind};

/// Confidence reported by models that only emit a label and no posterior.
///
/// Deliberately not 1.0: a bare label says nothing about certainty.
pub const NOMINAL_CONFIDENCE: f64 = 0.5;

/// Errors that can occur during classification.
#[derive(Debug, Error)]
pub enum ClassifierError {
    /// Empty or whitespace-only title
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The trained artifact is missing, unreadable, or malformed
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),
}

/// Result type for classifier operations.
pub type ClassifierResult<T> = Result<T, ClassifierError>;

/// Predicted theme for one title.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThemePrediction {
    pub theme: String,

    /// Maximum posterior, or [`NOMINAL_CONFIDENCE`] for label-only models
    pub confidence: f64,
}

/// Score of one label for one title.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThemeScore {
    pub theme: String,
    pub score: f64,
}

/// Trait for trained title-to-theme models.
///
/// Implementations must be safe for concurrent read-only use.
pub trait ThemeClassifier: Send + Sync {
    /// The closed label set, in model order.
    fn labels(&self) -> &[String];

    /// Predict the theme of `title`.
    ///
    /// # Errors
    /// `InvalidInput` if `title` is empty or whitespace-only.
    fn predict(&self, title: &str) -> ClassifierResult<ThemePrediction>;

    /// Every label with its score, best first.
    ///
    /// The default only knows the top prediction.
    fn rank_themes(&self, title: &str) -> ClassifierResult<Vec<ThemeScore>> {
        let prediction = self.predict(title)?;
        Ok(vec![ThemeScore {
            theme: prediction.theme,
            score: prediction.confidence,
        }])
    }
}

/// Reject empty or whitespace-only titles.
pub fn validate_title(title: &str) -> ClassifierResult<()> {
    if title.trim().is_empty() {
        return Err(ClassifierError::InvalidInput(
            "title must not be empty".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedClassifier {
        labels: Vec<String>,
    }

    impl ThemeClassifier for FixedClassifier {
        fn labels(&self) -> &[String] {
            &self.labels
        }

        fn predict(&self, title: &str) -> ClassifierResult<ThemePrediction> {
            validate_title(title)?;
            Ok(ThemePrediction {
                theme: self.labels[0].clone(),
                confidence: NOMINAL_CONFIDENCE,
            })
        }
    }

    #[test]
    fn test_validate_title() {
        assert!(validate_title("Quantum").is_ok());
        assert!(matches!(validate_title(""), Err(ClassifierError::InvalidInput(_))));
        assert!(matches!(validate_title(" \t\n"), Err(ClassifierError::InvalidInput(_))));
    }

    #[test]
    fn test_default_rank_themes_wraps_prediction() {
        let c = FixedClassifier {
            labels: vec!["Quantum".to_string()],
        };
        let ranked = c.rank_themes("anything").unwrap();
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].theme, "Quantum");
        assert!(c.rank_themes(" ").is_err());
    }
}
