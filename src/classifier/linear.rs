//! Linear classifier over TF-IDF title features.
//!
//! The artifact is a JSON document holding the fitted vectorizer, one
//! coefficient row and intercept per label, the class weights used during
//! fitting, and whether the model emits posteriors.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{
    validate_title, ClassifierError, ClassifierResult, ThemeClassifier, ThemePrediction,
    ThemeScore, NOMINAL_CONFIDENCE,
};
use crate::text::TfidfVectorizer;

/// What the model's decision function produces.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutputKind {
    /// Softmax posteriors; confidence is the maximum posterior
    #[default]
    Probabilities,

    /// Argmax label only; confidence is [`NOMINAL_CONFIDENCE`]
    Labels,
}

/// Serialized trained model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelArtifact {
    pub labels: Vec<String>,
    pub vectorizer: TfidfVectorizer,

    /// `coefficients[label][feature]`
    pub coefficients: Vec<Vec<f64>>,
    pub intercepts: Vec<f64>,

    /// Per-label weights applied during fitting, one per label
    #[serde(default)]
    pub class_weights: Vec<f64>,

    #[serde(default)]
    pub output: OutputKind,
}

impl ModelArtifact {
    /// Check shapes and numeric sanity.
    pub fn validate(&self) -> ClassifierResult<()> {
        let corrupt = |msg: String| Err(ClassifierError::ModelUnavailable(msg));

        if self.labels.is_empty() {
            return corrupt("artifact has no labels".to_string());
        }
        let mut sorted = self.labels.clone();
        sorted.sort();
        sorted.dedup();
        if sorted.len() != self.labels.len() {
            return corrupt("artifact labels are not unique".to_string());
        }
        if !self.vectorizer.is_well_formed() {
            return corrupt("artifact vectorizer is malformed".to_string());
        }

        let k = self.labels.len();
        let d = self.vectorizer.vocabulary_size();
        if self.coefficients.len() != k || self.intercepts.len() != k {
            return corrupt(format!(
                "expected {} coefficient rows and intercepts, found {} and {}",
                k,
                self.coefficients.len(),
                self.intercepts.len()
            ));
        }
        if let Some(row) = self.coefficients.iter().position(|r| r.len() != d) {
            return corrupt(format!(
                "coefficient row {} has {} features, vocabulary has {}",
                row,
                self.coefficients[row].len(),
                d
            ));
        }
        let all_finite = self
            .coefficients
            .iter()
            .flatten()
            .chain(self.intercepts.iter())
            .all(|v| v.is_finite());
        if !all_finite {
            return corrupt("artifact contains non-finite parameters".to_string());
        }
        if !self.class_weights.is_empty()
            && (self.class_weights.len() != k
                || self.class_weights.iter().any(|w| !w.is_finite() || *w <= 0.0))
        {
            return corrupt(format!(
                "expected {} positive class weights, found {:?}",
                k, self.class_weights
            ));
        }
        Ok(())
    }
}

/// Theme classifier backed by a [`ModelArtifact`].
#[derive(Debug, Clone)]
pub struct LinearThemeClassifier {
    artifact: ModelArtifact,
}

impl LinearThemeClassifier {
    /// Load and validate an artifact from disk.
    ///
    /// # Errors
    /// `ModelUnavailable` if the file is missing, unreadable, not valid JSON,
    /// or fails validation.
    pub fn load(path: &Path) -> ClassifierResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ClassifierError::ModelUnavailable(format!("{}: {}", path.display(), e))
        })?;
        let artifact: ModelArtifact = serde_json::from_str(&raw).map_err(|e| {
            ClassifierError::ModelUnavailable(format!("{}: corrupt artifact: {}", path.display(), e))
        })?;
        let classifier = Self::from_artifact(artifact)?;
        info!(
            path = %path.display(),
            labels = classifier.artifact.labels.len(),
            features = classifier.artifact.vectorizer.vocabulary_size(),
            "loaded theme classifier"
        );
        Ok(classifier)
    }

    pub fn from_artifact(artifact: ModelArtifact) -> ClassifierResult<Self> {
        artifact.validate()?;
        if artifact.output == OutputKind::Labels {
            warn!(
                confidence = NOMINAL_CONFIDENCE,
                "model emits labels only; reporting nominal confidence"
            );
        }
        Ok(Self { artifact })
    }

    /// Class weights the model was fitted with, exactly as stored.
    pub fn class_weights(&self) -> &[f64] {
        &self.artifact.class_weights
    }

    fn logits(&self, title: &str) -> Vec<f64> {
        let x = self.artifact.vectorizer.transform(title);
        self.artifact
            .coefficients
            .iter()
            .zip(&self.artifact.intercepts)
            .map(|(row, b)| b + x.entries().iter().map(|&(j, v)| row[j] * v).sum::<f64>())
            .collect()
    }

    fn argmax(scores: &[f64]) -> usize {
        let mut best = 0;
        for (i, s) in scores.iter().enumerate() {
            if *s > scores[best] {
                best = i;
            }
        }
        best
    }
}

/// Numerically stable softmax.
pub fn softmax(logits: &[f64]) -> Vec<f64> {
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = logits.iter().map(|z| (z - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

impl ThemeClassifier for LinearThemeClassifier {
    fn labels(&self) -> &[String] {
        &self.artifact.labels
    }

    fn predict(&self, title: &str) -> ClassifierResult<ThemePrediction> {
        validate_title(title)?;
        let logits = self.logits(title);
        let (best, confidence) = match self.artifact.output {
            OutputKind::Probabilities => {
                let probs = softmax(&logits);
                let best = Self::argmax(&probs);
                (best, probs[best].clamp(0.0, 1.0))
            }
            OutputKind::Labels => (Self::argmax(&logits), NOMINAL_CONFIDENCE),
        };
        Ok(ThemePrediction {
            theme: self.artifact.labels[best].clone(),
            confidence,
        })
    }

    fn rank_themes(&self, title: &str) -> ClassifierResult<Vec<ThemeScore>> {
        validate_title(title)?;
        let logits = self.logits(title);
        let scores = match self.artifact.output {
            OutputKind::Probabilities => softmax(&logits),
            OutputKind::Labels => logits,
        };
        let mut ranked: Vec<ThemeScore> = self
            .artifact
            .labels
            .iter()
            .zip(scores)
            .map(|(theme, score)| ThemeScore {
                theme: theme.clone(),
                score,
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.theme.cmp(&b.theme))
        });
        Ok(ranked)
    }
}
