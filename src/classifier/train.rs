//! Offline fitting of the theme classifier.
//!
//! Multinomial logistic regression on TF-IDF title features with "balanced"
//! class weights (`n / (k * count_c)`), L2 regularization of strength `1 / C`,
//! and full-batch gradient descent. Themes with too few records are left out
//! of the label set.

use std::collections::BTreeMap;
use std::path::Path;

use thiserror::Error;
use tracing::{debug, info};

use super::linear::{softmax, ModelArtifact, OutputKind};
use crate::models::GrantRecord;
use crate::text::{SparseVector, TfidfVectorizer};

/// Errors that can occur while fitting or saving a model.
#[derive(Debug, Error)]
pub enum TrainError {
    /// Not enough usable records or labels
    #[error("Insufficient training data: {0}")]
    InsufficientData(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type TrainResult<T> = Result<T, TrainError>;

/// Hyperparameters for [`fit`].
#[derive(Debug, Clone, PartialEq)]
pub struct TrainOptions {
    pub max_features: usize,

    /// Inverse regularization strength
    pub c: f64,
    pub max_iter: usize,
    pub learning_rate: f64,

    /// Stop once the largest gradient component falls below this
    pub tolerance: f64,

    /// Themes with fewer records are excluded from the label set
    pub min_samples_per_theme: usize,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            max_features: 500,
            c: 0.5,
            max_iter: 2000,
            learning_rate: 1.0,
            tolerance: 1e-6,
            min_samples_per_theme: 2,
        }
    }
}

/// Fitted artifact plus a summary of the run.
#[derive(Debug, Clone)]
pub struct TrainedModel {
    pub artifact: ModelArtifact,

    /// Record count per kept label, in label order
    pub class_counts: Vec<usize>,
    pub excluded_themes: Vec<String>,
    pub iterations: usize,
    pub final_loss: f64,
}

/// Fit a model on `records`.
pub fn fit(records: &[GrantRecord], options: &TrainOptions) -> TrainResult<TrainedModel> {
    fit_with_progress(records, options, |_, _| {})
}

/// Fit a model, reporting `(iteration, loss)` after every step.
pub fn fit_with_progress<F>(
    records: &[GrantRecord],
    options: &TrainOptions,
    mut on_iteration: F,
) -> TrainResult<TrainedModel>
where
    F: FnMut(usize, f64),
{
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for r in records.iter().filter(|r| !r.title.trim().is_empty()) {
        *counts.entry(r.theme.as_str()).or_insert(0) += 1;
    }

    let (kept, excluded): (Vec<_>, Vec<_>) = counts
        .iter()
        .partition(|&(_, &c)| c >= options.min_samples_per_theme);
    let labels: Vec<String> = kept.iter().map(|(t, _)| t.to_string()).collect();
    let excluded_themes: Vec<String> = excluded.iter().map(|(t, _)| t.to_string()).collect();

    if labels.len() < 2 {
        return Err(TrainError::InsufficientData(format!(
            "need at least 2 themes with {} or more records, found {}",
            options.min_samples_per_theme,
            labels.len()
        )));
    }

    let samples: Vec<(&str, usize)> = records
        .iter()
        .filter(|r| !r.title.trim().is_empty())
        .filter_map(|r| {
            labels
                .iter()
                .position(|l| *l == r.theme)
                .map(|y| (r.title.as_str(), y))
        })
        .collect();
    let titles: Vec<&str> = samples.iter().map(|(t, _)| *t).collect();

    let vectorizer = TfidfVectorizer::fit(&titles, options.max_features);
    let xs: Vec<SparseVector> = titles.iter().map(|t| vectorizer.transform(t)).collect();
    let ys: Vec<usize> = samples.iter().map(|(_, y)| *y).collect();

    let n = samples.len();
    let k = labels.len();
    let d = vectorizer.vocabulary_size();

    let class_counts: Vec<usize> = (0..k).map(|c| ys.iter().filter(|&&y| y == c).count()).collect();
    let class_weights: Vec<f64> = class_counts
        .iter()
        .map(|&c| n as f64 / (k as f64 * c as f64))
        .collect();
    info!(samples = n, labels = k, features = d, "fitting theme classifier");
    debug!(?class_weights, ?excluded_themes, "balanced class weights");

    let max_weight = class_weights.iter().copied().fold(1.0, f64::max);
    let step = options.learning_rate / max_weight;
    let reg = 1.0 / (options.c * n as f64);

    let mut coef = vec![vec![0.0; d]; k];
    let mut intercepts = vec![0.0; k];
    let mut iterations = 0;
    let mut loss = f64::INFINITY;

    for iter in 0..options.max_iter {
        let mut grad_coef = vec![vec![0.0; d]; k];
        let mut grad_b = vec![0.0; k];
        let mut data_loss = 0.0;

        for (x, &y) in xs.iter().zip(&ys) {
            let logits: Vec<f64> = (0..k)
                .map(|c| intercepts[c] + x.entries().iter().map(|&(j, v)| coef[c][j] * v).sum::<f64>())
                .collect();
            let probs = softmax(&logits);
            let w = class_weights[y];
            data_loss -= w * probs[y].max(f64::MIN_POSITIVE).ln();

            for c in 0..k {
                let err = w * (probs[c] - if c == y { 1.0 } else { 0.0 });
                grad_b[c] += err;
                for &(j, v) in x.entries() {
                    grad_coef[c][j] += err * v;
                }
            }
        }

        let mut max_grad: f64 = 0.0;
        let mut penalty = 0.0;
        for c in 0..k {
            for j in 0..d {
                let g = grad_coef[c][j] / n as f64 + reg * coef[c][j];
                penalty += coef[c][j] * coef[c][j];
                max_grad = max_grad.max(g.abs());
                coef[c][j] -= step * g;
            }
            let g = grad_b[c] / n as f64;
            max_grad = max_grad.max(g.abs());
            intercepts[c] -= step * g;
        }

        loss = data_loss / n as f64 + 0.5 * reg * penalty;
        iterations = iter + 1;
        on_iteration(iterations, loss);

        if max_grad < options.tolerance {
            debug!(iterations, loss, "converged");
            break;
        }
    }

    Ok(TrainedModel {
        artifact: ModelArtifact {
            labels,
            vectorizer,
            coefficients: coef,
            intercepts,
            class_weights,
            output: OutputKind::Probabilities,
        },
        class_counts,
        excluded_themes,
        iterations,
        final_loss: loss,
    })
}

/// Write an artifact as pretty-printed JSON.
pub fn save_artifact(artifact: &ModelArtifact, path: &Path) -> TrainResult<()> {
    let json = serde_json::to_string_pretty(artifact)?;
    std::fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{LinearThemeClassifier, ThemeClassifier};

    fn records() -> Vec<GrantRecord> {
        vec![
            GrantRecord::new("1", 2020, "Quantum", "Quantum Sensing Devices", "A"),
            GrantRecord::new("2", 2021, "Quantum", "Quantum Computing Algorithms", "B"),
            GrantRecord::new("3", 2022, "Quantum", "Quantum Networks Security", "C"),
            GrantRecord::new("4", 2020, "Healthcare", "Clinical Imaging Diagnostics", "D"),
            GrantRecord::new("5", 2021, "Healthcare", "Hospital Patient Monitoring", "E"),
            GrantRecord::new("6", 2022, "Healthcare", "Clinical Patient Outcomes", "F"),
            GrantRecord::new("7", 2022, "Healthcare", "Patient Imaging Workflow", "G"),
            GrantRecord::new("8", 2023, "Astronomy", "Telescope Arrays", "H"),
        ]
    }

    fn quick() -> TrainOptions {
        TrainOptions {
            max_iter: 300,
            ..TrainOptions::default()
        }
    }

    #[test]
    fn test_rare_theme_excluded() {
        let model = fit(&records(), &quick()).unwrap();
        assert_eq!(model.artifact.labels, vec!["Healthcare", "Quantum"]);
        assert_eq!(model.excluded_themes, vec!["Astronomy"]);
        assert_eq!(model.class_counts, vec![4, 3]);
    }

    #[test]
    fn test_balanced_class_weights() {
        let model = fit(&records(), &quick()).unwrap();
        let w = &model.artifact.class_weights;
        assert!((w[0] - 7.0 / 8.0).abs() < 1e-12);
        assert!((w[1] - 7.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_fitted_model_separates_themes() {
        let model = fit(&records(), &quick()).unwrap();
        let classifier = LinearThemeClassifier::from_artifact(model.artifact).unwrap();
        assert_eq!(classifier.predict("Quantum Sensing").unwrap().theme, "Quantum");
        assert_eq!(classifier.predict("Clinical Patient Imaging").unwrap().theme, "Healthcare");
    }

    #[test]
    fn test_loss_decreases() {
        let mut losses = Vec::new();
        fit_with_progress(&records(), &quick(), |_, loss| losses.push(loss)).unwrap();
        assert!(losses.len() > 1);
        assert!(losses.last().unwrap() < losses.first().unwrap());
    }

    #[test]
    fn test_single_theme_is_insufficient() {
        let only_quantum: Vec<GrantRecord> = records().into_iter().take(3).collect();
        assert!(matches!(
            fit(&only_quantum, &quick()),
            Err(TrainError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_save_and_load() {
        let model = fit(&records(), &quick()).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        save_artifact(&model.artifact, &path).unwrap();
        let loaded = LinearThemeClassifier::load(&path).unwrap();
        assert_eq!(loaded.labels(), model.artifact.labels.as_slice());
        assert_eq!(loaded.predict("Quantum Networks").unwrap().theme, "Quantum");
    }
}
