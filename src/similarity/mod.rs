//! Title similarity and the tiered keyword score.
//!
//! All comparisons run in one [`TfidfVectorizer`] fitted over the dataset
//! titles. The scorer caches the vector of every dataset title up front, and
//! [`QuerySimilarity`] memoizes the comparisons of one input title so that a
//! historical title shared by several co-authors is only scored once per
//! request.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::text::{normalize_text, SparseVector, TfidfVectorizer};

/// Similarity at or above which a historical title counts as a near-exact match.
pub const HIGH_SIMILARITY_THRESHOLD: f64 = 0.85;

/// Similarity strictly above which a historical title counts as a partial match.
pub const MID_SIMILARITY_THRESHOLD: f64 = 0.20;

/// Default size of the title vocabulary.
pub const DEFAULT_MAX_FEATURES: usize = 500;

/// Settings for the shared title vector space.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimilarityConfig {
    /// Maximum vocabulary size of the title vectorizer
    pub max_features: usize,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            max_features: DEFAULT_MAX_FEATURES,
        }
    }
}

/// Multipliers applied to the best similarity in each tier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TierMultipliers {
    pub high: f64,
    pub mid: f64,
}

/// Map the best title similarity `s` to a keyword score.
///
/// ```text
/// s >= 0.85  ->  s * high
/// s >  0.20  ->  s * mid
/// otherwise  ->  0
/// ```
pub fn keyword_score(s: f64, multipliers: TierMultipliers) -> f64 {
    if s >= HIGH_SIMILARITY_THRESHOLD {
        s * multipliers.high
    } else if s > MID_SIMILARITY_THRESHOLD {
        s * multipliers.mid
    } else {
        0.0
    }
}

/// Bounded [0, 1] similarity between titles in a shared TF-IDF space.
#[derive(Debug, Clone)]
pub struct TitleSimilarityScorer {
    vectorizer: TfidfVectorizer,
    title_vectors: HashMap<String, SparseVector>,
}

impl TitleSimilarityScorer {
    /// Fit the shared space over `titles` and cache their vectors.
    pub fn fit<S: AsRef<str>>(titles: &[S], config: &SimilarityConfig) -> Self {
        let vectorizer = TfidfVectorizer::fit(titles, config.max_features);
        let title_vectors = titles
            .iter()
            .map(|t| (t.as_ref().to_string(), vectorizer.transform(t.as_ref())))
            .collect();
        Self {
            vectorizer,
            title_vectors,
        }
    }

    pub fn vectorizer(&self) -> &TfidfVectorizer {
        &self.vectorizer
    }

    fn vector_of(&self, title: &str) -> SparseVector {
        match self.title_vectors.get(title) {
            Some(v) => v.clone(),
            None => self.vectorizer.transform(title),
        }
    }

    /// Symmetric similarity in [0, 1].
    ///
    /// Empty (after normalization) input on either side gives 0; identical
    /// normalized titles give exactly 1.0, even when every term is a stop
    /// word or out of vocabulary.
    pub fn similarity(&self, a: &str, b: &str) -> f64 {
        let (na, nb) = (normalize_text(a), normalize_text(b));
        if na.is_empty() || nb.is_empty() {
            return 0.0;
        }
        if na == nb {
            return 1.0;
        }
        let va = self.vector_of(a);
        self.similarity_to_vector(&na, &va, b)
    }

    fn similarity_to_vector(&self, normalized_query: &str, query: &SparseVector, title: &str) -> f64 {
        let nt = normalize_text(title);
        if normalized_query.is_empty() || nt.is_empty() {
            return 0.0;
        }
        if normalized_query == nt {
            return 1.0;
        }
        if query.is_zero() {
            return 0.0;
        }
        match self.title_vectors.get(title) {
            Some(v) => query.dot(v).clamp(0.0, 1.0),
            None => query.dot(&self.vectorizer.transform(title)).clamp(0.0, 1.0),
        }
    }

    /// Start a per-request memo for comparisons against `query`.
    pub fn for_query(&self, query: &str) -> QuerySimilarity<'_> {
        QuerySimilarity {
            scorer: self,
            normalized: normalize_text(query),
            vector: self.vectorizer.transform(query),
            memo: HashMap::new(),
        }
    }
}

/// Memoized comparisons of one input title against historical titles.
///
/// Owned by a single recommendation call; the input title is vectorized once.
pub struct QuerySimilarity<'a> {
    scorer: &'a TitleSimilarityScorer,
    normalized: String,
    vector: SparseVector,
    memo: HashMap<String, f64>,
}

impl QuerySimilarity<'_> {
    pub fn similarity(&mut self, title: &str) -> f64 {
        if let Some(&s) = self.memo.get(title) {
            return s;
        }
        let s = self
            .scorer
            .similarity_to_vector(&self.normalized, &self.vector, title);
        self.memo.insert(title.to_string(), s);
        s
    }

    /// Maximum similarity over `titles`, 0.0 when there are none.
    pub fn max_similarity<S: AsRef<str>>(&mut self, titles: &[S]) -> f64 {
        titles
            .iter()
            .map(|t| self.similarity(t.as_ref()))
            .fold(0.0, f64::max)
    }

    /// Number of distinct titles compared so far.
    pub fn memoized(&self) -> usize {
        self.memo.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const MULTIPLIERS: TierMultipliers = TierMultipliers {
        high: 200.0,
        mid: 50.0,
    };

    fn scorer() -> TitleSimilarityScorer {
        let titles = vec![
            "Quantum Sensing for Robotics",
            "Quantum Computing Workforce Training",
            "Deep Learning for Healthcare Imaging",
            "Healthcare Workforce Development",
            "Robotics in Agriculture",
        ];
        TitleSimilarityScorer::fit(&titles, &SimilarityConfig::default())
    }

    #[test]
    fn test_identity_is_one() {
        let s = scorer();
        assert_eq!(s.similarity("Quantum Sensing for Robotics", "Quantum Sensing for Robotics"), 1.0);
        assert_eq!(s.similarity("of the and", "OF  THE and"), 1.0);
    }

    #[test]
    fn test_empty_is_zero() {
        let s = scorer();
        assert_eq!(s.similarity("Quantum Sensing", ""), 0.0);
        assert_eq!(s.similarity("   ", "Quantum Sensing"), 0.0);
    }

    #[test]
    fn test_unrelated_titles_are_zero() {
        let s = scorer();
        assert_eq!(s.similarity("Quantum Sensing for Robotics", "Healthcare Workforce Development"), 0.0);
    }

    #[test]
    fn test_partial_overlap_is_between_bounds() {
        let s = scorer();
        let sim = s.similarity("Quantum Sensing for Robotics", "Robotics in Agriculture");
        assert!(sim > 0.0 && sim < 1.0);
    }

    #[test]
    fn test_keyword_tiers() {
        assert_eq!(keyword_score(1.0, MULTIPLIERS), 200.0);
        assert_eq!(keyword_score(0.85, MULTIPLIERS), 170.0);
        assert_eq!(keyword_score(0.5, MULTIPLIERS), 25.0);
        assert_eq!(keyword_score(0.20, MULTIPLIERS), 0.0);
        assert_eq!(keyword_score(0.0, MULTIPLIERS), 0.0);
    }

    #[test]
    fn test_query_similarity_memoizes() {
        let s = scorer();
        let mut q = s.for_query("Quantum Sensing for Robotics");
        let titles = ["Robotics in Agriculture", "Quantum Sensing for Robotics"];
        assert_eq!(q.max_similarity(&titles), 1.0);

        q.max_similarity(&titles);
        assert_eq!(q.memoized(), 2);
    }

    #[test]
    fn test_query_similarity_matches_pairwise() {
        let s = scorer();
        let mut q = s.for_query("quantum workforce");
        for title in ["Quantum Computing Workforce Training", "Healthcare Workforce Development"] {
            assert!((q.similarity(title) - s.similarity("quantum workforce", title)).abs() < 1e-12);
        }
    }

    #[test]
    fn test_max_similarity_of_nothing() {
        let s = scorer();
        let mut q = s.for_query("quantum");
        let none: [&str; 0] = [];
        assert_eq!(q.max_similarity(&none), 0.0);
    }

    proptest! {
        #[test]
        fn prop_symmetric_and_bounded(a in "[a-z ]{0,40}", b in "[a-z ]{0,40}") {
            let s = scorer();
            let ab = s.similarity(&a, &b);
            let ba = s.similarity(&b, &a);
            prop_assert!((ab - ba).abs() < 1e-12);
            prop_assert!((0.0..=1.0).contains(&ab));
        }

        #[test]
        fn prop_self_similarity(a in "[a-zA-Z][a-zA-Z ]{0,40}") {
            let s = scorer();
            prop_assert_eq!(s.similarity(&a, &a), 1.0);
        }

        #[test]
        fn prop_keyword_score_bounded(sim in 0.0f64..=1.0) {
            let k = keyword_score(sim, MULTIPLIERS);
            prop_assert!(k >= 0.0 && k <= MULTIPLIERS.high);
        }
    }
}
