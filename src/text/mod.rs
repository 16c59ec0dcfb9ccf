//! Text normalization, tokenization, and the shared TF-IDF term space.
//!
//! Titles are compared in a single vector space fitted once over every title
//! in the dataset. Comparing vectors produced by two different fits is
//! meaningless, so the fitted [`TfidfVectorizer`] is built at startup and only
//! ever read afterwards.

pub mod tfidf;

pub use tfidf::{SparseVector, TfidfVectorizer};

/// English stop words removed before vectorization.
const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "across", "after", "again", "against", "all", "almost", "along",
    "also", "although", "always", "am", "among", "an", "and", "another", "any", "are", "around",
    "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "either",
    "etc", "even", "ever", "every", "few", "for", "from", "further", "had", "has", "have",
    "having", "he", "her", "here", "hers", "him", "his", "how", "however", "if", "in", "into",
    "is", "it", "its", "itself", "just", "least", "less", "many", "may", "me", "might", "more",
    "most", "much", "must", "my", "neither", "no", "nor", "not", "now", "of", "off", "often",
    "on", "once", "only", "or", "other", "our", "ours", "out", "over", "own", "per", "rather",
    "same", "she", "should", "since", "so", "some", "such", "than", "that", "the", "their",
    "them", "then", "there", "these", "they", "this", "those", "through", "thus", "to", "too",
    "toward", "towards", "under", "until", "up", "upon", "us", "very", "via", "was", "we",
    "well", "were", "what", "when", "where", "whether", "which", "while", "who", "whom",
    "whose", "why", "will", "with", "within", "without", "would", "yet", "you", "your",
];

/// Whether `token` (already lowercased) is an English stop word.
pub fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.binary_search(&token).is_ok()
}

/// Normalizes text for consistent comparison.
///
/// This function applies the following transformations:
/// - Converts to lowercase
/// - Strips quote characters wrapping the whole string
/// - Collapses runs of whitespace to a single space
///
/// # Example
/// ```
/// use researcher_recommend::text::normalize_text;
///
/// assert_eq!(normalize_text("  \"Quantum   Sensing\" "), "quantum sensing");
/// ```
pub fn normalize_text(text: &str) -> String {
    text.trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Split text into lowercase terms of two or more alphanumeric characters,
/// dropping stop words.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() >= 2 && !is_stop_word(t))
        .map(str::to_string)
        .collect()
}
