//! Keyword tokenization and overlap scoring

use std::collections::HashSet;

/// Words too common in civic suggestions to signal a relation
pub const DEFAULT_STOPWORDS: &[&str] = &[
    "the", "and", "for", "with", "that", "this", "from", "are", "was", "were", "have", "has",
    "had", "but", "not", "you", "your", "our", "their", "they", "them", "his", "her", "its",
    "into", "onto", "about", "after", "before", "over", "under", "between", "across", "more",
    "less", "than", "then", "also", "will", "would", "could", "should", "can", "may", "might",
    "just", "like", "time", "year", "month", "city", "new", "york", "san", "francisco", "make",
    "need", "want", "much", "many", "some", "most", "other", "same", "very", "really",
];

/// Shortest token that counts as a keyword
pub const MIN_TOKEN_LEN: usize = 3;

/// Splits summaries into keyword sets
#[derive(Debug, Clone)]
pub struct Tokenizer {
    stopwords: HashSet<String>,
}

impl Tokenizer {
    /// Tokenizer with the given stopword list
    pub fn new<I, S>(stopwords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            stopwords: stopwords.into_iter().map(|s| s.as_ref().to_lowercase()).collect(),
        }
    }

    /// Keyword set of `text`
    ///
    /// Runs of `[a-z0-9']` in the lowercased text with quoting apostrophes
    /// trimmed from both ends, kept when at least three characters long.
    /// Interior apostrophes stay (`city's`). Stopwords match the untrimmed run.
    pub fn tokenize(&self, text: &str) -> HashSet<String> {
        let lowered = text.to_lowercase();
        lowered
            .split(|c: char| !(c.is_ascii_lowercase() || c.is_ascii_digit() || c == '\''))
            .filter(|raw| !self.stopwords.contains(*raw))
            .map(|raw| raw.trim_matches('\''))
            .filter(|token| token.len() >= MIN_TOKEN_LEN)
            .map(str::to_string)
            .collect()
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new(DEFAULT_STOPWORDS)
    }
}

/// Overlap coefficient `|a ∩ b| / min(|a|, |b|)`; 0.0 when either set is empty
pub fn overlap_score(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let smaller = a.len().min(b.len());
    if smaller == 0 {
        return 0.0;
    }
    let shared = a.intersection(b).count();
    shared as f64 / smaller as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn set(words: &[&str]) -> HashSet<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_tokenize_drops_short_and_stopwords() {
        let tokenizer = Tokenizer::default();
        let tokens = tokenizer.tokenize("We need WIDER sidewalks on the avenue!");
        assert_eq!(tokens, set(&["wider", "sidewalks", "avenue"]));
    }

    #[test]
    fn test_tokenize_trims_outer_apostrophes() {
        let tokenizer = Tokenizer::default();
        let tokens = tokenizer.tokenize("the city's buses don't run 'late' 'ok'");
        assert_eq!(tokens, set(&["city's", "buses", "don't", "run", "late"]));
    }

    #[test]
    fn test_tokenize_empty_text() {
        assert!(Tokenizer::default().tokenize("").is_empty());
        assert!(Tokenizer::default().tokenize("a an to of").is_empty());
    }

    #[test]
    fn test_custom_stopwords() {
        let tokenizer = Tokenizer::new(["Sidewalks"]);
        let tokens = tokenizer.tokenize("wider sidewalks");
        assert_eq!(tokens, set(&["wider"]));
    }

    #[test]
    fn test_overlap_score() {
        let a = set(&["wider", "sidewalks"]);
        let b = set(&["wider", "sidewalks", "brooklyn", "downtown"]);
        assert!((overlap_score(&a, &b) - 1.0).abs() < f64::EPSILON);

        let c = set(&["wider", "lanes"]);
        assert!((overlap_score(&a, &c) - 0.5).abs() < f64::EPSILON);

        assert_eq!(overlap_score(&a, &HashSet::new()), 0.0);
    }

    proptest! {
        #[test]
        fn prop_overlap_is_symmetric_and_bounded(
            a in proptest::collection::hash_set("[a-e]{3}", 0..8),
            b in proptest::collection::hash_set("[a-e]{3}", 0..8),
        ) {
            let ab = overlap_score(&a, &b);
            let ba = overlap_score(&b, &a);
            prop_assert!((ab - ba).abs() < 1e-12);
            prop_assert!((0.0..=1.0).contains(&ab));
        }
    }
}
