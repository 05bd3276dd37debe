//! Configuration types for the concept matcher.

use std::collections::HashSet;

use crate::strategy::{MatchStrategy, DEFAULT_STRATEGIES};

/// Default maximum window length in tokens.
pub const DEFAULT_WINDOW_SIZE: usize = 5;

/// Penn Treebank tag of cardinal numbers.
pub const CARDINAL_TAG: &str = "CD";

/// Tags too light to start or end a concept span: determiners,
/// conjunctions, prepositions, pronouns, modals and punctuation classes.
pub const DEFAULT_TRIVIAL_POS: &[&str] = &[
    "DT", "PDT", "WDT", "CC", "TO", "IN", "EX", "PRP", "PRP$", "WP", "WP$", "MD", "XX", ",", ".",
    ":", "``", "''", "-LRB-", "-RRB-", "HYPH", "NFP", "#", "$",
];

/// English function words.
pub const DEFAULT_STOPWORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "few", "for",
    "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers", "herself",
    "him", "himself", "his", "how", "i", "if", "in", "into", "is", "it", "its", "itself", "may",
    "me", "might", "more", "most", "must", "my", "myself", "nor", "of", "off", "on", "once",
    "only", "or", "other", "our", "ours", "ourselves", "out", "over", "own", "same", "shall",
    "she", "should", "so", "some", "such", "than", "that", "the", "their", "theirs", "them",
    "themselves", "then", "there", "these", "they", "this", "those", "through", "to", "too",
    "under", "until", "up", "very", "was", "we", "were", "what", "when", "where", "which",
    "while", "who", "whom", "why", "will", "with", "would", "you", "your", "yours", "yourself",
    "yourselves",
];

/// Scores assigned per strategy tier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreConfig {
    /// Exact surface phrase.
    pub exact: f64,
    /// Case-folded phrase.
    pub lowercase: f64,
    /// Bag of normalized words.
    pub norms: f64,
    /// Subtracted from the exact and lowercase scores when the match used
    /// acronym expansions.
    pub acronym_penalty: f64,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            exact: 1.0,
            lowercase: 0.6,
            norms: 0.3,
            acronym_penalty: 0.1,
        }
    }
}

/// Configuration for the concept matcher.
///
/// # Example
///
/// ```rust
/// use umls_concept_matcher::MatcherConfig;
///
/// let config = MatcherConfig::builder()
///     .with_window_size(6)
///     .with_stopword("patient")
///     .with_trivial_pos("UH")
///     .build();
///
/// assert_eq!(config.window_size, 6);
/// assert!(config.is_stopword("patient"));
/// assert!(config.is_trivial_pos("UH"));
/// assert!(config.is_trivial_pos("DT"));
/// ```
#[derive(Debug, Clone)]
pub struct MatcherConfig {
    /// Maximum window length in tokens.
    pub window_size: usize,
    /// Tier scores.
    pub scores: ScoreConfig,
    /// Tags that cannot start or end a window.
    pub trivial_pos: HashSet<String>,
    /// Normalized forms that cannot start or end a window and are left out
    /// of bag-of-words keys.
    pub stopwords: HashSet<String>,
    /// Tag of cardinal numbers; windows ending on it skip the norms index.
    pub cardinal_tag: String,
    /// Strategies tried per window, in order.
    pub strategies: Vec<MatchStrategy>,
    /// Match documents on the rayon pool (requires the `parallel` feature).
    pub parallel: bool,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            scores: ScoreConfig::default(),
            trivial_pos: DEFAULT_TRIVIAL_POS.iter().map(|s| s.to_string()).collect(),
            stopwords: DEFAULT_STOPWORDS.iter().map(|s| s.to_string()).collect(),
            cardinal_tag: CARDINAL_TAG.to_string(),
            strategies: DEFAULT_STRATEGIES.to_vec(),
            parallel: false,
        }
    }
}

impl MatcherConfig {
    /// Creates a new builder for MatcherConfig.
    pub fn builder() -> MatcherConfigBuilder {
        MatcherConfigBuilder::default()
    }

    /// True if `pos` is in the trivial set.
    pub fn is_trivial_pos(&self, pos: &str) -> bool {
        self.trivial_pos.contains(pos)
    }

    /// True if `norm` is a stopword.
    pub fn is_stopword(&self, norm: &str) -> bool {
        self.stopwords.contains(norm)
    }

    /// Score of a strategy tier, with the acronym penalty applied.
    pub fn score(&self, strategy: MatchStrategy) -> f64 {
        let scores = &self.scores;
        match strategy {
            MatchStrategy::Exact => scores.exact,
            MatchStrategy::Lowercase => scores.lowercase,
            MatchStrategy::EditedExact => scores.exact - scores.acronym_penalty,
            MatchStrategy::EditedLowercase => scores.lowercase - scores.acronym_penalty,
            MatchStrategy::Norms => scores.norms,
        }
    }
}

/// Builder for MatcherConfig.
#[derive(Debug, Clone, Default)]
pub struct MatcherConfigBuilder {
    config: MatcherConfig,
}

impl MatcherConfigBuilder {
    /// Sets the maximum window length. Zero is treated as one.
    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.config.window_size = window_size.max(1);
        self
    }

    /// Sets the tier scores.
    pub fn with_scores(mut self, scores: ScoreConfig) -> Self {
        self.config.scores = scores;
        self
    }

    /// Adds a trivial tag.
    pub fn with_trivial_pos(mut self, pos: impl Into<String>) -> Self {
        self.config.trivial_pos.insert(pos.into());
        self
    }

    /// Replaces the trivial tag set.
    pub fn with_trivial_pos_set<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.trivial_pos = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Adds a stopword.
    pub fn with_stopword(mut self, word: impl Into<String>) -> Self {
        self.config.stopwords.insert(word.into());
        self
    }

    /// Replaces the stopword set.
    pub fn with_stopwords<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.stopwords = words.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the cardinal number tag.
    pub fn with_cardinal_tag(mut self, tag: impl Into<String>) -> Self {
        self.config.cardinal_tag = tag.into();
        self
    }

    /// Sets the strategies tried per window, in order.
    pub fn with_strategies(mut self, strategies: &[MatchStrategy]) -> Self {
        self.config.strategies = strategies.to_vec();
        self
    }

    /// Enables or disables parallel document matching.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.config.parallel = parallel;
        self
    }

    /// Builds the MatcherConfig.
    pub fn build(self) -> MatcherConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MatcherConfig::default();
        assert_eq!(config.window_size, 5);
        assert_eq!(config.cardinal_tag, "CD");
        assert_eq!(config.strategies, DEFAULT_STRATEGIES);
        assert!(!config.parallel);
        assert!(config.is_trivial_pos("PRP$"));
        assert!(config.is_trivial_pos("-LRB-"));
        assert!(!config.is_trivial_pos("NN"));
        assert!(config.is_stopword("the"));
        assert!(!config.is_stopword("fever"));
    }

    #[test]
    fn test_tier_scores() {
        let config = MatcherConfig::default();
        assert_eq!(config.score(MatchStrategy::Exact), 1.0);
        assert_eq!(config.score(MatchStrategy::Lowercase), 0.6);
        assert!((config.score(MatchStrategy::EditedExact) - 0.9).abs() < 1e-9);
        assert!((config.score(MatchStrategy::EditedLowercase) - 0.5).abs() < 1e-9);
        assert_eq!(config.score(MatchStrategy::Norms), 0.3);
    }

    #[test]
    fn test_builder_replaces_sets() {
        let config = MatcherConfig::builder()
            .with_stopwords(["of"])
            .with_trivial_pos_set(["DT"])
            .with_window_size(0)
            .with_strategies(&[MatchStrategy::Exact])
            .with_parallel(true)
            .build();

        assert_eq!(config.window_size, 1);
        assert!(config.is_stopword("of"));
        assert!(!config.is_stopword("the"));
        assert!(config.is_trivial_pos("DT"));
        assert!(!config.is_trivial_pos("IN"));
        assert_eq!(config.strategies, vec![MatchStrategy::Exact]);
        assert!(config.parallel);
    }
}
