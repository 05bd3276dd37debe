//! # umls-concept-matcher
//!
//! Finds UMLS concepts in POS-tagged sentences by sliding a token window
//! over each sentence and looking the window up in a concept dictionary.
//!
//! ## Quick Start
//!
//! ```ignore
//! use umls_concept_matcher::{ConceptMatcher, Document, Sentence};
//! use umls_dictionary::{ConceptDictionary, DictionaryConfig};
//!
//! let dictionary = ConceptDictionary::open("/data/dictionary", DictionaryConfig::in_memory())?;
//! let matcher = ConceptMatcher::new(&dictionary);
//!
//! let doc = Document::new("Patient denies chest pain.");
//! let sentence = Sentence::from_tagged(&doc.text, &[
//!     ("Patient", "NN"), ("denies", "VBZ"), ("chest", "NN"), ("pain", "NN"), (".", "."),
//! ])?;
//! let output = matcher.match_document(&doc, &[sentence])?;
//! ```
//!
//! ## Strategy cascade
//!
//! Each window tries, in order, until one finds rows:
//!
//! | Strategy | Score |
//! |----------|-------|
//! | Exact phrase | 1.0 |
//! | Lowercase phrase (≥ 2 tokens) | 0.6 |
//! | Exact phrase, acronyms expanded | 0.9 |
//! | Lowercase phrase, acronyms expanded (≥ 2 tokens) | 0.5 |
//! | Bag of normalized words (≥ 2 tokens) | 0.3 |
//!
//! Windows never start or end on a stopword, punctuation or a trivial
//! part-of-speech tag.
//!
//! ## Feature Flags
//!
//! - `parallel` - Matches independent documents on the rayon pool

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod config;
mod edit;
mod error;
mod matcher;
mod model;
mod result;
mod strategy;
mod traits;

#[cfg(test)]
mod testing;

// Public re-exports
pub use config::{
    MatcherConfig, MatcherConfigBuilder, ScoreConfig, CARDINAL_TAG, DEFAULT_STOPWORDS,
    DEFAULT_TRIVIAL_POS, DEFAULT_WINDOW_SIZE,
};
pub use edit::EditedSentence;
pub use error::{MatcherError, MatcherResult};
pub use matcher::{ConceptMatcher, UNKNOWN_SOURCE};
pub use model::{ConceptAnnotation, Document, Sentence, Span, TermAnnotation, Token};
pub use result::{MatchOutput, MatchStats};
pub use strategy::{MatchStrategy, StrategyOutcome, Window, DEFAULT_STRATEGIES};
pub use traits::{ConceptLookup, Normalizer};

// Re-export commonly used types from dependencies for convenience
pub use umls_concepts::{ConceptRow, Cui, Sui, Tui};
