//! Error types for concept matching.

use thiserror::Error;
use umls_dictionary::DictionaryError;

use crate::model::Span;

/// Errors that can occur while matching a sentence.
#[derive(Error, Debug)]
pub enum MatcherError {
    /// Lookup against the dictionary failed.
    #[error("dictionary error: {0}")]
    Dictionary(#[from] DictionaryError),

    /// A sentence or token span does not address the document text.
    #[error("invalid span {span} over text of length {text_len}: {reason}")]
    InvalidSpan {
        /// The offending span.
        span: Span,
        /// Length of the document text in bytes.
        text_len: usize,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// A token lies outside its sentence.
    #[error("token {index} at {token} lies outside sentence {sentence}")]
    TokenOutOfBounds {
        /// Position of the token in the sentence.
        index: usize,
        /// Token span.
        token: Span,
        /// Sentence span.
        sentence: Span,
    },
}

/// Result type for matcher operations.
pub type MatcherResult<T> = std::result::Result<T, MatcherError>;
