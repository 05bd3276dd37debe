//! Span model shared with the text-processing collaborators.
//!
//! Tokenization, tagging, sentence splitting, acronym expansion and word
//! normalization happen upstream. Their results arrive here as plain values
//! addressed by byte offsets into the document text, and the matcher's
//! results leave the same way.

use std::fmt;

use umls_concepts::{Cui, Sui, Tui};

use crate::error::{MatcherError, MatcherResult};
use crate::strategy::MatchStrategy;

/// Half-open byte range `[begin, end)` over a document's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Span {
    /// First byte.
    pub begin: usize,
    /// One past the last byte.
    pub end: usize,
}

impl Span {
    /// Creates a span.
    pub const fn new(begin: usize, end: usize) -> Self {
        Self { begin, end }
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.begin)
    }

    /// True for a zero-length span.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True if `other` lies entirely inside this span.
    pub fn contains(&self, other: &Span) -> bool {
        self.begin <= other.begin && other.end <= self.end
    }

    /// The text covered by this span, if it addresses `text` on character
    /// boundaries.
    pub fn slice<'t>(&self, text: &'t str) -> Option<&'t str> {
        if self.begin > self.end {
            return None;
        }
        text.get(self.begin..self.end)
    }

    /// Checks that the span addresses `text` on character boundaries.
    pub fn validate(&self, text: &str) -> MatcherResult<()> {
        let reason = if self.begin > self.end {
            "begin after end"
        } else if self.end > text.len() {
            "end past text"
        } else if !text.is_char_boundary(self.begin) || !text.is_char_boundary(self.end) {
            "not on a character boundary"
        } else {
            return Ok(());
        };
        Err(MatcherError::InvalidSpan {
            span: *self,
            text_len: text.len(),
            reason,
        })
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.begin, self.end)
    }
}

/// A POS-tagged token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Position in the document text.
    pub span: Span,
    /// Penn Treebank part-of-speech tag.
    pub pos: String,
    /// Expansion supplied by the acronym detector.
    pub acronym_expansion: Option<String>,
    /// Normalized form supplied by an upstream normalizer.
    pub norm: Option<String>,
}

impl Token {
    /// Creates a token with no acronym expansion or normalized form.
    pub fn new(span: Span, pos: impl Into<String>) -> Self {
        Self {
            span,
            pos: pos.into(),
            acronym_expansion: None,
            norm: None,
        }
    }

    /// Attaches an acronym expansion.
    pub fn with_acronym_expansion(mut self, expansion: impl Into<String>) -> Self {
        self.acronym_expansion = Some(expansion.into());
        self
    }

    /// Attaches a normalized form.
    pub fn with_norm(mut self, norm: impl Into<String>) -> Self {
        self.norm = Some(norm.into());
        self
    }
}

/// A sentence and its tokens, in text order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence {
    /// Position in the document text.
    pub span: Span,
    /// Tokens inside `span`.
    pub tokens: Vec<Token>,
}

impl Sentence {
    /// Creates a sentence.
    pub fn new(span: Span, tokens: Vec<Token>) -> Self {
        Self { span, tokens }
    }

    /// Builds a sentence covering all of `text` from `(word, pos)` pairs,
    /// locating each word after the previous one.
    ///
    /// ```rust
    /// use umls_concept_matcher::Sentence;
    ///
    /// let sentence = Sentence::from_tagged("Chest pain.", &[("Chest", "NN"), ("pain", "NN"), (".", ".")]).unwrap();
    /// assert_eq!(sentence.tokens[1].span.begin, 6);
    /// ```
    pub fn from_tagged(text: &str, tagged: &[(&str, &str)]) -> MatcherResult<Self> {
        let mut cursor = 0;
        let mut tokens = Vec::with_capacity(tagged.len());
        for (word, pos) in tagged {
            let Some(offset) = text[cursor..].find(word) else {
                return Err(MatcherError::InvalidSpan {
                    span: Span::new(cursor, text.len()),
                    text_len: text.len(),
                    reason: "word not found in text",
                });
            };
            let begin = cursor + offset;
            cursor = begin + word.len();
            tokens.push(Token::new(Span::new(begin, cursor), *pos));
        }
        Ok(Self::new(Span::new(0, text.len()), tokens))
    }

    /// Checks that every span addresses `text` and every token lies inside
    /// the sentence, after its predecessor.
    pub fn validate(&self, text: &str) -> MatcherResult<()> {
        self.span.validate(text)?;
        let mut previous_end = self.span.begin;
        for (index, token) in self.tokens.iter().enumerate() {
            token.span.validate(text)?;
            if !self.span.contains(&token.span) {
                return Err(MatcherError::TokenOutOfBounds {
                    index,
                    token: token.span,
                    sentence: self.span,
                });
            }
            if token.span.begin < previous_end {
                return Err(MatcherError::InvalidSpan {
                    span: token.span,
                    text_len: text.len(),
                    reason: "token overlaps its predecessor",
                });
            }
            previous_end = token.span.end;
        }
        Ok(())
    }
}

/// A document's text. Sentences are supplied alongside it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Document {
    /// Full plain text.
    pub text: String,
}

impl Document {
    /// Creates a document.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// A span resolved to one dictionary row.
#[derive(Debug, Clone, PartialEq)]
pub struct ConceptAnnotation {
    /// Matched text in the original document.
    pub span: Span,
    /// Term identifier.
    pub sui: Sui,
    /// Concept identifier.
    pub cui: Cui,
    /// Semantic type identifier.
    pub tui: Tui,
    /// Source vocabulary name, or `"unknown"`.
    pub source: String,
    /// Source-local code.
    pub code: String,
    /// Confidence of the strategy that matched.
    pub score: f64,
    /// Strategy that matched.
    pub strategy: MatchStrategy,
}

/// Marks text covered by at least one concept annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TermAnnotation {
    /// Matched text in the original document.
    pub span: Span,
}
