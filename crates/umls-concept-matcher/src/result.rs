//! Match result types.

use std::collections::BTreeSet;

use crate::model::{ConceptAnnotation, Span, TermAnnotation};
use crate::strategy::MatchStrategy;

/// Annotations produced for a sentence or a document.
///
/// Concept annotations appear in window order (start token, then window
/// length), and within a window in dictionary row order. Overlapping
/// annotations are expected.
#[derive(Debug, Clone, Default)]
pub struct MatchOutput {
    /// One annotation per matched dictionary row.
    pub concepts: Vec<ConceptAnnotation>,
    /// One annotation per matched window.
    pub terms: Vec<TermAnnotation>,
    /// Counters.
    pub stats: MatchStats,
}

impl MatchOutput {
    /// Creates an empty output.
    pub fn new() -> Self {
        Self::default()
    }

    /// True if nothing matched.
    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty()
    }

    /// Appends another output.
    pub fn extend(&mut self, other: MatchOutput) {
        self.concepts.extend(other.concepts);
        self.terms.extend(other.terms);
        self.stats.merge(&other.stats);
    }

    /// Distinct matched spans, sorted.
    pub fn term_spans(&self) -> Vec<Span> {
        self.terms
            .iter()
            .map(|t| t.span)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Concept annotations over exactly `span`.
    pub fn concepts_at(&self, span: Span) -> impl Iterator<Item = &ConceptAnnotation> {
        self.concepts.iter().filter(move |c| c.span == span)
    }
}

/// Counters gathered while matching.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchStats {
    /// Sentences processed.
    pub sentences: usize,
    /// Windows that reached the strategy cascade.
    pub windows: usize,
    /// Dictionary lookups issued.
    pub lookups: usize,
    /// Windows matched by the exact strategy.
    pub exact_hits: usize,
    /// Windows matched by the lowercase strategy.
    pub lowercase_hits: usize,
    /// Windows matched by the exact strategy over expanded text.
    pub edited_exact_hits: usize,
    /// Windows matched by the lowercase strategy over expanded text.
    pub edited_lowercase_hits: usize,
    /// Windows matched by the norms strategy.
    pub norms_hits: usize,
    /// Rows whose source id was not in the source table.
    pub unknown_sources: usize,
}

impl MatchStats {
    /// Counts a window matched by `strategy`.
    pub fn record_hit(&mut self, strategy: MatchStrategy) {
        match strategy {
            MatchStrategy::Exact => self.exact_hits += 1,
            MatchStrategy::Lowercase => self.lowercase_hits += 1,
            MatchStrategy::EditedExact => self.edited_exact_hits += 1,
            MatchStrategy::EditedLowercase => self.edited_lowercase_hits += 1,
            MatchStrategy::Norms => self.norms_hits += 1,
        }
    }

    /// Windows matched by any strategy.
    pub fn hits(&self) -> usize {
        self.exact_hits
            + self.lowercase_hits
            + self.edited_exact_hits
            + self.edited_lowercase_hits
            + self.norms_hits
    }

    /// Adds another set of counters.
    pub fn merge(&mut self, other: &MatchStats) {
        self.sentences += other.sentences;
        self.windows += other.windows;
        self.lookups += other.lookups;
        self.exact_hits += other.exact_hits;
        self.lowercase_hits += other.lowercase_hits;
        self.edited_exact_hits += other.edited_exact_hits;
        self.edited_lowercase_hits += other.edited_lowercase_hits;
        self.norms_hits += other.norms_hits;
        self.unknown_sources += other.unknown_sources;
    }
}
