//! Statistics gathered while building a dictionary.

use std::time::Duration;

/// Counters for one build.
#[derive(Debug, Clone, Default)]
pub struct BuildStats {
    /// Semantic types in the whitelist.
    pub types_of_interest: usize,
    /// Concepts with at least one whitelisted type.
    pub typed_concepts: usize,
    /// Rows read from `MRSTY.RRF`.
    pub type_rows: usize,
    /// Rows read from `MRCONSO.RRF`.
    pub concept_rows: usize,
    /// Rows read from `MRXNS_ENG.RRF`.
    pub norm_rows: usize,
    /// Rows skipped, by reason.
    pub skipped: SkipCounts,
    /// Distinct keys in the phrase index.
    pub phrase_keys: u64,
    /// Distinct keys in the lowercase index.
    pub lowercase_keys: u64,
    /// Distinct keys in the norms index.
    pub norm_keys: u64,
    /// Rows written across all three indices.
    pub rows_written: u64,
    /// Distinct sources.
    pub sources: usize,
    /// Wall-clock build time.
    pub elapsed: Duration,
}

/// Reasons a row was left out of the dictionary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SkipCounts {
    /// Row language differs from the configured one.
    pub language: usize,
    /// Phrase shorter than the minimum length.
    pub short_phrase: usize,
    /// Row is marked suppressible.
    pub suppressed: usize,
    /// Term type is banned.
    pub banned_term_type: usize,
    /// Concept has no whitelisted type.
    pub untyped_concept: usize,
    /// Every type of the concept was removed by the filter sets.
    pub filtered: usize,
    /// Normalized string has fewer than two tokens.
    pub short_norm: usize,
    /// Normalized string belongs to a suppressed term.
    pub banned_term: usize,
}

impl SkipCounts {
    /// Total skipped rows.
    pub fn total(&self) -> usize {
        self.language
            + self.short_phrase
            + self.suppressed
            + self.banned_term_type
            + self.untyped_concept
            + self.filtered
            + self.short_norm
            + self.banned_term
    }
}

impl std::fmt::Display for BuildStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Dictionary Build")?;
        writeln!(f, "  Types of interest: {}", self.types_of_interest)?;
        writeln!(f, "  Typed concepts:    {}", self.typed_concepts)?;
        writeln!(f, "  MRCONSO rows:      {}", self.concept_rows)?;
        writeln!(f, "  MRXNS rows:        {}", self.norm_rows)?;
        writeln!(f, "  Skipped rows:      {}", self.skipped.total())?;
        writeln!(f, "  Phrase keys:       {}", self.phrase_keys)?;
        writeln!(f, "  Lowercase keys:    {}", self.lowercase_keys)?;
        writeln!(f, "  Norm keys:         {}", self.norm_keys)?;
        writeln!(f, "  Rows written:      {}", self.rows_written)?;
        writeln!(f, "  Sources:           {}", self.sources)?;
        writeln!(f, "  Elapsed:           {:.1?}", self.elapsed)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_total() {
        let skipped = SkipCounts {
            language: 1,
            short_phrase: 2,
            suppressed: 3,
            banned_term_type: 4,
            untyped_concept: 5,
            filtered: 6,
            short_norm: 7,
            banned_term: 8,
        };
        assert_eq!(skipped.total(), 36);
    }
}
