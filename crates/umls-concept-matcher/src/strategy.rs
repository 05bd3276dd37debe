//! Lookup strategies tried per window.
//!
//! A window is matched by walking an ordered list of strategies; the first
//! one that finds rows wins and the rest are not tried for that window.
//!
//! | Strategy | Index | Key | Applies when |
//! |----------|-------|-----|--------------|
//! | `Exact` | phrases | surface text | always |
//! | `Lowercase` | lowercase | case-folded surface text | ≥ 2 tokens |
//! | `EditedExact` | phrases | acronym-expanded text | a token was expanded |
//! | `EditedLowercase` | lowercase | case-folded expanded text | expanded, ≥ 2 tokens |
//! | `Norms` | norms | sorted bag of normalized forms | ≥ 2 tokens, last token not a cardinal |

use std::fmt;

use umls_concepts::ConceptRow;
use umls_dictionary::{norms_key, DictionaryResult, IndexKind};

use crate::config::MatcherConfig;
use crate::error::MatcherResult;
use crate::traits::ConceptLookup;

/// The default cascade.
pub const DEFAULT_STRATEGIES: &[MatchStrategy] = &[
    MatchStrategy::Exact,
    MatchStrategy::Lowercase,
    MatchStrategy::EditedExact,
    MatchStrategy::EditedLowercase,
    MatchStrategy::Norms,
];

/// One way of turning a window into a dictionary key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchStrategy {
    /// Exact surface phrase.
    Exact,
    /// Case-folded phrase; multi-token windows only.
    Lowercase,
    /// Exact phrase over the acronym-expanded text.
    EditedExact,
    /// Case-folded phrase over the acronym-expanded text; multi-token windows only.
    EditedLowercase,
    /// Sorted bag of normalized forms.
    Norms,
}

/// The per-window facts strategies read.
#[derive(Debug, Clone, Copy)]
pub struct Window<'s> {
    /// Original text from the first token's start to the last token's end.
    pub text: &'s str,
    /// The same tokens in the acronym-expanded text.
    pub edited_text: &'s str,
    /// Number of tokens.
    pub token_count: usize,
    /// True if any token was expanded.
    pub edited: bool,
    /// Tag of the last token.
    pub last_pos: &'s str,
    /// Normalized form per token.
    pub norms: &'s [String],
    /// Per token: stopword or punctuation, left out of bags.
    pub excluded: &'s [bool],
}

impl MatchStrategy {
    /// Short name used in logs and statistics.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Lowercase => "lowercase",
            Self::EditedExact => "edited-exact",
            Self::EditedLowercase => "edited-lowercase",
            Self::Norms => "norms",
        }
    }

    /// Index the strategy queries.
    pub fn index(&self) -> IndexKind {
        match self {
            Self::Exact | Self::EditedExact => IndexKind::Phrases,
            Self::Lowercase | Self::EditedLowercase => IndexKind::Lowercase,
            Self::Norms => IndexKind::Norms,
        }
    }

    /// Dictionary key for `window`, or `None` if the strategy does not
    /// apply to it.
    pub fn key(&self, window: &Window<'_>, config: &MatcherConfig) -> Option<String> {
        let multi_token = window.token_count > 1;
        match self {
            Self::Exact => Some(window.text.to_string()),
            Self::Lowercase if multi_token => Some(window.text.to_lowercase()),
            Self::EditedExact if window.edited => Some(window.edited_text.to_string()),
            Self::EditedLowercase if window.edited && multi_token => {
                Some(window.edited_text.to_lowercase())
            }
            Self::Norms if multi_token && window.last_pos != config.cardinal_tag => {
                let bag: Vec<&str> = window
                    .norms
                    .iter()
                    .zip(window.excluded)
                    .filter(|(_, &excluded)| !excluded)
                    .map(|(norm, _)| norm.as_str())
                    .collect();
                if bag.is_empty() {
                    None
                } else {
                    Some(norms_key(bag))
                }
            }
            _ => None,
        }
    }

    /// Looks `key` up in the strategy's index.
    pub fn lookup(
        &self,
        lookup: &dyn ConceptLookup,
        key: &str,
    ) -> DictionaryResult<Option<Vec<ConceptRow>>> {
        match self.index() {
            IndexKind::Phrases => lookup.for_phrase(key),
            IndexKind::Lowercase => lookup.for_lowercase_phrase(key),
            IndexKind::Norms => lookup.for_norms(key),
        }
    }

    /// Runs the strategy on `window`. An absent key and an empty row list
    /// both count as a miss.
    pub fn apply(
        &self,
        window: &Window<'_>,
        lookup: &dyn ConceptLookup,
        config: &MatcherConfig,
    ) -> MatcherResult<StrategyOutcome> {
        let Some(key) = self.key(window, config) else {
            return Ok(StrategyOutcome::NotApplicable);
        };
        Ok(match self.lookup(lookup, &key)? {
            Some(rows) if !rows.is_empty() => StrategyOutcome::Hit(rows),
            _ => StrategyOutcome::Miss,
        })
    }
}

/// What one strategy found for one window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrategyOutcome {
    /// The strategy has no key for the window; no lookup was issued.
    NotApplicable,
    /// The lookup found no rows.
    Miss,
    /// The lookup found rows.
    Hit(Vec<ConceptRow>),
}

impl StrategyOutcome {
    /// True if a dictionary lookup was issued.
    pub fn looked_up(&self) -> bool {
        !matches!(self, Self::NotApplicable)
    }
}

impl fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
