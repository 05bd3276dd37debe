//! Seams between the matcher and its collaborators.
//!
//! [`ConceptLookup`] is what the matcher needs from a dictionary; it is
//! implemented here for [`ConceptDictionary`] so both backends work out of
//! the box. [`Normalizer`] is the optional word normalization model.

use umls_concepts::ConceptRow;
use umls_dictionary::{ConceptDictionary, DictionaryResult};

/// Read access to the three phrase indices and the source table.
///
/// A miss is `Ok(None)`. Implementations must be safe for concurrent
/// readers.
pub trait ConceptLookup: Send + Sync {
    /// Rows for an exact surface phrase.
    fn for_phrase(&self, phrase: &str) -> DictionaryResult<Option<Vec<ConceptRow>>>;

    /// Rows for a case-folded phrase.
    fn for_lowercase_phrase(&self, phrase: &str) -> DictionaryResult<Option<Vec<ConceptRow>>>;

    /// Rows for a canonical bag-of-words key.
    fn for_norms(&self, norms: &str) -> DictionaryResult<Option<Vec<ConceptRow>>>;

    /// Name of a source id.
    fn source(&self, id: i32) -> DictionaryResult<Option<String>>;
}

impl ConceptLookup for ConceptDictionary {
    fn for_phrase(&self, phrase: &str) -> DictionaryResult<Option<Vec<ConceptRow>>> {
        ConceptDictionary::for_phrase(self, phrase)
    }

    fn for_lowercase_phrase(&self, phrase: &str) -> DictionaryResult<Option<Vec<ConceptRow>>> {
        ConceptDictionary::for_lowercase_phrase(self, phrase)
    }

    fn for_norms(&self, norms: &str) -> DictionaryResult<Option<Vec<ConceptRow>>> {
        ConceptDictionary::for_norms(self, norms)
    }

    fn source(&self, id: i32) -> DictionaryResult<Option<String>> {
        ConceptDictionary::source(self, id)
    }
}

/// Word normalization model: `(word, pos) → normalized form`.
///
/// Returning `None` defers to the token's own normalized form, then to the
/// lowercase surface form.
///
/// Any `Fn(&str, &str) -> Option<String>` closure is a normalizer:
///
/// ```rust
/// use umls_concept_matcher::Normalizer;
///
/// let strip_plural = |word: &str, pos: &str| {
///     (pos == "NNS").then(|| word.trim_end_matches('s').to_lowercase())
/// };
/// assert_eq!(strip_plural.normalize("Lesions", "NNS").as_deref(), Some("lesion"));
/// assert_eq!(strip_plural.normalize("fever", "NN"), None);
/// ```
pub trait Normalizer: Send + Sync {
    /// Normalized form of `word` tagged `pos`.
    fn normalize(&self, word: &str, pos: &str) -> Option<String>;
}

impl<F> Normalizer for F
where
    F: Fn(&str, &str) -> Option<String> + Send + Sync,
{
    fn normalize(&self, word: &str, pos: &str) -> Option<String> {
        self(word, pos)
    }
}
