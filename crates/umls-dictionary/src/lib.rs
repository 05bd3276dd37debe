//! # umls-dictionary
//!
//! Offline builder and read-only store for UMLS phrase-to-concept dictionaries.
//!
//! A dictionary is a directory holding three sorted index files and a source
//! table:
//!
//! ```text
//! dictionary/
//! ├── phrases        exact surface phrase      → [ConceptRow]
//! ├── lowercase      case-folded phrase        → [ConceptRow]
//! ├── norms          sorted normalized bag     → [ConceptRow]
//! ├── sources.txt    source names, id = line number
//! └── manifest.json  format version, counts, SHA-256 digests
//! ```
//!
//! ## Building
//!
//! ```ignore
//! use umls_dictionary::{BuilderConfig, DictionaryBuilder};
//!
//! let config = BuilderConfig::builder("/data/umls/2024AA", "tuis.txt", "ttys.txt")
//!     .with_banned_cuis("banned-cuis.txt")
//!     .build();
//! let stats = DictionaryBuilder::new(config).build("/data/dictionary")?;
//! ```
//!
//! ## Reading
//!
//! ```ignore
//! use umls_dictionary::{ConceptDictionary, DictionaryConfig};
//!
//! let dictionary = ConceptDictionary::open("/data/dictionary", DictionaryConfig::in_memory())?;
//! let rows = dictionary.for_lowercase_phrase("chest pain")?;
//! ```
//!
//! The binary `umls-dict-build` wraps both for command-line use.

pub mod builder;
pub mod error;
pub mod manifest;
mod rrf;
pub mod sources;
pub mod store;
pub mod table;

pub use builder::{BuildStats, BuilderConfig, DictionaryBuilder, FilterSets};
pub use error::{DictionaryError, DictionaryResult};
pub use manifest::DictionaryManifest;
pub use sources::SourceTable;
pub use store::{
    BackendKind, ConceptDictionary, DictionaryConfig, DictionaryStats, IndexKind,
};
pub use table::LoadMode;

// Re-export the row types stored in every index
pub use umls_concepts::{ConceptRow, Cui, Sui, Tui};

/// File name of the exact phrase index.
pub const PHRASES_FILE: &str = "phrases";

/// File name of the lowercase phrase index.
pub const LOWERCASE_FILE: &str = "lowercase";

/// File name of the normalized bag-of-words index.
pub const NORMS_FILE: &str = "norms";

/// File name of the source table.
pub const SOURCES_FILE: &str = "sources.txt";

/// Builds the canonical key of the norms index: tokens sorted in byte
/// order and joined with single spaces.
///
/// The builder and the matcher both key bags through this function.
///
/// ```rust
/// use umls_dictionary::norms_key;
///
/// assert_eq!(norms_key(["fox", "the", "brown"]), "brown fox the");
/// assert_eq!(norms_key(["the", "brown", "fox"]), "brown fox the");
/// ```
pub fn norms_key<I, S>(tokens: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut tokens: Vec<S> = tokens.into_iter().collect();
    tokens.sort_by(|a, b| a.as_ref().cmp(b.as_ref()));
    let mut key = String::new();
    for (idx, token) in tokens.iter().enumerate() {
        if idx > 0 {
            key.push(' ');
        }
        key.push_str(token.as_ref());
    }
    key
}
