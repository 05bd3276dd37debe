//! Configuration for the dictionary builder.

use std::path::{Path, PathBuf};

/// Default minimum phrase length in characters.
pub const DEFAULT_MIN_PHRASE_LENGTH: usize = 3;

/// Default language code for `MRCONSO.RRF` and `MRXNS_ENG.RRF` rows.
pub const DEFAULT_LANGUAGE: &str = "ENG";

/// Configuration for [`DictionaryBuilder`](super::DictionaryBuilder).
///
/// # Example
///
/// ```rust
/// use umls_dictionary::BuilderConfig;
///
/// let config = BuilderConfig::builder("/data/umls/2024AA", "tuis.txt", "banned-ttys.txt")
///     .with_banned_cuis("banned-cuis.txt")
///     .with_min_phrase_length(4)
///     .build();
///
/// assert_eq!(config.min_phrase_length, 4);
/// assert!(config.banned_suis.is_none());
/// ```
#[derive(Debug, Clone)]
pub struct BuilderConfig {
    /// Root of the UMLS distribution (the directory holding `META/`, or `META/` itself).
    pub rrf_dir: PathBuf,
    /// Semantic types to keep, one TUI per line.
    pub types_of_interest: PathBuf,
    /// Term types to drop, one TTY per line.
    pub banned_term_types: PathBuf,
    /// Banned SUIs, one per line.
    pub banned_suis: Option<PathBuf>,
    /// Banned CUIs, one per line.
    pub banned_cuis: Option<PathBuf>,
    /// Banned TUIs, one per line.
    pub banned_tuis: Option<PathBuf>,
    /// Banned SUI-CUI pairs, one pair per line.
    pub banned_sui_cuis: Option<PathBuf>,
    /// Phrases shorter than this many characters are skipped.
    pub min_phrase_length: usize,
    /// Only rows with this `LAT` value are read.
    pub language: String,
}

impl BuilderConfig {
    /// Creates a new builder for BuilderConfig with the required inputs.
    pub fn builder(
        rrf_dir: impl AsRef<Path>,
        types_of_interest: impl AsRef<Path>,
        banned_term_types: impl AsRef<Path>,
    ) -> BuilderConfigBuilder {
        BuilderConfigBuilder {
            config: BuilderConfig {
                rrf_dir: rrf_dir.as_ref().to_path_buf(),
                types_of_interest: types_of_interest.as_ref().to_path_buf(),
                banned_term_types: banned_term_types.as_ref().to_path_buf(),
                banned_suis: None,
                banned_cuis: None,
                banned_tuis: None,
                banned_sui_cuis: None,
                min_phrase_length: DEFAULT_MIN_PHRASE_LENGTH,
                language: DEFAULT_LANGUAGE.to_string(),
            },
        }
    }
}

/// Builder for BuilderConfig.
#[derive(Debug, Clone)]
pub struct BuilderConfigBuilder {
    config: BuilderConfig,
}

impl BuilderConfigBuilder {
    /// Sets the banned SUI file.
    pub fn with_banned_suis(mut self, path: impl AsRef<Path>) -> Self {
        self.config.banned_suis = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the banned CUI file.
    pub fn with_banned_cuis(mut self, path: impl AsRef<Path>) -> Self {
        self.config.banned_cuis = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the banned TUI file.
    pub fn with_banned_tuis(mut self, path: impl AsRef<Path>) -> Self {
        self.config.banned_tuis = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the banned SUI-CUI pair file.
    pub fn with_banned_sui_cuis(mut self, path: impl AsRef<Path>) -> Self {
        self.config.banned_sui_cuis = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the minimum phrase length.
    pub fn with_min_phrase_length(mut self, length: usize) -> Self {
        self.config.min_phrase_length = length;
        self
    }

    /// Sets the language code.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.config.language = language.into();
        self
    }

    /// Builds the BuilderConfig.
    pub fn build(self) -> BuilderConfig {
        self.config
    }
}
