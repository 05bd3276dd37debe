//! Error types for building and reading dictionaries.

use std::path::PathBuf;

use umls_concepts::ConceptError;

/// Result type for dictionary operations.
pub type DictionaryResult<T> = Result<T, DictionaryError>;

/// Errors that can occur while building or reading a dictionary.
#[derive(Debug, thiserror::Error)]
pub enum DictionaryError {
    /// I/O error with path context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A delimited input line has the wrong number of fields.
    #[error("{path}:{line}: expected {expected} fields, found {found}")]
    MalformedLine {
        path: PathBuf,
        line: usize,
        expected: usize,
        found: usize,
    },

    /// A delimited input line has a field that could not be interpreted.
    #[error("{path}:{line}: {message}")]
    InvalidLine {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// Identifier or row codec error.
    #[error(transparent)]
    Concept(#[from] ConceptError),

    /// The dictionary directory could not be opened.
    #[error("cannot open dictionary at {path}: {reason}")]
    StorageOpen { path: PathBuf, reason: String },

    /// A sorted table file is corrupt or of an unknown version.
    #[error("invalid table format: {message}")]
    InvalidFormat { message: String },

    /// Keys were handed to a table writer out of order.
    #[error("key '{key}' is not greater than the previous key '{previous}'")]
    UnsortedKey { previous: String, key: String },

    /// A table file does not match the digest recorded in the manifest.
    #[error("checksum mismatch for {file}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        file: String,
        expected: String,
        actual: String,
    },

    /// Manifest (de)serialization error.
    #[error("manifest serialization error: {0}")]
    Serialization(String),

    /// The dictionary has been closed.
    #[error("dictionary is closed")]
    Closed,
}

impl DictionaryError {
    /// Creates an I/O error with path context.
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid format error.
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            message: message.into(),
        }
    }

    /// Creates a storage open error.
    pub fn storage_open(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::StorageOpen {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
