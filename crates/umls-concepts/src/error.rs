//! Error types for identifier parsing and row decoding.

use thiserror::Error;

/// Errors that can occur while parsing identifiers or decoding rows.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConceptError {
    /// The string is not a canonical identifier of the expected kind.
    #[error("invalid {kind} identifier: '{input}'")]
    InvalidIdentifier {
        /// Identifier kind that was expected (`CUI`, `SUI` or `TUI`).
        kind: &'static str,
        /// The rejected input.
        input: String,
    },

    /// A row buffer ended before a complete record could be read.
    #[error("truncated concept record: {available} bytes available, {required} required")]
    TruncatedRecord {
        /// Bytes left in the buffer.
        available: usize,
        /// Bytes needed for one record.
        required: usize,
    },
}

/// Result type for identifier and row codec operations.
pub type ConceptResult<T> = std::result::Result<T, ConceptError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_invalid_identifier() {
        let err = ConceptError::InvalidIdentifier {
            kind: "CUI",
            input: "X123".to_string(),
        };
        assert_eq!(err.to_string(), "invalid CUI identifier: 'X123'");
    }

    #[test]
    fn test_error_display_truncated_record() {
        let err = ConceptError::TruncatedRecord {
            available: 10,
            required: 28,
        };
        assert_eq!(
            err.to_string(),
            "truncated concept record: 10 bytes available, 28 required"
        );
    }
}
