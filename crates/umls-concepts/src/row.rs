//! Fixed-width binary concept rows.
//!
//! # Record Format
//!
//! Every row is exactly [`ROW_SIZE`] bytes, all integers big-endian:
//!
//! ```text
//! [4 bytes]  SUI value (u32 BE)
//! [4 bytes]  CUI value (u32 BE)
//! [4 bytes]  TUI value (u32 BE)
//! [4 bytes]  Source id (i32 BE)
//! [12 bytes] Source code (ASCII, NUL padded)
//! ```
//!
//! A stored row list is the flat concatenation of its records.

use crate::error::{ConceptError, ConceptResult};
use crate::id::{Cui, Sui, Tui};

/// Maximum number of bytes kept from a source code.
pub const MAX_CODE_LEN: usize = 12;

/// Size of one encoded row.
pub const ROW_SIZE: usize = 16 + MAX_CODE_LEN;

/// One phrase-to-concept association: the term, its concept and semantic type,
/// the contributing source, and the source-local code.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConceptRow {
    sui: Sui,
    cui: Cui,
    tui: Tui,
    source: i32,
    code: String,
}

impl ConceptRow {
    /// Creates a row, truncating `code` to [`MAX_CODE_LEN`] and dropping
    /// trailing NUL and space, which the encoded field cannot keep.
    pub fn new(sui: Sui, cui: Cui, tui: Tui, source: i32, code: impl Into<String>) -> Self {
        let mut code = code.into();
        truncate_code(&mut code);
        let kept = code.trim_end_matches(['\0', ' ']).len();
        code.truncate(kept);
        Self {
            sui,
            cui,
            tui,
            source,
            code,
        }
    }

    /// String identifier of the matched term.
    #[inline]
    pub fn sui(&self) -> Sui {
        self.sui
    }

    /// Concept identifier.
    #[inline]
    pub fn cui(&self) -> Cui {
        self.cui
    }

    /// Semantic type identifier.
    #[inline]
    pub fn tui(&self) -> Tui {
        self.tui
    }

    /// Dense id of the contributing source vocabulary.
    #[inline]
    pub fn source(&self) -> i32 {
        self.source
    }

    /// Source-local code, possibly empty.
    #[inline]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Appends the encoded row to `out`.
    pub fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_bytes());
    }

    /// Encodes the row into a fixed-size buffer.
    pub fn to_bytes(&self) -> [u8; ROW_SIZE] {
        let mut buf = [0u8; ROW_SIZE];
        buf[0..4].copy_from_slice(&self.sui.value().to_be_bytes());
        buf[4..8].copy_from_slice(&self.cui.value().to_be_bytes());
        buf[8..12].copy_from_slice(&self.tui.value().to_be_bytes());
        buf[12..16].copy_from_slice(&self.source.to_be_bytes());
        let code = self.code.as_bytes();
        buf[16..16 + code.len()].copy_from_slice(code);
        buf
    }

    /// Decodes one row from the front of `buf`.
    ///
    /// Returns the row and the number of bytes consumed.
    pub fn decode(buf: &[u8]) -> ConceptResult<(Self, usize)> {
        if buf.len() < ROW_SIZE {
            return Err(ConceptError::TruncatedRecord {
                available: buf.len(),
                required: ROW_SIZE,
            });
        }
        let code = String::from_utf8_lossy(&buf[16..ROW_SIZE])
            .trim_end_matches(['\0', ' '])
            .to_string();
        let row = Self {
            sui: Sui::new(read_u32(&buf[0..4])),
            cui: Cui::new(read_u32(&buf[4..8])),
            tui: Tui::new(read_u32(&buf[8..12])),
            source: read_u32(&buf[12..16]) as i32,
            code,
        };
        Ok((row, ROW_SIZE))
    }
}

fn read_u32(bytes: &[u8]) -> u32 {
    u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// Cuts the code to at most [`MAX_CODE_LEN`] characters without splitting one.
fn truncate_code(code: &mut String) {
    if code.len() <= MAX_CODE_LEN {
        return;
    }
    let mut end = code
        .char_indices()
        .nth(MAX_CODE_LEN)
        .map_or(code.len(), |(idx, _)| idx);
    // the field is byte sized; multi-byte chars shrink it further
    while end > MAX_CODE_LEN || !code.is_char_boundary(end) {
        end -= 1;
    }
    code.truncate(end);
}

/// Encodes a row list as consecutive fixed-size records.
pub fn encode_rows(rows: &[ConceptRow]) -> Vec<u8> {
    let mut out = Vec::with_capacity(rows.len() * ROW_SIZE);
    for row in rows {
        row.encode(&mut out);
    }
    out
}

/// Decodes a buffer of consecutive records.
pub fn decode_rows(buf: &[u8]) -> ConceptResult<Vec<ConceptRow>> {
    RowIter::new(buf).collect()
}

/// Iterator decoding rows from a borrowed buffer in [`ROW_SIZE`] strides.
#[derive(Debug, Clone)]
pub struct RowIter<'a> {
    remaining: &'a [u8],
}

impl<'a> RowIter<'a> {
    /// Creates an iterator over `buf`.
    pub fn new(buf: &'a [u8]) -> Self {
        Self { remaining: buf }
    }
}

impl Iterator for RowIter<'_> {
    type Item = ConceptResult<ConceptRow>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining.is_empty() {
            return None;
        }
        match ConceptRow::decode(self.remaining) {
            Ok((row, used)) => {
                self.remaining = &self.remaining[used..];
                Some(Ok(row))
            }
            Err(e) => {
                self.remaining = &[];
                Some(Err(e))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining.len().div_ceil(ROW_SIZE);
        (n, Some(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(code: &str) -> ConceptRow {
        ConceptRow::new(Sui::new(46854), Cui::new(18681), Tui::new(184), 3, code)
    }

    #[test]
    fn test_round_trip() {
        let original = row("R51");
        let (decoded, used) = ConceptRow::decode(&original.to_bytes()).unwrap();
        assert_eq!(used, ROW_SIZE);
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_round_trip_empty_and_full_code() {
        for code in ["", "123456789012", "A1 ", "B2\0", " C3  "] {
            let original = row(code);
            let (decoded, _) = ConceptRow::decode(&original.to_bytes()).unwrap();
            assert_eq!(decoded, original);
        }
    }

    #[test]
    fn test_trailing_padding_dropped_at_construction() {
        assert_eq!(row("A1 ").code(), "A1");
        assert_eq!(row(" C3  ").code(), " C3");
        assert_eq!(row("ABCDEFGHIJK  XYZ").code(), "ABCDEFGHIJK");
    }

    #[test]
    fn test_long_code_truncated_at_construction() {
        let r = row("ABCDEFGHIJKLMNO");
        assert_eq!(r.code(), "ABCDEFGHIJKL");
    }

    #[test]
    fn test_multibyte_code_never_exceeds_field() {
        let r = row("ééééééééé");
        assert!(r.code().len() <= MAX_CODE_LEN);
        assert_eq!(r.code(), "éééééé");
    }

    #[test]
    fn test_layout_is_big_endian() {
        let bytes = ConceptRow::new(Sui::new(1), Cui::new(2), Tui::new(3), -1, "AB").to_bytes();
        assert_eq!(&bytes[0..4], &[0, 0, 0, 1]);
        assert_eq!(&bytes[4..8], &[0, 0, 0, 2]);
        assert_eq!(&bytes[8..12], &[0, 0, 0, 3]);
        assert_eq!(&bytes[12..16], &[0xff, 0xff, 0xff, 0xff]);
        assert_eq!(&bytes[16..18], b"AB");
        assert!(bytes[18..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_space_padded_code_is_trimmed() {
        let mut bytes = row("").to_bytes();
        bytes[16..28].copy_from_slice(b"D0001       ");
        let (decoded, _) = ConceptRow::decode(&bytes).unwrap();
        assert_eq!(decoded.code(), "D0001");
    }

    #[test]
    fn test_list_preserves_order() {
        let rows = vec![row("A"), row("B"), row("A"), row("C")];
        let bytes = encode_rows(&rows);
        assert_eq!(bytes.len(), 4 * ROW_SIZE);
        assert_eq!(decode_rows(&bytes).unwrap(), rows);
    }

    #[test]
    fn test_empty_list() {
        assert!(decode_rows(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_trailing_partial_record_fails() {
        let mut bytes = encode_rows(&[row("A")]);
        bytes.extend_from_slice(&[0, 1, 2]);
        let err = decode_rows(&bytes).unwrap_err();
        assert_eq!(
            err,
            ConceptError::TruncatedRecord {
                available: 3,
                required: ROW_SIZE,
            }
        );
    }
}
