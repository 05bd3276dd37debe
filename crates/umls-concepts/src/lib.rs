//! # umls-concepts
//!
//! Core value types for UMLS concept recognition.
//!
//! This crate provides:
//! - **Identifiers**: [`Cui`], [`Sui`] and [`Tui`], compact `u32` newtypes with
//!   their canonical string forms (`C0018681`, `S0046854`, `T047`)
//! - **Concept rows**: [`ConceptRow`], the record stored in every dictionary
//!   index, with its fixed 28-byte binary codec
//!
//! ## Usage
//!
//! ```rust
//! use umls_concepts::{decode_rows, encode_rows, ConceptRow, Cui, Sui, Tui};
//!
//! let cui: Cui = "C0018681".parse().unwrap();
//! let row = ConceptRow::new(Sui::new(46854), cui, Tui::new(184), 0, "R51");
//!
//! let bytes = encode_rows(&[row.clone()]);
//! assert_eq!(bytes.len(), 28);
//! assert_eq!(decode_rows(&bytes).unwrap(), vec![row]);
//! ```
//!
//! ## Feature Flags
//!
//! - `serde` - Serialize identifiers as their canonical strings and rows as structs

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
mod id;
mod row;

pub use error::{ConceptError, ConceptResult};
pub use id::{Cui, Sui, Tui};
pub use row::{decode_rows, encode_rows, ConceptRow, RowIter, MAX_CODE_LEN, ROW_SIZE};
