//! Compact UMLS identifiers.
//!
//! UMLS identifiers are a single prefix letter followed by a zero-padded
//! decimal number (`C0018681`, `S0046854`, `T047`). They are stored as the
//! bare `u32` and rendered back to the canonical string on demand.

use std::fmt;
use std::str::FromStr;

use nom::{
    character::complete::{char, digit1},
    combinator::{all_consuming, map_res},
    sequence::preceded,
    IResult,
};

use crate::error::{ConceptError, ConceptResult};

/// Parses `<prefix><digits>` into the numeric part.
fn prefixed_number(prefix: char, input: &str) -> IResult<&str, u32> {
    all_consuming(preceded(char(prefix), map_res(digit1, str::parse::<u32>)))(input)
}

macro_rules! umls_identifier {
    ($(#[$meta:meta])* $name:ident, $prefix:literal, $width:literal, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(u32);

        impl $name {
            /// Canonical prefix letter.
            pub const PREFIX: char = $prefix;

            /// Minimum number of digits in the canonical form.
            pub const WIDTH: usize = $width;

            /// Creates an identifier from its numeric value.
            #[inline]
            pub const fn new(value: u32) -> Self {
                Self(value)
            }

            /// Returns the numeric value.
            #[inline]
            pub const fn value(self) -> u32 {
                self.0
            }

            /// Parses the canonical string form.
            pub fn parse(input: &str) -> ConceptResult<Self> {
                prefixed_number($prefix, input)
                    .map(|(_, value)| Self(value))
                    .map_err(|_| ConceptError::InvalidIdentifier {
                        kind: $kind,
                        input: input.to_string(),
                    })
            }
        }

        impl From<u32> for $name {
            fn from(value: u32) -> Self {
                Self(value)
            }
        }

        impl From<$name> for u32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl FromStr for $name {
            type Err = ConceptError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{:0width$}", $prefix, self.0, width = $width)
            }
        }

        #[cfg(feature = "serde")]
        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        #[cfg(feature = "serde")]
        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = <std::borrow::Cow<'de, str>>::deserialize(deserializer)?;
                Self::parse(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

umls_identifier!(
    /// Concept Unique Identifier, e.g. `C0018681`.
    Cui, 'C', 7, "CUI"
);

umls_identifier!(
    /// String Unique Identifier, e.g. `S0046854`.
    Sui, 'S', 7, "SUI"
);

umls_identifier!(
    /// Semantic Type Unique Identifier, e.g. `T047`.
    Tui, 'T', 3, "TUI"
);
