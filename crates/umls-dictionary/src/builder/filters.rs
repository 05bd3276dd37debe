//! Build-time exclusion sets.

use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;

use umls_concepts::{ConceptError, Cui, Sui, Tui};

use super::BuilderConfig;
use crate::error::{DictionaryError, DictionaryResult};
use crate::rrf;

/// Sets of term types and identifiers excluded from the dictionary.
#[derive(Debug, Clone, Default)]
pub struct FilterSets {
    banned_term_types: HashSet<String>,
    banned_suis: HashSet<Sui>,
    banned_cuis: HashSet<Cui>,
    banned_tuis: HashSet<Tui>,
    banned_sui_cuis: HashSet<(Sui, Cui)>,
}

impl FilterSets {
    /// Creates empty filter sets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads every filter file named in `config`.
    pub fn load(config: &BuilderConfig) -> DictionaryResult<Self> {
        let mut filters = Self::new();
        filters.banned_term_types = rrf::read_list(&config.banned_term_types)?
            .into_iter()
            .map(|(_, tty)| tty)
            .collect();
        if let Some(path) = &config.banned_suis {
            filters.banned_suis = read_ids(path)?;
        }
        if let Some(path) = &config.banned_cuis {
            filters.banned_cuis = read_ids(path)?;
        }
        if let Some(path) = &config.banned_tuis {
            filters.banned_tuis = read_ids(path)?;
        }
        if let Some(path) = &config.banned_sui_cuis {
            for (line, sui, cui) in rrf::read_pairs(path)? {
                let pair = Sui::parse(&sui)
                    .and_then(|sui| Cui::parse(&cui).map(|cui| (sui, cui)))
                    .map_err(|e| invalid_line(path, line, e))?;
                filters.banned_sui_cuis.insert(pair);
            }
        }
        tracing::info!(
            term_types = filters.banned_term_types.len(),
            suis = filters.banned_suis.len(),
            cuis = filters.banned_cuis.len(),
            tuis = filters.banned_tuis.len(),
            sui_cuis = filters.banned_sui_cuis.len(),
            "loaded filter sets"
        );
        Ok(filters)
    }

    /// Bans a term type.
    pub fn ban_term_type(&mut self, tty: impl Into<String>) {
        self.banned_term_types.insert(tty.into());
    }

    /// Bans a SUI.
    pub fn ban_sui(&mut self, sui: Sui) {
        self.banned_suis.insert(sui);
    }

    /// Bans a CUI.
    pub fn ban_cui(&mut self, cui: Cui) {
        self.banned_cuis.insert(cui);
    }

    /// Bans a TUI.
    pub fn ban_tui(&mut self, tui: Tui) {
        self.banned_tuis.insert(tui);
    }

    /// Bans one SUI-CUI pairing.
    pub fn ban_sui_cui(&mut self, sui: Sui, cui: Cui) {
        self.banned_sui_cuis.insert((sui, cui));
    }

    /// True if rows with this term type are dropped.
    pub fn is_banned_term_type(&self, tty: &str) -> bool {
        self.banned_term_types.contains(tty)
    }

    /// True if the `(sui, cui, tui)` combination survives every filter.
    pub fn allows(&self, sui: Sui, cui: Cui, tui: Tui) -> bool {
        !self.banned_suis.contains(&sui)
            && !self.banned_cuis.contains(&cui)
            && !self.banned_tuis.contains(&tui)
            && !self.banned_sui_cuis.contains(&(sui, cui))
    }
}

fn read_ids<T>(path: &Path) -> DictionaryResult<HashSet<T>>
where
    T: FromStr<Err = ConceptError> + Eq + std::hash::Hash,
{
    rrf::read_list(path)?
        .into_iter()
        .map(|(line, s)| s.parse::<T>().map_err(|e| invalid_line(path, line, e)))
        .collect()
}

fn invalid_line(path: &Path, line: usize, err: ConceptError) -> DictionaryError {
    DictionaryError::InvalidLine {
        path: path.to_path_buf(),
        line,
        message: err.to_string(),
    }
}
