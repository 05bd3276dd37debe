//! Source vocabulary name table.
//!
//! Source abbreviations (`SNOMEDCT_US`, `MSH`, `ICD10CM`, ...) are stored in
//! every row as a small dense `i32`. This table maps between the two.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::{DictionaryError, DictionaryResult};

/// Bidirectional mapping between source names and dense ids.
///
/// Ids are assigned in first-seen order starting at 0. On disk the table is
/// a newline-delimited list of names where a name's id is its line number.
#[derive(Debug, Clone, Default)]
pub struct SourceTable {
    name_to_id: HashMap<String, i32>,
    id_to_name: Vec<String>,
}

impl SourceTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id for `name`, assigning the next id on first sight.
    pub fn register(&mut self, name: &str) -> i32 {
        if let Some(&id) = self.name_to_id.get(name) {
            return id;
        }
        let id = self.id_to_name.len() as i32;
        self.name_to_id.insert(name.to_string(), id);
        self.id_to_name.push(name.to_string());
        id
    }

    /// Gets the id of a registered source.
    #[inline]
    pub fn id(&self, name: &str) -> Option<i32> {
        self.name_to_id.get(name).copied()
    }

    /// Gets the name for a source id.
    #[inline]
    pub fn name(&self, id: i32) -> Option<&str> {
        usize::try_from(id)
            .ok()
            .and_then(|idx| self.id_to_name.get(idx))
            .map(String::as_str)
    }

    /// Number of registered sources.
    #[inline]
    pub fn len(&self) -> usize {
        self.id_to_name.len()
    }

    /// True if no source is registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.id_to_name.is_empty()
    }

    /// Iterates `(id, name)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (i32, &str)> + '_ {
        self.id_to_name
            .iter()
            .enumerate()
            .map(|(idx, name)| (idx as i32, name.as_str()))
    }

    /// Writes the table, one name per line in id order.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> DictionaryResult<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| DictionaryError::io_error(path, e))?;
        let mut writer = BufWriter::new(file);
        for name in &self.id_to_name {
            writeln!(writer, "{}", name).map_err(|e| DictionaryError::io_error(path, e))?;
        }
        writer
            .flush()
            .map_err(|e| DictionaryError::io_error(path, e))
    }

    /// Reads a table written by [`save`](Self::save).
    pub fn load<P: AsRef<Path>>(path: P) -> DictionaryResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| DictionaryError::io_error(path, e))?;
        let mut table = Self::new();
        for line in BufReader::new(file).lines() {
            let line = line.map_err(|e| DictionaryError::io_error(path, e))?;
            // keep duplicate or empty lines so ids stay positional
            let id = table.id_to_name.len() as i32;
            table.name_to_id.entry(line.clone()).or_insert(id);
            table.id_to_name.push(line);
        }
        Ok(table)
    }
}
