//! In-memory lookup for unit tests.

use std::collections::HashMap;

use umls_concepts::ConceptRow;
use umls_dictionary::DictionaryResult;

use crate::traits::ConceptLookup;

#[derive(Debug, Default)]
pub(crate) struct MapLookup {
    phrases: HashMap<String, Vec<ConceptRow>>,
    lowercase: HashMap<String, Vec<ConceptRow>>,
    norms: HashMap<String, Vec<ConceptRow>>,
    sources: Vec<String>,
}

impl MapLookup {
    pub(crate) fn phrase(&mut self, key: &str, rows: Vec<ConceptRow>) {
        self.phrases.insert(key.to_string(), rows);
    }

    pub(crate) fn lowercase(&mut self, key: &str, rows: Vec<ConceptRow>) {
        self.lowercase.insert(key.to_string(), rows);
    }

    pub(crate) fn norm(&mut self, key: &str, rows: Vec<ConceptRow>) {
        self.norms.insert(key.to_string(), rows);
    }

    pub(crate) fn add_source(&mut self, name: &str) -> i32 {
        self.sources.push(name.to_string());
        self.sources.len() as i32 - 1
    }
}

impl ConceptLookup for MapLookup {
    fn for_phrase(&self, phrase: &str) -> DictionaryResult<Option<Vec<ConceptRow>>> {
        Ok(self.phrases.get(phrase).cloned())
    }

    fn for_lowercase_phrase(&self, phrase: &str) -> DictionaryResult<Option<Vec<ConceptRow>>> {
        Ok(self.lowercase.get(phrase).cloned())
    }

    fn for_norms(&self, norms: &str) -> DictionaryResult<Option<Vec<ConceptRow>>> {
        Ok(self.norms.get(norms).cloned())
    }

    fn source(&self, id: i32) -> DictionaryResult<Option<String>> {
        Ok(usize::try_from(id).ok().and_then(|i| self.sources.get(i)).cloned())
    }
}
