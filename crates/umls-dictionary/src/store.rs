//! Read-only dictionary store.
//!
//! [`ConceptDictionary`] opens a directory written by the builder and serves
//! the three phrase indices plus the source table. The backend is chosen once
//! at open time:
//!
//! - **Disk**: table files stay on disk (memory-mapped or read into owned
//!   buffers) and every lookup binary-searches them, optionally through an
//!   LRU cache.
//! - **Memory**: all tables are drained into hash maps at open time and the
//!   files are released; lookups are plain map reads.
//!
//! Both backends are safe for any number of concurrent readers.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use lru::LruCache;
use parking_lot::{Mutex, RwLock};
use umls_concepts::{decode_rows, ConceptRow, Cui};

use crate::error::{DictionaryError, DictionaryResult};
use crate::manifest::{DictionaryManifest, FORMAT_VERSION};
use crate::sources::SourceTable;
use crate::table::{LoadMode, SortedTable};
use crate::{LOWERCASE_FILE, NORMS_FILE, PHRASES_FILE, SOURCES_FILE};

/// Configuration for opening a [`ConceptDictionary`].
///
/// # Example
///
/// ```rust
/// use umls_dictionary::{DictionaryConfig, LoadMode};
///
/// let config = DictionaryConfig::builder()
///     .with_in_memory(false)
///     .with_load_mode(LoadMode::Owned)
///     .with_cache_size(50_000)
///     .build();
///
/// assert_eq!(config.cache_size, 50_000);
/// ```
#[derive(Debug, Clone, Default)]
pub struct DictionaryConfig {
    /// Drain every index into memory at open time.
    pub in_memory: bool,
    /// How table files are loaded.
    pub load_mode: LoadMode,
    /// LRU lookup cache entries for the disk backend (0 = no cache).
    pub cache_size: usize,
    /// Recompute and compare index digests at open time.
    pub verify_checksums: bool,
}

impl DictionaryConfig {
    /// Creates a new builder for DictionaryConfig.
    pub fn builder() -> DictionaryConfigBuilder {
        DictionaryConfigBuilder::default()
    }

    /// Config for the fully materialized backend.
    pub fn in_memory() -> Self {
        Self {
            in_memory: true,
            ..Self::default()
        }
    }
}

/// Builder for DictionaryConfig.
#[derive(Debug, Clone, Default)]
pub struct DictionaryConfigBuilder {
    config: DictionaryConfig,
}

impl DictionaryConfigBuilder {
    /// Selects the in-memory backend.
    pub fn with_in_memory(mut self, in_memory: bool) -> Self {
        self.config.in_memory = in_memory;
        self
    }

    /// Sets how table files are loaded.
    pub fn with_load_mode(mut self, mode: LoadMode) -> Self {
        self.config.load_mode = mode;
        self
    }

    /// Sets the lookup cache size.
    pub fn with_cache_size(mut self, size: usize) -> Self {
        self.config.cache_size = size;
        self
    }

    /// Enables checksum verification at open.
    pub fn with_verify_checksums(mut self, verify: bool) -> Self {
        self.config.verify_checksums = verify;
        self
    }

    /// Builds the DictionaryConfig.
    pub fn build(self) -> DictionaryConfig {
        self.config
    }
}

/// The three phrase indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexKind {
    /// Exact surface form.
    Phrases,
    /// Case-folded surface form.
    Lowercase,
    /// Sorted bag of normalized tokens.
    Norms,
}

/// Which backend a dictionary was opened with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Table files queried per call.
    Disk,
    /// Fully materialized hash maps.
    Memory,
}

/// Size summary of an open dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DictionaryStats {
    /// Backend in use.
    pub backend: BackendKind,
    /// Keys in the phrase index.
    pub phrase_keys: usize,
    /// Keys in the lowercase index.
    pub lowercase_keys: usize,
    /// Keys in the norms index.
    pub norm_keys: usize,
    /// Entries in the source table.
    pub sources: usize,
}

type LookupCache = Mutex<LruCache<(IndexKind, String), Option<Vec<ConceptRow>>>>;

struct DiskIndices {
    phrases: SortedTable,
    lowercase: SortedTable,
    norms: SortedTable,
    cache: Option<LookupCache>,
}

impl DiskIndices {
    fn table(&self, kind: IndexKind) -> &SortedTable {
        match kind {
            IndexKind::Phrases => &self.phrases,
            IndexKind::Lowercase => &self.lowercase,
            IndexKind::Norms => &self.norms,
        }
    }

    fn lookup(&self, kind: IndexKind, key: &str) -> DictionaryResult<Option<Vec<ConceptRow>>> {
        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.lock().get(&(kind, key.to_string())) {
                return Ok(hit.clone());
            }
        }
        let rows = match self.table(kind).get(key)? {
            Some(bytes) => Some(decode_rows(bytes)?),
            None => None,
        };
        if let Some(cache) = &self.cache {
            cache.lock().put((kind, key.to_string()), rows.clone());
        }
        Ok(rows)
    }

    fn scan(
        &self,
        kind: IndexKind,
        mut keep: impl FnMut(&str, &ConceptRow) -> bool,
    ) -> DictionaryResult<Vec<(String, ConceptRow)>> {
        let mut out = Vec::new();
        for entry in self.table(kind).iter() {
            let (key, bytes) = entry?;
            for row in decode_rows(bytes)? {
                if keep(key, &row) {
                    out.push((key.to_string(), row));
                }
            }
        }
        Ok(out)
    }
}

struct MemoryIndices {
    phrases: HashMap<String, Vec<ConceptRow>>,
    lowercase: HashMap<String, Vec<ConceptRow>>,
    norms: HashMap<String, Vec<ConceptRow>>,
}

impl MemoryIndices {
    fn drain(disk: DiskIndices) -> DictionaryResult<Self> {
        Ok(Self {
            phrases: materialize(&disk.phrases)?,
            lowercase: materialize(&disk.lowercase)?,
            norms: materialize(&disk.norms)?,
        })
    }

    fn map(&self, kind: IndexKind) -> &HashMap<String, Vec<ConceptRow>> {
        match kind {
            IndexKind::Phrases => &self.phrases,
            IndexKind::Lowercase => &self.lowercase,
            IndexKind::Norms => &self.norms,
        }
    }

    fn scan(
        &self,
        kind: IndexKind,
        mut keep: impl FnMut(&str, &ConceptRow) -> bool,
    ) -> Vec<(String, ConceptRow)> {
        let mut out: Vec<(String, ConceptRow)> = self
            .map(kind)
            .iter()
            .flat_map(|(key, rows)| rows.iter().map(move |row| (key, row)))
            .filter(|(key, row)| keep(key, row))
            .map(|(key, row)| (key.clone(), row.clone()))
            .collect();
        // match the disk backend's key order; stable sort keeps row order
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }
}

fn materialize(table: &SortedTable) -> DictionaryResult<HashMap<String, Vec<ConceptRow>>> {
    let mut map = HashMap::with_capacity(table.len());
    for entry in table.iter() {
        let (key, bytes) = entry?;
        map.insert(key.to_string(), decode_rows(bytes)?);
    }
    Ok(map)
}

enum Backend {
    Disk(DiskIndices),
    Memory(MemoryIndices),
}

impl Backend {
    fn kind(&self) -> BackendKind {
        match self {
            Backend::Disk(_) => BackendKind::Disk,
            Backend::Memory(_) => BackendKind::Memory,
        }
    }

    fn lookup(&self, kind: IndexKind, key: &str) -> DictionaryResult<Option<Vec<ConceptRow>>> {
        match self {
            Backend::Disk(disk) => disk.lookup(kind, key),
            Backend::Memory(memory) => Ok(memory.map(kind).get(key).cloned()),
        }
    }

    fn scan(
        &self,
        kind: IndexKind,
        keep: impl FnMut(&str, &ConceptRow) -> bool,
    ) -> DictionaryResult<Vec<(String, ConceptRow)>> {
        match self {
            Backend::Disk(disk) => disk.scan(kind, keep),
            Backend::Memory(memory) => Ok(memory.scan(kind, keep)),
        }
    }

    fn key_count(&self, kind: IndexKind) -> usize {
        match self {
            Backend::Disk(disk) => disk.table(kind).len(),
            Backend::Memory(memory) => memory.map(kind).len(),
        }
    }
}

struct OpenState {
    backend: Backend,
    sources: SourceTable,
}

/// Read-only phrase-to-concept dictionary.
///
/// # Example
///
/// ```ignore
/// use umls_dictionary::{ConceptDictionary, DictionaryConfig};
///
/// let dictionary = ConceptDictionary::open("/data/dictionary", DictionaryConfig::default())?;
/// if let Some(rows) = dictionary.for_phrase("Fever")? {
///     for row in rows {
///         println!("{} {}", row.cui(), dictionary.source(row.source())?.unwrap_or_default());
///     }
/// }
/// dictionary.close()?;
/// ```
pub struct ConceptDictionary {
    path: PathBuf,
    manifest: DictionaryManifest,
    state: RwLock<Option<OpenState>>,
}

impl ConceptDictionary {
    /// Opens the dictionary directory at `path`.
    ///
    /// Any failure here is a [`DictionaryError::StorageOpen`].
    pub fn open<P: AsRef<Path>>(path: P, config: DictionaryConfig) -> DictionaryResult<Self> {
        let path = path.as_ref();
        if !path.is_dir() {
            return Err(DictionaryError::storage_open(path, "not a directory"));
        }
        Self::open_dir(path, &config)
            .map_err(|err| match err {
                e @ DictionaryError::StorageOpen { .. } => e,
                other => DictionaryError::storage_open(path, other.to_string()),
            })
    }

    fn open_dir(path: &Path, config: &DictionaryConfig) -> DictionaryResult<Self> {
        let manifest = DictionaryManifest::load(path)?;
        if manifest.format_version != FORMAT_VERSION {
            return Err(DictionaryError::storage_open(
                path,
                format!(
                    "unsupported format version {} (expected {})",
                    manifest.format_version, FORMAT_VERSION
                ),
            ));
        }
        if config.verify_checksums {
            manifest.verify(path)?;
        }

        let disk = DiskIndices {
            phrases: SortedTable::open(path.join(PHRASES_FILE), config.load_mode)?,
            lowercase: SortedTable::open(path.join(LOWERCASE_FILE), config.load_mode)?,
            norms: SortedTable::open(path.join(NORMS_FILE), config.load_mode)?,
            cache: NonZeroUsize::new(config.cache_size).map(|n| Mutex::new(LruCache::new(n))),
        };
        let sources = SourceTable::load(path.join(SOURCES_FILE))?;
        let backend = if config.in_memory {
            Backend::Memory(MemoryIndices::drain(disk)?)
        } else {
            Backend::Disk(disk)
        };

        tracing::info!(
            path = %path.display(),
            backend = ?backend.kind(),
            phrases = backend.key_count(IndexKind::Phrases),
            lowercase = backend.key_count(IndexKind::Lowercase),
            norms = backend.key_count(IndexKind::Norms),
            sources = sources.len(),
            "opened concept dictionary"
        );

        Ok(Self {
            path: path.to_path_buf(),
            manifest,
            state: RwLock::new(Some(OpenState { backend, sources })),
        })
    }

    fn with_state<T>(&self, f: impl FnOnce(&OpenState) -> DictionaryResult<T>) -> DictionaryResult<T> {
        let guard = self.state.read();
        match guard.as_ref() {
            Some(state) => f(state),
            None => Err(DictionaryError::Closed),
        }
    }

    /// Looks up a generic index.
    pub fn lookup(&self, kind: IndexKind, key: &str) -> DictionaryResult<Option<Vec<ConceptRow>>> {
        self.with_state(|state| state.backend.lookup(kind, key))
    }

    /// Rows for an exact surface phrase.
    pub fn for_phrase(&self, phrase: &str) -> DictionaryResult<Option<Vec<ConceptRow>>> {
        self.lookup(IndexKind::Phrases, phrase)
    }

    /// Rows for a case-folded phrase.
    pub fn for_lowercase_phrase(&self, phrase: &str) -> DictionaryResult<Option<Vec<ConceptRow>>> {
        self.lookup(IndexKind::Lowercase, phrase)
    }

    /// Rows for a canonical normalized bag (see [`norms_key`](crate::norms_key)).
    pub fn for_norms(&self, norms: &str) -> DictionaryResult<Option<Vec<ConceptRow>>> {
        self.lookup(IndexKind::Norms, norms)
    }

    /// Name of a source id.
    pub fn source(&self, id: i32) -> DictionaryResult<Option<String>> {
        self.with_state(|state| Ok(state.sources.name(id).map(str::to_string)))
    }

    /// Every `(phrase, row)` whose row carries `cui`. Scans the whole phrase index.
    pub fn with_cui(&self, cui: Cui) -> DictionaryResult<Vec<(String, ConceptRow)>> {
        self.with_state(|state| state.backend.scan(IndexKind::Phrases, |_, row| row.cui() == cui))
    }

    /// Every `(phrase, row)` whose lowercase phrase contains `word`.
    /// Scans the whole lowercase index.
    pub fn with_word(&self, word: &str) -> DictionaryResult<Vec<(String, ConceptRow)>> {
        self.with_state(|state| {
            state
                .backend
                .scan(IndexKind::Lowercase, |phrase, _| phrase.contains(word))
        })
    }

    /// Key and source counts.
    pub fn stats(&self) -> DictionaryResult<DictionaryStats> {
        self.with_state(|state| {
            Ok(DictionaryStats {
                backend: state.backend.kind(),
                phrase_keys: state.backend.key_count(IndexKind::Phrases),
                lowercase_keys: state.backend.key_count(IndexKind::Lowercase),
                norm_keys: state.backend.key_count(IndexKind::Norms),
                sources: state.sources.len(),
            })
        })
    }

    /// Manifest the dictionary was opened with.
    pub fn manifest(&self) -> &DictionaryManifest {
        &self.manifest
    }

    /// Directory the dictionary was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True once [`close`](Self::close) has run.
    pub fn is_closed(&self) -> bool {
        self.state.read().is_none()
    }

    /// Releases the indices. Every later call fails with
    /// [`DictionaryError::Closed`], including a second `close`.
    pub fn close(&self) -> DictionaryResult<()> {
        match self.state.write().take() {
            Some(_) => {
                tracing::debug!(path = %self.path.display(), "closed concept dictionary");
                Ok(())
            }
            None => Err(DictionaryError::Closed),
        }
    }
}

impl std::fmt::Debug for ConceptDictionary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConceptDictionary")
            .field("path", &self.path)
            .field("closed", &self.is_closed())
            .finish()
    }
}
