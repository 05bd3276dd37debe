//! Offline dictionary builder.
//!
//! Compiles a UMLS distribution into the three phrase indices and the
//! source table read by [`ConceptDictionary`](crate::ConceptDictionary).
//!
//! # Pipeline
//!
//! ```text
//! types-of-interest ─┐
//! MRSTY.RRF ─────────┴─> CUI → [TUI]
//! MRCONSO.RRF ─────────> phrases, lowercase, (SUI, CUI) → [(source, code)]
//! MRXNS_ENG.RRF ───────> norms
//!                        └─> sorted tables + sources.txt + manifest.json
//! ```
//!
//! The build is single-threaded and holds all three indices in memory until
//! they are written. Output goes to a staging directory that replaces the
//! target only once every file is complete.
//!
//! # Example
//!
//! ```ignore
//! use umls_dictionary::{BuilderConfig, DictionaryBuilder};
//!
//! let config = BuilderConfig::builder("/data/umls/2024AA", "tuis.txt", "ttys.txt").build();
//! let stats = DictionaryBuilder::new(config).build("/data/dictionary")?;
//! println!("{stats}");
//! ```

mod config;
mod filters;
mod stats;

pub use config::{BuilderConfig, BuilderConfigBuilder, DEFAULT_LANGUAGE, DEFAULT_MIN_PHRASE_LENGTH};
pub use filters::FilterSets;
pub use stats::{BuildStats, SkipCounts};

use std::collections::{BTreeMap, HashMap, HashSet};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Instant;

use umls_concepts::{encode_rows, ConceptRow, Cui, Sui, Tui};

use crate::error::{DictionaryError, DictionaryResult};
use crate::manifest::{sha256_file, DictionaryManifest, IndexEntry};
use crate::rrf::{self, mrconso, mrsty, mrxns};
use crate::sources::SourceTable;
use crate::{norms_key, LOWERCASE_FILE, NORMS_FILE, PHRASES_FILE, SOURCES_FILE};

/// SUPPRESS value of rows that are not suppressible.
const NOT_SUPPRESSED: &str = "N";

type Index = BTreeMap<String, Vec<ConceptRow>>;

/// One-shot builder turning a UMLS distribution into a dictionary directory.
pub struct DictionaryBuilder {
    config: BuilderConfig,
}

/// Scan state threaded through the build passes.
#[derive(Default)]
struct BuildAccumulator {
    whitelist: HashSet<Tui>,
    types: HashMap<Cui, Vec<Tui>>,
    suppressed: HashSet<Sui>,
    term_sources: HashMap<(Sui, Cui), Vec<(i32, String)>>,
    sources: SourceTable,
    phrases: Index,
    lowercase: Index,
    norms: Index,
    stats: BuildStats,
}

impl DictionaryBuilder {
    /// Creates a builder.
    pub fn new(config: BuilderConfig) -> Self {
        Self { config }
    }

    /// Runs the build and writes the dictionary into `out_dir`.
    ///
    /// An existing dictionary at `out_dir` is replaced.
    pub fn build<P: AsRef<Path>>(&self, out_dir: P) -> DictionaryResult<BuildStats> {
        let start = Instant::now();
        let out_dir = out_dir.as_ref();
        let filters = FilterSets::load(&self.config)?;
        let mut acc = BuildAccumulator::default();

        self.load_whitelist(&mut acc)?;
        self.scan_types(&mut acc)?;
        self.scan_concepts(&mut acc, &filters)?;
        self.scan_norms(&mut acc, &filters)?;

        let staging = sibling_dir(out_dir, "partial")?;
        remove_if_present(&staging)?;
        std::fs::create_dir_all(&staging).map_err(|e| DictionaryError::io_error(&staging, e))?;
        acc.write(&staging)?;
        replace_dir(&staging, out_dir)?;

        acc.stats.elapsed = start.elapsed();
        tracing::info!(
            out = %out_dir.display(),
            phrases = acc.stats.phrase_keys,
            lowercase = acc.stats.lowercase_keys,
            norms = acc.stats.norm_keys,
            rows = acc.stats.rows_written,
            sources = acc.stats.sources,
            skipped = acc.stats.skipped.total(),
            elapsed_ms = acc.stats.elapsed.as_millis() as u64,
            "dictionary built"
        );
        Ok(acc.stats)
    }

    fn load_whitelist(&self, acc: &mut BuildAccumulator) -> DictionaryResult<()> {
        let path = &self.config.types_of_interest;
        for (line, tui) in rrf::read_list(path)? {
            let tui = parse_field(path, line, &tui, Tui::parse)?;
            acc.whitelist.insert(tui);
        }
        acc.stats.types_of_interest = acc.whitelist.len();
        tracing::info!(types = acc.whitelist.len(), "loaded types of interest");
        Ok(())
    }

    fn scan_types(&self, acc: &mut BuildAccumulator) -> DictionaryResult<()> {
        let path = rrf::locate(&self.config.rrf_dir, "MRSTY.RRF")?;
        let rows = rrf::for_each_row(&path, mrsty::COLUMNS, |line, fields| {
            let cui = parse_field(&path, line, fields[mrsty::CUI], Cui::parse)?;
            let tui = parse_field(&path, line, fields[mrsty::TUI], Tui::parse)?;
            acc.type_line(cui, tui);
            Ok(())
        })?;
        acc.stats.type_rows = rows;
        acc.stats.typed_concepts = acc.types.len();
        tracing::info!(concepts = acc.types.len(), "loaded semantic types");
        Ok(())
    }

    fn scan_concepts(&self, acc: &mut BuildAccumulator, filters: &FilterSets) -> DictionaryResult<()> {
        let path = rrf::locate(&self.config.rrf_dir, "MRCONSO.RRF")?;
        let rows = rrf::for_each_row(&path, mrconso::COLUMNS, |line, fields| {
            if fields[mrconso::LAT] != self.config.language {
                acc.stats.skipped.language += 1;
                return Ok(());
            }
            let term = ConceptLine {
                cui: parse_field(&path, line, fields[mrconso::CUI], Cui::parse)?,
                sui: parse_field(&path, line, fields[mrconso::SUI], Sui::parse)?,
                source: fields[mrconso::SAB],
                term_type: fields[mrconso::TTY],
                code: fields[mrconso::CODE],
                phrase: fields[mrconso::STR],
                suppress: fields[mrconso::SUPPRESS],
            };
            acc.concept_line(&term, &self.config, filters);
            Ok(())
        })?;
        acc.stats.concept_rows = rows;
        tracing::info!(
            phrases = acc.phrases.len(),
            lowercase = acc.lowercase.len(),
            sources = acc.sources.len(),
            "scanned concept names"
        );
        Ok(())
    }

    fn scan_norms(&self, acc: &mut BuildAccumulator, filters: &FilterSets) -> DictionaryResult<()> {
        let path = rrf::locate(&self.config.rrf_dir, "MRXNS_ENG.RRF")?;
        let rows = rrf::for_each_row(&path, mrxns::COLUMNS, |line, fields| {
            if fields[mrxns::LAT] != self.config.language {
                acc.stats.skipped.language += 1;
                return Ok(());
            }
            let cui = parse_field(&path, line, fields[mrxns::CUI], Cui::parse)?;
            let sui = parse_field(&path, line, fields[mrxns::SUI], Sui::parse)?;
            acc.norm_line(sui, cui, fields[mrxns::NSTR], filters);
            Ok(())
        })?;
        acc.stats.norm_rows = rows;
        tracing::info!(norms = acc.norms.len(), "scanned normalized strings");
        Ok(())
    }
}

/// The `MRCONSO.RRF` fields the builder reads.
struct ConceptLine<'a> {
    cui: Cui,
    sui: Sui,
    source: &'a str,
    term_type: &'a str,
    code: &'a str,
    phrase: &'a str,
    suppress: &'a str,
}

impl BuildAccumulator {
    fn type_line(&mut self, cui: Cui, tui: Tui) {
        if !self.whitelist.contains(&tui) {
            return;
        }
        let types = self.types.entry(cui).or_default();
        if !types.contains(&tui) {
            types.push(tui);
        }
    }

    /// Types of `cui` that survive the filters for this term.
    fn surviving_types(&self, sui: Sui, cui: Cui, filters: &FilterSets) -> Option<Vec<Tui>> {
        let types = self.types.get(&cui)?;
        Some(
            types
                .iter()
                .copied()
                .filter(|&tui| filters.allows(sui, cui, tui))
                .collect(),
        )
    }

    fn concept_line(&mut self, line: &ConceptLine<'_>, config: &BuilderConfig, filters: &FilterSets) {
        let skipped = &mut self.stats.skipped;
        if line.phrase.chars().count() < config.min_phrase_length {
            skipped.short_phrase += 1;
            return;
        }
        if line.suppress != NOT_SUPPRESSED {
            skipped.suppressed += 1;
            self.suppressed.insert(line.sui);
            return;
        }
        if filters.is_banned_term_type(line.term_type) {
            skipped.banned_term_type += 1;
            return;
        }
        let types = match self.surviving_types(line.sui, line.cui, filters) {
            None => {
                self.stats.skipped.untyped_concept += 1;
                return;
            }
            Some(types) if types.is_empty() => {
                self.stats.skipped.filtered += 1;
                return;
            }
            Some(types) => types,
        };

        let source = self.sources.register(line.source);
        let lowercase = line.phrase.to_lowercase();
        for tui in types {
            let row = ConceptRow::new(line.sui, line.cui, tui, source, line.code);
            self.lowercase
                .entry(lowercase.clone())
                .or_default()
                .push(row.clone());
            self.phrases
                .entry(line.phrase.to_string())
                .or_default()
                .push(row);
        }

        let pairs = self.term_sources.entry((line.sui, line.cui)).or_default();
        if !pairs.iter().any(|(s, c)| *s == source && c == line.code) {
            pairs.push((source, line.code.to_string()));
        }
    }

    fn norm_line(&mut self, sui: Sui, cui: Cui, normalized: &str, filters: &FilterSets) {
        let tokens: Vec<&str> = normalized.split(' ').filter(|t| !t.is_empty()).collect();
        if tokens.len() < 2 {
            self.stats.skipped.short_norm += 1;
            return;
        }
        if self.suppressed.contains(&sui) {
            self.stats.skipped.banned_term += 1;
            return;
        }
        let types = match self.surviving_types(sui, cui, filters) {
            Some(types) if !types.is_empty() => types,
            Some(_) => {
                self.stats.skipped.filtered += 1;
                return;
            }
            None => {
                self.stats.skipped.untyped_concept += 1;
                return;
            }
        };
        let Some(pairs) = self.term_sources.get(&(sui, cui)) else {
            return;
        };

        let rows = self.norms.entry(norms_key(tokens)).or_default();
        for tui in types {
            for (source, code) in pairs {
                rows.push(ConceptRow::new(sui, cui, tui, *source, code.as_str()));
            }
        }
    }

    fn write(&mut self, dir: &Path) -> DictionaryResult<()> {
        let mut manifest = DictionaryManifest::new(self.sources.len());
        self.stats.phrase_keys = write_index(dir, PHRASES_FILE, &self.phrases, &mut manifest)?;
        self.stats.lowercase_keys =
            write_index(dir, LOWERCASE_FILE, &self.lowercase, &mut manifest)?;
        self.stats.norm_keys = write_index(dir, NORMS_FILE, &self.norms, &mut manifest)?;
        self.stats.rows_written = manifest.total_rows();
        self.stats.sources = self.sources.len();

        self.sources.save(dir.join(SOURCES_FILE))?;
        // the manifest marks the directory complete, so it goes last
        manifest.save(dir)
    }
}

fn write_index(
    dir: &Path,
    name: &str,
    index: &Index,
    manifest: &mut DictionaryManifest,
) -> DictionaryResult<u64> {
    let path = dir.join(name);
    let mut writer = crate::table::SortedTableWriter::create(&path)?;
    let mut rows = 0u64;
    for (key, list) in index {
        writer.insert(key, &encode_rows(list))?;
        rows += list.len() as u64;
    }
    let keys = writer.finish()?;
    let file_size_bytes = std::fs::metadata(&path)
        .map_err(|e| DictionaryError::io_error(&path, e))?
        .len();
    manifest.add_index(IndexEntry {
        name: name.to_string(),
        keys,
        rows,
        file_size_bytes,
        sha256: sha256_file(&path)?,
    });
    tracing::debug!(index = name, keys, rows, "wrote index");
    Ok(keys)
}

fn parse_field<T>(
    path: &Path,
    line: usize,
    field: &str,
    parse: fn(&str) -> umls_concepts::ConceptResult<T>,
) -> DictionaryResult<T> {
    parse(field).map_err(|e| DictionaryError::InvalidLine {
        path: path.to_path_buf(),
        line,
        message: e.to_string(),
    })
}

/// `<parent>/<name>.<suffix>` next to `dir`, whatever trailing separators
/// `dir` carries.
fn sibling_dir(dir: &Path, suffix: &str) -> DictionaryResult<PathBuf> {
    let name = dir.file_name().ok_or_else(|| {
        DictionaryError::io_error(
            dir,
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "output path has no directory name",
            ),
        )
    })?;
    let mut sibling = OsString::from(name);
    sibling.push(".");
    sibling.push(suffix);
    Ok(dir.parent().unwrap_or_else(|| Path::new("")).join(sibling))
}

fn remove_if_present(dir: &Path) -> DictionaryResult<()> {
    if dir.exists() {
        std::fs::remove_dir_all(dir).map_err(|e| DictionaryError::io_error(dir, e))?;
    }
    Ok(())
}

/// Moves the complete `staging` directory to `target`. An existing target
/// is set aside first and restored if the move fails.
fn replace_dir(staging: &Path, target: &Path) -> DictionaryResult<()> {
    if !target.exists() {
        return std::fs::rename(staging, target).map_err(|e| DictionaryError::io_error(target, e));
    }
    let previous = sibling_dir(target, "previous")?;
    remove_if_present(&previous)?;
    std::fs::rename(target, &previous).map_err(|e| DictionaryError::io_error(target, e))?;
    if let Err(e) = std::fs::rename(staging, target) {
        if let Err(restore) = std::fs::rename(&previous, target) {
            tracing::error!(
                previous = %previous.display(),
                error = %restore,
                "could not restore previous dictionary"
            );
        }
        return Err(DictionaryError::io_error(target, e));
    }
    remove_if_present(&previous)
}
