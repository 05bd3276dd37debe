//! Manifest describing a built dictionary directory.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{DictionaryError, DictionaryResult};

/// File name of the manifest inside a dictionary directory.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Dictionary directory format version.
pub const FORMAT_VERSION: u32 = 1;

/// Manifest written last by the builder.
///
/// A directory without a manifest, or with a different format version, is
/// not a usable dictionary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DictionaryManifest {
    /// Directory format version.
    pub format_version: u32,
    /// Timestamp when the dictionary was built.
    pub built_at: DateTime<Utc>,
    /// Version of the builder.
    pub builder_version: String,
    /// Number of entries in the source table.
    pub source_count: usize,
    /// Per-index entries.
    pub indices: Vec<IndexEntry>,
}

/// Entry for a single index file in the manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    /// File name relative to the dictionary directory.
    pub name: String,
    /// Number of distinct keys.
    pub keys: u64,
    /// Number of rows across all keys.
    pub rows: u64,
    /// File size in bytes.
    pub file_size_bytes: u64,
    /// Hex SHA-256 of the file.
    pub sha256: String,
}

impl DictionaryManifest {
    /// Creates an empty manifest stamped with the current time.
    pub fn new(source_count: usize) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            built_at: Utc::now(),
            builder_version: env!("CARGO_PKG_VERSION").to_string(),
            source_count,
            indices: Vec::new(),
        }
    }

    /// Adds an index entry.
    pub fn add_index(&mut self, entry: IndexEntry) {
        self.indices.push(entry);
    }

    /// Finds an index entry by file name.
    pub fn index(&self, name: &str) -> Option<&IndexEntry> {
        self.indices.iter().find(|e| e.name == name)
    }

    /// Total rows across all indices.
    pub fn total_rows(&self) -> u64 {
        self.indices.iter().map(|e| e.rows).sum()
    }

    /// Saves the manifest as JSON into `dir`.
    pub fn save<P: AsRef<Path>>(&self, dir: P) -> DictionaryResult<()> {
        let path = dir.as_ref().join(MANIFEST_FILE);
        let file = File::create(&path).map_err(|e| DictionaryError::io_error(&path, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)
            .map_err(|e| DictionaryError::Serialization(e.to_string()))?;
        writer
            .flush()
            .and_then(|_| writer.get_ref().sync_all())
            .map_err(|e| DictionaryError::io_error(&path, e))
    }

    /// Loads the manifest from `dir`.
    pub fn load<P: AsRef<Path>>(dir: P) -> DictionaryResult<Self> {
        let path = dir.as_ref().join(MANIFEST_FILE);
        let file = File::open(&path).map_err(|e| DictionaryError::io_error(&path, e))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader).map_err(|e| DictionaryError::Serialization(e.to_string()))
    }

    /// Recomputes every index digest and compares it with the manifest.
    pub fn verify<P: AsRef<Path>>(&self, dir: P) -> DictionaryResult<()> {
        let dir = dir.as_ref();
        for entry in &self.indices {
            let actual = sha256_file(dir.join(&entry.name))?;
            if actual != entry.sha256 {
                return Err(DictionaryError::ChecksumMismatch {
                    file: entry.name.clone(),
                    expected: entry.sha256.clone(),
                    actual,
                });
            }
        }
        Ok(())
    }
}

/// Computes the hex SHA-256 digest of a file.
pub fn sha256_file<P: AsRef<Path>>(path: P) -> DictionaryResult<String> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| DictionaryError::io_error(path, e))?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = reader
            .read(&mut buf)
            .map_err(|e| DictionaryError::io_error(path, e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(&hasher.finalize()))
}

mod hex {
    pub fn encode(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl std::fmt::Display for DictionaryManifest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Dictionary Manifest")?;
        writeln!(f, "  Format:    v{}", self.format_version)?;
        writeln!(f, "  Built:     {}", self.built_at)?;
        writeln!(f, "  Builder:   {}", self.builder_version)?;
        writeln!(f, "  Sources:   {}", self.source_count)?;
        for entry in &self.indices {
            writeln!(
                f,
                "  {:<10} {} keys, {} rows, {} KB",
                entry.name,
                entry.keys,
                entry.rows,
                entry.file_size_bytes / 1024
            )?;
        }
        Ok(())
    }
}
