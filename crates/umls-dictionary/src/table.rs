//! Immutable sorted key/value table files.
//!
//! Each dictionary index is one table file, bulk loaded once from keys in
//! ascending byte order and only ever read afterwards.
//!
//! # File Format
//!
//! ```text
//! [4 bytes]  Magic: "UDKV"
//! [4 bytes]  Version (u32 BE)
//! [var]      Entries, in key order:
//!              key length (u32 BE) | key (UTF-8) | value length (u32 BE) | value
//! [8N bytes] Offset of each entry (u64 BE)
//! [8 bytes]  Entry count N (u64 BE)
//! [8 bytes]  Offset of the offset table (u64 BE)
//! [4 bytes]  Magic: "UDKV"
//! ```
//!
//! Point lookups binary-search the offset table; iteration walks the entries
//! in order. A reader is `Sync` and serves any number of concurrent callers.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use memmap2::Mmap;

use crate::error::{DictionaryError, DictionaryResult};

/// Magic bytes at both ends of a table file.
const TABLE_MAGIC: &[u8; 4] = b"UDKV";

/// Current table format version.
const TABLE_VERSION: u32 = 1;

const HEADER_LEN: usize = 8;
const FOOTER_LEN: usize = 8 + 8 + 4;

/// How table files are brought into memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadMode {
    /// Memory-map the file (zero-copy, paged in on demand).
    #[default]
    Mmap,
    /// Read the whole file into an owned buffer.
    Owned,
}

enum Buffer {
    Mmap(Mmap),
    Owned(Vec<u8>),
}

impl Buffer {
    fn as_slice(&self) -> &[u8] {
        match self {
            Buffer::Mmap(m) => m.as_ref(),
            Buffer::Owned(v) => v.as_slice(),
        }
    }
}

/// Bulk writer for a table file.
///
/// Keys must be inserted in strictly ascending byte order.
pub struct SortedTableWriter {
    path: PathBuf,
    writer: BufWriter<File>,
    offsets: Vec<u64>,
    position: u64,
    last_key: Option<String>,
}

impl SortedTableWriter {
    /// Creates (or truncates) the table file at `path`.
    pub fn create<P: AsRef<Path>>(path: P) -> DictionaryResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path).map_err(|e| DictionaryError::io_error(&path, e))?;
        let mut writer = BufWriter::new(file);
        writer
            .write_all(TABLE_MAGIC)
            .and_then(|_| writer.write_all(&TABLE_VERSION.to_be_bytes()))
            .map_err(|e| DictionaryError::io_error(&path, e))?;
        Ok(Self {
            path,
            writer,
            offsets: Vec::new(),
            position: HEADER_LEN as u64,
            last_key: None,
        })
    }

    /// Appends one entry.
    pub fn insert(&mut self, key: &str, value: &[u8]) -> DictionaryResult<()> {
        if let Some(previous) = &self.last_key {
            if key.as_bytes() <= previous.as_bytes() {
                return Err(DictionaryError::UnsortedKey {
                    previous: previous.clone(),
                    key: key.to_string(),
                });
            }
        }
        let key_len = u32::try_from(key.len())
            .map_err(|_| DictionaryError::invalid_format("key longer than u32::MAX"))?;
        let value_len = u32::try_from(value.len())
            .map_err(|_| DictionaryError::invalid_format("value longer than u32::MAX"))?;

        self.write(&key_len.to_be_bytes())?;
        self.write(key.as_bytes())?;
        self.write(&value_len.to_be_bytes())?;
        self.write(value)?;

        self.offsets.push(self.position);
        self.position += 8 + key.len() as u64 + value.len() as u64;
        self.last_key = Some(key.to_string());
        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> DictionaryResult<()> {
        self.writer
            .write_all(bytes)
            .map_err(|e| DictionaryError::io_error(&self.path, e))
    }

    /// Writes the offset table and footer; returns the number of entries.
    pub fn finish(mut self) -> DictionaryResult<u64> {
        let table_offset = self.position;
        let offsets = std::mem::take(&mut self.offsets);
        for offset in &offsets {
            self.write(&offset.to_be_bytes())?;
        }
        let count = offsets.len() as u64;
        self.write(&count.to_be_bytes())?;
        self.write(&table_offset.to_be_bytes())?;
        self.write(TABLE_MAGIC)?;
        self.writer
            .flush()
            .map_err(|e| DictionaryError::io_error(&self.path, e))?;
        Ok(count)
    }
}

/// Read-only view of a table file.
pub struct SortedTable {
    buffer: Buffer,
    len: usize,
    table_offset: usize,
}

impl SortedTable {
    /// Opens a table file and validates its header and footer.
    pub fn open<P: AsRef<Path>>(path: P, mode: LoadMode) -> DictionaryResult<Self> {
        let path = path.as_ref();
        let buffer = match mode {
            LoadMode::Mmap => {
                let file = File::open(path).map_err(|e| DictionaryError::io_error(path, e))?;
                // SAFETY: table files are written once by the builder and never
                // modified while a dictionary is open.
                let map = unsafe { Mmap::map(&file) }
                    .map_err(|e| DictionaryError::io_error(path, e))?;
                Buffer::Mmap(map)
            }
            LoadMode::Owned => {
                Buffer::Owned(std::fs::read(path).map_err(|e| DictionaryError::io_error(path, e))?)
            }
        };
        Self::from_buffer(buffer)
    }

    fn from_buffer(buffer: Buffer) -> DictionaryResult<Self> {
        let bytes = buffer.as_slice();
        if bytes.len() < HEADER_LEN + FOOTER_LEN {
            return Err(DictionaryError::invalid_format("file too short"));
        }
        if &bytes[0..4] != TABLE_MAGIC || &bytes[bytes.len() - 4..] != TABLE_MAGIC {
            return Err(DictionaryError::invalid_format("invalid magic bytes"));
        }
        let version = read_u32(&bytes[4..8]);
        if version != TABLE_VERSION {
            return Err(DictionaryError::invalid_format(format!(
                "unsupported version: {} (expected {})",
                version, TABLE_VERSION
            )));
        }

        let footer = bytes.len() - FOOTER_LEN;
        let len = read_u64(&bytes[footer..footer + 8]) as usize;
        let table_offset = read_u64(&bytes[footer + 8..footer + 16]) as usize;
        let expected_end = len
            .checked_mul(8)
            .and_then(|n| n.checked_add(table_offset));
        if table_offset < HEADER_LEN || expected_end != Some(footer) {
            return Err(DictionaryError::invalid_format(
                "offset table does not match footer",
            ));
        }

        Ok(Self {
            buffer,
            len,
            table_offset,
        })
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if the table holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Looks up the value stored under `key`.
    pub fn get(&self, key: &str) -> DictionaryResult<Option<&[u8]>> {
        let target = key.as_bytes();
        let (mut lo, mut hi) = (0usize, self.len);
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let (candidate, value) = self.entry(mid)?;
            match candidate.as_bytes().cmp(target) {
                std::cmp::Ordering::Less => lo = mid + 1,
                std::cmp::Ordering::Greater => hi = mid,
                std::cmp::Ordering::Equal => return Ok(Some(value)),
            }
        }
        Ok(None)
    }

    /// Iterates all entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = DictionaryResult<(&str, &[u8])>> + '_ {
        (0..self.len).map(move |idx| self.entry(idx))
    }

    fn entry(&self, idx: usize) -> DictionaryResult<(&str, &[u8])> {
        let bytes = self.buffer.as_slice();
        let slot = self.table_offset + idx * 8;
        let start = read_u64(&bytes[slot..slot + 8]) as usize;

        let key_len = read_len(bytes, start, self.table_offset)?;
        let key_start = start + 4;
        let key_end = key_start + key_len;
        let value_len = read_len(bytes, key_end, self.table_offset)?;
        let value_start = key_end + 4;
        let value_end = value_start + value_len;
        if value_end > self.table_offset {
            return Err(DictionaryError::invalid_format(format!(
                "entry {} overruns the data section",
                idx
            )));
        }

        let key = std::str::from_utf8(&bytes[key_start..key_end])
            .map_err(|_| DictionaryError::invalid_format(format!("entry {} key is not UTF-8", idx)))?;
        Ok((key, &bytes[value_start..value_end]))
    }
}

fn read_len(bytes: &[u8], at: usize, limit: usize) -> DictionaryResult<usize> {
    if at + 4 > limit {
        return Err(DictionaryError::invalid_format("length field out of bounds"));
    }
    Ok(read_u32(&bytes[at..at + 4]) as usize)
}

fn read_u32(bytes: &[u8]) -> u32 {
    u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

fn read_u64(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[..8]);
    u64::from_be_bytes(buf)
}
