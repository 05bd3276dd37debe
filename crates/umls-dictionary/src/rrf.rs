//! Streaming readers for UMLS Rich Release Format files and plain list files.
//!
//! RRF rows are pipe-delimited and terminated by a trailing `|`, so a row
//! with `n` columns splits into `n + 1` pieces with an empty last piece.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::error::{DictionaryError, DictionaryResult};

/// Column positions in `MRCONSO.RRF`.
pub(crate) mod mrconso {
    pub const COLUMNS: usize = 18;
    pub const CUI: usize = 0;
    pub const LAT: usize = 1;
    pub const SUI: usize = 5;
    pub const SAB: usize = 11;
    pub const TTY: usize = 12;
    pub const CODE: usize = 13;
    pub const STR: usize = 14;
    pub const SUPPRESS: usize = 16;
}

/// Column positions in `MRSTY.RRF`.
pub(crate) mod mrsty {
    pub const COLUMNS: usize = 6;
    pub const CUI: usize = 0;
    pub const TUI: usize = 1;
}

/// Column positions in `MRXNS_ENG.RRF`.
pub(crate) mod mrxns {
    pub const COLUMNS: usize = 5;
    pub const LAT: usize = 0;
    pub const NSTR: usize = 1;
    pub const CUI: usize = 2;
    pub const SUI: usize = 4;
}

/// Calls `f` with the 1-based line number and the fields of every row.
///
/// A row whose field count differs from `columns` aborts the scan.
pub(crate) fn for_each_row<F>(path: &Path, columns: usize, mut f: F) -> DictionaryResult<usize>
where
    F: FnMut(usize, &[&str]) -> DictionaryResult<()>,
{
    let file = File::open(path).map_err(|e| DictionaryError::io_error(path, e))?;
    let reader = BufReader::with_capacity(1 << 20, file);
    let mut count = 0;

    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| DictionaryError::io_error(path, e))?;
        let line_no = idx + 1;
        if line.is_empty() {
            continue;
        }
        let row = line.strip_suffix('|').unwrap_or(&line);
        let fields: Vec<&str> = row.split('|').collect();
        if fields.len() != columns {
            return Err(DictionaryError::MalformedLine {
                path: path.to_path_buf(),
                line: line_no,
                expected: columns,
                found: fields.len(),
            });
        }
        f(line_no, &fields)?;
        count += 1;
        if count % 1_000_000 == 0 {
            tracing::debug!(file = %path.display(), rows = count, "scanning");
        }
    }
    Ok(count)
}

/// Reads a list file: the first token of every non-blank, non-comment line.
///
/// Tokens end at whitespace or `|`, so `T047|Disease or Syndrome` yields `T047`.
/// Each token comes with its 1-based line number.
pub(crate) fn read_list(path: &Path) -> DictionaryResult<Vec<(usize, String)>> {
    read_lines(path, |line_no, line| {
        line.split(|c: char| c.is_whitespace() || c == '|')
            .next()
            .map(|token| (line_no, token.to_string()))
    })
}

/// Reads a pair list file: two tokens separated by whitespace, `,` or `|`.
pub(crate) fn read_pairs(path: &Path) -> DictionaryResult<Vec<(usize, String, String)>> {
    read_lines(path, |line_no, line| {
        let mut parts = line
            .split(|c: char| c.is_whitespace() || c == ',' || c == '|')
            .filter(|s| !s.is_empty());
        match (parts.next(), parts.next()) {
            (Some(a), Some(b)) => Some((line_no, a.to_string(), b.to_string())),
            (Some(a), None) => Some((line_no, a.to_string(), String::new())),
            _ => None,
        }
    })
}

fn read_lines<T, F>(path: &Path, mut parse: F) -> DictionaryResult<Vec<T>>
where
    F: FnMut(usize, &str) -> Option<T>,
{
    let file = File::open(path).map_err(|e| DictionaryError::io_error(path, e))?;
    let mut out = Vec::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| DictionaryError::io_error(path, e))?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(item) = parse(idx + 1, line) {
            out.push(item);
        }
    }
    Ok(out)
}

/// Locates a distribution file under `root/META` or directly under `root`.
pub(crate) fn locate(root: &Path, name: &str) -> DictionaryResult<PathBuf> {
    let candidates = [root.join("META").join(name), root.join(name)];
    candidates
        .iter()
        .find(|p| p.is_file())
        .cloned()
        .ok_or_else(|| {
            DictionaryError::io_error(
                &candidates[1],
                std::io::Error::new(std::io::ErrorKind::NotFound, format!("{} not found", name)),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_for_each_row_strips_trailing_pipe() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("MRSTY.RRF");
        std::fs::write(&path, "C0000005|T116|A1.4.1.2.1.7|Amino Acid|AT1|256|\n").unwrap();

        let mut seen = Vec::new();
        let count = for_each_row(&path, mrsty::COLUMNS, |line, fields| {
            seen.push((line, fields[mrsty::CUI].to_string(), fields[mrsty::TUI].to_string()));
            Ok(())
        })
        .unwrap();
        assert_eq!(count, 1);
        assert_eq!(seen, vec![(1, "C0000005".to_string(), "T116".to_string())]);
    }

    #[test]
    fn test_for_each_row_rejects_wrong_field_count() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("MRSTY.RRF");
        std::fs::write(&path, "C0000005|T116|x|y|z|1|\nC0000039|T119|\n").unwrap();

        let err = for_each_row(&path, mrsty::COLUMNS, |_, _| Ok(())).unwrap_err();
        match err {
            DictionaryError::MalformedLine {
                line,
                expected,
                found,
                ..
            } => {
                assert_eq!(line, 2);
                assert_eq!(expected, 6);
                assert_eq!(found, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_read_list_takes_first_token() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tuis.txt");
        std::fs::write(&path, "# semantic types\nT047|Disease or Syndrome\n\nT184 Sign\n").unwrap();
        assert_eq!(
            read_list(&path).unwrap(),
            vec![(2, "T047".to_string()), (4, "T184".to_string())]
        );
    }

    #[test]
    fn test_read_pairs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pairs.txt");
        std::fs::write(&path, "S0000001 C0000005\nS0000002,C0000039\n").unwrap();
        let pairs = read_pairs(&path).unwrap();
        assert_eq!(pairs[0], (1, "S0000001".to_string(), "C0000005".to_string()));
        assert_eq!(pairs[1], (2, "S0000002".to_string(), "C0000039".to_string()));
    }

    #[test]
    fn test_locate_prefers_meta() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("META")).unwrap();
        std::fs::write(dir.path().join("META").join("MRSTY.RRF"), "").unwrap();
        let found = locate(dir.path(), "MRSTY.RRF").unwrap();
        assert!(found.ends_with("META/MRSTY.RRF"));
        assert!(locate(dir.path(), "MRCONSO.RRF").is_err());
    }
}
