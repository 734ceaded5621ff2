//! The repository/branch to job mapping table.
//!
//! The table is loaded once at startup from a semicolon-delimited text
//! source and is immutable afterwards. Each record subscribes one job to
//! one (repository, branch) pair, or to a (repository, branch, file)
//! triple when file matching is enabled. Multiple records may share a key;
//! their jobs accumulate in file order, duplicates preserved.
//!
//! Concurrent reads need no locking: handlers only ever borrow the table
//! through [`MappingTable::lookup`].

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::key::build_key;
use crate::types::{JobName, LookupKey};

/// Errors that can occur while loading the mapping table.
///
/// All of these are fatal at startup: a malformed record aborts the entire
/// load rather than producing a partial table.
#[derive(Debug, Error)]
pub enum MappingError {
    /// The mapping file could not be opened or read.
    #[error("failed to read mapping file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The source could not be tokenized as semicolon-delimited records.
    #[error("failed to parse mapping source: {0}")]
    Parse(#[from] csv::Error),

    /// A record has too few fields to name a repository, branch, and job.
    #[error("mapping record on line {line} has {found} fields, expected at least 3")]
    MalformedRecord { line: u64, found: usize },

    /// In file-matching mode every record must carry a file pattern.
    #[error("mapping record on line {line} has {found} fields, file matching requires exactly 4")]
    MalformedFileRecord { line: u64, found: usize },
}

/// Immutable lookup table from [`LookupKey`] to the ordered list of
/// subscribed jobs.
#[derive(Debug, Default)]
pub struct MappingTable {
    entries: HashMap<LookupKey, Vec<JobName>>,
}

impl MappingTable {
    /// Parses a mapping source into a table.
    ///
    /// Records are semicolon-delimited with no header row. In
    /// non-file-matching mode a record is (repository; branch; job) and
    /// fields beyond the third are ignored; in file-matching mode a record
    /// is exactly (repository; branch; job; file-pattern). The job name is
    /// always the third field regardless of mode.
    pub fn load<R: io::Read>(reader: R, file_matching: bool) -> Result<Self, MappingError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(b';')
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut entries: HashMap<LookupKey, Vec<JobName>> = HashMap::new();
        let mut records = 0u64;

        for result in csv_reader.records() {
            let record = result?;
            let line = record.position().map_or(records + 1, |p| p.line());
            let found = record.len();

            let key = if file_matching {
                if found != 4 {
                    return Err(MappingError::MalformedFileRecord { line, found });
                }
                build_key(&[&record[0], &record[1], &record[3]])
            } else {
                if found < 3 {
                    return Err(MappingError::MalformedRecord { line, found });
                }
                build_key(&[&record[0], &record[1]])
            };

            entries
                .entry(key)
                .or_default()
                .push(JobName::new(&record[2]));
            records += 1;
        }

        info!(records, keys = entries.len(), "Mapping loaded");

        Ok(MappingTable { entries })
    }

    /// Opens and parses the mapping file at `path`.
    pub fn load_file(path: impl AsRef<Path>, file_matching: bool) -> Result<Self, MappingError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| MappingError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::load(io::BufReader::new(file), file_matching)
    }

    /// Returns the jobs subscribed to `key`, in mapping-source order.
    ///
    /// An empty slice is the "no subscribers" case, not an error.
    pub fn lookup(&self, key: &LookupKey) -> &[JobName] {
        self.entries.get(key).map_or(&[], Vec::as_slice)
    }

    /// Number of distinct lookup keys in the table.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::build_key;

    fn load_str(source: &str, file_matching: bool) -> Result<MappingTable, MappingError> {
        MappingTable::load(source.as_bytes(), file_matching)
    }

    fn jobs<'a>(table: &'a MappingTable, parts: &[&str]) -> Vec<&'a str> {
        table
            .lookup(&build_key(parts))
            .iter()
            .map(JobName::as_str)
            .collect()
    }

    // ─── Non-file-matching mode ───

    #[test]
    fn lookup_returns_jobs_in_file_order() {
        let table = load_str("repoA;main;buildA\nrepoA;dev;buildDev\nrepoB;main;buildA\n", false)
            .unwrap();

        assert_eq!(jobs(&table, &["repoA", "main"]), vec!["buildA"]);
        assert_eq!(jobs(&table, &["repoA", "dev"]), vec!["buildDev"]);
        assert_eq!(jobs(&table, &["repoB", "main"]), vec!["buildA"]);
        assert!(jobs(&table, &["repoC", "main"]).is_empty());
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn shared_key_accumulates_jobs_with_duplicates() {
        let table =
            load_str("r;main;first\nr;main;second\nr;main;first\n", false).unwrap();

        assert_eq!(jobs(&table, &["r", "main"]), vec!["first", "second", "first"]);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn extra_fields_ignored_without_file_matching() {
        let table = load_str("r;main;job;ignored;also-ignored\n", false).unwrap();

        assert_eq!(jobs(&table, &["r", "main"]), vec!["job"]);
    }

    #[test]
    fn too_few_fields_is_malformed() {
        let err = load_str("r;main;job\nr;main\n", false).unwrap_err();

        assert!(matches!(
            err,
            MappingError::MalformedRecord { line: 2, found: 2 }
        ));
    }

    #[test]
    fn empty_source_yields_empty_table() {
        let table = load_str("", false).unwrap();
        assert!(table.is_empty());
    }

    // ─── File-matching mode ───

    #[test]
    fn file_matching_keys_include_file_pattern() {
        let table = load_str("r;main;job;src/a.c\nr;main;other;src/b.c\n", true).unwrap();

        assert_eq!(jobs(&table, &["r", "main", "src/a.c"]), vec!["job"]);
        assert_eq!(jobs(&table, &["r", "main", "src/b.c"]), vec!["other"]);
        assert!(jobs(&table, &["r", "main"]).is_empty());
    }

    #[test]
    fn file_matching_rejects_three_field_record() {
        let err = load_str("r;main;job\n", true).unwrap_err();

        assert!(matches!(
            err,
            MappingError::MalformedFileRecord { line: 1, found: 3 }
        ));
    }

    #[test]
    fn file_matching_rejects_five_field_record() {
        let err = load_str("r;main;job;src/a.c;extra\n", true).unwrap_err();

        assert!(matches!(
            err,
            MappingError::MalformedFileRecord { line: 1, found: 5 }
        ));
    }

    #[test]
    fn malformed_record_aborts_entire_load() {
        // The first record is fine; the second is not. No partial table.
        let result = load_str("r;main;job;src/a.c\nr;main;job\n", true);
        assert!(result.is_err());
    }

    // ─── File I/O ───

    #[test]
    fn load_file_reads_from_disk() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "repoA;main;buildA").unwrap();
        file.flush().unwrap();

        let table = MappingTable::load_file(file.path(), false).unwrap();
        assert_eq!(jobs(&table, &["repoA", "main"]), vec!["buildA"]);
    }

    #[test]
    fn load_file_missing_path_is_io_error() {
        let err = MappingTable::load_file("/nonexistent/mapping.csv", false).unwrap_err();
        assert!(matches!(err, MappingError::Io { .. }));
    }
}
