// src/ledger.rs

//! Source ledger: the ordered outcome of a generate or restore run
//!
//! Every file the run wants to change gets one [`SourceRecord`]. Records
//! keep insertion order, which is the order of previews, JSON output and
//! apply. A later `add` for a path already present replaces that record in
//! place. Unit directories that failed get a record carrying the error
//! instead of content; those are reported by [`SourceLedger::errors`] and
//! skipped everywhere else.
//!
//! Nothing here writes to disk except [`SourceLedger::apply`], which makes
//! no multi-file atomicity promise: it attempts every record and returns the
//! first failure.

use crate::error::{Error, Result};
use crate::store::SourceStore;
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Content recorded for files marked for deletion
pub const TOMBSTONE: &str = "<removed>";

/// What a record does to its path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    /// Existing file rewritten in place
    Modified,
    /// New file
    Added,
    /// File to delete (tombstone)
    Removed,
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Modified => write!(f, "modified"),
            Self::Added => write!(f, "added"),
            Self::Removed => write!(f, "removed"),
        }
    }
}

/// One file's outcome
#[derive(Debug, Serialize)]
pub struct SourceRecord {
    pub path: PathBuf,
    pub content: String,
    pub status: RecordStatus,
    #[serde(serialize_with = "serialize_error", skip_serializing_if = "Option::is_none")]
    pub error: Option<Error>,
}

impl SourceRecord {
    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

fn serialize_error<S: Serializer>(
    error: &Option<Error>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match error {
        Some(e) => serializer.serialize_str(&e.to_string()),
        None => serializer.serialize_none(),
    }
}

/// Ordered collection of source records
#[derive(Debug, Default)]
pub struct SourceLedger {
    records: Vec<SourceRecord>,
    index: HashMap<PathBuf, usize>,
}

impl SourceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a file outcome, replacing any earlier record for the same path
    pub fn add(
        &mut self,
        path: impl Into<PathBuf>,
        content: impl Into<String>,
        status: RecordStatus,
    ) {
        let content = match status {
            RecordStatus::Removed => TOMBSTONE.to_string(),
            _ => content.into(),
        };
        self.insert(SourceRecord {
            path: path.into(),
            content,
            status,
            error: None,
        });
    }

    /// Record a tombstone for a path
    pub fn remove(&mut self, path: impl Into<PathBuf>) {
        self.add(path, TOMBSTONE, RecordStatus::Removed);
    }

    /// Record a failure against a path (usually a unit directory)
    pub fn add_failure(&mut self, path: impl Into<PathBuf>, error: Error) {
        let path = path.into();
        warn!("{}", error);
        self.insert(SourceRecord {
            path,
            content: String::new(),
            status: RecordStatus::Modified,
            error: Some(error),
        });
    }

    fn insert(&mut self, record: SourceRecord) {
        match self.index.get(&record.path) {
            Some(&slot) => self.records[slot] = record,
            None => {
                self.index.insert(record.path.clone(), self.records.len());
                self.records.push(record);
            }
        }
    }

    /// Paths of every successful record, in insertion order
    pub fn filenames(&self) -> Vec<&Path> {
        self.successes().map(|r| r.path.as_path()).collect()
    }

    /// Recorded content of a path, empty when there is no successful record
    pub fn source(&self, path: impl AsRef<Path>) -> &str {
        self.record(path)
            .filter(|r| !r.is_failure())
            .map(|r| r.content.as_str())
            .unwrap_or("")
    }

    /// Record for a path, failures included
    pub fn record(&self, path: impl AsRef<Path>) -> Option<&SourceRecord> {
        self.index.get(path.as_ref()).map(|&slot| &self.records[slot])
    }

    /// Every record, failures included, in insertion order
    pub fn records(&self) -> &[SourceRecord] {
        &self.records
    }

    fn successes(&self) -> impl Iterator<Item = &SourceRecord> {
        self.records.iter().filter(|r| !r.is_failure())
    }

    /// Per-path errors, in insertion order
    pub fn errors(&self) -> Vec<(&Path, &Error)> {
        self.records
            .iter()
            .filter_map(|r| r.error.as_ref().map(|e| (r.path.as_path(), e)))
            .collect()
    }

    pub fn has_errors(&self) -> bool {
        self.records.iter().any(SourceRecord::is_failure)
    }

    /// All errors joined into one, one line per failing path
    pub fn single_error(&self) -> Option<Error> {
        let errors = self.errors();
        if errors.is_empty() {
            return None;
        }
        let details = errors
            .iter()
            .map(|(path, error)| format!("{}: {}", path.display(), error))
            .collect::<Vec<_>>()
            .join("\n");
        Some(Error::Batch {
            count: errors.len(),
            details,
        })
    }

    /// Write every successful record to the store
    ///
    /// Tombstones delete their path; everything else is written with parent
    /// directories created. All records are attempted; the first failure is
    /// returned.
    pub fn apply(&self, store: &dyn SourceStore) -> Result<()> {
        let mut first_error = None;
        let mut applied = 0usize;

        for record in self.successes() {
            let outcome = match record.status {
                RecordStatus::Removed => store.remove(&record.path),
                RecordStatus::Modified | RecordStatus::Added => {
                    store.write(&record.path, &record.content)
                }
            };
            match outcome {
                Ok(()) => {
                    applied += 1;
                    debug!("Applied {} {}", record.status, record.path.display());
                }
                Err(e) => {
                    warn!("Failed to apply {}: {}", record.path.display(), e);
                    if first_error.is_none() {
                        first_error = Some(Error::apply(&record.path, e));
                    }
                }
            }
        }

        info!("Applied {} of {} file change(s)", applied, self.successes().count());
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// JSON preview of every record
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.records)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Human-readable preview: a header per file followed by its content
impl fmt::Display for SourceLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for record in self.successes() {
            writeln!(f, "// ==> {} ({})", record.path.display(), record.status)?;
            write!(f, "{}", record.content)?;
            if !record.content.ends_with('\n') {
                writeln!(f)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
