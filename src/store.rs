// src/store.rs

//! Persistent store abstraction
//!
//! The generator never touches the filesystem directly: reads go through
//! [`SourceStore::list_sources`] and [`SourceStore::read`] during parsing, and
//! writes through [`SourceStore::write`] and [`SourceStore::remove`] when a
//! ledger is applied. [`FsStore`] is the real filesystem, [`MemoryStore`] an
//! in-memory map used by tests and dry runs.

use crate::error::{Error, Result};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Read/write access to source files
///
/// Implementations must be shareable across the worker threads that parse
/// unit directories.
pub trait SourceStore: Send + Sync {
    /// `.rs` files directly inside `dir` (not recursive), sorted by path
    fn list_sources(&self, dir: &Path) -> Result<Vec<PathBuf>>;

    /// Full content of one file
    fn read(&self, path: &Path) -> Result<String>;

    /// Write a file, creating parent directories as needed
    fn write(&self, path: &Path, content: &str) -> io::Result<()>;

    /// Delete a file; a file that is already absent counts as success
    ///
    /// Directory-backed stores also drop the file's directory once it is
    /// left empty, so directories created by `write` do not outlive their
    /// files.
    fn remove(&self, path: &Path) -> io::Result<()>;
}

fn is_rust_source(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "rs")
}

/// The real filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStore;

impl FsStore {
    pub fn new() -> Self {
        Self
    }
}

impl SourceStore for FsStore {
    fn list_sources(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        if !dir.is_dir() {
            return Err(Error::io(
                dir,
                io::Error::new(io::ErrorKind::NotFound, "not a directory"),
            ));
        }

        let mut sources = Vec::new();
        for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| Error::io(dir, e.into()))?;
            if entry.file_type().is_file() && is_rust_source(entry.path()) {
                sources.push(entry.into_path());
            }
        }
        sources.sort();
        Ok(sources)
    }

    fn read(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).map_err(|e| Error::io(path, e))
    }

    fn write(&self, path: &Path, content: &str) -> io::Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        // Write to a sibling temp file, then rename over the target
        let temp_path = path.with_extension("rs.multibin-tmp");
        let written = fs::File::create(&temp_path)
            .and_then(|mut file| {
                file.write_all(content.as_bytes())?;
                file.sync_all()
            })
            .and_then(|()| fs::rename(&temp_path, path));
        if let Err(e) = written {
            let _ = fs::remove_file(&temp_path);
            return Err(e);
        }

        debug!("Wrote {} ({} bytes)", path.display(), content.len());
        Ok(())
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        match fs::remove_file(path) {
            Ok(()) => {
                debug!("Removed {}", path.display());
                prune_empty_parent(path);
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("Already absent: {}", path.display());
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

/// Drop the directory holding `path` if removing it left the directory empty
fn prune_empty_parent(path: &Path) {
    let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) else {
        return;
    };
    let is_empty = fs::read_dir(parent).is_ok_and(|mut entries| entries.next().is_none());
    if is_empty && fs::remove_dir(parent).is_ok() {
        debug!("Removed empty directory {}", parent.display());
    }
}

/// In-memory store keyed by path
#[derive(Debug, Default)]
pub struct MemoryStore {
    files: Mutex<BTreeMap<PathBuf, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store from `(path, content)` pairs
    pub fn with_files<P, C>(files: impl IntoIterator<Item = (P, C)>) -> Self
    where
        P: Into<PathBuf>,
        C: Into<String>,
    {
        let store = Self::new();
        {
            let mut map = store.files.lock();
            for (path, content) in files {
                map.insert(path.into(), content.into());
            }
        }
        store
    }

    /// Content of a file, if present
    pub fn get(&self, path: &Path) -> Option<String> {
        self.files.lock().get(path).cloned()
    }

    /// Every stored path, sorted
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.lock().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.files.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.lock().is_empty()
    }
}

impl SourceStore for MemoryStore {
    fn list_sources(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let files = self.files.lock();
        let sources: Vec<PathBuf> = files
            .keys()
            .filter(|path| path.parent() == Some(dir) && is_rust_source(path))
            .cloned()
            .collect();
        if sources.is_empty() && !files.keys().any(|path| path.starts_with(dir)) {
            return Err(Error::io(
                dir,
                io::Error::new(io::ErrorKind::NotFound, "not a directory"),
            ));
        }
        Ok(sources)
    }

    fn read(&self, path: &Path) -> Result<String> {
        self.get(path).ok_or_else(|| {
            Error::io(path, io::Error::from(io::ErrorKind::NotFound))
        })
    }

    fn write(&self, path: &Path, content: &str) -> io::Result<()> {
        self.files
            .lock()
            .insert(path.to_path_buf(), content.to_string());
        Ok(())
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        self.files.lock().remove(path);
        Ok(())
    }
}
