// src/error.rs

//! Error types for multibin
//!
//! One error enum covers the whole pipeline. Per-unit failures (parse,
//! entry lookup, template rendering) are captured in the ledger instead of
//! aborting a batch; `Batch` is the combined form handed to callers that want
//! a single failure signal.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while generating, restoring or dispatching
#[derive(Debug, Error)]
pub enum Error {
    /// A source file is not valid Rust
    #[error("{}:{line}:{column}: parse error: {message}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },

    /// No entry function in the expected form was found
    #[error("{}: no `fn {expected}` entry function found", dir.display())]
    EntryNotFound { dir: PathBuf, expected: String },

    /// More than one entry function was found
    #[error(
        "{}: ambiguous entry, found {} entry functions in {}",
        dir.display(),
        locations.len(),
        locations.join(", ")
    )]
    AmbiguousEntry { dir: PathBuf, locations: Vec<String> },

    /// The directory cannot be turned into a program unit
    #[error("{}: invalid unit directory: {reason}", dir.display())]
    InvalidUnit { dir: PathBuf, reason: String },

    /// A syntax position could not be mapped back onto the source text
    #[error("{}: cannot rewrite source: {message}", path.display())]
    Rewrite { path: PathBuf, message: String },

    /// A template produced text that does not re-parse
    #[error("failed to render {template} template: {message}")]
    TemplateRender {
        template: &'static str,
        message: String,
    },

    /// Writing or deleting a file during apply failed
    #[error("failed to apply {}: {source}", path.display())]
    Apply {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Reading from the store failed
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Command line validation failed
    #[error("usage error: {0}")]
    Usage(String),

    /// Invalid generator configuration
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The dispatcher was invoked under a name nobody registered
    #[error(
        "{name} app not added into this binary, registered apps are: {}",
        registered.join(", ")
    )]
    UnknownApp {
        name: String,
        registered: Vec<String>,
    },

    /// Several per-path failures joined into one
    #[error("{count} failure(s):\n{details}")]
    Batch { count: usize, details: String },
}

impl Error {
    /// Build an `Io` error for a path
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Build an `Apply` error for a path
    pub fn apply(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Apply {
            path: path.into(),
            source,
        }
    }
}

/// Result type for multibin operations
pub type Result<T> = std::result::Result<T, Error>;
