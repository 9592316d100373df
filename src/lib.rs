// src/lib.rs

//! multibin: fold standalone Rust programs into one multi-call binary
//!
//! Every program directory holds a single entry file with `fn main`. The
//! generator rewrites it into an embeddable module and emits the glue around
//! it; restore undoes all of it.
//!
//! # Architecture
//!
//! - Parser: finds and parses the entry file of a program directory
//! - Renamer: minimal source edits between standalone and embedded form
//! - Templates: auto-registration, standalone main and aggregator main
//! - Ledger: ordered, previewable set of file changes, applied on request
//! - Generator: per-directory pipeline, run in parallel, collected in order
//! - Registry: what the generated aggregator main runs to pick a program by
//!   the name it was invoked under

pub mod config;
pub mod dispatch;
mod error;
pub mod generator;
pub mod ledger;
pub mod parser;
pub mod renamer;
pub mod store;
pub mod template;
pub mod unit;

pub use config::{EntryNames, GeneratorConfig};
pub use dispatch::{Dispatch, Registry};
pub use error::{Error, Result};
pub use generator::Generator;
pub use ledger::{RecordStatus, SourceLedger, SourceRecord, TOMBSTONE};
pub use parser::{EntryForm, ParsedUnit};
pub use renamer::SourceFile;
pub use store::{FsStore, MemoryStore, SourceStore};
pub use unit::{ProgramUnit, UnitName};
