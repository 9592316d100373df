// src/parser.rs

//! Source parser
//!
//! Reads a unit directory through a [`SourceStore`], parses every top-level
//! `.rs` file and locates the single entry function. The entry may be in
//! standalone form (`fn main`) or embedded form (`pub fn app_main`); which
//! one it is gets reported as an [`EntryForm`] rather than as an error so
//! callers can branch on it.

use crate::config::{DEFAULT_MODULE, EntryNames};
use crate::error::{Error, Result};
use crate::store::SourceStore;
use std::fmt;
use std::path::{Path, PathBuf};
use syn::{AttrStyle, Expr, ExprLit, Item, Lit, Meta};
use tracing::debug;

/// Which of its two names the entry function currently carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryForm {
    /// `fn main`, directly runnable
    Standalone,
    /// Renamed for inclusion in a multi-call binary
    Embedded,
}

impl fmt::Display for EntryForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standalone => write!(f, "standalone"),
            Self::Embedded => write!(f, "embedded"),
        }
    }
}

/// Result of parsing one unit directory
#[derive(Debug, Clone)]
pub struct ParsedUnit {
    /// File holding the entry function
    pub entry_path: PathBuf,
    /// Original text of the entry file
    pub source: String,
    /// Syntax tree of the entry file, spans pointing into `source`
    pub tree: syn::File,
    /// Current module name (`crate_name` attribute, `main` when absent)
    pub module_name: String,
    /// Current form of the entry function
    pub form: EntryForm,
}

/// Parse a unit directory and locate its entry function
pub fn parse_unit(store: &dyn SourceStore, dir: &Path, names: &EntryNames) -> Result<ParsedUnit> {
    let sources = store.list_sources(dir)?;
    debug!("Parsing {} source file(s) in {}", sources.len(), dir.display());

    let mut entries: Vec<(PathBuf, String, syn::File, EntryForm)> = Vec::new();
    for path in sources {
        let text = store.read(&path)?;
        let tree = parse_source(&path, &text)?;
        for form in entry_forms(&tree, names) {
            entries.push((path.clone(), text.clone(), tree.clone(), form));
        }
    }

    match entries.len() {
        0 => Err(Error::EntryNotFound {
            dir: dir.to_path_buf(),
            expected: format!("{}` or `fn {}", names.standalone, names.embedded),
        }),
        1 => {
            let (entry_path, source, tree, form) = entries.remove(0);
            let module_name = module_name(&tree).unwrap_or_else(|| DEFAULT_MODULE.to_string());
            debug!(
                "Found {} entry in {} (module `{}`)",
                form,
                entry_path.display(),
                module_name
            );
            Ok(ParsedUnit {
                entry_path,
                source,
                tree,
                module_name,
                form,
            })
        }
        _ => Err(Error::AmbiguousEntry {
            dir: dir.to_path_buf(),
            locations: entries
                .iter()
                .map(|(path, _, _, form)| format!("{} ({})", path.display(), form))
                .collect(),
        }),
    }
}

/// Parse one file, mapping syn errors to a located [`Error::Parse`]
pub fn parse_source(path: &Path, text: &str) -> Result<syn::File> {
    syn::parse_file(text).map_err(|e| {
        let start = e.span().start();
        Error::Parse {
            path: path.to_path_buf(),
            line: start.line,
            column: start.column + 1,
            message: e.to_string(),
        }
    })
}

/// Forms of every top-level entry function in a file, in source order
pub fn entry_forms(tree: &syn::File, names: &EntryNames) -> Vec<EntryForm> {
    tree.items
        .iter()
        .filter_map(|item| match item {
            Item::Fn(func) if func.sig.ident == names.standalone => Some(EntryForm::Standalone),
            Item::Fn(func) if func.sig.ident == names.embedded => Some(EntryForm::Embedded),
            _ => None,
        })
        .collect()
}

/// Value of the `#![crate_name = "..."]` attribute, if any
pub fn module_name(tree: &syn::File) -> Option<String> {
    tree.attrs
        .iter()
        .filter(|attr| {
            matches!(attr.style, AttrStyle::Inner(_)) && attr.path().is_ident("crate_name")
        })
        .find_map(|attr| match &attr.meta {
            Meta::NameValue(nv) => match &nv.value {
                Expr::Lit(ExprLit {
                    lit: Lit::Str(s), ..
                }) => Some(s.value()),
                _ => None,
            },
            _ => None,
        })
}
