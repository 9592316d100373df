// src/unit.rs

//! Program units and the names derived from them
//!
//! A program unit is one directory holding a program's top-level sources.
//! Its names all come from the last path segment:
//!
//! - `invocation`: what the multi-call binary is invoked as (`my-tool`)
//! - `module`: the Rust identifier used in generated code (`my_tool`)
//! - `symbol`: the capitalized form used in docs (`MyTool`)

use crate::error::{Error, Result};
use std::path::{Component, Path, PathBuf};

/// Names derived from a unit directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitName {
    pub invocation: String,
    pub module: String,
    pub symbol: String,
}

impl UnitName {
    /// Derive names from a directory's last segment
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let normalized = normalize(dir);
        let segment = normalized
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| Error::InvalidUnit {
                dir: dir.to_path_buf(),
                reason: "no usable last path segment".to_string(),
            })?;

        let invocation = segment.to_lowercase();
        let module = invocation.replace('-', "_");
        if syn::parse_str::<syn::Ident>(&module).is_err() {
            return Err(Error::InvalidUnit {
                dir: dir.to_path_buf(),
                reason: format!("`{}` is not a valid Rust module name", module),
            });
        }

        Ok(Self {
            symbol: capitalize(&module),
            invocation,
            module,
        })
    }
}

/// `my_tool` -> `MyTool`
fn capitalize(module: &str) -> String {
    module
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// One directory taking part in a generate or restore run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramUnit {
    pub dir: PathBuf,
    pub name: UnitName,
}

impl ProgramUnit {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        let name = UnitName::from_dir(&dir)?;
        Ok(Self { dir, name })
    }

    /// `D/<module><suffix>.rs`
    pub fn autoregister_path(&self, suffix: &str) -> PathBuf {
        self.dir.join(format!("{}{}.rs", self.name.module, suffix))
    }

    /// `D/<module>/main.rs`
    pub fn standalone_path(&self) -> PathBuf {
        self.dir.join(&self.name.module).join("main.rs")
    }

    /// `#[path]` value leading from the standalone main to the entry file
    pub fn standalone_import_path(&self, entry_file: &Path) -> String {
        relative_path(&self.dir.join(&self.name.module), entry_file)
    }
}

/// Aggregator main location inside the aggregator directory
pub fn aggregator_path(aggregator_dir: &Path) -> PathBuf {
    aggregator_dir.join("main.rs")
}

/// Make a path absolute and resolve `.`/`..` lexically (no filesystem access)
pub fn normalize(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::ParentDir => {
                normalized.pop();
            }
            Component::CurDir => {}
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Relative path from directory `from` to `to`, always `/`-separated so it
/// can be used verbatim in a `#[path]` attribute
pub fn relative_path(from: &Path, to: &Path) -> String {
    let from = normalize(from);
    let to = normalize(to);
    let from_parts: Vec<_> = from.components().collect();
    let to_parts: Vec<_> = to.components().collect();

    let common = from_parts
        .iter()
        .zip(&to_parts)
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<String> = Vec::new();
    parts.extend(std::iter::repeat_n("..".to_string(), from_parts.len() - common));
    parts.extend(
        to_parts[common..]
            .iter()
            .map(|c| c.as_os_str().to_string_lossy().into_owned()),
    );
    parts.join("/")
}
