// src/config.rs

//! Generator configuration
//!
//! Everything has a default, so a config file is optional. A TOML file can
//! override the names baked into generated code:
//!
//! ```toml
//! # Crate that provides `Registry` to the generated files
//! runtime_crate = "multibin"
//!
//! # Name of the entry function once a program is embedded
//! embedded_entry = "app_main"
//!
//! # Suffix of the auto-registration file (`<module><suffix>.rs`)
//! autoregister_suffix = "_autoregister"
//! ```

use crate::error::{Error, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Entry function name of a standalone program
pub const STANDALONE_ENTRY: &str = "main";

/// Module name of a program that has not been embedded
pub const DEFAULT_MODULE: &str = "main";

/// Names used by the generator and baked into generated sources
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Path of the crate providing `Registry` (e.g. `multibin` or `tools::multicall`)
    pub runtime_crate: String,
    /// Entry function name in embedded form
    pub embedded_entry: String,
    /// Suffix appended to the module name for the auto-registration file
    pub autoregister_suffix: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            runtime_crate: "multibin".to_string(),
            embedded_entry: "app_main".to_string(),
            autoregister_suffix: "_autoregister".to_string(),
        }
    }
}

impl GeneratorConfig {
    /// Load a configuration file, falling back to defaults for missing keys
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let config: Self = toml::from_str(&text)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        debug!("Loaded generator config from {}: {:?}", path.display(), config);
        Ok(config)
    }

    /// Check that every name can appear in generated Rust code
    pub fn validate(&self) -> Result<()> {
        if syn::parse_str::<syn::Path>(&self.runtime_crate).is_err() {
            return Err(Error::Config(format!(
                "runtime_crate `{}` is not a Rust path",
                self.runtime_crate
            )));
        }
        if syn::parse_str::<syn::Ident>(&self.embedded_entry).is_err() {
            return Err(Error::Config(format!(
                "embedded_entry `{}` is not a Rust identifier",
                self.embedded_entry
            )));
        }
        if self.embedded_entry == STANDALONE_ENTRY {
            return Err(Error::Config(format!(
                "embedded_entry must differ from `{}`",
                STANDALONE_ENTRY
            )));
        }
        let suffix_ok = !self.autoregister_suffix.is_empty()
            && self
                .autoregister_suffix
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !suffix_ok {
            return Err(Error::Config(format!(
                "autoregister_suffix `{}` must be non-empty and contain only [A-Za-z0-9_]",
                self.autoregister_suffix
            )));
        }
        Ok(())
    }

    /// Entry names for the renamer and parser
    pub fn entry_names(&self) -> EntryNames {
        EntryNames {
            standalone: STANDALONE_ENTRY.to_string(),
            embedded: self.embedded_entry.clone(),
        }
    }
}

/// The two names an entry function alternates between
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryNames {
    pub standalone: String,
    pub embedded: String,
}

impl Default for EntryNames {
    fn default() -> Self {
        GeneratorConfig::default().entry_names()
    }
}
