// src/generator.rs

//! Orchestrator for generate and restore runs
//!
//! Changes made by [`Generator::generate`], for every unit directory `D`
//! named `N`:
//!
//! 1. The entry file gets `#![crate_name = "N"]` and its `fn main` becomes
//!    `pub fn app_main`.
//! 2. `D/N_autoregister.rs` is added, exposing `register(&mut Registry)`.
//! 3. `D/N/main.rs` is added, a standalone binary calling `N::app_main()`.
//!
//! With an aggregator directory `B`, `B/main.rs` is added as well: it pulls
//! in every auto-registration file and runs the multi-call `Registry`.
//!
//! [`Generator::restore`] does the exact opposite. Neither writes anything:
//! both return a [`SourceLedger`] to preview or apply.
//!
//! Units are processed in parallel; results land in the ledger in argument
//! order. A failing unit is recorded as a failure and the batch goes on.

use crate::config::{DEFAULT_MODULE, EntryNames, GeneratorConfig};
use crate::error::{Error, Result};
use crate::ledger::{RecordStatus, SourceLedger};
use crate::parser::{self, EntryForm, ParsedUnit};
use crate::renamer::{self, SourceFile};
use crate::store::SourceStore;
use crate::template::{self, AggregatedUnit};
use crate::unit::{self, ProgramUnit};
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File changes computed for one unit
#[derive(Debug)]
struct UnitChanges {
    unit: ProgramUnit,
    files: Vec<(PathBuf, String, RecordStatus)>,
}

/// Drives generate and restore runs against a store
pub struct Generator<'a> {
    store: &'a dyn SourceStore,
    config: GeneratorConfig,
    names: EntryNames,
}

impl<'a> Generator<'a> {
    /// Generator with the default configuration
    pub fn new(store: &'a dyn SourceStore) -> Self {
        Self::with_config(store, GeneratorConfig::default())
    }

    pub fn with_config(store: &'a dyn SourceStore, config: GeneratorConfig) -> Self {
        let names = config.entry_names();
        Self {
            store,
            config,
            names,
        }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Compute every change needed to embed `unit_dirs` into a multi-call
    /// binary whose main lives in `aggregator_dir` (none when `None`)
    pub fn generate<P: AsRef<Path> + Sync>(
        &self,
        aggregator_dir: Option<&Path>,
        unit_dirs: &[P],
    ) -> SourceLedger {
        info!("Generating {} unit(s)", unit_dirs.len());
        let outcomes: Vec<(PathBuf, Result<UnitChanges>)> = unit_dirs
            .par_iter()
            .map(|dir| (dir.as_ref().to_path_buf(), self.generate_unit(dir.as_ref())))
            .collect();

        let mut ledger = SourceLedger::new();
        let units = record_outcomes(&mut ledger, outcomes);

        if let Some(aggregator_dir) = aggregator_dir.filter(|d| !d.as_os_str().is_empty())
            && !units.is_empty()
        {
            let listed: Vec<AggregatedUnit> = units
                .iter()
                .map(|unit| AggregatedUnit {
                    module: unit.name.module.clone(),
                    import_path: unit::relative_path(
                        aggregator_dir,
                        &unit.autoregister_path(&self.config.autoregister_suffix),
                    ),
                })
                .collect();
            let path = unit::aggregator_path(aggregator_dir);
            match template::render_aggregator(&listed, &self.config) {
                Ok(text) => ledger.add(path, text, RecordStatus::Added),
                Err(e) => ledger.add_failure(path, e),
            }
        }

        ledger
    }

    /// Compute every change needed to undo [`Generator::generate`]
    pub fn restore<P: AsRef<Path> + Sync>(
        &self,
        aggregator_dir: Option<&Path>,
        unit_dirs: &[P],
    ) -> SourceLedger {
        info!("Restoring {} unit(s)", unit_dirs.len());
        let outcomes: Vec<(PathBuf, Result<UnitChanges>)> = unit_dirs
            .par_iter()
            .map(|dir| (dir.as_ref().to_path_buf(), self.restore_unit(dir.as_ref())))
            .collect();

        let mut ledger = SourceLedger::new();
        let units = record_outcomes(&mut ledger, outcomes);

        if let Some(aggregator_dir) = aggregator_dir.filter(|d| !d.as_os_str().is_empty())
            && !units.is_empty()
        {
            ledger.remove(unit::aggregator_path(aggregator_dir));
        }

        ledger
    }

    fn generate_unit(&self, dir: &Path) -> Result<UnitChanges> {
        let unit = ProgramUnit::new(dir)?;
        let parsed = parser::parse_unit(self.store, dir, &self.names)?;
        let module = &unit.name.module;

        let entry = match parsed.form {
            EntryForm::Embedded if parsed.module_name == *module => {
                debug!("{} is already embedded, re-deriving outputs", dir.display());
                parsed.source.clone()
            }
            _ => renamer::embed(source_file(&parsed), module, &self.names)?,
        };

        let entry_file = unit::relative_path(dir, &parsed.entry_path);
        let auto_register = template::render_auto_register(&unit.name, &entry_file, &self.config)?;
        let standalone = template::render_standalone(
            &unit.standalone_import_path(&parsed.entry_path),
            &unit.name,
            &self.config,
        )?;

        let files = vec![
            (parsed.entry_path.clone(), entry, RecordStatus::Modified),
            (
                unit.autoregister_path(&self.config.autoregister_suffix),
                auto_register,
                RecordStatus::Added,
            ),
            (unit.standalone_path(), standalone, RecordStatus::Added),
        ];
        debug!("Generated {} file(s) for {}", files.len(), dir.display());
        Ok(UnitChanges { unit, files })
    }

    fn restore_unit(&self, dir: &Path) -> Result<UnitChanges> {
        let unit = ProgramUnit::new(dir)?;
        let parsed = parser::parse_unit(self.store, dir, &self.names)?;
        if parsed.form != EntryForm::Embedded {
            return Err(Error::EntryNotFound {
                dir: dir.to_path_buf(),
                expected: self.names.embedded.clone(),
            });
        }

        let restored = renamer::unembed(source_file(&parsed), DEFAULT_MODULE, &self.names)?;
        let files = vec![
            (parsed.entry_path.clone(), restored, RecordStatus::Modified),
            (
                unit.autoregister_path(&self.config.autoregister_suffix),
                String::new(),
                RecordStatus::Removed,
            ),
            (unit.standalone_path(), String::new(), RecordStatus::Removed),
        ];
        debug!("Restored {} for {}", files[0].0.display(), dir.display());
        Ok(UnitChanges { unit, files })
    }
}

fn source_file(parsed: &ParsedUnit) -> SourceFile<'_> {
    SourceFile {
        path: &parsed.entry_path,
        text: &parsed.source,
        tree: &parsed.tree,
    }
}

/// Write per-unit outcomes into the ledger in argument order, returning the
/// units that succeeded
///
/// Two directories deriving the same module name would register twice in one
/// binary, so every repeat after the first is turned into a failure.
fn record_outcomes(
    ledger: &mut SourceLedger,
    outcomes: Vec<(PathBuf, Result<UnitChanges>)>,
) -> Vec<ProgramUnit> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut succeeded = Vec::new();

    for (dir, outcome) in outcomes {
        match outcome {
            Ok(changes) if !seen.insert(changes.unit.name.module.clone()) => {
                ledger.add_failure(
                    dir.clone(),
                    Error::InvalidUnit {
                        dir,
                        reason: format!("duplicate unit name `{}`", changes.unit.name.module),
                    },
                );
            }
            Ok(changes) => {
                for (path, content, status) in changes.files {
                    ledger.add(path, content, status);
                }
                succeeded.push(changes.unit);
            }
            Err(e) => ledger.add_failure(dir, e),
        }
    }

    succeeded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    const SAMPLE: &str = "fn main() {\n    println!(\"hi\");\n}\n";

    #[test]
    fn test_generate_single_unit_without_aggregator() {
        let store = MemoryStore::with_files([("apps/sample/main.rs", SAMPLE)]);
        let ledger = Generator::new(&store).generate(None, &["apps/sample"]);

        assert!(ledger.single_error().is_none());
        assert_eq!(
            ledger.filenames(),
            vec![
                Path::new("apps/sample/main.rs"),
                Path::new("apps/sample/sample_autoregister.rs"),
                Path::new("apps/sample/sample/main.rs"),
            ]
        );
    }

    #[test]
    fn test_empty_aggregator_dir_is_ignored() {
        let store = MemoryStore::with_files([("apps/sample/main.rs", SAMPLE)]);
        let ledger = Generator::new(&store).generate(Some(Path::new("")), &["apps/sample"]);
        assert_eq!(ledger.filenames().len(), 3);
    }

    #[test]
    fn test_no_aggregator_when_every_unit_fails() {
        let store = MemoryStore::with_files([("apps/bad/main.rs", "fn main( {")]);
        let ledger = Generator::new(&store).generate(Some(Path::new("bin")), &["apps/bad"]);
        assert!(ledger.filenames().is_empty());
        assert_eq!(ledger.errors().len(), 1);
    }

    #[test]
    fn test_duplicate_unit_names_fail_the_repeat() {
        let store = MemoryStore::with_files([
            ("a/tool/main.rs", SAMPLE),
            ("b/tool/main.rs", SAMPLE),
        ]);
        let ledger = Generator::new(&store).generate(Some(Path::new("bin")), &["a/tool", "b/tool"]);

        let errors = ledger.errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].0, Path::new("b/tool"));
        assert!(ledger.source("bin/main.rs").contains("mod tool;"));
        assert_eq!(ledger.source("b/tool/main.rs"), "");
    }

    #[test]
    fn test_restore_rejects_standalone_unit() {
        let store = MemoryStore::with_files([("apps/sample/main.rs", SAMPLE)]);
        let ledger = Generator::new(&store).restore(None, &["apps/sample"]);
        let errors = ledger.errors();
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            errors[0].1,
            Error::EntryNotFound { expected, .. } if expected == "app_main"
        ));
    }

    #[test]
    fn test_visible_main_is_refused() {
        let store = MemoryStore::with_files([("apps/sample/main.rs", "pub fn main() {}\n")]);
        let ledger = Generator::new(&store).generate(None, &["apps/sample"]);
        assert!(ledger.filenames().is_empty());
        assert!(matches!(ledger.errors()[0].1, Error::InvalidUnit { .. }));
    }

    #[test]
    fn test_invalid_unit_name_is_recorded() {
        let store = MemoryStore::with_files([("apps/2048/main.rs", SAMPLE)]);
        let ledger = Generator::new(&store).generate(None, &["apps/2048"]);
        assert!(matches!(ledger.errors()[0].1, Error::InvalidUnit { .. }));
    }
}
