// tests/restore.rs

//! Integration tests for restore runs and generate/restore round trips

mod common;

use common::{sample_store, sample_tree, OTHER, OTHER_HELPERS, SAMPLE};
use multibin::{Error, FsStore, Generator, MemoryStore, RecordStatus, TOMBSTONE};
use std::fs;
use std::path::Path;

#[test]
fn test_restore_records() {
    let store = sample_store();
    let generator = Generator::new(&store);
    generator
        .generate(Some(Path::new("bin")), &["apps/sample"])
        .apply(&store)
        .unwrap();

    let ledger = generator.restore(Some(Path::new("bin")), &["apps/sample"]);
    assert!(ledger.single_error().is_none());
    assert_eq!(ledger.source("apps/sample/main.rs"), SAMPLE);
    assert_eq!(ledger.source("apps/sample/sample_autoregister.rs"), TOMBSTONE);
    assert_eq!(ledger.source("apps/sample/sample/main.rs"), TOMBSTONE);
    assert_eq!(ledger.source("bin/main.rs"), TOMBSTONE);

    let statuses: Vec<RecordStatus> = ledger.records().iter().map(|r| r.status).collect();
    assert_eq!(
        statuses,
        vec![
            RecordStatus::Modified,
            RecordStatus::Removed,
            RecordStatus::Removed,
            RecordStatus::Removed,
        ]
    );
}

#[test]
fn test_round_trip_in_memory() {
    let store = sample_store();
    let generator = Generator::new(&store);
    let dirs = ["apps/sample", "apps/other"];

    generator.generate(Some(Path::new("bin")), &dirs).apply(&store).unwrap();
    assert_eq!(store.len(), 8);

    generator.restore(Some(Path::new("bin")), &dirs).apply(&store).unwrap();
    assert_eq!(
        store.paths(),
        vec![
            Path::new("apps/other/helpers.rs").to_path_buf(),
            Path::new("apps/other/other.rs").to_path_buf(),
            Path::new("apps/sample/main.rs").to_path_buf(),
        ]
    );
    assert_eq!(store.get(Path::new("apps/sample/main.rs")).unwrap(), SAMPLE);
    assert_eq!(store.get(Path::new("apps/other/other.rs")).unwrap(), OTHER);
    assert_eq!(
        store.get(Path::new("apps/other/helpers.rs")).unwrap(),
        OTHER_HELPERS
    );
}

#[test]
fn test_round_trip_on_disk() {
    let tree = sample_tree();
    let root = tree.path();
    let store = FsStore::new();
    let generator = Generator::new(&store);
    let dirs = [root.join("apps/sample"), root.join("apps/other")];
    let bin = root.join("bin");

    generator.generate(Some(bin.as_path()), &dirs).apply(&store).unwrap();
    generator.restore(Some(bin.as_path()), &dirs).apply(&store).unwrap();

    assert_eq!(
        fs::read_to_string(root.join("apps/sample/main.rs")).unwrap(),
        SAMPLE
    );
    assert_eq!(
        fs::read_to_string(root.join("apps/other/other.rs")).unwrap(),
        OTHER
    );
    assert!(!root.join("apps/sample/sample_autoregister.rs").exists());
    assert!(!root.join("apps/sample/sample/main.rs").exists());
    assert!(!root.join("apps/other/other_autoregister.rs").exists());
    assert!(!bin.join("main.rs").exists());

    // Directories created by generate are gone again
    assert!(!root.join("apps/sample/sample").exists());
    assert!(!root.join("apps/other/other").exists());
    assert!(!bin.exists());
    let mut left: Vec<String> = walkdir::WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .map(|entry| {
            let entry = entry.unwrap();
            let relative = entry.path().strip_prefix(root).unwrap();
            relative.to_string_lossy().replace('\\', "/")
        })
        .collect();
    left.sort();
    assert_eq!(
        left,
        vec![
            "apps",
            "apps/other",
            "apps/other/helpers.rs",
            "apps/other/other.rs",
            "apps/sample",
            "apps/sample/main.rs",
        ]
    );
}

#[test]
fn test_restore_of_standalone_unit_fails() {
    let store = MemoryStore::with_files([("apps/sample/main.rs", SAMPLE)]);
    let ledger = Generator::new(&store).restore(Some(Path::new("bin")), &["apps/sample"]);

    assert!(ledger.filenames().is_empty());
    let errors = ledger.errors();
    assert_eq!(errors.len(), 1);
    assert!(matches!(errors[0].1, Error::EntryNotFound { .. }));
}

#[test]
fn test_restore_continues_past_failures() {
    let store = sample_store();
    let generator = Generator::new(&store);
    generator.generate(None, &["apps/sample"]).apply(&store).unwrap();

    // apps/other was never generated
    let ledger = generator.restore(None, &["apps/other", "apps/sample"]);
    assert_eq!(ledger.errors().len(), 1);
    assert_eq!(ledger.errors()[0].0, Path::new("apps/other"));
    assert_eq!(ledger.source("apps/sample/main.rs"), SAMPLE);
}
