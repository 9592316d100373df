// tests/common/mod.rs

//! Shared fixtures for the generate and restore integration suites.

#![allow(dead_code)]

use multibin::MemoryStore;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// The stock example program
pub const SAMPLE: &str = r#"//! Sample code
// Sample code
use std::env;

/// sample shows the calling args
fn main() {
    // print them
    println!("Sample does some stuff, here args are {:?}", env::args().collect::<Vec<_>>());
}
"#;

/// A second program with a helper module file next to its entry
pub const OTHER: &str = r#"mod helpers;

// greet, then exit cleanly
fn main() -> std::process::ExitCode {
    helpers::greet("other");
    std::process::ExitCode::SUCCESS
}
"#;

pub const OTHER_HELPERS: &str = r#"pub fn greet(who: &str) {
    println!("hello from {who}");
}
"#;

/// Canonical (prettyplease) text of a source file
pub fn canonical(source: &str) -> String {
    prettyplease::unparse(&syn::parse_file(source).unwrap())
}

/// Memory store holding `apps/sample` and `apps/other`
pub fn sample_store() -> MemoryStore {
    MemoryStore::with_files([
        ("apps/sample/main.rs", SAMPLE),
        ("apps/other/other.rs", OTHER),
        ("apps/other/helpers.rs", OTHER_HELPERS),
    ])
}

/// Temp directory laid out like [`sample_store`]
///
/// Returns the TempDir: keep it alive to prevent cleanup.
pub fn sample_tree() -> TempDir {
    let temp_dir = tempfile::tempdir().unwrap();
    write(temp_dir.path(), "apps/sample/main.rs", SAMPLE);
    write(temp_dir.path(), "apps/other/other.rs", OTHER);
    write(temp_dir.path(), "apps/other/helpers.rs", OTHER_HELPERS);
    temp_dir
}

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}
