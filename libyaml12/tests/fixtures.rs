//! Test harness for the loader against fixture files.
//!
//! Every test/yaml/*.yaml stream must load. When test/events/<name>.events
//! exists, the event dump of the stream must match it line for line.
//! Every test/nay/*.yaml stream must fail; when test/nay/<name>.error exists
//! it holds the name of the expected error kind.

use std::fs;
use std::path::{Path, PathBuf};

use libyaml12::{dump_events, load_all, Value};

/// Root test directory.
fn test_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .join("test")
}

/// All files matching `pattern` under test/, sorted.
fn fixture_files(pattern: &str) -> Vec<PathBuf> {
    let pattern = test_root().join(pattern);
    let mut files: Vec<PathBuf> = glob::glob(&pattern.to_string_lossy())
        .expect("valid glob pattern")
        .flatten()
        .collect();
    files.sort();
    files
}

fn stem(path: &Path) -> String {
    path.file_stem().unwrap().to_string_lossy().to_string()
}

fn load_stream(bytes: &[u8]) -> libyaml12::Result<Vec<Value>> {
    load_all(bytes).collect()
}

/// Run a single loadable fixture.
fn run_yaml_test(path: &Path) -> Result<(), String> {
    let filename = path.file_name().unwrap().to_string_lossy().to_string();
    let content = fs::read(path).map_err(|e| format!("Failed to read {}: {}", filename, e))?;

    let docs = load_stream(&content)
        .map_err(|e| format!("{}: Unexpected load error: {}", filename, e))?;

    let events_path = test_root()
        .join("events")
        .join(format!("{}.events", stem(path)));
    if let Ok(expected) = fs::read_to_string(&events_path) {
        let actual = dump_events(&content)
            .map_err(|e| format!("{}: Unexpected parse error: {}", filename, e))?;
        if actual.trim_end() != expected.trim_end() {
            return Err(format!(
                "{}: Event mismatch\n    expected:\n{}\n    actual:\n{}",
                filename, expected, actual
            ));
        }
    }
    println!("  {} => {:?}", filename, docs);
    Ok(())
}

/// Run a single fixture that must fail.
fn run_nay_test(path: &Path) -> Result<(), String> {
    let filename = path.file_name().unwrap().to_string_lossy().to_string();
    let content = fs::read(path).map_err(|e| format!("Failed to read {}: {}", filename, e))?;

    match load_stream(&content) {
        Ok(docs) => Err(format!(
            "{}: Expected load error, but got success: {:?}",
            filename, docs
        )),
        Err(e) => {
            let error_path = path.with_extension("error");
            match fs::read_to_string(error_path) {
                Ok(expected) if expected.trim() != e.kind().name() => Err(format!(
                    "{}: Error mismatch\n    expected: {}\n    actual:   {} ({})",
                    filename,
                    expected.trim(),
                    e.kind().name(),
                    e
                )),
                Ok(_) => {
                    println!("  {} => {} (as expected)", filename, e.kind());
                    Ok(())
                }
                Err(_) => {
                    println!("  {} => error: {} (no .error file to compare)", filename, e);
                    Ok(())
                }
            }
        }
    }
}

fn run_all(files: &[PathBuf], run: fn(&Path) -> Result<(), String>, label: &str) {
    assert!(!files.is_empty(), "no {} fixtures found", label);
    println!("\nRunning {} {} fixtures:", files.len(), label);

    let mut passed = 0;
    let mut errors: Vec<String> = Vec::new();

    for file in files {
        match run(file) {
            Ok(()) => passed += 1,
            Err(e) => errors.push(e),
        }
    }

    println!("\nResults: {} passed, {} failed", passed, errors.len());

    if !errors.is_empty() {
        println!("\nErrors:");
        for error in &errors {
            println!("  - {}", error);
        }
    }

    assert!(errors.is_empty(), "{} {} fixtures failed", errors.len(), label);
}

#[test]
fn test_all_yaml_fixtures() {
    run_all(&fixture_files("yaml/*.yaml"), run_yaml_test, "yaml");
}

#[test]
fn test_all_nay_fixtures() {
    run_all(&fixture_files("nay/*.yaml"), run_nay_test, "nay");
}

#[test]
fn test_every_events_file_has_a_stream() {
    for events in fixture_files("events/*.events") {
        let yaml = test_root().join("yaml").join(format!("{}.yaml", stem(&events)));
        assert!(yaml.exists(), "{} has no yaml fixture", events.display());
    }
}
