// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Path to a file under `tests/fixtures/`
pub fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

pub fn read_fixture(name: &str) -> String {
    fs::read_to_string(fixture_path(name)).unwrap()
}

/// Write `content` to `name` in a fresh temp directory.
///
/// Returns (TempDir, path) - keep the TempDir alive to prevent cleanup.
pub fn write_temp(name: &str, content: &str) -> (TempDir, PathBuf) {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join(name);
    fs::write(&path, content).unwrap();
    (temp_dir, path)
}

/// Copy a fixture into a fresh temp directory.
pub fn copy_fixture(name: &str) -> (TempDir, PathBuf) {
    write_temp(name, &read_fixture(name))
}

pub fn lines(content: &str) -> Vec<String> {
    content.lines().map(str::to_string).collect()
}
