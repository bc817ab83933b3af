//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::path::PathBuf;

use tempfile::TempDir;
use tracing_subscriber::EnvFilter;

/// Route library logs to the test output, filtered by `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Fresh directory plus a file name inside it.
pub fn scratch(name: &str) -> (TempDir, PathBuf) {
    init_tracing();
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join(name);
    (dir, path)
}
