//! Common test utilities for integration tests.
//!
//! This module provides helper functions and configuration fixtures for
//! testing the n8n-deploy library.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A minimal document with one development environment.
#[allow(dead_code)]
pub const MINIMAL_DOCUMENT: &str = r#"
global:
  project_name: n8n
  organization: acme
environments:
  dev:
    account: "123456789012"
    region: us-east-1
    settings: {}
"#;

/// Writes `contents` as `system.yaml` into `dir` and returns its path.
#[allow(dead_code)]
pub fn write_config(dir: &Path, contents: &str) -> PathBuf {
    let path = dir.join("system.yaml");
    fs::write(&path, contents).unwrap();
    path
}

/// Creates a temporary directory holding the bundled example document.
#[allow(dead_code)]
pub fn example_dir() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("system.yaml");
    n8n_deploy::ConfigLoader::generate_example_config(&path).unwrap();
    (dir, path)
}

/// Builds a document with a single `production` environment whose
/// `settings` block is `settings` (inline YAML).
#[allow(dead_code)]
pub fn production_document(settings: &str) -> String {
    format!(
        r#"
global:
  project_name: n8n
  organization: acme
defaults:
  fargate: {{ cpu: 512, memory: 1024 }}
  monitoring: {{ log_retention_days: 14 }}
  backup: {{ enabled: true, retention_days: 7 }}
environments:
  production:
    account: "123456789012"
    region: us-west-2
    settings: {settings}
"#
    )
}
