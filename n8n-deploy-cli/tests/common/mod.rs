//! Common test utilities for CLI integration tests.
//!
//! This module provides shared helpers for CLI testing, including:
//! - Test environment setup with temporary directories
//! - Command builders pointed at the environment's document
//! - Configuration fixtures

use assert_cmd::Command;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A small document with a development and a production environment.
#[allow(dead_code)]
pub const TWO_ENVIRONMENTS: &str = r#"
global:
  project_name: n8n
  organization: acme
environments:
  dev:
    account: "123456789012"
    region: us-east-1
    settings:
      networking: { vpc_cidr: 10.0.0.0/16 }
  production:
    account: "123456789013"
    region: us-west-2
    settings:
      database: { type: postgres }
stacks:
  minimal:
    description: Minimal setup
    components: [network, storage, compute, access]
"#;

/// Test environment with an isolated working directory.
pub struct TestEnv {
    /// Temporary directory (kept alive for the duration of the test)
    #[allow(dead_code)]
    temp_dir: TempDir,
    /// Path to the temporary directory
    pub temp_path: PathBuf,
}

#[allow(dead_code)]
impl TestEnv {
    /// Create a new, empty test environment.
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let temp_path = temp_dir.path().to_path_buf();
        Self {
            temp_dir,
            temp_path,
        }
    }

    /// Create a test environment whose `system.yaml` holds `contents`.
    pub fn with_config(contents: &str) -> Self {
        let env = Self::new();
        env.write_file("system.yaml", contents);
        env
    }

    /// Create a test environment holding the bundled example as `system.yaml`.
    pub fn with_example() -> Self {
        let env = Self::new();
        n8n_deploy::ConfigLoader::generate_example_config(&env.config_path())
            .expect("Failed to write example config");
        env
    }

    /// Path of the environment's `system.yaml`.
    pub fn config_path(&self) -> PathBuf {
        self.temp_path.join("system.yaml")
    }

    /// Get a command builder running inside the test environment.
    ///
    /// The configuration variable is cleared so the default lookup applies.
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("n8n-deploy").expect("Failed to find n8n-deploy binary");
        cmd.current_dir(&self.temp_path)
            .env_remove("N8N_DEPLOY_CONFIG")
            .env_remove("N8N_DEPLOY_LOG_MODE");
        cmd
    }

    /// Get the temp path.
    pub fn path(&self) -> &Path {
        &self.temp_path
    }

    /// Write a file relative to the test environment.
    pub fn write_file(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_path.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(&path, contents).expect("Failed to write test file");
        path
    }
}
