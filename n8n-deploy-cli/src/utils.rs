//! Utility functions for CLI operations.
//!
//! This module provides common helpers used across CLI commands, including
//! loader construction, environment selection, and override parsing.

use crate::error::CliError;
use n8n_deploy::config::{ConfigLoader, Overrides, StackType};
use std::path::PathBuf;

/// Global CLI options shared across all commands.
#[derive(Debug, Clone)]
#[allow(dead_code)] // Fields used via pattern matching in main.rs
pub struct GlobalOptions {
    /// Enable verbose output.
    pub verbose: bool,

    /// Suppress non-essential output.
    pub quiet: bool,

    /// Configuration document to load.
    pub config: PathBuf,
}

/// Create a loader for the configured document.
pub fn loader(global: &GlobalOptions) -> ConfigLoader {
    ConfigLoader::new(&global.config)
}

/// Return the requested environment, or list the available ones.
///
/// When no environment was given, the environments defined by the document
/// are printed to stderr and an argument error is returned.
pub fn require_environment(
    loader: &ConfigLoader,
    environment: Option<String>,
) -> Result<String, CliError> {
    if let Some(environment) = environment {
        return Ok(environment);
    }

    let available = loader.available_environments()?;
    eprintln!("Available environments:");
    for name in &available {
        eprintln!("  {name}");
    }
    Err(CliError::InvalidArguments(
        "--env is required (choose one of the environments above)".to_string(),
    ))
}

/// Parse an optional stack type name.
pub fn parse_stack_type(name: Option<&str>) -> Result<Option<StackType>, CliError> {
    name.map(|name| name.parse::<StackType>().map_err(CliError::InvalidArguments))
        .transpose()
}

/// Parse `key=value` assignments into overrides.
pub fn parse_overrides(assignments: &[String]) -> Result<Overrides, CliError> {
    let mut overrides = Overrides::new();
    for assignment in assignments {
        overrides
            .set_assignment(assignment)
            .map_err(|e| CliError::InvalidArguments(e.to_string()))?;
    }
    Ok(overrides)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_overrides() {
        let overrides =
            parse_overrides(&["scaling={min_tasks: 1, max_tasks: 2}".to_string()]).unwrap();
        assert_eq!(overrides.len(), 1);

        let err = parse_overrides(&["no-equals-sign".to_string()]).unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn test_parse_stack_type() {
        assert_eq!(parse_stack_type(None).unwrap(), None);
        assert_eq!(
            parse_stack_type(Some("enterprise")).unwrap(),
            Some(StackType::Enterprise)
        );
        assert!(parse_stack_type(Some("huge")).is_err());
    }
}
