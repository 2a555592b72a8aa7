//! Init command implementation.
//!
//! This module implements the `init` command, which writes the bundled
//! example configuration document.

use crate::error::CliError;
use crate::utils::GlobalOptions;
use clap::Parser;
use n8n_deploy::config::{ConfigLoader, DEFAULT_EXAMPLE_FILE};
use std::path::PathBuf;

/// Write an example configuration document.
#[derive(Parser)]
#[command(about = "Write an example configuration document")]
pub struct InitCommand {
    /// Where to write the example
    #[arg(long, short = 'o', value_name = "PATH", default_value = DEFAULT_EXAMPLE_FILE)]
    output: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    force: bool,

    /// Print the example to stdout instead of writing it
    #[arg(long)]
    dry_run: bool,
}

impl InitCommand {
    /// Execute the init command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        if self.dry_run {
            print!("{}", ConfigLoader::example_config());
            return Ok(());
        }

        if self.output.exists() && !self.force {
            return Err(CliError::SemanticFailure(format!(
                "{} already exists (use --force to overwrite)",
                self.output.display()
            )));
        }

        ConfigLoader::generate_example_config(&self.output)?;

        if !global.quiet {
            eprintln!("Wrote example configuration to {}", self.output.display());
            eprintln!("Copy it to system.yaml and adjust the account ids to get started");
        }
        Ok(())
    }
}
