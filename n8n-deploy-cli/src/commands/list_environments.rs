//! List environments command implementation.
//!
//! This module implements the `list-environments` command, which prints
//! the environments defined by the configuration document.

use crate::error::CliError;
use crate::utils::{loader, GlobalOptions};
use clap::Parser;
use std::io::Write;

/// List the environments defined by the configuration document.
#[derive(Parser)]
#[command(about = "List the environments defined by the configuration document")]
pub struct ListEnvironmentsCommand {
    /// Also print the account and region of each environment
    #[arg(long)]
    pub long: bool,
}

impl ListEnvironmentsCommand {
    /// Execute the list-environments command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let loader = loader(global);
        let config = loader.config()?;

        // Output one per line to stdout
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();

        for (name, env) in &config.environments {
            if self.long {
                writeln!(handle, "{name}\t{}\t{}", env.account, env.region)?;
            } else {
                writeln!(handle, "{name}")?;
            }
        }

        Ok(())
    }
}
