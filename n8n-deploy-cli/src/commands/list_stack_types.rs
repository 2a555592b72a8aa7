//! List stack types command implementation.
//!
//! This module implements the `list-stack-types` command, which prints the
//! stack-type presets defined by the configuration document.

use crate::error::CliError;
use crate::utils::{loader, GlobalOptions};
use clap::Parser;
use std::io::Write;

/// List the stack-type presets defined by the configuration document.
#[derive(Parser)]
#[command(about = "List the stack-type presets defined by the configuration document")]
pub struct ListStackTypesCommand {
    /// Also print each preset's description and components
    #[arg(long)]
    pub long: bool,
}

impl ListStackTypesCommand {
    /// Execute the list-stack-types command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let loader = loader(global);
        let config = loader.config()?;

        let stdout = std::io::stdout();
        let mut handle = stdout.lock();

        for (stack_type, preset) in config.stacks.iter().flatten() {
            if self.long {
                writeln!(
                    handle,
                    "{stack_type}\t{}\t{}",
                    preset.description,
                    preset.components.join(",")
                )?;
            } else {
                writeln!(handle, "{stack_type}")?;
            }
        }

        Ok(())
    }
}
