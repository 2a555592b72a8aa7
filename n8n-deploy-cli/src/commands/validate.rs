//! Command to validate an n8n-deploy configuration document.

use crate::error::CliError;
use crate::utils::{loader, GlobalOptions};
use clap::Args;

/// Validate the configuration document.
#[derive(Args)]
pub struct ValidateCommand {
    /// Also resolve every environment through defaults and re-validate it
    #[arg(long)]
    pub resolve: bool,
}

impl ValidateCommand {
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let loader = loader(global);

        // 1. Parse and validate the whole document
        let path = loader.validate_config_file()?;

        // 2. Optionally resolve each environment
        if self.resolve {
            for environment in loader.available_environments()? {
                loader.load_config(&environment, None, None)?;
                log::debug!("environment '{environment}' resolves");
            }
        }

        if !global.quiet {
            let environments = loader.available_environments()?;
            println!(
                "Configuration is valid: {} ({} environments)",
                path.display(),
                environments.len()
            );
        }
        Ok(())
    }
}
