//! Shell completion generation command.
//!
//! This module provides the `completions` command which generates shell
//! completion scripts for the shells supported by `clap_complete`.

use crate::cli::Cli;
use crate::error::CliError;
use crate::utils::GlobalOptions;
use clap::{CommandFactory, Parser};
use clap_complete::{generate, Shell};
use std::io;

/// Name of the installed binary
const BIN_NAME: &str = "n8n-deploy";

/// Generate shell completion scripts
#[derive(Parser)]
pub struct CompletionsCommand {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Where the generated script is usually installed.
fn install_hint(shell: Shell) -> Option<&'static str> {
    match shell {
        Shell::Bash => Some(
            "n8n-deploy completions bash > ~/.local/share/bash-completion/completions/n8n-deploy",
        ),
        Shell::Zsh => Some("n8n-deploy completions zsh > ~/.zsh/completions/_n8n-deploy"),
        Shell::Fish => {
            Some("n8n-deploy completions fish > ~/.config/fish/completions/n8n-deploy.fish")
        }
        Shell::PowerShell => {
            Some("n8n-deploy completions powershell | Out-String | Invoke-Expression")
        }
        _ => None,
    }
}

impl CompletionsCommand {
    /// Execute the completions command.
    pub fn execute(&self, global: &GlobalOptions) -> Result<(), CliError> {
        if !global.quiet {
            if let Some(hint) = install_hint(self.shell) {
                eprintln!("# Install with:");
                eprintln!("#   {hint}");
            }
        }

        let mut cmd = Cli::command();
        generate(self.shell, &mut cmd, BIN_NAME, &mut io::stdout());
        Ok(())
    }
}
