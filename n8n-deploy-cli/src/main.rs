//! Main entry point for the n8n-deploy CLI.
//!
//! This is the command-line interface for resolving `system.yaml` and
//! synthesizing deployment plans:
//! - `synth`: Compose one environment and emit its resource plan
//! - `show`: Print the resolved configuration of one environment
//! - `validate`: Validate the configuration document
//! - `list-environments` and `list-stack-types`: Inspect the document
//! - `init`: Write an example configuration document

mod cli;
mod commands;
mod error;
mod utils;

use clap::Parser;
use cli::Cli;
use utils::GlobalOptions;

fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    n8n_deploy::init_logger(cli.verbose, cli.quiet).install();

    let global = GlobalOptions {
        verbose: cli.verbose,
        quiet: cli.quiet,
        config: cli.config,
    };

    // Execute the command
    let result = match cli.command {
        cli::Command::Synth(cmd) => cmd.execute(&global),
        cli::Command::Show(cmd) => cmd.execute(&global),
        cli::Command::Validate(cmd) => cmd.execute(&global),
        cli::Command::ListEnvironments(cmd) => cmd.execute(&global),
        cli::Command::ListStackTypes(cmd) => cmd.execute(&global),
        cli::Command::Init(cmd) => cmd.execute(&global),
        cli::Command::Completions(cmd) => cmd.execute(&global),
    };

    // Handle errors and set exit code
    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}
