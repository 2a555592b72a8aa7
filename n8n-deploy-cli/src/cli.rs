//! CLI structure and command definitions.
//!
//! This module defines the main CLI structure using clap's derive macros,
//! including global options and subcommands.

use crate::commands::{
    CompletionsCommand, InitCommand, ListEnvironmentsCommand, ListStackTypesCommand,
    ShowCommand, SynthCommand, ValidateCommand,
};
use clap::{Parser, Subcommand};
use n8n_deploy::config::DEFAULT_CONFIG_FILE;
use std::path::PathBuf;

/// Command-line tool for synthesizing n8n deployment plans.
#[derive(Parser)]
#[command(name = "n8n-deploy")]
#[command(version, about = "Synthesize n8n deployment plans from system.yaml", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Configuration document (searched for in parent directories)
    #[arg(
        long,
        value_name = "PATH",
        global = true,
        env = "N8N_DEPLOY_CONFIG",
        default_value = DEFAULT_CONFIG_FILE
    )]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand)]
pub enum Command {
    /// Compose one environment and emit its resource plan
    Synth(SynthCommand),

    /// Print the resolved configuration of one environment
    Show(ShowCommand),

    /// Validate the configuration document
    Validate(ValidateCommand),

    /// List the environments of the document
    ListEnvironments(ListEnvironmentsCommand),

    /// List the stack-type presets of the document
    ListStackTypes(ListStackTypesCommand),

    /// Write an example configuration document
    Init(InitCommand),

    /// Generate shell completion scripts
    Completions(CompletionsCommand),
}
