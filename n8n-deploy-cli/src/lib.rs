//! Library exports for n8n-deploy-cli.
//!
//! This module exports the CLI structure for use by documentation tooling
//! such as man page and completion generators.

pub mod cli;
pub mod commands;
pub mod error;
pub mod utils;

pub use cli::Cli;
