//! Show command implementation.
//!
//! This module implements the `show` command, which prints the fully
//! resolved configuration of one environment.

use crate::error::CliError;
use crate::utils::{loader, parse_overrides, require_environment, GlobalOptions};
use clap::{Parser, ValueEnum};
use std::io::Write;

/// Output format of the resolved configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ShowFormat {
    /// YAML, in the shape of `system.yaml`
    #[default]
    Yaml,
    /// Pretty-printed JSON
    Json,
}

/// Print the resolved configuration of one environment.
#[derive(Parser)]
#[command(about = "Print the resolved configuration of one environment")]
pub struct ShowCommand {
    /// Environment to resolve
    #[arg(long = "env", short = 'e', value_name = "ENV")]
    pub environment: Option<String>,

    /// Stack-type preset to apply
    #[arg(long, short = 't', value_name = "TYPE")]
    pub stack_type: Option<String>,

    /// Override a setting (`key=value`, value parsed as YAML)
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub overrides: Vec<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = ShowFormat::Yaml)]
    pub format: ShowFormat,
}

impl ShowCommand {
    /// Execute the show command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let loader = loader(global);
        let environment = require_environment(&loader, self.environment)?;
        let overrides = parse_overrides(&self.overrides)?;
        let config =
            loader.load_config(&environment, self.stack_type.as_deref(), Some(&overrides))?;

        let rendered = match self.format {
            ShowFormat::Yaml => {
                serde_yaml::to_string(&config).map_err(|e| CliError::Output(e.to_string()))?
            }
            ShowFormat::Json => serde_json::to_string_pretty(&config)
                .map_err(|e| CliError::Output(e.to_string()))?,
        };

        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        write!(handle, "{rendered}")?;
        if !rendered.ends_with('\n') {
            writeln!(handle)?;
        }
        Ok(())
    }
}
