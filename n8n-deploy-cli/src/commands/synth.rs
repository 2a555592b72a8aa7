//! Synth command implementation.
//!
//! This module implements the `synth` command, which resolves one
//! environment, composes its stacks, and emits the resource plan as JSON.

use crate::error::CliError;
use crate::utils::{loader, parse_overrides, parse_stack_type, require_environment, GlobalOptions};
use clap::Parser;
use n8n_deploy::{PlanBackend, StackComposer};
use std::io::Write;
use std::path::PathBuf;

/// Synthesize the resource plan of one environment.
#[derive(Parser)]
#[command(about = "Synthesize the resource plan of one environment")]
pub struct SynthCommand {
    /// Environment to synthesize
    #[arg(long = "env", short = 'e', value_name = "ENV")]
    pub environment: Option<String>,

    /// Stack-type preset to apply
    #[arg(long, short = 't', value_name = "TYPE")]
    pub stack_type: Option<String>,

    /// Override a setting (`key=value`, value parsed as YAML)
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub overrides: Vec<String>,

    /// Write the plan to a file instead of stdout
    #[arg(long, short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,
}

impl SynthCommand {
    /// Execute the synth command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        // 1. Resolve the environment
        let loader = loader(global);
        let environment = require_environment(&loader, self.environment)?;
        let overrides = parse_overrides(&self.overrides)?;
        let config =
            loader.load_config(&environment, self.stack_type.as_deref(), Some(&overrides))?;
        let stack_type = parse_stack_type(self.stack_type.as_deref())?;

        // 2. Compose the stacks
        let mut backend = PlanBackend::new();
        let composition =
            StackComposer::new(&config, &environment, stack_type).compose(&mut backend)?;
        let plan = backend.finish();

        // 3. Emit the plan
        match self.output {
            Some(path) => {
                plan.write_to(&path)?;
                if !global.quiet {
                    eprintln!(
                        "Synthesized {} stacks ({} resources) for '{environment}' into {}",
                        composition.stacks.len(),
                        plan.resource_count(),
                        path.display()
                    );
                }
            }
            None => {
                let json = plan.to_json_pretty()?;
                let stdout = std::io::stdout();
                let mut handle = stdout.lock();
                writeln!(handle, "{json}")?;
            }
        }

        log::debug!("stacks: {}", composition.stacks.join(", "));
        Ok(())
    }
}
