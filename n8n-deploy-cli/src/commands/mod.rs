//! CLI command implementations.
//!
//! This module contains the implementations of all CLI commands:
//! - `synth`: Compose one environment and emit its resource plan
//! - `show`: Print the resolved configuration of one environment
//! - `validate`: Validate the configuration document
//! - `list_environments`: List the environments of the document
//! - `list_stack_types`: List the stack-type presets of the document
//! - `init`: Write an example configuration document
//! - `completions`: Generate shell completion scripts

pub mod completions;
pub mod init;
pub mod list_environments;
pub mod list_stack_types;
pub mod show;
pub mod synth;
pub mod validate;

pub use completions::CompletionsCommand;
pub use init::InitCommand;
pub use list_environments::ListEnvironmentsCommand;
pub use list_stack_types::ListStackTypesCommand;
pub use show::ShowCommand;
pub use synth::SynthCommand;
pub use validate::ValidateCommand;
