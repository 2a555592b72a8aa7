//! CLI-specific error types with exit codes.
//!
//! Library errors are wrapped and classified into the process exit codes
//! listed in [`exit`].

use n8n_deploy::Error as LibError;
use std::fmt;

/// Process exit codes.
pub mod exit {
    /// The command ran but refused to act (e.g. an existing init target).
    pub const SEMANTIC_FAILURE: i32 = 1;
    /// No configuration document was found.
    pub const CONFIG_NOT_FOUND: i32 = 2;
    /// The document failed to parse or validate.
    pub const CONFIG_INVALID: i32 = 3;
    /// Bad arguments, including unknown environments and stack types.
    pub const INVALID_ARGUMENTS: i32 = 4;
    /// Reading or writing a file failed.
    pub const IO: i32 = 5;
    /// Composition or output rendering failed.
    pub const COMPOSITION: i32 = 6;
}

/// Errors surfaced by CLI commands.
#[derive(Debug)]
pub enum CliError {
    /// Library error (wrapped).
    Library(LibError),

    /// Invalid command-line arguments.
    InvalidArguments(String),

    /// I/O error outside the library.
    Io(std::io::Error),

    /// Rendering the resolved configuration failed.
    Output(String),

    /// The command refused to act.
    SemanticFailure(String),
}

impl CliError {
    /// The exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Library(lib_err) => Self::library_exit_code(lib_err),
            CliError::InvalidArguments(_) => exit::INVALID_ARGUMENTS,
            CliError::Io(_) => exit::IO,
            CliError::Output(_) => exit::COMPOSITION,
            CliError::SemanticFailure(_) => exit::SEMANTIC_FAILURE,
        }
    }

    fn library_exit_code(err: &LibError) -> i32 {
        match err {
            LibError::ConfigNotFound { .. } => exit::CONFIG_NOT_FOUND,
            LibError::ConfigParse { .. }
            | LibError::ConfigInvalid { .. }
            | LibError::UnknownComponent { .. } => exit::CONFIG_INVALID,
            LibError::EnvironmentNotFound { .. } | LibError::StackTypeNotFound { .. } => {
                exit::INVALID_ARGUMENTS
            }
            LibError::Io(_) => exit::IO,
            _ => exit::COMPOSITION,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Library(e) => e.fmt(f),
            CliError::InvalidArguments(msg) => write!(f, "Invalid arguments: {msg}"),
            CliError::Io(e) => write!(f, "I/O error: {e}"),
            CliError::Output(msg) => write!(f, "Failed to render output: {msg}"),
            CliError::SemanticFailure(msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Library(e) => Some(e),
            CliError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<LibError> for CliError {
    fn from(e: LibError) -> Self {
        CliError::Library(e)
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e)
    }
}
