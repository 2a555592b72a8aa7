//! Error types for the n8n-deploy library.
//!
//! Every failure in configuration loading and stack composition is reported
//! through [`Error`]. None of them are retried: a missing document, an invalid
//! field or an unsatisfied component dependency is a deterministic user error.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for operations that may fail with an n8n-deploy error.
///
/// # Examples
///
/// ```
/// use n8n_deploy::{Error, Result};
///
/// fn example_operation() -> Result<String> {
///     Ok("dev".to_string())
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for the n8n-deploy library.
#[derive(Debug, Error)]
pub enum Error {
    /// The configuration document could not be located.
    #[error("configuration file '{}' not found", path.display())]
    ConfigNotFound {
        /// The path that was searched for.
        path: PathBuf,
    },

    /// The configuration document is not syntactically valid YAML.
    #[error("invalid YAML in {}: {message}", path.display())]
    ConfigParse {
        /// The document that failed to parse.
        path: PathBuf,
        /// The parser's description of the problem.
        message: String,
    },

    /// The configuration document failed schema validation.
    #[error("invalid configuration at '{field}': {message}")]
    ConfigInvalid {
        /// Dotted path of the offending field.
        field: String,
        /// The violated constraint.
        message: String,
    },

    /// The requested environment is not defined in the document.
    #[error("environment '{name}' not found in configuration (available: {})", list_or_none(available))]
    EnvironmentNotFound {
        /// The requested environment name.
        name: String,
        /// The environments the document does define.
        available: Vec<String>,
    },

    /// The requested stack type is not defined in the document.
    #[error("stack type '{name}' not found in configuration (available: {})", list_or_none(available))]
    StackTypeNotFound {
        /// The requested stack type name.
        name: String,
        /// The stack types the document does define.
        available: Vec<String>,
    },

    /// A components list names something that is not a known component.
    #[error("unknown component '{name}'")]
    UnknownComponent {
        /// The unrecognized component name.
        name: String,
    },

    /// A component was requested without one of its prerequisites.
    #[error("{component} stack requires {requires} stack")]
    DependencyUnsatisfied {
        /// The component that cannot be built.
        component: crate::compose::Component,
        /// The missing prerequisite.
        requires: crate::compose::Component,
    },

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A plan artifact could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn list_or_none(names: &[String]) -> String {
    if names.is_empty() {
        "none".to_string()
    } else {
        names.join(", ")
    }
}

impl Error {
    /// Shorthand for a [`Error::ConfigInvalid`] error.
    pub(crate) fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigInvalid {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Check if error indicates that something requested by name is absent.
    ///
    /// # Examples
    ///
    /// ```
    /// use n8n_deploy::Error;
    ///
    /// let err = Error::EnvironmentNotFound { name: "staging".into(), available: vec![] };
    /// assert!(err.is_not_found());
    /// ```
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ConfigNotFound { .. }
                | Self::EnvironmentNotFound { .. }
                | Self::StackTypeNotFound { .. }
        )
    }

    /// Check if error stems from the content of the configuration document.
    ///
    /// # Examples
    ///
    /// ```
    /// use n8n_deploy::Error;
    ///
    /// let err = Error::ConfigInvalid { field: "global.organization".into(), message: "missing".into() };
    /// assert!(err.is_invalid());
    /// ```
    #[must_use]
    pub fn is_invalid(&self) -> bool {
        matches!(
            self,
            Self::ConfigInvalid { .. } | Self::ConfigParse { .. } | Self::UnknownComponent { .. }
        )
    }
}
