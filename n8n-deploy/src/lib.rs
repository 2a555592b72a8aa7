#![deny(missing_docs, unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! # n8n-deploy
//!
//! Configuration resolution and stack composition for n8n deployments.
//!
//! A single `system.yaml` describes every environment of a deployment. This
//! library validates that document, resolves one environment through its
//! stack-type preset, defaults and runtime overrides, and composes the
//! resulting components into a declarative resource plan.
//!
//! ## Core Types
//!
//! - [`ConfigLoader`] and [`N8nConfig`]: Loading and the typed document
//! - [`Overrides`]: Runtime setting overrides
//! - [`StackComposer`] and [`SynthesisBackend`]: Component composition
//! - [`PlanBackend`] and [`SynthesizedPlan`]: The JSON resource plan
//! - [`Error`] and [`Result`]: Error handling types
//! - [`Logger`] and [`LogLevel`]: Logging infrastructure
//!
//! ## Examples
//!
//! ```
//! use n8n_deploy::{ConfigLoader, PlanBackend, StackComposer, StackType};
//! use tempfile::TempDir;
//!
//! let dir = TempDir::new().unwrap();
//! let path = dir.path().join("system.yaml");
//! ConfigLoader::generate_example_config(&path).unwrap();
//!
//! let config = ConfigLoader::new(&path)
//!     .load_config("production", None, None)
//!     .unwrap();
//!
//! let mut backend = PlanBackend::new();
//! let composition = StackComposer::new(&config, "production", None)
//!     .compose(&mut backend)
//!     .unwrap();
//! assert_eq!(composition.stacks[0], "n8n-serverless-production-network");
//!
//! let plan = backend.finish();
//! assert!(plan.resource_count() > 0);
//! assert_eq!("standard".parse::<StackType>().unwrap(), StackType::Standard);
//! ```

pub mod compose;
pub mod config;
pub mod error;
pub mod logging;

// Re-export key types at crate root for convenience
pub use compose::{
    Component, Composition, PlanBackend, StackComposer, SynthesisBackend, SynthesizedPlan,
};
pub use config::{get_config, ConfigLoader, N8nConfig, Overrides, StackType};
pub use error::{Error, Result};
pub use logging::{init_logger, LogLevel, Logger};
