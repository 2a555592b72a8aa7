//! Configuration system for n8n deployments.
//!
//! This module turns a `system.yaml` document into one fully resolved,
//! environment-scoped [`N8nConfig`]:
//!
//! 1. Parse the document once and cache it
//! 2. Validate the whole document against the schema
//! 3. Look up the requested environment
//! 4. Apply the requested stack-type preset
//! 5. Fill omitted `fargate`, `monitoring` and `backup` sections from defaults
//! 6. Apply runtime overrides
//! 7. Return a root holding only that environment
//!
//! Every step returns a new value; nothing is mutated in place.
//!
//! # Examples
//!
//! ```
//! use n8n_deploy::config::{ConfigLoader, Overrides};
//! use tempfile::TempDir;
//!
//! let dir = TempDir::new().unwrap();
//! let path = dir.path().join("system.yaml");
//! ConfigLoader::generate_example_config(&path).unwrap();
//!
//! let mut overrides = Overrides::new();
//! overrides.set_assignment("scaling={min_tasks: 1, max_tasks: 3}").unwrap();
//!
//! let config = ConfigLoader::new(&path)
//!     .load_config("dev", Some("minimal"), Some(&overrides))
//!     .unwrap();
//! let dev = config.environment("dev").unwrap();
//! assert_eq!(dev.settings.scaling.as_ref().unwrap().max_tasks, 3);
//! ```

pub mod loader;
pub mod merger;
pub mod overlay;
pub mod schema;
pub mod stack_type;
pub mod validator;

pub use loader::{get_config, ConfigLoader, DEFAULT_CONFIG_FILE, DEFAULT_EXAMPLE_FILE};
pub use merger::{ConfigMerger, Overrides};
pub use schema::{
    AccessConfig, AccessType, AuroraServerlessConfig, AuthConfig, AuthProvider, BackupConfig,
    CloudflareConfig, DatabaseConfig, DatabaseType, DefaultsConfig, DeploymentType, DockerConfig,
    EfsConfig, EnvironmentConfig, EnvironmentSettings, FargateConfig, GlobalConfig,
    HighAvailabilityConfig, MonitoringConfig, MultiRegionConfig, N8nConfig, NetworkingConfig,
    ScalingConfig, SharedCategory, SharedResources, StackConfig, StackType,
};
pub use validator::ConfigValidator;
