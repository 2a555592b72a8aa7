//! Stack composition for one resolved environment.
//!
//! Composition is split into two parts:
//! 1. **Driving**: [`StackComposer`] selects the components, orders them by
//!    their prerequisites and threads outputs between them
//! 2. **Synthesis**: a [`SynthesisBackend`] turns each component into
//!    resources; [`PlanBackend`] records them as a JSON plan
//!
//! # Examples
//!
//! ```
//! use n8n_deploy::compose::{tag_set, Component, PlanBackend, StackComposer};
//! use n8n_deploy::config::N8nConfig;
//!
//! let config: N8nConfig = serde_yaml::from_str(r#"
//! global: { project_name: n8n, organization: acme }
//! environments:
//!   production:
//!     account: "123456789012"
//!     region: us-west-2
//!     settings:
//!       database: { type: postgres }
//!       monitoring: { alarm_email: ops@acme.io }
//! "#).unwrap();
//!
//! let mut backend = PlanBackend::new();
//! let composition = StackComposer::new(&config, "production", None)
//!     .compose(&mut backend)
//!     .unwrap();
//! assert_eq!(
//!     composition.order,
//!     vec![
//!         Component::Network,
//!         Component::Storage,
//!         Component::Database,
//!         Component::Compute,
//!         Component::Access,
//!         Component::Monitoring,
//!     ]
//! );
//!
//! let tags = tag_set(&config, "production", None);
//! assert_eq!(tags["Organization"], "acme");
//! ```

pub mod backend;
pub mod component;
pub mod driver;
pub mod plan;

pub use backend::{
    AccessOutputs, ComputeInputs, ComputeOutputs, DatabaseOutputs, MonitoringInputs,
    MonitoringOutputs, MountConfig, NetworkOutputs, ResourceHandle, StackContext,
    StorageOutputs, SynthesisBackend,
};
pub use component::{Component, ComponentSet};
pub use driver::{cost_allocation_tags, tag_set, Composition, StackComposer, MANAGED_BY};
pub use plan::{PlanBackend, PlannedResource, StackPlan, SynthesizedPlan};
