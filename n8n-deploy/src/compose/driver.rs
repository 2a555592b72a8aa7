//! Stack composition driver.
//!
//! Selects the components of one environment, checks their prerequisites,
//! and calls the backend in construction order while threading each
//! component's outputs to its consumers. Tags are applied once at the end.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::compose::backend::{
    AccessOutputs, ComputeInputs, ComputeOutputs, DatabaseOutputs, MonitoringInputs,
    MonitoringOutputs, NetworkOutputs, StackContext, StorageOutputs, SynthesisBackend,
};
use crate::compose::component::{Component, ComponentSet};
use crate::config::schema::{N8nConfig, StackType, ENVIRONMENT_PLACEHOLDER};
use crate::error::{Error, Result};

/// Value of the `ManagedBy` tag.
pub const MANAGED_BY: &str = "n8n-deploy";

/// Result of composing one environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Composition {
    /// Environment name.
    pub environment: String,
    /// Components in the order they were built.
    pub order: Vec<Component>,
    /// Stack names, parallel to `order`.
    pub stacks: Vec<String>,
    /// Network outputs, if built.
    pub network: Option<NetworkOutputs>,
    /// Storage outputs, if built.
    pub storage: Option<StorageOutputs>,
    /// Database outputs, if built.
    pub database: Option<DatabaseOutputs>,
    /// Compute outputs, if built.
    pub compute: Option<ComputeOutputs>,
    /// Access outputs, if built.
    pub access: Option<AccessOutputs>,
    /// Monitoring outputs, if built.
    pub monitoring: Option<MonitoringOutputs>,
    /// Tags applied to every resource.
    pub tags: BTreeMap<String, String>,
    /// Cost allocation tags and their resolved values.
    pub cost_allocation_tags: BTreeMap<String, String>,
}

/// Composes the stacks of one environment.
///
/// # Examples
///
/// ```
/// use n8n_deploy::compose::{PlanBackend, StackComposer};
/// use n8n_deploy::config::N8nConfig;
///
/// let config: N8nConfig = serde_yaml::from_str(r#"
/// global: { project_name: n8n, organization: acme }
/// environments:
///   dev: { account: "123456789012", region: us-east-1, settings: {} }
/// "#).unwrap();
///
/// let mut backend = PlanBackend::new();
/// let composition = StackComposer::new(&config, "dev", None).compose(&mut backend).unwrap();
/// assert_eq!(composition.stacks[0], "n8n-dev-network");
/// assert_eq!(composition.tags["ManagedBy"], "n8n-deploy");
/// ```
#[derive(Debug)]
pub struct StackComposer<'a> {
    config: &'a N8nConfig,
    environment: String,
    stack_type: Option<StackType>,
}

impl<'a> StackComposer<'a> {
    /// Create a composer for `environment` of a resolved configuration.
    #[must_use]
    pub fn new(config: &'a N8nConfig, environment: &str, stack_type: Option<StackType>) -> Self {
        Self {
            config,
            environment: environment.to_string(),
            stack_type,
        }
    }

    /// Build every selected component through `backend`.
    ///
    /// All selection and dependency errors are reported before the first
    /// backend call.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EnvironmentNotFound`], [`Error::UnknownComponent`],
    /// [`Error::DependencyUnsatisfied`], or any error from the backend.
    pub fn compose<B: SynthesisBackend + ?Sized>(&self, backend: &mut B) -> Result<Composition> {
        let ctx = StackContext::new(self.config, &self.environment, self.stack_type)?;
        let order = ComponentSet::select(&ctx.settings)?.construction_order()?;
        log::debug!(
            "composing '{}': {}",
            self.environment,
            order
                .iter()
                .map(|c| c.as_str())
                .collect::<Vec<_>>()
                .join(" -> ")
        );

        let mut network = None;
        let mut storage = None;
        let mut database = None;
        let mut compute = None;
        let mut access = None;
        let mut monitoring = None;

        for &component in &order {
            log::debug!("building stack {}", ctx.stack_name(component));
            match component {
                Component::Network => {
                    network = Some(backend.build_network(&ctx)?);
                }
                Component::Storage => {
                    let net = produced(network.as_ref(), component, Component::Network)?;
                    storage = Some(backend.build_storage(&ctx, net)?);
                }
                Component::Database => {
                    let net = produced(network.as_ref(), component, Component::Network)?;
                    database = Some(backend.build_database(&ctx, net)?);
                }
                Component::Compute => {
                    let inputs = ComputeInputs {
                        network: produced(network.as_ref(), component, Component::Network)?
                            .clone(),
                        storage: produced(storage.as_ref(), component, Component::Storage)?
                            .clone(),
                        database: database.clone(),
                    };
                    compute = Some(backend.build_compute(&ctx, &inputs)?);
                }
                Component::Access => {
                    let service = produced(compute.as_ref(), component, Component::Compute)?;
                    access = Some(backend.build_access(&ctx, service)?);
                }
                Component::Monitoring => {
                    let inputs = MonitoringInputs {
                        compute: compute.clone(),
                        storage: storage.clone(),
                        database: database.clone(),
                    };
                    monitoring = Some(backend.build_monitoring(&ctx, &inputs)?);
                }
            }
        }

        let tags = tag_set(self.config, &self.environment, self.stack_type);
        backend.apply_tags(&tags)?;

        Ok(Composition {
            environment: self.environment.clone(),
            stacks: order.iter().map(|c| ctx.stack_name(*c)).collect(),
            order,
            network,
            storage,
            database,
            compute,
            access,
            monitoring,
            tags,
            cost_allocation_tags: cost_allocation_tags(self.config, &self.environment),
        })
    }
}

fn produced<T>(output: Option<&T>, component: Component, requires: Component) -> Result<&T> {
    output.ok_or(Error::DependencyUnsatisfied {
        component,
        requires,
    })
}

fn substitute(value: &str, environment: &str) -> String {
    value.replace(ENVIRONMENT_PLACEHOLDER, environment)
}

/// The uniform tag set of an environment.
///
/// Global tags (with `{{ environment }}` substituted) come first, then the
/// environment's tags, then the standard tags; later entries win.
///
/// # Examples
///
/// ```
/// use n8n_deploy::compose::tag_set;
/// use n8n_deploy::config::{N8nConfig, StackType};
///
/// let config: N8nConfig = serde_yaml::from_str(r#"
/// global:
///   project_name: n8n
///   organization: acme
///   tags: { Env: "{{ environment }}-env" }
/// environments:
///   dev: { account: "1", region: us-east-1, settings: {} }
/// "#).unwrap();
/// let tags = tag_set(&config, "dev", Some(StackType::Minimal));
/// assert_eq!(tags["Env"], "dev-env");
/// assert_eq!(tags["StackType"], "minimal");
/// ```
#[must_use]
pub fn tag_set(
    config: &N8nConfig,
    environment: &str,
    stack_type: Option<StackType>,
) -> BTreeMap<String, String> {
    let mut tags = BTreeMap::new();

    if let Some(ref global) = config.global.tags {
        for (key, value) in global {
            tags.insert(key.clone(), substitute(value, environment));
        }
    }
    if let Some(env_tags) = config.environment(environment).and_then(|e| e.tags.as_ref()) {
        tags.extend(env_tags.iter().map(|(k, v)| (k.clone(), v.clone())));
    }

    tags.insert("Environment".to_string(), environment.to_string());
    tags.insert("Project".to_string(), config.global.project_name.clone());
    tags.insert("Organization".to_string(), config.global.organization.clone());
    tags.insert("ManagedBy".to_string(), MANAGED_BY.to_string());
    if let Some(stack_type) = stack_type {
        tags.insert("StackType".to_string(), stack_type.to_string());
    }

    tags
}

/// Cost allocation tag keys that resolve to a value, global tags first.
#[must_use]
pub fn cost_allocation_tags(config: &N8nConfig, environment: &str) -> BTreeMap<String, String> {
    let Some(ref keys) = config.global.cost_allocation_tags else {
        return BTreeMap::new();
    };
    let env_tags = config.environment(environment).and_then(|e| e.tags.as_ref());

    keys.iter()
        .filter_map(|key| {
            let global = config
                .global
                .tags
                .as_ref()
                .and_then(|tags| tags.get(key))
                .map(|value| substitute(value, environment));
            global
                .or_else(|| env_tags.and_then(|tags| tags.get(key)).cloned())
                .map(|value| (key.clone(), value))
        })
        .collect()
}
