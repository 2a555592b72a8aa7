//! The seam between stack composition and resource synthesis.
//!
//! The composition driver decides which components are built and in which
//! order; a [`SynthesisBackend`] decides what each component consists of.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::compose::Component;
use crate::config::schema::{
    DefaultsConfig, EnvironmentSettings, N8nConfig, SharedCategory, SharedResources, StackType,
};
use crate::error::{Error, Result};

/// Logical identifier of a synthesized resource.
///
/// # Examples
///
/// ```
/// use n8n_deploy::compose::ResourceHandle;
///
/// let vpc = ResourceHandle::new("n8n-dev-vpc");
/// assert_eq!(vpc.as_str(), "n8n-dev-vpc");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ResourceHandle(String);

impl ResourceHandle {
    /// Wrap a logical resource id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The logical resource id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outputs of the network component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkOutputs {
    /// Virtual network.
    pub vpc: ResourceHandle,
    /// Subnets the service runs in.
    pub subnets: Vec<ResourceHandle>,
    /// Security group of the n8n service.
    pub service_security_group: ResourceHandle,
    /// Security group of the shared filesystem.
    pub file_system_security_group: ResourceHandle,
}

/// How the shared filesystem is mounted into the container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MountConfig {
    /// Filesystem to mount.
    pub file_system: ResourceHandle,
    /// Access point used for the mount.
    pub access_point: ResourceHandle,
    /// Path inside the container.
    pub container_path: String,
    /// Whether the mount is read-only.
    pub read_only: bool,
}

/// Outputs of the storage component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageOutputs {
    /// Shared filesystem.
    pub file_system: ResourceHandle,
    /// Access point for n8n data.
    pub access_point: ResourceHandle,
    /// Container mount settings.
    pub mount: MountConfig,
}

/// Outputs of the database component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatabaseOutputs {
    /// Connection endpoint.
    pub endpoint: ResourceHandle,
    /// Secret holding the credentials.
    pub credentials: ResourceHandle,
}

/// Outputs of the compute component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComputeOutputs {
    /// Running service.
    pub service: ResourceHandle,
    /// Security group of the service.
    pub security_group: ResourceHandle,
    /// Log destination.
    pub log_group: ResourceHandle,
    /// Auto-scaling target, when the scaling bounds allow it.
    pub auto_scaling: Option<ResourceHandle>,
}

/// Outputs of the access component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessOutputs {
    /// Public entry point resource.
    pub entry_point: ResourceHandle,
    /// Public URL of the service.
    pub url: String,
}

/// Outputs of the monitoring component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonitoringOutputs {
    /// Topic receiving alarm notifications.
    pub alarm_topic: ResourceHandle,
    /// Alarms created.
    pub alarms: Vec<ResourceHandle>,
    /// Dashboard.
    pub dashboard: ResourceHandle,
}

/// Producers consumed by the compute component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputeInputs {
    /// Network outputs.
    pub network: NetworkOutputs,
    /// Storage outputs.
    pub storage: StorageOutputs,
    /// Database outputs, when a database is built.
    pub database: Option<DatabaseOutputs>,
}

/// Producers consumed by the monitoring component; any may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonitoringInputs {
    /// Compute outputs.
    pub compute: Option<ComputeOutputs>,
    /// Storage outputs.
    pub storage: Option<StorageOutputs>,
    /// Database outputs.
    pub database: Option<DatabaseOutputs>,
}

/// Everything a component builder may read about its environment.
#[derive(Debug, Clone, PartialEq)]
pub struct StackContext {
    /// Project name.
    pub project_name: String,
    /// Owning organization.
    pub organization: String,
    /// Environment name.
    pub environment: String,
    /// Account identifier.
    pub account: String,
    /// Primary region.
    pub region: String,
    /// Resolved environment settings.
    pub settings: EnvironmentSettings,
    /// Defaults section.
    pub defaults: Option<DefaultsConfig>,
    /// Shared resource identifiers.
    pub shared_resources: Option<SharedResources>,
    /// Stack type the environment was resolved with.
    pub stack_type: Option<StackType>,
}

impl StackContext {
    /// Build the context for one environment of a resolved configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EnvironmentNotFound`] if the environment is absent.
    pub fn new(config: &N8nConfig, environment: &str, stack_type: Option<StackType>) -> Result<Self> {
        let env = config
            .environment(environment)
            .ok_or_else(|| Error::EnvironmentNotFound {
                name: environment.to_string(),
                available: config.environment_names(),
            })?;

        Ok(Self {
            project_name: config.global.project_name.clone(),
            organization: config.global.organization.clone(),
            environment: environment.to_string(),
            account: env.account.clone(),
            region: env.region.clone(),
            settings: env.settings.clone(),
            defaults: config.defaults.clone(),
            shared_resources: config.shared_resources.clone(),
            stack_type,
        })
    }

    /// Prefix of every stack and resource name: `<project>-<environment>`.
    #[must_use]
    pub fn stack_prefix(&self) -> String {
        format!("{}-{}", self.project_name, self.environment)
    }

    /// Name of the stack built for `component`.
    ///
    /// # Examples
    ///
    /// ```
    /// use n8n_deploy::compose::{Component, StackContext};
    /// use n8n_deploy::config::EnvironmentSettings;
    ///
    /// let ctx = StackContext {
    ///     project_name: "n8n".into(),
    ///     organization: "acme".into(),
    ///     environment: "dev".into(),
    ///     account: "1".into(),
    ///     region: "us-east-1".into(),
    ///     settings: EnvironmentSettings::default(),
    ///     defaults: None,
    ///     shared_resources: None,
    ///     stack_type: None,
    /// };
    /// assert_eq!(ctx.stack_name(Component::Storage), "n8n-dev-storage");
    /// assert_eq!(ctx.resource_name("ecs-cluster", ""), "n8n-dev-ecs-cluster");
    /// assert_eq!(ctx.resource_name("sg", "efs"), "n8n-dev-sg-efs");
    /// ```
    #[must_use]
    pub fn stack_name(&self, component: Component) -> String {
        format!("{}-{component}", self.stack_prefix())
    }

    /// Consistent resource name: `<project>-<environment>-<type>[-<name>]`.
    #[must_use]
    pub fn resource_name(&self, resource_type: &str, name: &str) -> String {
        if name.is_empty() {
            format!("{}-{resource_type}", self.stack_prefix())
        } else {
            format!("{}-{resource_type}-{name}", self.stack_prefix())
        }
    }

    /// Whether this is a production environment.
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self.environment.to_lowercase().as_str(), "production" | "prod")
    }

    /// Whether this is a development environment.
    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self.environment.to_lowercase().as_str(), "development" | "dev")
    }

    /// Whether stateful resources survive stack deletion.
    #[must_use]
    pub fn retain_on_delete(&self) -> bool {
        !self.is_development()
    }

    /// Look up a shared resource identifier.
    #[must_use]
    pub fn shared_resource(&self, category: SharedCategory, key: &str) -> Option<&str> {
        self.shared_resources
            .as_ref()
            .and_then(|shared| shared.get(category, key))
    }
}

/// Synthesizes the resources of each component.
///
/// The driver calls each `build_*` method at most once, in construction
/// order, and finally [`SynthesisBackend::apply_tags`] once.
#[cfg_attr(test, mockall::automock)]
pub trait SynthesisBackend {
    /// Build the network component.
    ///
    /// # Errors
    ///
    /// Returns an error if synthesis fails.
    fn build_network(&mut self, ctx: &StackContext) -> Result<NetworkOutputs>;

    /// Build the storage component.
    ///
    /// # Errors
    ///
    /// Returns an error if synthesis fails.
    fn build_storage(&mut self, ctx: &StackContext, network: &NetworkOutputs)
        -> Result<StorageOutputs>;

    /// Build the database component.
    ///
    /// # Errors
    ///
    /// Returns an error if synthesis fails.
    fn build_database(
        &mut self,
        ctx: &StackContext,
        network: &NetworkOutputs,
    ) -> Result<DatabaseOutputs>;

    /// Build the compute component.
    ///
    /// # Errors
    ///
    /// Returns an error if synthesis fails.
    fn build_compute(&mut self, ctx: &StackContext, inputs: &ComputeInputs)
        -> Result<ComputeOutputs>;

    /// Build the access component.
    ///
    /// # Errors
    ///
    /// Returns an error if synthesis fails.
    fn build_access(&mut self, ctx: &StackContext, compute: &ComputeOutputs)
        -> Result<AccessOutputs>;

    /// Build the monitoring component.
    ///
    /// # Errors
    ///
    /// Returns an error if synthesis fails.
    fn build_monitoring(
        &mut self,
        ctx: &StackContext,
        inputs: &MonitoringInputs,
    ) -> Result<MonitoringOutputs>;

    /// Stamp the tag set onto every resource built so far.
    ///
    /// # Errors
    ///
    /// Returns an error if tagging fails.
    fn apply_tags(&mut self, tags: &BTreeMap<String, String>) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> N8nConfig {
        serde_yaml::from_str(
            r#"
global: { project_name: n8n, organization: acme }
environments:
  production: { account: "2", region: us-west-2, settings: {} }
  Dev: { account: "1", region: us-east-1, settings: {} }
shared_resources:
  security: { certificate_arn: "arn:cert" }
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_context_from_config() {
        let ctx = StackContext::new(&config(), "production", Some(StackType::Standard)).unwrap();
        assert_eq!(ctx.stack_prefix(), "n8n-production");
        assert_eq!(ctx.account, "2");
        assert!(ctx.is_production());
        assert!(!ctx.is_development());
        assert!(ctx.retain_on_delete());
        assert_eq!(
            ctx.shared_resource(SharedCategory::Security, "certificate_arn"),
            Some("arn:cert")
        );
        assert_eq!(ctx.shared_resource(SharedCategory::Networking, "route53_zone_id"), None);
    }

    #[test]
    fn test_environment_classification_case_insensitive() {
        let ctx = StackContext::new(&config(), "Dev", None).unwrap();
        assert!(ctx.is_development());
        assert!(!ctx.retain_on_delete());
    }

    #[test]
    fn test_context_missing_environment() {
        let err = StackContext::new(&config(), "staging", None).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_handles_serialize_as_strings() {
        let outputs = DatabaseOutputs {
            endpoint: ResourceHandle::new("db"),
            credentials: ResourceHandle::new("secret"),
        };
        let json = serde_json::to_value(&outputs).unwrap();
        assert_eq!(json["endpoint"], "db");
    }
}
