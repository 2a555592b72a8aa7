//! Configuration schema definitions.
//!
//! This module defines the complete structure of `system.yaml`: the global
//! project settings, the defaults section, one [`EnvironmentConfig`] per named
//! environment, the stack-type presets and the shared resource identifiers.
//!
//! Field-level defaults are declared here and apply whenever a field is absent
//! from the document. Range and cross-field rules live in
//! [`ConfigValidator`](crate::config::ConfigValidator).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Default n8n release deployed when no version is configured.
pub const DEFAULT_N8N_VERSION: &str = "1.94.1";

/// Template placeholder substituted with the environment name in tag values.
pub const ENVIRONMENT_PLACEHOLDER: &str = "{{ environment }}";

/// Root configuration document.
///
/// # Examples
///
/// ```
/// use n8n_deploy::config::N8nConfig;
///
/// let yaml = r#"
/// global:
///   project_name: n8n
///   organization: acme
/// environments:
///   dev:
///     account: "123456789012"
///     region: us-east-1
///     settings: {}
/// "#;
/// let config: N8nConfig = serde_yaml::from_str(yaml).unwrap();
/// assert_eq!(config.environment_names(), vec!["dev".to_string()]);
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct N8nConfig {
    /// Project-wide settings.
    pub global: GlobalConfig,

    /// Fallback sections for environments that omit them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,

    /// Named deployment environments.
    pub environments: BTreeMap<String, EnvironmentConfig>,

    /// Named stack-type presets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stacks: Option<BTreeMap<StackType, StackConfig>>,

    /// Resource identifiers shared across environments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_resources: Option<SharedResources>,
}

impl N8nConfig {
    /// Get configuration for a specific environment.
    #[must_use]
    pub fn environment(&self, name: &str) -> Option<&EnvironmentConfig> {
        self.environments.get(name)
    }

    /// Get the preset for a specific stack type.
    #[must_use]
    pub fn stack_config(&self, stack_type: StackType) -> Option<&StackConfig> {
        self.stacks.as_ref().and_then(|stacks| stacks.get(&stack_type))
    }

    /// Names of all defined environments, in sorted order.
    #[must_use]
    pub fn environment_names(&self) -> Vec<String> {
        self.environments.keys().cloned().collect()
    }

    /// Names of all defined stack types, in declaration order of [`StackType`].
    #[must_use]
    pub fn stack_type_names(&self) -> Vec<String> {
        self.stacks
            .as_ref()
            .map(|stacks| stacks.keys().map(ToString::to_string).collect())
            .unwrap_or_default()
    }
}

/// Global project configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct GlobalConfig {
    /// Project name, used as the prefix of every stack and resource name.
    pub project_name: String,

    /// Owning organization.
    pub organization: String,

    /// Tags applied to every resource. Values may contain `{{ environment }}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeMap<String, String>>,

    /// Tag keys reported for cost allocation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_allocation_tags: Option<Vec<String>>,
}

/// Default sections substituted into environments that omit them.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DefaultsConfig {
    /// Default task sizing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fargate: Option<FargateConfig>,

    /// Shared filesystem lifecycle defaults (consumed by the storage stack).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub efs: Option<EfsConfig>,

    /// Default monitoring settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monitoring: Option<MonitoringConfig>,

    /// Default backup settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup: Option<BackupConfig>,
}

/// Shared filesystem defaults.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct EfsConfig {
    /// Days before files transition to infrequent-access storage.
    pub lifecycle_days: u32,
}

impl Default for EfsConfig {
    fn default() -> Self {
        Self { lifecycle_days: 30 }
    }
}

/// Complete configuration of one environment.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct EnvironmentConfig {
    /// Cloud account identifier.
    pub account: String,

    /// Primary region.
    pub region: String,

    /// Optional multi-region deployment settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multi_region: Option<MultiRegionConfig>,

    /// Environment-specific settings.
    pub settings: EnvironmentSettings,

    /// Tags applied to this environment's resources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeMap<String, String>>,
}

/// Multi-region deployment configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct MultiRegionConfig {
    /// Whether secondary regions are deployed.
    pub enabled: bool,

    /// Free-form descriptions of the secondary regions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regions: Option<Vec<serde_yaml::Mapping>>,
}

/// Deployment target of an environment.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentType {
    /// Serverless container platform.
    #[default]
    Aws,
    /// Local container engine.
    Docker,
}

impl fmt::Display for DeploymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Aws => write!(f, "aws"),
            Self::Docker => write!(f, "docker"),
        }
    }
}

/// Environment-specific settings.
///
/// Every section is optional; absent sections either fall back to the
/// defaults section (`fargate`, `monitoring`, `backup`) or to the section's
/// own field-level defaults when a stack builder reads it.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct EnvironmentSettings {
    /// Deployment target.
    #[serde(default)]
    pub deployment_type: DeploymentType,

    /// Local container engine settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docker: Option<DockerConfig>,

    /// Task sizing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fargate: Option<FargateConfig>,

    /// Auto-scaling bounds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scaling: Option<ScalingConfig>,

    /// Virtual network settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub networking: Option<NetworkingConfig>,

    /// Public entry point settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access: Option<AccessConfig>,

    /// Database settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<DatabaseConfig>,

    /// Authentication settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthConfig>,

    /// Logging and alarm settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monitoring: Option<MonitoringConfig>,

    /// Backup settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup: Option<BackupConfig>,

    /// High-availability settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high_availability: Option<HighAvailabilityConfig>,

    /// Free-form feature flags; `components` selects the stacks to build.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<BTreeMap<String, serde_yaml::Value>>,
}

/// Key of the component list inside the features map.
pub const COMPONENTS_FEATURE: &str = "components";

impl EnvironmentSettings {
    /// The explicit component list from `features.components`, if any.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `components` is not a list of strings.
    pub fn components(&self) -> Result<Option<Vec<String>>> {
        let Some(value) = self
            .features
            .as_ref()
            .and_then(|features| features.get(COMPONENTS_FEATURE))
        else {
            return Ok(None);
        };

        let field = "settings.features.components";
        let items = value
            .as_sequence()
            .ok_or_else(|| Error::invalid(field, "must be a list of component names"))?;

        items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    Error::invalid(format!("{field}[{i}]"), "component name must be a string")
                })
            })
            .collect::<Result<Vec<_>>>()
            .map(Some)
    }

    /// The database engine in effect (`sqlite` when no section is given).
    #[must_use]
    pub fn database_type(&self) -> DatabaseType {
        self.database
            .as_ref()
            .map_or(DatabaseType::default(), |db| db.kind)
    }

    /// The access method in effect (`api_gateway` when no section is given).
    #[must_use]
    pub fn access_type(&self) -> AccessType {
        self.access
            .as_ref()
            .map_or(AccessType::default(), |access| access.kind)
    }
}

/// Fargate task sizing.
///
/// # Examples
///
/// ```
/// use n8n_deploy::config::FargateConfig;
///
/// let fargate: FargateConfig = serde_yaml::from_str("cpu: 512").unwrap();
/// assert_eq!(fargate.memory, 512);
/// assert_eq!(fargate.spot_percentage, 80);
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct FargateConfig {
    /// CPU units.
    pub cpu: u32,
    /// Memory in MiB.
    pub memory: u32,
    /// Share of tasks placed on spot capacity, in percent.
    pub spot_percentage: u32,
    /// n8n container image version.
    pub n8n_version: String,
}

impl Default for FargateConfig {
    fn default() -> Self {
        Self {
            cpu: 256,
            memory: 512,
            spot_percentage: 80,
            n8n_version: DEFAULT_N8N_VERSION.to_string(),
        }
    }
}

/// Auto-scaling configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ScalingConfig {
    /// Minimum running tasks.
    pub min_tasks: u32,
    /// Maximum running tasks.
    pub max_tasks: u32,
    /// Target average CPU utilization, in percent.
    pub target_cpu_utilization: u32,
    /// Scale-in cooldown, in seconds.
    pub scale_in_cooldown: u32,
    /// Scale-out cooldown, in seconds.
    pub scale_out_cooldown: u32,
}

impl Default for ScalingConfig {
    fn default() -> Self {
        Self {
            min_tasks: 1,
            max_tasks: 1,
            target_cpu_utilization: 70,
            scale_in_cooldown: 300,
            scale_out_cooldown: 60,
        }
    }
}

impl ScalingConfig {
    /// Whether the bounds leave room for auto-scaling at all.
    ///
    /// # Examples
    ///
    /// ```
    /// use n8n_deploy::config::ScalingConfig;
    ///
    /// let fixed = ScalingConfig { min_tasks: 2, max_tasks: 2, ..Default::default() };
    /// assert!(!fixed.auto_scaling_possible());
    /// ```
    #[must_use]
    pub fn auto_scaling_possible(&self) -> bool {
        self.max_tasks > self.min_tasks
    }
}

/// Network configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct NetworkingConfig {
    /// Reuse an existing VPC instead of creating one.
    pub use_existing_vpc: bool,
    /// Identifier of the VPC to reuse.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vpc_id: Option<String>,
    /// Address range of a newly created VPC.
    pub vpc_cidr: String,
    /// Subnets to use inside an existing VPC.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnet_ids: Option<Vec<String>>,
    /// Explicit availability zones.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability_zones: Option<Vec<String>>,
    /// Number of NAT gateways.
    pub nat_gateways: u32,
}

impl Default for NetworkingConfig {
    fn default() -> Self {
        Self {
            use_existing_vpc: false,
            vpc_id: None,
            vpc_cidr: "10.0.0.0/16".to_string(),
            subnet_ids: None,
            availability_zones: None,
            nat_gateways: 0,
        }
    }
}

/// Supported database engines.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    /// Embedded database on the shared filesystem.
    #[default]
    Sqlite,
    /// Managed relational database.
    Postgres,
}

impl fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sqlite => write!(f, "sqlite"),
            Self::Postgres => write!(f, "postgres"),
        }
    }
}

/// Aurora Serverless capacity range.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AuroraServerlessConfig {
    /// Minimum capacity units.
    pub min_capacity: f64,
    /// Maximum capacity units.
    pub max_capacity: f64,
}

impl Default for AuroraServerlessConfig {
    fn default() -> Self {
        Self {
            min_capacity: 0.5,
            max_capacity: 1.0,
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Database engine.
    #[serde(rename = "type")]
    pub kind: DatabaseType,
    /// Connect to an existing database instead of creating one.
    pub use_existing: bool,
    /// Secret holding the connection details of an existing database.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_secret_arn: Option<String>,
    /// Instance class of a provisioned instance, e.g. `db.t4g.micro`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_class: Option<String>,
    /// Deploy a standby in a second availability zone.
    pub multi_az: bool,
    /// Use Aurora Serverless with this capacity range.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aurora_serverless: Option<AuroraServerlessConfig>,
    /// Days automated backups are kept.
    pub backup_retention_days: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            kind: DatabaseType::Sqlite,
            use_existing: false,
            connection_secret_arn: None,
            instance_class: None,
            multi_az: false,
            aurora_serverless: None,
            backup_retention_days: 7,
        }
    }
}

/// Public entry method.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AccessType {
    /// Managed HTTP API in front of the service.
    #[default]
    ApiGateway,
    /// Zero-trust reverse tunnel.
    Cloudflare,
}

impl fmt::Display for AccessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ApiGateway => write!(f, "api_gateway"),
            Self::Cloudflare => write!(f, "cloudflare"),
        }
    }
}

/// Tunnel access configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct CloudflareConfig {
    /// Whether the tunnel is deployed.
    pub enabled: bool,
    /// Name of the secret that holds the tunnel token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tunnel_token_secret_name: Option<String>,
    /// Tunnel name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tunnel_name: Option<String>,
    /// Public hostname served through the tunnel.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tunnel_domain: Option<String>,
    /// Put an identity-aware access policy in front of the tunnel.
    pub access_enabled: bool,
    /// Email addresses admitted by the access policy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_allowed_emails: Option<Vec<String>>,
    /// Email domains admitted by the access policy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_allowed_domains: Option<Vec<String>>,

    /// Set on records created implicitly for tunnel access; such records
    /// skip the token rule and the tunnel builder creates the secret.
    #[serde(skip)]
    pub provisional: bool,
}

impl CloudflareConfig {
    /// An enabled tunnel record that has not been through validation.
    ///
    /// # Examples
    ///
    /// ```
    /// use n8n_deploy::config::CloudflareConfig;
    ///
    /// let tunnel = CloudflareConfig::provisional();
    /// assert!(tunnel.enabled);
    /// assert!(tunnel.tunnel_token_secret_name.is_none());
    /// ```
    #[must_use]
    pub fn provisional() -> Self {
        Self {
            enabled: true,
            provisional: true,
            ..Default::default()
        }
    }
}

/// Public access configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct AccessConfig {
    /// Entry method.
    #[serde(rename = "type")]
    pub kind: AccessType,
    /// Custom domain name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_name: Option<String>,
    /// Put a CDN distribution in front of the API.
    pub cloudfront_enabled: bool,
    /// Attach a web application firewall.
    pub waf_enabled: bool,
    /// Requests per second allowed by the API.
    pub api_gateway_throttle: u32,
    /// Allowed CORS origins.
    pub cors_origins: Vec<String>,
    /// Source addresses admitted by the firewall.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_whitelist: Option<Vec<String>>,
    /// Tunnel settings, used when `type` is `cloudflare`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloudflare: Option<CloudflareConfig>,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            kind: AccessType::ApiGateway,
            domain_name: None,
            cloudfront_enabled: true,
            waf_enabled: false,
            api_gateway_throttle: 1000,
            cors_origins: vec!["*".to_string()],
            ip_whitelist: None,
            cloudflare: None,
        }
    }
}

impl AccessConfig {
    /// Resolve the tunnel record for tunnel-type access.
    ///
    /// With tunnel access and no tunnel section, a provisional record is
    /// created; an explicit section is forced to `enabled`. Other access
    /// types are returned unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use n8n_deploy::config::{AccessConfig, AccessType};
    ///
    /// let access = AccessConfig { kind: AccessType::Cloudflare, ..Default::default() };
    /// let resolved = access.normalized();
    /// assert!(resolved.cloudflare.unwrap().provisional);
    /// ```
    #[must_use]
    pub fn normalized(&self) -> Self {
        let mut access = self.clone();
        if access.kind == AccessType::Cloudflare {
            match access.cloudflare.as_mut() {
                Some(tunnel) => {
                    // a section the user left disabled gets a created token secret
                    if !tunnel.enabled && tunnel.tunnel_token_secret_name.is_none() {
                        tunnel.provisional = true;
                    }
                    tunnel.enabled = true;
                }
                None => access.cloudflare = Some(CloudflareConfig::provisional()),
            }
        }
        access
    }
}

/// OAuth providers.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuthProvider {
    /// Google Workspace.
    Google,
    /// GitHub.
    Github,
    /// Okta.
    Okta,
    /// Azure Active Directory.
    AzureAd,
}

/// Authentication configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    /// Enable HTTP basic authentication.
    pub basic_auth_enabled: bool,
    /// Enable OAuth login.
    pub oauth_enabled: bool,
    /// OAuth provider, required when OAuth is enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oauth_provider: Option<AuthProvider>,
    /// Require multi-factor authentication.
    pub mfa_required: bool,
    /// Email domains allowed to log in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_email_domains: Option<Vec<String>>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            basic_auth_enabled: true,
            oauth_enabled: false,
            oauth_provider: None,
            mfa_required: false,
            allowed_email_domains: None,
        }
    }
}

/// Monitoring and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct MonitoringConfig {
    /// Days container logs are kept.
    pub log_retention_days: u32,
    /// Address subscribed to the alarm topic.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alarm_email: Option<String>,
    /// Enable cluster-level container metrics.
    pub enable_container_insights: bool,
    /// Enable distributed tracing.
    pub enable_xray_tracing: bool,
    /// Namespace of the custom n8n metrics.
    pub custom_metrics_namespace: String,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            log_retention_days: 30,
            alarm_email: None,
            enable_container_insights: true,
            enable_xray_tracing: false,
            custom_metrics_namespace: "N8n/Serverless".to_string(),
        }
    }
}

/// Backup configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct BackupConfig {
    /// Whether backups are taken.
    pub enabled: bool,
    /// Days backups are kept.
    pub retention_days: u32,
    /// Copy backups to other regions.
    pub cross_region_backup: bool,
    /// Regions that receive backup copies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_regions: Option<Vec<String>>,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            retention_days: 7,
            cross_region_backup: false,
            backup_regions: None,
        }
    }
}

/// High availability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct HighAvailabilityConfig {
    /// Spread tasks over several availability zones.
    pub multi_az: bool,
    /// Allow auto-scaling when the scaling bounds permit it.
    pub auto_scaling_enabled: bool,
    /// Seconds between health checks.
    pub health_check_interval: u32,
    /// Failed checks before a task is replaced.
    pub unhealthy_threshold: u32,
}

impl Default for HighAvailabilityConfig {
    fn default() -> Self {
        Self {
            multi_az: false,
            auto_scaling_enabled: true,
            health_check_interval: 30,
            unhealthy_threshold: 2,
        }
    }
}

/// Local container engine configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct DockerConfig {
    /// Compose file used for local deployments.
    pub compose_file: String,
    /// Container image.
    pub image: String,
    /// Published port.
    pub port: u16,
    /// Compose profiles to activate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profiles: Option<Vec<String>>,
}

impl Default for DockerConfig {
    fn default() -> Self {
        Self {
            compose_file: "docker/docker-compose.yml".to_string(),
            image: format!("n8nio/n8n:{DEFAULT_N8N_VERSION}"),
            port: 5678,
            profiles: None,
        }
    }
}

/// Predefined stack types.
///
/// # Examples
///
/// ```
/// use n8n_deploy::config::StackType;
///
/// let stack_type: StackType = "minimal".parse().unwrap();
/// assert_eq!(stack_type, StackType::Minimal);
/// assert_eq!(stack_type.to_string(), "minimal");
/// assert!("tiny".parse::<StackType>().is_err());
/// ```
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum StackType {
    /// Single small task for personal use.
    Minimal,
    /// Production-ready setup with monitoring.
    Standard,
    /// Highly available setup with managed database.
    Enterprise,
}

impl StackType {
    /// All stack types, in declaration order.
    pub const ALL: [Self; 3] = [Self::Minimal, Self::Standard, Self::Enterprise];

    /// The name used in `system.yaml`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Minimal => "minimal",
            Self::Standard => "standard",
            Self::Enterprise => "enterprise",
        }
    }
}

impl fmt::Display for StackType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StackType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|stack_type| stack_type.as_str() == s)
            .ok_or_else(|| format!("invalid stack type: {s}"))
    }
}

/// Name that ends an inheritance chain at the defaults section.
pub const INHERIT_DEFAULTS: &str = "defaults";

/// Stack type preset.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct StackConfig {
    /// Human-readable summary.
    pub description: String,

    /// Components to build.
    pub components: Vec<String>,

    /// Settings overlay applied onto the environment's settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<serde_yaml::Mapping>,

    /// Preset whose overlay is applied first, or `defaults`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inherit_from: Option<String>,
}

/// Categories of shared resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SharedCategory {
    /// Certificates, keys and similar.
    Security,
    /// Hosted zones, transit gateways and similar.
    Networking,
    /// Buckets, filesystems and similar.
    Storage,
}

/// Shared resources across environments.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SharedResources {
    /// Security resource identifiers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<BTreeMap<String, String>>,
    /// Networking resource identifiers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub networking: Option<BTreeMap<String, String>>,
    /// Storage resource identifiers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<BTreeMap<String, String>>,
}

impl SharedResources {
    /// Look up a shared resource identifier by category and key.
    ///
    /// # Examples
    ///
    /// ```
    /// use n8n_deploy::config::{SharedCategory, SharedResources};
    /// use std::collections::BTreeMap;
    ///
    /// let shared = SharedResources {
    ///     security: Some(BTreeMap::from([("certificate_arn".to_string(), "arn:cert".to_string())])),
    ///     ..Default::default()
    /// };
    /// assert_eq!(shared.get(SharedCategory::Security, "certificate_arn"), Some("arn:cert"));
    /// assert_eq!(shared.get(SharedCategory::Storage, "certificate_arn"), None);
    /// ```
    #[must_use]
    pub fn get(&self, category: SharedCategory, key: &str) -> Option<&str> {
        let resources = match category {
            SharedCategory::Security => &self.security,
            SharedCategory::Networking => &self.networking,
            SharedCategory::Storage => &self.storage,
        };
        resources
            .as_ref()
            .and_then(|map| map.get(key))
            .map(String::as_str)
    }
}
