//! Configuration validation.
//!
//! Every range, cross-field and conditional-required rule runs in a single
//! pass over the document. The first violation is reported as
//! [`Error::ConfigInvalid`] carrying the dotted path of the offending field.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use std::sync::OnceLock;

use regex::Regex;

use crate::compose::Component;
use crate::config::schema::{
    AccessConfig, AuthConfig, BackupConfig, CloudflareConfig, DatabaseConfig, DatabaseType,
    EnvironmentConfig, EnvironmentSettings, FargateConfig, HighAvailabilityConfig,
    MonitoringConfig, N8nConfig, NetworkingConfig, ScalingConfig, StackConfig, StackType,
};
use crate::config::stack_type::inheritance_chain;
use crate::error::{Error, Result};

/// Longest hostname accepted in a domain field.
const MAX_DOMAIN_LEN: usize = 253;

/// Validates configuration documents.
///
/// # Examples
///
/// ```
/// use n8n_deploy::config::{ConfigValidator, N8nConfig};
///
/// let config: N8nConfig = serde_yaml::from_str(r#"
/// global: { project_name: n8n, organization: acme }
/// environments:
///   dev: { account: "123456789012", region: us-east-1, settings: {} }
/// "#).unwrap();
/// ConfigValidator::validate(&config).unwrap();
/// ```
pub struct ConfigValidator;

impl ConfigValidator {
    /// Convert a parsed YAML document into the typed root record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigInvalid`] when a required field is missing, a
    /// field has the wrong type, an enum member is not in its closed set or
    /// an unknown field is present. The error names the dotted path of the
    /// record that failed, or `document` for the root.
    pub fn deserialize(value: serde_yaml::Value) -> Result<N8nConfig> {
        serde_path_to_error::deserialize(value).map_err(|e| {
            let field = match e.path().to_string() {
                path if path == "." => "document".to_string(),
                path => path,
            };
            Error::invalid(field, e.into_inner().to_string())
        })
    }

    /// Validate a complete configuration.
    ///
    /// # Errors
    ///
    /// Returns the first rule violation found.
    pub fn validate(config: &N8nConfig) -> Result<()> {
        Self::validate_identifier("global.project_name", &config.global.project_name)?;
        Self::validate_identifier("global.organization", &config.global.organization)?;

        if let Some(ref defaults) = config.defaults {
            if let Some(ref fargate) = defaults.fargate {
                Self::validate_fargate("defaults.fargate", fargate)?;
            }
            if let Some(ref monitoring) = defaults.monitoring {
                Self::validate_monitoring("defaults.monitoring", monitoring)?;
            }
            if let Some(ref backup) = defaults.backup {
                Self::validate_backup("defaults.backup", backup)?;
            }
            if let Some(ref efs) = defaults.efs {
                if efs.lifecycle_days == 0 {
                    return Err(Error::invalid(
                        "defaults.efs.lifecycle_days",
                        "must be at least 1",
                    ));
                }
            }
        }

        for (name, env) in &config.environments {
            Self::validate_environment(name, env)?;
        }

        if let Some(ref stacks) = config.stacks {
            Self::validate_stacks(stacks)?;
        }

        Ok(())
    }

    /// Validate one environment, reporting fields under `environments.<name>`.
    ///
    /// # Errors
    ///
    /// Returns the first rule violation found.
    pub fn validate_environment(name: &str, env: &EnvironmentConfig) -> Result<()> {
        let prefix = format!("environments.{name}");

        if env.account.trim().is_empty() {
            return Err(Error::invalid(
                format!("{prefix}.account"),
                "Cannot be empty or only whitespace",
            ));
        }
        if env.region.trim().is_empty() {
            return Err(Error::invalid(
                format!("{prefix}.region"),
                "Cannot be empty or only whitespace",
            ));
        }

        Self::validate_settings(&format!("{prefix}.settings"), &env.settings)
    }

    /// Validate every section of an environment's settings.
    ///
    /// # Errors
    ///
    /// Returns the first rule violation found.
    pub fn validate_settings(prefix: &str, settings: &EnvironmentSettings) -> Result<()> {
        if let Some(ref fargate) = settings.fargate {
            Self::validate_fargate(&format!("{prefix}.fargate"), fargate)?;
        }
        if let Some(ref scaling) = settings.scaling {
            Self::validate_scaling(&format!("{prefix}.scaling"), scaling)?;
        }
        if let Some(ref networking) = settings.networking {
            Self::validate_networking(&format!("{prefix}.networking"), networking)?;
        }
        if let Some(ref access) = settings.access {
            Self::validate_access(&format!("{prefix}.access"), access)?;
        }
        if let Some(ref database) = settings.database {
            Self::validate_database(&format!("{prefix}.database"), database)?;
        }
        if let Some(ref auth) = settings.auth {
            Self::validate_auth(&format!("{prefix}.auth"), auth)?;
        }
        if let Some(ref monitoring) = settings.monitoring {
            Self::validate_monitoring(&format!("{prefix}.monitoring"), monitoring)?;
        }
        if let Some(ref backup) = settings.backup {
            Self::validate_backup(&format!("{prefix}.backup"), backup)?;
        }
        if let Some(ref ha) = settings.high_availability {
            Self::validate_high_availability(&format!("{prefix}.high_availability"), ha)?;
        }

        // Shape errors from `components()` already carry the relative path.
        let components = settings
            .components()
            .map_err(|e| match e {
                Error::ConfigInvalid { field, message } => {
                    Error::invalid(format!("{prefix}.{}", field.trim_start_matches("settings.")), message)
                }
                other => other,
            })?;
        if let Some(components) = components {
            Self::validate_component_names(&format!("{prefix}.features.components"), &components)?;
        }

        Ok(())
    }

    /// The memory sizes allowed for a CPU value, or `None` for an unsupported CPU.
    ///
    /// # Examples
    ///
    /// ```
    /// use n8n_deploy::config::ConfigValidator;
    ///
    /// assert_eq!(ConfigValidator::allowed_memory(256), Some(vec![512, 1024, 2048]));
    /// assert!(ConfigValidator::allowed_memory(300).is_none());
    /// ```
    #[must_use]
    pub fn allowed_memory(cpu: u32) -> Option<Vec<u32>> {
        let stepped = |start: u32, end: u32, step: usize| (start..=end).step_by(step).collect();
        match cpu {
            256 => Some(vec![512, 1024, 2048]),
            512 => Some(vec![1024, 2048, 3072, 4096]),
            1024 => Some(stepped(2048, 8192, 1024)),
            2048 => Some(stepped(4096, 16384, 1024)),
            4096 => Some(stepped(8192, 30720, 1024)),
            8192 => Some(stepped(16384, 61440, 4096)),
            16384 => Some(stepped(32768, 122_880, 8192)),
            _ => None,
        }
    }

    /// Check a hostname against strict DNS syntax.
    ///
    /// # Examples
    ///
    /// ```
    /// use n8n_deploy::config::ConfigValidator;
    ///
    /// assert!(ConfigValidator::is_valid_domain("n8n.example.com"));
    /// assert!(!ConfigValidator::is_valid_domain("-bad.example.com"));
    /// assert!(!ConfigValidator::is_valid_domain("example..com"));
    /// ```
    #[must_use]
    pub fn is_valid_domain(domain: &str) -> bool {
        static DOMAIN_RE: OnceLock<Option<Regex>> = OnceLock::new();
        let re = DOMAIN_RE.get_or_init(|| {
            Regex::new(r"^(?:[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?\.)+[A-Za-z]{2,63}$").ok()
        });
        domain.len() <= MAX_DOMAIN_LEN && re.as_ref().is_some_and(|re| re.is_match(domain))
    }

    /// Validate string identifiers (project name, organization).
    ///
    /// Checks that the identifier is non-empty after trimming, contains no
    /// null bytes, and is not longer than 255 characters.
    fn validate_identifier(field: &str, value: &str) -> Result<()> {
        let trimmed = value.trim();

        if trimmed.is_empty() {
            return Err(Error::invalid(field, "Cannot be empty or only whitespace"));
        }
        if trimmed.contains('\0') {
            return Err(Error::invalid(field, "Cannot contain null bytes"));
        }
        if trimmed.len() > 255 {
            return Err(Error::invalid(field, "Cannot exceed 255 characters"));
        }

        Ok(())
    }

    fn check_range(field: String, value: u32, range: RangeInclusive<u32>) -> Result<()> {
        if range.contains(&value) {
            Ok(())
        } else {
            Err(Error::invalid(
                field,
                format!(
                    "must be between {} and {}, got {value}",
                    range.start(),
                    range.end()
                ),
            ))
        }
    }

    fn check_min(field: String, value: u32, min: u32) -> Result<()> {
        if value >= min {
            Ok(())
        } else {
            Err(Error::invalid(
                field,
                format!("must be at least {min}, got {value}"),
            ))
        }
    }

    fn check_domain(field: String, domain: &str) -> Result<()> {
        if Self::is_valid_domain(domain) {
            Ok(())
        } else {
            Err(Error::invalid(
                field,
                format!("invalid domain name format: {domain}"),
            ))
        }
    }

    /// Validate task sizing, including the CPU/memory pairing.
    fn validate_fargate(prefix: &str, fargate: &FargateConfig) -> Result<()> {
        Self::check_range(format!("{prefix}.cpu"), fargate.cpu, 256..=16384)?;
        Self::check_range(format!("{prefix}.memory"), fargate.memory, 512..=122_880)?;
        Self::check_range(
            format!("{prefix}.spot_percentage"),
            fargate.spot_percentage,
            0..=100,
        )?;

        let allowed = Self::allowed_memory(fargate.cpu).ok_or_else(|| {
            Error::invalid(
                format!("{prefix}.cpu"),
                format!(
                    "unsupported CPU value {}; expected one of 256, 512, 1024, 2048, 4096, 8192, 16384",
                    fargate.cpu
                ),
            )
        })?;
        if !allowed.contains(&fargate.memory) {
            return Err(Error::invalid(
                format!("{prefix}.memory"),
                format!(
                    "Invalid CPU/memory combination: {}/{}",
                    fargate.cpu, fargate.memory
                ),
            ));
        }

        if fargate.n8n_version.trim().is_empty() {
            return Err(Error::invalid(
                format!("{prefix}.n8n_version"),
                "Cannot be empty or only whitespace",
            ));
        }

        Ok(())
    }

    fn validate_scaling(prefix: &str, scaling: &ScalingConfig) -> Result<()> {
        Self::check_min(format!("{prefix}.min_tasks"), scaling.min_tasks, 1)?;
        Self::check_min(format!("{prefix}.max_tasks"), scaling.max_tasks, 1)?;
        Self::check_range(
            format!("{prefix}.target_cpu_utilization"),
            scaling.target_cpu_utilization,
            10..=90,
        )?;
        Self::check_min(
            format!("{prefix}.scale_in_cooldown"),
            scaling.scale_in_cooldown,
            60,
        )?;
        Self::check_min(
            format!("{prefix}.scale_out_cooldown"),
            scaling.scale_out_cooldown,
            60,
        )?;

        if scaling.max_tasks < scaling.min_tasks {
            return Err(Error::invalid(
                format!("{prefix}.max_tasks"),
                format!(
                    "max_tasks ({}) must be >= min_tasks ({})",
                    scaling.max_tasks, scaling.min_tasks
                ),
            ));
        }

        Ok(())
    }

    fn validate_networking(prefix: &str, networking: &NetworkingConfig) -> Result<()> {
        Self::check_range(
            format!("{prefix}.nat_gateways"),
            networking.nat_gateways,
            0..=3,
        )?;

        if networking.use_existing_vpc && networking.vpc_id.is_none() {
            return Err(Error::invalid(
                format!("{prefix}.vpc_id"),
                "vpc_id is required when use_existing_vpc is true",
            ));
        }

        Ok(())
    }

    fn validate_access(prefix: &str, access: &AccessConfig) -> Result<()> {
        let access = access.normalized();
        if let Some(ref domain) = access.domain_name {
            Self::check_domain(format!("{prefix}.domain_name"), domain)?;
        }
        Self::check_min(
            format!("{prefix}.api_gateway_throttle"),
            access.api_gateway_throttle,
            1,
        )?;
        if let Some(ref tunnel) = access.cloudflare {
            Self::validate_cloudflare(&format!("{prefix}.cloudflare"), tunnel)?;
        }
        Ok(())
    }

    /// Validate a normalized tunnel record.
    ///
    /// Provisional records skip the token rule; the tunnel builder creates
    /// the token secret for them. A section declared without `enabled: true`
    /// is provisional once normalized.
    fn validate_cloudflare(prefix: &str, tunnel: &CloudflareConfig) -> Result<()> {
        if tunnel.enabled && !tunnel.provisional && tunnel.tunnel_token_secret_name.is_none() {
            return Err(Error::invalid(
                format!("{prefix}.tunnel_token_secret_name"),
                "tunnel_token_secret_name is required when the tunnel is enabled",
            ));
        }
        if let Some(ref domain) = tunnel.tunnel_domain {
            Self::check_domain(format!("{prefix}.tunnel_domain"), domain)?;
        }
        Ok(())
    }

    fn validate_database(prefix: &str, database: &DatabaseConfig) -> Result<()> {
        Self::check_range(
            format!("{prefix}.backup_retention_days"),
            database.backup_retention_days,
            1..=35,
        )?;

        if database.kind == DatabaseType::Postgres
            && database.use_existing
            && database.connection_secret_arn.is_none()
        {
            return Err(Error::invalid(
                format!("{prefix}.connection_secret_arn"),
                "connection_secret_arn is required when use_existing is true",
            ));
        }

        if let Some(ref aurora) = database.aurora_serverless {
            if aurora.min_capacity <= 0.0 {
                return Err(Error::invalid(
                    format!("{prefix}.aurora_serverless.min_capacity"),
                    "must be greater than 0",
                ));
            }
            if aurora.max_capacity < aurora.min_capacity {
                return Err(Error::invalid(
                    format!("{prefix}.aurora_serverless.max_capacity"),
                    "max_capacity must be >= min_capacity",
                ));
            }
        }

        Ok(())
    }

    fn validate_auth(prefix: &str, auth: &AuthConfig) -> Result<()> {
        if auth.oauth_enabled && auth.oauth_provider.is_none() {
            return Err(Error::invalid(
                format!("{prefix}.oauth_provider"),
                "oauth_provider is required when oauth_enabled is true",
            ));
        }
        Ok(())
    }

    fn validate_monitoring(prefix: &str, monitoring: &MonitoringConfig) -> Result<()> {
        Self::check_range(
            format!("{prefix}.log_retention_days"),
            monitoring.log_retention_days,
            1..=365,
        )
    }

    fn validate_backup(prefix: &str, backup: &BackupConfig) -> Result<()> {
        Self::check_range(
            format!("{prefix}.retention_days"),
            backup.retention_days,
            1..=365,
        )
    }

    fn validate_high_availability(prefix: &str, ha: &HighAvailabilityConfig) -> Result<()> {
        Self::check_range(
            format!("{prefix}.health_check_interval"),
            ha.health_check_interval,
            10..=300,
        )?;
        Self::check_range(
            format!("{prefix}.unhealthy_threshold"),
            ha.unhealthy_threshold,
            2..=10,
        )
    }

    fn validate_component_names(field: &str, names: &[String]) -> Result<()> {
        for (i, name) in names.iter().enumerate() {
            name.parse::<Component>()
                .map_err(|e| Error::invalid(format!("{field}[{i}]"), e.to_string()))?;
        }
        Ok(())
    }

    /// Validate the stack-type table, including the inheritance graph.
    fn validate_stacks(stacks: &BTreeMap<StackType, StackConfig>) -> Result<()> {
        for (stack_type, stack) in stacks {
            let prefix = format!("stacks.{stack_type}");

            if stack.description.trim().is_empty() {
                return Err(Error::invalid(
                    format!("{prefix}.description"),
                    "Cannot be empty or only whitespace",
                ));
            }
            Self::validate_component_names(&format!("{prefix}.components"), &stack.components)?;

            inheritance_chain(stacks, *stack_type)?;
        }
        Ok(())
    }
}
