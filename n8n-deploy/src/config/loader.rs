//! Configuration file discovery and loading.
//!
//! A [`ConfigLoader`] locates `system.yaml`, parses it once, validates it
//! once, and then resolves any number of environments from the cached root.

use std::cell::OnceCell;
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::merger::{ConfigMerger, Overrides};
use crate::config::schema::{AccessType, EnvironmentConfig, N8nConfig};
use crate::config::stack_type::{apply_stack_type, resolve_stack_type};
use crate::config::validator::ConfigValidator;
use crate::error::{Error, Result};

/// Conventional name of the configuration document.
pub const DEFAULT_CONFIG_FILE: &str = "system.yaml";

/// Default output path of [`ConfigLoader::generate_example_config`].
pub const DEFAULT_EXAMPLE_FILE: &str = "system.yaml.example";

const EXAMPLE_CONFIG: &str = r#"# n8n deployment configuration.
# Copy to system.yaml and adjust accounts, regions and domains.

global:
  project_name: n8n-serverless
  organization: mycompany
  tags:
    Project: n8n
    Environment: "{{ environment }}"
    Owner: platform-team
  cost_allocation_tags:
    - Project
    - Environment
    - CostCenter

# Used when an environment omits the whole section.
defaults:
  fargate:
    cpu: 256
    memory: 512
    spot_percentage: 80
  efs:
    lifecycle_days: 30
  monitoring:
    log_retention_days: 30
    enable_container_insights: true
  backup:
    enabled: true
    retention_days: 7

environments:
  dev:
    account: "123456789012"
    region: us-east-1
    settings:
      deployment_type: aws
      fargate:
        cpu: 256
        memory: 512
      scaling:
        min_tasks: 1
        max_tasks: 1
      networking:
        use_existing_vpc: false
        vpc_cidr: 10.0.0.0/16
      access:
        cloudfront_enabled: false
        api_gateway_throttle: 100
      auth:
        basic_auth_enabled: true
        oauth_enabled: false
      docker:
        compose_file: docker/docker-compose.yml
        image: n8nio/n8n:1.94.1
        port: 5678
    tags:
      CostCenter: engineering

  production:
    account: "123456789013"
    region: us-west-2
    multi_region:
      enabled: false
    settings:
      fargate:
        cpu: 1024
        memory: 2048
        spot_percentage: 50
      scaling:
        min_tasks: 2
        max_tasks: 10
        target_cpu_utilization: 70
      networking:
        use_existing_vpc: true
        vpc_id: vpc-prod12345
        subnet_ids:
          - subnet-1
          - subnet-2
      access:
        domain_name: n8n.example.com
        cloudfront_enabled: true
        waf_enabled: true
        api_gateway_throttle: 10000
        ip_whitelist:
          - 203.0.113.0/24
      database:
        type: postgres
        use_existing: false
        instance_class: db.t4g.micro
        multi_az: true
        backup_retention_days: 14
      auth:
        basic_auth_enabled: false
        oauth_enabled: true
        oauth_provider: okta
        mfa_required: true
        allowed_email_domains:
          - example.com
      monitoring:
        log_retention_days: 90
        alarm_email: ops@example.com
        enable_container_insights: true
        enable_xray_tracing: true
      backup:
        enabled: true
        retention_days: 30
        cross_region_backup: true
        backup_regions:
          - us-east-1
      high_availability:
        multi_az: true
        auto_scaling_enabled: true
        health_check_interval: 30
        unhealthy_threshold: 3
    tags:
      CostCenter: operations

stacks:
  minimal:
    description: Minimal setup for personal use
    components:
      - fargate
      - efs
      - api_gateway
    settings:
      fargate:
        cpu: 256
        memory: 512
  standard:
    description: Standard setup with monitoring
    components:
      - fargate
      - efs
      - api_gateway
      - cloudfront
      - monitoring
    inherit_from: defaults

shared_resources:
  security:
    certificate_arn: arn:aws:acm:us-east-1:123456789012:certificate/example
  networking:
    route53_zone_id: Z0123456789EXAMPLE
"#;

/// Loads and resolves a configuration document.
///
/// The parsed document and the validated root are cached for the lifetime
/// of the loader. Create a new loader to pick up changes on disk.
///
/// # Examples
///
/// ```no_run
/// use n8n_deploy::config::ConfigLoader;
///
/// let loader = ConfigLoader::new("system.yaml");
/// let config = loader.load_config("dev", Some("minimal"), None).unwrap();
/// assert_eq!(config.environment_names(), vec!["dev".to_string()]);
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config_file: PathBuf,
    working_dir: Option<PathBuf>,
    path: OnceCell<PathBuf>,
    raw: OnceCell<serde_yaml::Value>,
    root: OnceCell<N8nConfig>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIG_FILE)
    }
}

impl ConfigLoader {
    /// Create a loader for the given document path.
    #[must_use]
    pub fn new(config_file: impl Into<PathBuf>) -> Self {
        Self {
            config_file: config_file.into(),
            working_dir: None,
            path: OnceCell::new(),
            raw: OnceCell::new(),
            root: OnceCell::new(),
        }
    }

    /// Start the upward search from `dir` instead of the process working directory.
    #[must_use]
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// The path of the document this loader reads.
    ///
    /// If the configured path does not exist, each ancestor of the working
    /// directory is searched for a file with the same name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigNotFound`] if no document can be located.
    pub fn config_path(&self) -> Result<&Path> {
        if let Some(path) = self.path.get() {
            return Ok(path);
        }
        let found = self.locate()?;
        log::debug!("using configuration file {}", found.display());
        Ok(self.path.get_or_init(|| found))
    }

    fn locate(&self) -> Result<PathBuf> {
        if self.config_file.is_file() {
            return Ok(self.config_file.clone());
        }

        let not_found = || Error::ConfigNotFound {
            path: self.config_file.clone(),
        };
        let file_name = self.config_file.file_name().ok_or_else(not_found)?;
        let mut current = match self.working_dir {
            Some(ref dir) => dir.clone(),
            None => env::current_dir()?,
        };

        loop {
            let candidate = current.join(file_name);
            if candidate.is_file() {
                return Ok(candidate);
            }
            if !current.pop() {
                break;
            }
        }

        Err(not_found())
    }

    /// The parsed document, before schema conversion.
    fn raw_document(&self) -> Result<&serde_yaml::Value> {
        if let Some(raw) = self.raw.get() {
            return Ok(raw);
        }
        let path = self.config_path()?;
        let contents = fs::read_to_string(path)?;
        let raw = serde_yaml::from_str(&contents).map_err(|e| Error::ConfigParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(self.raw.get_or_init(|| raw))
    }

    /// The validated root configuration with every environment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigNotFound`], [`Error::ConfigParse`] or
    /// [`Error::ConfigInvalid`].
    pub fn config(&self) -> Result<&N8nConfig> {
        if let Some(root) = self.root.get() {
            return Ok(root);
        }
        let root = ConfigValidator::deserialize(self.raw_document()?.clone())?;
        ConfigValidator::validate(&root)?;
        Ok(self.root.get_or_init(|| root))
    }

    /// Resolve one environment.
    ///
    /// Applies, in order: the stack-type preset (if requested), the defaults
    /// merge, and the overrides (if any). The resolved environment is then
    /// normalized and validated again. The returned root holds only the
    /// requested environment; the global section, defaults, stack table and
    /// shared resources are carried over unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigNotFound`], [`Error::ConfigParse`],
    /// [`Error::ConfigInvalid`], [`Error::EnvironmentNotFound`] or
    /// [`Error::StackTypeNotFound`].
    pub fn load_config(
        &self,
        environment: &str,
        stack_type: Option<&str>,
        overrides: Option<&Overrides>,
    ) -> Result<N8nConfig> {
        let root = self.config()?;

        let mut resolved = root
            .environment(environment)
            .cloned()
            .ok_or_else(|| Error::EnvironmentNotFound {
                name: environment.to_string(),
                available: root.environment_names(),
            })?;

        if let Some(name) = stack_type {
            let stack_type = resolve_stack_type(root, name)?;
            log::debug!("applying stack type '{stack_type}' to environment '{environment}'");
            resolved = apply_stack_type(root, &resolved, stack_type)?;
        }

        resolved = ConfigMerger::merge_with_defaults(&resolved, root.defaults.as_ref());

        if let Some(overrides) = overrides.filter(|o| !o.is_empty()) {
            log::debug!("applying {} override(s)", overrides.len());
            resolved = ConfigMerger::apply_overrides(&resolved, overrides)?;
        }

        let resolved = Self::normalize(resolved);
        ConfigValidator::validate_environment(environment, &resolved)?;

        Ok(N8nConfig {
            global: root.global.clone(),
            defaults: root.defaults.clone(),
            environments: BTreeMap::from([(environment.to_string(), resolved)]),
            stacks: root.stacks.clone(),
            shared_resources: root.shared_resources.clone(),
        })
    }

    fn normalize(mut env: EnvironmentConfig) -> EnvironmentConfig {
        if let Some(access) = env.settings.access.as_ref() {
            if access.kind == AccessType::Cloudflare && access.cloudflare.is_none() {
                log::warn!("tunnel access without a tunnel section, using a provisional tunnel");
            }
        }
        env.settings.access = env.settings.access.as_ref().map(|a| a.normalized());
        env
    }

    /// Names of the environments the document defines.
    ///
    /// # Errors
    ///
    /// Returns any error from loading the document.
    pub fn available_environments(&self) -> Result<Vec<String>> {
        Ok(self.config()?.environment_names())
    }

    /// Names of the stack types the document defines.
    ///
    /// # Errors
    ///
    /// Returns any error from loading the document.
    pub fn available_stack_types(&self) -> Result<Vec<String>> {
        Ok(self.config()?.stack_type_names())
    }

    /// Parse and validate the document without resolving an environment.
    ///
    /// Returns the path of the validated document.
    ///
    /// # Errors
    ///
    /// Returns any error from loading the document.
    pub fn validate_config_file(&self) -> Result<PathBuf> {
        self.config()?;
        Ok(self.config_path()?.to_path_buf())
    }

    /// The text of the example configuration document.
    #[must_use]
    pub const fn example_config() -> &'static str {
        EXAMPLE_CONFIG
    }

    /// Write the example configuration document to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be written.
    pub fn generate_example_config(path: &Path) -> Result<()> {
        fs::write(path, EXAMPLE_CONFIG)?;
        log::debug!("wrote example configuration to {}", path.display());
        Ok(())
    }
}

/// Load one environment from `system.yaml`, searching upward from the
/// working directory.
///
/// # Errors
///
/// Returns any error from [`ConfigLoader::load_config`].
pub fn get_config(environment: &str, stack_type: Option<&str>) -> Result<N8nConfig> {
    ConfigLoader::default().load_config(environment, stack_type, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::StackType;
    use tempfile::TempDir;

    const DOCUMENT: &str = r#"
global: { project_name: n8n, organization: acme }
defaults:
  fargate: { cpu: 512, memory: 1024 }
environments:
  dev:
    account: "123456789012"
    region: us-east-1
    settings:
      monitoring: { log_retention_days: 14 }
  production:
    account: "123456789013"
    region: us-west-2
    settings:
      fargate: { cpu: 1024, memory: 2048 }
stacks:
  minimal:
    description: Minimal
    components: [fargate, efs, api_gateway]
"#;

    fn write_config(dir: &TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_environment() {
        let dir = TempDir::new().unwrap();
        let loader = ConfigLoader::new(write_config(&dir, DOCUMENT));
        let config = loader.load_config("dev", None, None).unwrap();

        assert_eq!(config.environment_names(), vec!["dev".to_string()]);
        let dev = config.environment("dev").unwrap();
        assert_eq!(dev.settings.fargate.as_ref().unwrap().cpu, 512);
        assert_eq!(dev.settings.monitoring.as_ref().unwrap().log_retention_days, 14);
        assert!(config.stacks.is_some());
        assert!(config.defaults.is_some());
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let loader = ConfigLoader::new("missing.yaml").with_working_dir(dir.path());
        let err = loader.load_config("dev", None, None).unwrap_err();
        assert!(matches!(err, Error::ConfigNotFound { .. }));
    }

    #[test]
    fn test_upward_search_from_working_dir() {
        let dir = TempDir::new().unwrap();
        write_config(&dir, DOCUMENT);
        let nested = dir.path().join("infra").join("stacks");
        fs::create_dir_all(&nested).unwrap();

        let loader =
            ConfigLoader::new("does-not-exist/system.yaml").with_working_dir(&nested);
        assert_eq!(
            loader.config_path().unwrap(),
            dir.path().join(DEFAULT_CONFIG_FILE)
        );
    }

    #[test]
    fn test_parse_error_is_distinct() {
        let dir = TempDir::new().unwrap();
        let loader = ConfigLoader::new(write_config(&dir, "global: [unclosed"));
        let err = loader.validate_config_file().unwrap_err();
        assert!(matches!(err, Error::ConfigParse { .. }));
        assert!(err.to_string().contains("invalid YAML"));
    }

    #[test]
    fn test_environment_not_found() {
        let dir = TempDir::new().unwrap();
        let loader = ConfigLoader::new(write_config(&dir, DOCUMENT));
        match loader.load_config("staging", None, None).unwrap_err() {
            Error::EnvironmentNotFound { name, available } => {
                assert_eq!(name, "staging");
                assert_eq!(available, vec!["dev", "production"]);
            }
            other => panic!("expected EnvironmentNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_stack_type_not_found() {
        let dir = TempDir::new().unwrap();
        let loader = ConfigLoader::new(write_config(&dir, DOCUMENT));
        for name in ["enterprise", "gigantic"] {
            let err = loader.load_config("dev", Some(name), None).unwrap_err();
            assert!(matches!(err, Error::StackTypeNotFound { .. }), "{name}");
        }
    }

    #[test]
    fn test_overrides_revalidated() {
        let dir = TempDir::new().unwrap();
        let loader = ConfigLoader::new(write_config(&dir, DOCUMENT));
        let mut overrides = Overrides::new();
        overrides
            .set_assignment("scaling={min_tasks: 5, max_tasks: 2}")
            .unwrap();
        let err = loader
            .load_config("dev", None, Some(&overrides))
            .unwrap_err();
        assert!(err
            .to_string()
            .contains("environments.dev.settings.scaling.max_tasks"));
    }

    #[test]
    fn test_tunnel_access_normalized() {
        let dir = TempDir::new().unwrap();
        let loader = ConfigLoader::new(write_config(&dir, DOCUMENT));
        let mut overrides = Overrides::new();
        overrides.set_assignment("access={type: cloudflare}").unwrap();

        let config = loader.load_config("dev", None, Some(&overrides)).unwrap();
        let access = config.environments["dev"].settings.access.clone().unwrap();
        assert_eq!(access.kind, AccessType::Cloudflare);
        let tunnel = access.cloudflare.unwrap();
        assert!(tunnel.enabled);
        assert!(tunnel.provisional);
    }

    #[test]
    fn test_tunnel_section_same_outcome_everywhere() {
        let access = |cloudflare: &str| {
            r#"
global: { project_name: n8n, organization: acme }
environments:
  dev:
    account: "1"
    region: us-east-1
    settings:
      access: { type: cloudflare, cloudflare: TUNNEL }
"#
            .replace("TUNNEL", cloudflare)
        };

        // declared without `enabled`: accepted by both paths
        let dir = TempDir::new().unwrap();
        let loader = ConfigLoader::new(write_config(&dir, &access("{ tunnel_name: n8n }")));
        loader.validate_config_file().unwrap();
        let config = loader.load_config("dev", None, None).unwrap();
        let tunnel = config.environments["dev"]
            .settings
            .access
            .clone()
            .and_then(|a| a.cloudflare)
            .unwrap();
        assert!(tunnel.enabled);
        assert_eq!(tunnel.tunnel_name.as_deref(), Some("n8n"));

        // declared enabled without a token: rejected by both paths
        let dir = TempDir::new().unwrap();
        let loader = ConfigLoader::new(write_config(&dir, &access("{ enabled: true }")));
        let field = "environments.dev.settings.access.cloudflare.tunnel_token_secret_name";
        assert!(loader.validate_config_file().unwrap_err().to_string().contains(field));
        assert!(loader
            .load_config("dev", None, None)
            .unwrap_err()
            .to_string()
            .contains(field));
    }

    #[test]
    fn test_cache_filled_once() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, DOCUMENT);
        let loader = ConfigLoader::new(&path);
        let first = loader.load_config("dev", None, None).unwrap();

        // Edits on disk are not seen by the same loader.
        fs::write(&path, "not: [valid").unwrap();
        let second = loader.load_config("dev", None, None).unwrap();
        assert_eq!(first, second);

        // A fresh loader reads the file again.
        assert!(ConfigLoader::new(&path).config().is_err());
    }

    #[test]
    fn test_available_names() {
        let dir = TempDir::new().unwrap();
        let loader = ConfigLoader::new(write_config(&dir, DOCUMENT));
        assert_eq!(
            loader.available_environments().unwrap(),
            vec!["dev", "production"]
        );
        assert_eq!(loader.available_stack_types().unwrap(), vec!["minimal"]);
    }

    #[test]
    fn test_example_config_loads_everywhere() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(DEFAULT_EXAMPLE_FILE);
        ConfigLoader::generate_example_config(&path).unwrap();

        let loader = ConfigLoader::new(&path);
        let environments = loader.available_environments().unwrap();
        assert_eq!(environments, vec!["dev", "production"]);

        for env in &environments {
            loader.load_config(env, None, None).unwrap();
            for stack_type in StackType::ALL {
                if loader.available_stack_types().unwrap().contains(&stack_type.to_string()) {
                    loader
                        .load_config(env, Some(stack_type.as_str()), None)
                        .unwrap();
                }
            }
        }
    }
}
