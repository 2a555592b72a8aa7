//! Defaults merge and runtime overrides.
//!
//! Both steps work on whole settings sections. The defaults merge fills in
//! `fargate`, `monitoring` and `backup` only when the environment omits the
//! section entirely; a section with a single field present keeps no default
//! fields. Overrides assign sections by name through the overlay allow-list.

use std::collections::BTreeMap;

use serde_yaml::Value;

use crate::config::overlay::assign_field;
use crate::config::schema::{DefaultsConfig, EnvironmentConfig};
use crate::error::{Error, Result};

/// Runtime overrides keyed by settings section name.
///
/// # Examples
///
/// ```
/// use n8n_deploy::config::Overrides;
///
/// let mut overrides = Overrides::new();
/// overrides.set_assignment("fargate={cpu: 512, memory: 1024}").unwrap();
/// assert_eq!(overrides.len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides(BTreeMap<String, Value>);

impl Overrides {
    /// Create an empty set of overrides.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one override.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    /// Parse a `key=value` assignment, with the value written as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigInvalid`] if there is no `=`, the key is empty
    /// or the value is not valid YAML.
    ///
    /// # Examples
    ///
    /// ```
    /// use n8n_deploy::config::Overrides;
    ///
    /// let (key, value) = Overrides::parse_assignment("deployment_type=docker").unwrap();
    /// assert_eq!(key, "deployment_type");
    /// assert_eq!(value.as_str(), Some("docker"));
    /// assert!(Overrides::parse_assignment("novalue").is_err());
    /// ```
    pub fn parse_assignment(assignment: &str) -> Result<(String, Value)> {
        let (key, raw) = assignment.split_once('=').ok_or_else(|| {
            Error::invalid(
                "overrides",
                format!("expected key=value, got '{assignment}'"),
            )
        })?;
        let key = key.trim();
        if key.is_empty() {
            return Err(Error::invalid("overrides", "override key cannot be empty"));
        }
        let value = serde_yaml::from_str(raw)
            .map_err(|e| Error::invalid(format!("overrides.{key}"), e.to_string()))?;
        Ok((key.to_string(), value))
    }

    /// Parse and set a `key=value` assignment.
    ///
    /// # Errors
    ///
    /// See [`Overrides::parse_assignment`].
    pub fn set_assignment(&mut self, assignment: &str) -> Result<()> {
        let (key, value) = Self::parse_assignment(assignment)?;
        self.insert(key, value);
        Ok(())
    }

    /// Number of overrides.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no overrides are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the overrides in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

impl FromIterator<(String, Value)> for Overrides {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Merges environment settings with defaults and overrides.
pub struct ConfigMerger;

impl ConfigMerger {
    /// Substitute default sections the environment omits entirely.
    ///
    /// # Examples
    ///
    /// ```
    /// use n8n_deploy::config::{ConfigMerger, DefaultsConfig, EnvironmentConfig, FargateConfig};
    ///
    /// let env: EnvironmentConfig = serde_yaml::from_str(
    ///     "{ account: '1', region: us-east-1, settings: {} }").unwrap();
    /// let defaults = DefaultsConfig {
    ///     fargate: Some(FargateConfig { cpu: 512, memory: 1024, ..Default::default() }),
    ///     ..Default::default()
    /// };
    /// let merged = ConfigMerger::merge_with_defaults(&env, Some(&defaults));
    /// assert_eq!(merged.settings.fargate.unwrap().cpu, 512);
    /// ```
    #[must_use]
    pub fn merge_with_defaults(
        env: &EnvironmentConfig,
        defaults: Option<&DefaultsConfig>,
    ) -> EnvironmentConfig {
        let mut merged = env.clone();
        let Some(defaults) = defaults else {
            return merged;
        };

        let settings = &mut merged.settings;
        if settings.fargate.is_none() {
            settings.fargate.clone_from(&defaults.fargate);
        }
        if settings.monitoring.is_none() {
            settings.monitoring.clone_from(&defaults.monitoring);
        }
        if settings.backup.is_none() {
            settings.backup.clone_from(&defaults.backup);
        }

        merged
    }

    /// Apply runtime overrides, one settings section per key.
    ///
    /// Keys that are not assignable settings sections are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigInvalid`] at `overrides.<key>` if a value has the
    /// wrong shape for its section.
    pub fn apply_overrides(
        env: &EnvironmentConfig,
        overrides: &Overrides,
    ) -> Result<EnvironmentConfig> {
        let mut resolved = env.clone();
        for (key, value) in overrides.iter() {
            if assign_field(&mut resolved.settings, key, value.clone(), "overrides")? {
                log::debug!("override applied to settings.{key}");
            }
        }
        Ok(resolved)
    }
}


// Property-based tests for the defaults merge
#[cfg(test)]
#[allow(unused_doc_comments)] // proptest! macro doesn't support doc comments
mod property_tests {
    use super::*;
    use crate::config::schema::{BackupConfig, EnvironmentSettings, FargateConfig, MonitoringConfig};
    use proptest::prelude::*;

    fn fargate_strategy() -> impl Strategy<Value = FargateConfig> {
        (0u32..=100).prop_map(|spot_percentage| FargateConfig {
            spot_percentage,
            ..Default::default()
        })
    }

    fn monitoring_strategy() -> impl Strategy<Value = MonitoringConfig> {
        (1u32..=365).prop_map(|log_retention_days| MonitoringConfig {
            log_retention_days,
            ..Default::default()
        })
    }

    fn backup_strategy() -> impl Strategy<Value = BackupConfig> {
        (1u32..=365, any::<bool>()).prop_map(|(retention_days, enabled)| BackupConfig {
            enabled,
            retention_days,
            ..Default::default()
        })
    }

    /// Property: each merged section is the environment's own section when
    /// present, otherwise the defaults section, never a mix.
    proptest! {
        #[test]
        fn prop_merge_all_or_nothing(
            env_fargate in prop::option::of(fargate_strategy()),
            env_monitoring in prop::option::of(monitoring_strategy()),
            env_backup in prop::option::of(backup_strategy()),
            def_fargate in prop::option::of(fargate_strategy()),
            def_monitoring in prop::option::of(monitoring_strategy()),
            def_backup in prop::option::of(backup_strategy()),
        ) {
            let env = EnvironmentConfig {
                account: "1".to_string(),
                region: "us-east-1".to_string(),
                multi_region: None,
                settings: EnvironmentSettings {
                    fargate: env_fargate.clone(),
                    monitoring: env_monitoring.clone(),
                    backup: env_backup.clone(),
                    ..Default::default()
                },
                tags: None,
            };
            let defaults = DefaultsConfig {
                fargate: def_fargate.clone(),
                efs: None,
                monitoring: def_monitoring.clone(),
                backup: def_backup.clone(),
            };

            let merged = ConfigMerger::merge_with_defaults(&env, Some(&defaults));
            prop_assert_eq!(merged.settings.fargate, env_fargate.or(def_fargate));
            prop_assert_eq!(merged.settings.monitoring, env_monitoring.or(def_monitoring));
            prop_assert_eq!(merged.settings.backup, env_backup.or(def_backup));
        }
    }

    /// Property: merging is idempotent
    proptest! {
        #[test]
        fn prop_merge_idempotent(def_fargate in prop::option::of(fargate_strategy())) {
            let env = EnvironmentConfig {
                account: "1".to_string(),
                region: "us-east-1".to_string(),
                multi_region: None,
                settings: EnvironmentSettings::default(),
                tags: None,
            };
            let defaults = DefaultsConfig { fargate: def_fargate, ..Default::default() };
            let once = ConfigMerger::merge_with_defaults(&env, Some(&defaults));
            let twice = ConfigMerger::merge_with_defaults(&once, Some(&defaults));
            prop_assert_eq!(once, twice);
        }
    }
}
