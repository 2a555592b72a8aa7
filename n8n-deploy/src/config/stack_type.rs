//! Stack-type preset application.
//!
//! A preset contributes a settings overlay and the list of components to
//! build. Presets may inherit from one another; the chain is applied
//! root-first so the requested preset has the last word.

use std::collections::BTreeMap;

use serde_yaml::{Mapping, Value};

use crate::config::overlay::apply_settings;
use crate::config::schema::{
    EnvironmentConfig, N8nConfig, StackConfig, StackType, COMPONENTS_FEATURE, INHERIT_DEFAULTS,
};
use crate::error::{Error, Result};

/// Parse a stack-type selector against the presets a document defines.
///
/// # Errors
///
/// Returns [`Error::StackTypeNotFound`] if the name is not a stack type or
/// the document has no preset for it.
///
/// # Examples
///
/// ```
/// use n8n_deploy::config::{stack_type::resolve_stack_type, N8nConfig};
///
/// let config: N8nConfig = serde_yaml::from_str(r#"
/// global: { project_name: n8n, organization: acme }
/// environments: {}
/// stacks:
///   minimal: { description: small, components: [fargate] }
/// "#).unwrap();
/// assert!(resolve_stack_type(&config, "minimal").is_ok());
/// assert!(resolve_stack_type(&config, "enterprise").unwrap_err().is_not_found());
/// ```
pub fn resolve_stack_type(config: &N8nConfig, name: &str) -> Result<StackType> {
    name.parse::<StackType>()
        .ok()
        .filter(|stack_type| config.stack_config(*stack_type).is_some())
        .ok_or_else(|| Error::StackTypeNotFound {
            name: name.to_string(),
            available: config.stack_type_names(),
        })
}

/// Resolve the inheritance chain of a preset, root first.
///
/// The chain ends at a preset without `inherit_from` or one inheriting from
/// `defaults`. The returned list ends with `start` itself.
///
/// # Errors
///
/// Returns [`Error::StackTypeNotFound`] if `start` is not in the table, and
/// [`Error::ConfigInvalid`] if a parent is unknown or the chain loops.
pub fn inheritance_chain(
    stacks: &BTreeMap<StackType, StackConfig>,
    start: StackType,
) -> Result<Vec<StackType>> {
    if !stacks.contains_key(&start) {
        return Err(Error::StackTypeNotFound {
            name: start.to_string(),
            available: stacks.keys().map(ToString::to_string).collect(),
        });
    }

    let mut chain = vec![start];
    let mut current = start;

    while let Some(parent) = stacks
        .get(&current)
        .and_then(|stack| stack.inherit_from.as_deref())
    {
        if parent == INHERIT_DEFAULTS {
            break;
        }

        let field = format!("stacks.{current}.inherit_from");
        let parent_type = parent.parse::<StackType>().map_err(|_| {
            Error::invalid(&field, format!("unknown stack type '{parent}'"))
        })?;
        if !stacks.contains_key(&parent_type) {
            return Err(Error::invalid(
                field,
                format!("inherits from undefined stack type '{parent}'"),
            ));
        }
        if chain.contains(&parent_type) {
            let path: Vec<&str> = chain
                .iter()
                .map(|t| t.as_str())
                .chain(std::iter::once(parent_type.as_str()))
                .collect();
            return Err(Error::invalid(
                format!("stacks.{start}.inherit_from"),
                format!("inheritance cycle: {}", path.join(" -> ")),
            ));
        }

        chain.push(parent_type);
        current = parent_type;
    }

    chain.reverse();
    Ok(chain)
}

/// Apply a stack-type preset to an environment.
///
/// Each preset's `settings` overlay in the inheritance chain is applied in
/// order through the assignable-section allow-list, then the requested
/// preset's component list replaces `features.components`. Other feature
/// keys are preserved. A `components` key inside a `settings` overlay is not
/// a settings section and is skipped.
///
/// # Errors
///
/// Returns [`Error::StackTypeNotFound`] if the document has no such preset,
/// or [`Error::ConfigInvalid`] for broken inheritance or malformed overlays.
pub fn apply_stack_type(
    config: &N8nConfig,
    env: &EnvironmentConfig,
    stack_type: StackType,
) -> Result<EnvironmentConfig> {
    let (Some(stacks), Some(preset)) = (config.stacks.as_ref(), config.stack_config(stack_type))
    else {
        return Err(Error::StackTypeNotFound {
            name: stack_type.to_string(),
            available: config.stack_type_names(),
        });
    };

    let mut settings = env.settings.clone();
    for link in inheritance_chain(stacks, stack_type)? {
        let Some(overlay) = stacks.get(&link).and_then(|stack| stack.settings.as_ref()) else {
            continue;
        };
        let filtered: Mapping = overlay
            .iter()
            .filter(|(key, _)| key.as_str() != Some(COMPONENTS_FEATURE))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        log::debug!("applying settings overlay of stack type '{link}'");
        settings = apply_settings(&settings, &filtered, &format!("stacks.{link}.settings"))?;
    }

    let components = preset
        .components
        .iter()
        .cloned()
        .map(Value::String)
        .collect();
    let mut features = settings.features.take().unwrap_or_default();
    features.insert(COMPONENTS_FEATURE.to_string(), Value::Sequence(components));
    settings.features = Some(features);

    Ok(EnvironmentConfig {
        settings,
        ..env.clone()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENT: &str = r#"
global: { project_name: n8n, organization: acme }
environments:
  dev:
    account: "123456789012"
    region: us-east-1
    settings:
      fargate: { cpu: 256, memory: 512 }
      features: { webhooks: true }
stacks:
  minimal:
    description: Minimal setup
    components: [fargate, efs, api_gateway]
    settings:
      fargate: { cpu: 256, memory: 1024 }
      components: [ignored]
      not_a_real_field: 42
  standard:
    description: Standard setup
    components: [fargate, efs, api_gateway, monitoring]
    inherit_from: minimal
    settings:
      monitoring: { log_retention_days: 60 }
"#;

    fn config() -> N8nConfig {
        serde_yaml::from_str(DOCUMENT).unwrap()
    }

    fn components(env: &EnvironmentConfig) -> Vec<String> {
        env.settings.components().unwrap().unwrap()
    }

    #[test]
    fn test_minimal_components_written_to_features() {
        let config = config();
        let env = config.environment("dev").unwrap();
        let resolved = apply_stack_type(&config, env, StackType::Minimal).unwrap();
        assert_eq!(components(&resolved), vec!["fargate", "efs", "api_gateway"]);
        assert_eq!(resolved.settings.fargate.as_ref().unwrap().memory, 1024);
    }

    #[test]
    fn test_other_features_preserved() {
        let config = config();
        let env = config.environment("dev").unwrap();
        let resolved = apply_stack_type(&config, env, StackType::Minimal).unwrap();
        let features = resolved.settings.features.unwrap();
        assert_eq!(features.get("webhooks"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_input_environment_untouched() {
        let config = config();
        let env = config.environment("dev").unwrap();
        let before = env.clone();
        let _ = apply_stack_type(&config, env, StackType::Standard).unwrap();
        assert_eq!(env, &before);
    }

    #[test]
    fn test_inherited_overlays_applied_root_first() {
        let config = config();
        let env = config.environment("dev").unwrap();
        let resolved = apply_stack_type(&config, env, StackType::Standard).unwrap();
        // Parent contributes fargate, child contributes monitoring.
        assert_eq!(resolved.settings.fargate.as_ref().unwrap().memory, 1024);
        assert_eq!(
            resolved.settings.monitoring.as_ref().unwrap().log_retention_days,
            60
        );
        // Component list comes from the requested preset only.
        assert_eq!(
            components(&resolved),
            vec!["fargate", "efs", "api_gateway", "monitoring"]
        );
    }

    #[test]
    fn test_chain_order() {
        let config = config();
        let chain = inheritance_chain(config.stacks.as_ref().unwrap(), StackType::Standard).unwrap();
        assert_eq!(chain, vec![StackType::Minimal, StackType::Standard]);
    }

    #[test]
    fn test_absent_preset_not_found() {
        let config = config();
        let env = config.environment("dev").unwrap();
        let err = apply_stack_type(&config, env, StackType::Enterprise).unwrap_err();
        match err {
            Error::StackTypeNotFound { name, available } => {
                assert_eq!(name, "enterprise");
                assert_eq!(available, vec!["minimal", "standard"]);
            }
            other => panic!("expected StackTypeNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_no_stacks_table() {
        let mut config = config();
        config.stacks = None;
        let env = config.environments["dev"].clone();
        assert!(apply_stack_type(&config, &env, StackType::Minimal)
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_resolve_stack_type_unknown_name() {
        let err = resolve_stack_type(&config(), "huge").unwrap_err();
        assert!(err.to_string().contains("'huge'"));
        assert!(err.to_string().contains("minimal, standard"));
    }

    #[test]
    fn test_self_inheritance_is_cycle() {
        let mut config = config();
        if let Some(stacks) = config.stacks.as_mut() {
            stacks
                .get_mut(&StackType::Minimal)
                .unwrap()
                .inherit_from = Some("minimal".to_string());
        }
        let err = inheritance_chain(config.stacks.as_ref().unwrap(), StackType::Minimal)
            .unwrap_err();
        assert!(err.to_string().contains("inheritance cycle: minimal -> minimal"));
    }
}
