//! Assignable settings sections.
//!
//! Stack-type overlays and runtime overrides may only assign the top-level
//! sections of [`EnvironmentSettings`] listed in [`SETTINGS_FIELDS`]. Any
//! other key is ignored.

use serde_yaml::{Mapping, Value};

use crate::config::schema::EnvironmentSettings;
use crate::error::{Error, Result};

type Setter = fn(&mut EnvironmentSettings, Value) -> std::result::Result<(), serde_yaml::Error>;

/// A settings section that overlays may assign.
pub struct SettingsField {
    /// Section name as written in YAML.
    pub name: &'static str,
    set: Setter,
}

impl SettingsField {
    /// Assign `value` to this section of `settings`.
    ///
    /// A YAML `null` clears optional sections.
    ///
    /// # Errors
    ///
    /// Returns the deserialization error if `value` has the wrong shape.
    pub fn assign(
        &self,
        settings: &mut EnvironmentSettings,
        value: Value,
    ) -> std::result::Result<(), serde_yaml::Error> {
        (self.set)(settings, value)
    }
}

macro_rules! section {
    ($name:ident) => {
        SettingsField {
            name: stringify!($name),
            set: |settings, value| {
                settings.$name = serde_yaml::from_value(value)?;
                Ok(())
            },
        }
    };
}

/// Every section an overlay may assign.
pub static SETTINGS_FIELDS: &[SettingsField] = &[
    section!(deployment_type),
    section!(docker),
    section!(fargate),
    section!(scaling),
    section!(networking),
    section!(access),
    section!(database),
    section!(auth),
    section!(monitoring),
    section!(backup),
    section!(high_availability),
    section!(features),
];

/// Look up an assignable section by name.
///
/// # Examples
///
/// ```
/// use n8n_deploy::config::overlay::settings_field;
///
/// assert!(settings_field("fargate").is_some());
/// assert!(settings_field("not_a_real_field").is_none());
/// ```
#[must_use]
pub fn settings_field(name: &str) -> Option<&'static SettingsField> {
    SETTINGS_FIELDS.iter().find(|field| field.name == name)
}

/// Assign one key onto `settings` in place.
///
/// Returns whether the key named an assignable section.
///
/// # Errors
///
/// Returns [`Error::ConfigInvalid`] at `<origin>.<key>` if the value has the
/// wrong shape for its section.
pub fn assign_field(
    settings: &mut EnvironmentSettings,
    key: &str,
    value: Value,
    origin: &str,
) -> Result<bool> {
    let Some(field) = settings_field(key) else {
        log::debug!("{origin}: ignoring unknown settings key '{key}'");
        return Ok(false);
    };

    field
        .assign(settings, value)
        .map_err(|e| Error::invalid(format!("{origin}.{key}"), e.to_string()))?;
    Ok(true)
}

/// Apply a settings overlay, returning the new settings.
///
/// Keys are applied in document order; non-string keys and keys that are not
/// assignable sections are ignored. The input is left untouched.
///
/// # Errors
///
/// Returns [`Error::ConfigInvalid`] if a recognized section has the wrong shape.
///
/// # Examples
///
/// ```
/// use n8n_deploy::config::overlay::apply_settings;
/// use n8n_deploy::config::EnvironmentSettings;
///
/// let overlay: serde_yaml::Mapping =
///     serde_yaml::from_str("fargate: { cpu: 512, memory: 1024 }\nbogus: 1").unwrap();
/// let settings = apply_settings(&EnvironmentSettings::default(), &overlay, "stacks.minimal.settings").unwrap();
/// assert_eq!(settings.fargate.unwrap().cpu, 512);
/// ```
pub fn apply_settings(
    settings: &EnvironmentSettings,
    overlay: &Mapping,
    origin: &str,
) -> Result<EnvironmentSettings> {
    let mut resolved = settings.clone();
    for (key, value) in overlay {
        match key.as_str() {
            Some(key) => {
                assign_field(&mut resolved, key, value.clone(), origin)?;
            }
            None => log::debug!("{origin}: ignoring non-string settings key {key:?}"),
        }
    }
    Ok(resolved)
}
