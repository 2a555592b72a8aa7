//! Component kinds and their dependency graph.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::config::schema::{DatabaseType, EnvironmentSettings};
use crate::error::{Error, Result};

/// One deployable unit of infrastructure.
///
/// Declaration order is the tie-breaker for construction order.
///
/// # Examples
///
/// ```
/// use n8n_deploy::compose::Component;
///
/// assert_eq!("efs".parse::<Component>().unwrap(), Component::Storage);
/// assert_eq!("fargate".parse::<Component>().unwrap(), Component::Compute);
/// assert!("kafka".parse::<Component>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Component {
    /// Virtual network, subnets and security groups.
    Network,
    /// Shared filesystem for n8n data.
    Storage,
    /// Managed relational database.
    Database,
    /// Container service running n8n.
    Compute,
    /// Public entry point.
    Access,
    /// Alarms and dashboards.
    Monitoring,
}

impl Component {
    /// All components, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Network,
        Self::Storage,
        Self::Database,
        Self::Compute,
        Self::Access,
        Self::Monitoring,
    ];

    /// Canonical name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Storage => "storage",
            Self::Database => "database",
            Self::Compute => "compute",
            Self::Access => "access",
            Self::Monitoring => "monitoring",
        }
    }

    /// Components that must be selected for this one to be built.
    #[must_use]
    pub const fn requires(self) -> &'static [Self] {
        match self {
            Self::Storage | Self::Database => &[Self::Network],
            Self::Compute => &[Self::Network, Self::Storage],
            Self::Access => &[Self::Compute],
            Self::Network | Self::Monitoring => &[],
        }
    }

    /// Components that, when selected, are built before this one.
    #[must_use]
    pub const fn after(self) -> &'static [Self] {
        match self {
            Self::Compute => &[Self::Database],
            Self::Monitoring => &[Self::Compute, Self::Storage, Self::Database],
            _ => &[],
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Component {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "network" | "vpc" => Ok(Self::Network),
            "storage" | "efs" => Ok(Self::Storage),
            "database" | "rds" | "postgres" => Ok(Self::Database),
            "compute" | "fargate" => Ok(Self::Compute),
            "access" | "api_gateway" | "cloudfront" | "cloudflare" => Ok(Self::Access),
            "monitoring" | "alarms" => Ok(Self::Monitoring),
            _ => Err(Error::UnknownComponent {
                name: s.to_string(),
            }),
        }
    }
}

/// The set of components selected for one environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentSet(BTreeSet<Component>);

impl ComponentSet {
    /// Select components from resolved settings.
    ///
    /// An explicit `features.components` list is used as given; otherwise
    /// network, storage, compute and access are selected, plus database for
    /// postgres and monitoring when a monitoring section exists. In both
    /// cases a `networking` section selects network and a postgres database
    /// selects database.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownComponent`] for a name that is not a component
    /// or alias, and [`Error::ConfigInvalid`] if the list is malformed.
    ///
    /// # Examples
    ///
    /// ```
    /// use n8n_deploy::compose::{Component, ComponentSet};
    /// use n8n_deploy::config::EnvironmentSettings;
    ///
    /// let set = ComponentSet::select(&EnvironmentSettings::default()).unwrap();
    /// assert!(set.contains(Component::Access));
    /// assert!(!set.contains(Component::Database));
    /// ```
    pub fn select(settings: &EnvironmentSettings) -> Result<Self> {
        let postgres = settings.database_type() == DatabaseType::Postgres;

        let mut set: BTreeSet<Component> = match settings.components()? {
            Some(names) => names
                .iter()
                .map(|name| name.parse())
                .collect::<Result<_>>()?,
            None => {
                let mut set = BTreeSet::from([
                    Component::Network,
                    Component::Storage,
                    Component::Compute,
                    Component::Access,
                ]);
                if postgres {
                    set.insert(Component::Database);
                }
                if settings.monitoring.is_some() {
                    set.insert(Component::Monitoring);
                }
                set
            }
        };

        if settings.networking.is_some() {
            set.insert(Component::Network);
        }
        if postgres {
            set.insert(Component::Database);
        }

        Ok(Self(set))
    }

    /// Whether `component` is selected.
    #[must_use]
    pub fn contains(&self, component: Component) -> bool {
        self.0.contains(&component)
    }

    /// Selected components in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = Component> + '_ {
        self.0.iter().copied()
    }

    /// Number of selected components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The order in which the selected components are built.
    ///
    /// Every hard prerequisite is checked before any ordering happens.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DependencyUnsatisfied`] for the first selected
    /// component whose prerequisite is not selected.
    ///
    /// # Examples
    ///
    /// ```
    /// use n8n_deploy::compose::{Component, ComponentSet};
    ///
    /// let set: ComponentSet = [Component::Monitoring, Component::Network].into_iter().collect();
    /// assert_eq!(set.construction_order().unwrap(), vec![Component::Network, Component::Monitoring]);
    ///
    /// let set: ComponentSet = [Component::Storage].into_iter().collect();
    /// assert!(set.construction_order().is_err());
    /// ```
    pub fn construction_order(&self) -> Result<Vec<Component>> {
        for component in self.iter() {
            if let Some(&missing) = component.requires().iter().find(|r| !self.contains(**r)) {
                return Err(Error::DependencyUnsatisfied {
                    component,
                    requires: missing,
                });
            }
        }

        let mut pending: BTreeMap<Component, usize> = self
            .iter()
            .map(|c| (c, self.predecessors(c).count()))
            .collect();
        let mut order = Vec::with_capacity(self.len());

        while let Some(next) = pending
            .iter()
            .find(|(_, &count)| count == 0)
            .map(|(&c, _)| c)
        {
            pending.remove(&next);
            order.push(next);
            for (&c, count) in &mut pending {
                if self.predecessors(c).any(|p| p == next) {
                    *count -= 1;
                }
            }
        }
        debug_assert!(pending.is_empty(), "component graph is acyclic");

        Ok(order)
    }

    fn predecessors(&self, component: Component) -> impl Iterator<Item = Component> + '_ {
        component
            .requires()
            .iter()
            .chain(component.after())
            .copied()
            .filter(|p| self.contains(*p))
    }
}

impl FromIterator<Component> for ComponentSet {
    fn from_iter<I: IntoIterator<Item = Component>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{MonitoringConfig, NetworkingConfig};

    fn settings(yaml: &str) -> EnvironmentSettings {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_aliases() {
        for (name, expected) in [
            ("vpc", Component::Network),
            ("efs", Component::Storage),
            ("rds", Component::Database),
            ("postgres", Component::Database),
            ("fargate", Component::Compute),
            ("api_gateway", Component::Access),
            ("cloudfront", Component::Access),
            ("cloudflare", Component::Access),
            ("alarms", Component::Monitoring),
        ] {
            assert_eq!(name.parse::<Component>().unwrap(), expected, "{name}");
        }
        for component in Component::ALL {
            assert_eq!(component.as_str().parse::<Component>().unwrap(), component);
        }
    }

    #[test]
    fn test_unknown_component_error() {
        let err = "Network".parse::<Component>().unwrap_err();
        assert!(matches!(err, Error::UnknownComponent { ref name } if name == "Network"));
    }

    #[test]
    fn test_default_selection() {
        let set = ComponentSet::select(&EnvironmentSettings::default()).unwrap();
        assert_eq!(
            set.iter().collect::<Vec<_>>(),
            vec![
                Component::Network,
                Component::Storage,
                Component::Compute,
                Component::Access
            ]
        );
    }

    #[test]
    fn test_default_selection_with_postgres_and_monitoring() {
        let mut s = settings("database: { type: postgres }");
        s.monitoring = Some(MonitoringConfig::default());
        let set = ComponentSet::select(&s).unwrap();
        assert!(set.contains(Component::Database));
        assert!(set.contains(Component::Monitoring));
        assert_eq!(set.len(), 6);
    }

    #[test]
    fn test_explicit_selection() {
        let set = ComponentSet::select(&settings(
            "features: { components: [fargate, efs, api_gateway] }",
        ))
        .unwrap();
        assert_eq!(
            set.iter().collect::<Vec<_>>(),
            vec![Component::Storage, Component::Compute, Component::Access]
        );
    }

    #[test]
    fn test_explicit_selection_gains_network_and_database() {
        let mut s = settings("features: { components: [fargate, efs] }\ndatabase: { type: postgres }");
        s.networking = Some(NetworkingConfig::default());
        let set = ComponentSet::select(&s).unwrap();
        assert!(set.contains(Component::Network));
        assert!(set.contains(Component::Database));
    }

    #[test]
    fn test_unknown_name_rejected_before_construction() {
        let err = ComponentSet::select(&settings("features: { components: [fargate, kafka] }"))
            .unwrap_err();
        assert!(matches!(err, Error::UnknownComponent { .. }));
    }

    #[test]
    fn test_full_order() {
        let set: ComponentSet = Component::ALL.into_iter().collect();
        assert_eq!(
            set.construction_order().unwrap(),
            vec![
                Component::Network,
                Component::Storage,
                Component::Database,
                Component::Compute,
                Component::Access,
                Component::Monitoring,
            ]
        );
    }

    #[test]
    fn test_missing_prerequisite() {
        let set: ComponentSet = [Component::Storage, Component::Compute, Component::Access]
            .into_iter()
            .collect();
        match set.construction_order().unwrap_err() {
            Error::DependencyUnsatisfied {
                component,
                requires,
            } => {
                assert_eq!(component, Component::Storage);
                assert_eq!(requires, Component::Network);
            }
            other => panic!("expected DependencyUnsatisfied, got {other:?}"),
        }
    }

    #[test]
    fn test_access_requires_compute() {
        let set: ComponentSet = [Component::Network, Component::Access].into_iter().collect();
        assert!(matches!(
            set.construction_order(),
            Err(Error::DependencyUnsatisfied {
                component: Component::Access,
                requires: Component::Compute
            })
        ));
    }

    #[test]
    fn test_monitoring_tolerates_absent_producers() {
        let set: ComponentSet = [Component::Monitoring].into_iter().collect();
        assert_eq!(set.construction_order().unwrap(), vec![Component::Monitoring]);
    }
}
