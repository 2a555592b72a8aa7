//! Plan synthesis backend.
//!
//! [`PlanBackend`] records each component as a stack of declarative
//! resources. The finished [`SynthesizedPlan`] serializes to JSON and is the
//! artifact handed to deployment tooling.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};

use crate::compose::backend::{
    AccessOutputs, ComputeInputs, ComputeOutputs, DatabaseOutputs, MonitoringInputs,
    MonitoringOutputs, MountConfig, NetworkOutputs, ResourceHandle, StackContext,
    StorageOutputs, SynthesisBackend,
};
use crate::compose::Component;
use crate::config::schema::{
    AccessConfig, AccessType, BackupConfig, CloudflareConfig, NetworkingConfig, SharedCategory,
};
use crate::error::{Error, Result};

/// Port the n8n container listens on.
pub const N8N_PORT: u16 = 5678;

/// Data directory of n8n inside the container.
pub const N8N_DATA_PATH: &str = "/home/node/.n8n";

/// Root directory of the filesystem access point.
pub const ACCESS_POINT_PATH: &str = "/n8n-data";

const EFS_LIFECYCLE_DAYS: [u32; 9] = [1, 7, 14, 30, 60, 90, 180, 270, 365];

const LOG_RETENTION_DAYS: [u32; 17] = [
    1, 3, 5, 7, 14, 30, 60, 90, 120, 150, 180, 365, 400, 545, 731, 1096, 1827,
];

/// One resource of a stack.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedResource {
    /// Logical id, unique within the plan.
    pub id: String,
    /// Resource kind, for example `vpc` or `fargate-service`.
    pub kind: String,
    /// Kind-specific settings.
    pub properties: Value,
    /// Ids of resources this one refers to.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    /// Tags stamped onto the resource.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}

impl PlannedResource {
    fn new(id: impl Into<String>, kind: &str, properties: Value) -> Self {
        Self {
            id: id.into(),
            kind: kind.to_string(),
            properties,
            depends_on: Vec::new(),
            tags: BTreeMap::new(),
        }
    }

    fn after(mut self, handles: &[&ResourceHandle]) -> Self {
        self.depends_on
            .extend(handles.iter().map(|handle| handle.to_string()));
        self
    }

    fn handle(&self) -> ResourceHandle {
        ResourceHandle::new(self.id.clone())
    }
}

/// Resources of one component.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StackPlan {
    /// Stack name, `<project>-<environment>-<component>`.
    pub name: String,
    /// Component the stack implements.
    pub component: Component,
    /// Resources in creation order.
    pub resources: Vec<PlannedResource>,
}

impl StackPlan {
    /// Find a resource by id.
    #[must_use]
    pub fn resource(&self, id: &str) -> Option<&PlannedResource> {
        self.resources.iter().find(|resource| resource.id == id)
    }

    /// All resources of one kind.
    pub fn resources_of_kind<'a>(
        &'a self,
        kind: &'a str,
    ) -> impl Iterator<Item = &'a PlannedResource> + 'a {
        self.resources
            .iter()
            .filter(move |resource| resource.kind == kind)
    }
}

/// The recorded resource graph of one environment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SynthesizedPlan {
    /// Project name.
    pub project: String,
    /// Environment name.
    pub environment: String,
    /// Target account.
    pub account: String,
    /// Target region.
    pub region: String,
    /// When synthesis started.
    pub generated_at: DateTime<Utc>,
    /// Stacks in construction order.
    pub stacks: Vec<StackPlan>,
}

impl SynthesizedPlan {
    /// The stack built for `component`, if any.
    #[must_use]
    pub fn stack(&self, component: Component) -> Option<&StackPlan> {
        self.stacks.iter().find(|stack| stack.component == component)
    }

    /// Total number of resources across all stacks.
    #[must_use]
    pub fn resource_count(&self) -> usize {
        self.stacks.iter().map(|stack| stack.resources.len()).sum()
    }

    /// Render the plan as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] if rendering fails.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the plan as JSON to `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering or writing fails.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut json = self.to_json_pretty()?;
        json.push('\n');
        fs::write(path, json)?;
        Ok(())
    }
}

/// A [`SynthesisBackend`] that records a [`SynthesizedPlan`].
///
/// # Examples
///
/// ```
/// use n8n_deploy::compose::{Component, PlanBackend, StackComposer};
/// use n8n_deploy::config::N8nConfig;
///
/// let config: N8nConfig = serde_yaml::from_str(r#"
/// global: { project_name: n8n, organization: acme }
/// environments:
///   dev: { account: "123456789012", region: us-east-1, settings: {} }
/// "#).unwrap();
///
/// let mut backend = PlanBackend::new();
/// StackComposer::new(&config, "dev", None).compose(&mut backend).unwrap();
/// let plan = backend.finish();
///
/// let storage = plan.stack(Component::Storage).unwrap();
/// assert!(storage.resource("n8n-dev-efs-n8n").is_some());
/// assert!(plan.stack(Component::Database).is_none());
/// ```
#[derive(Debug, Clone)]
pub struct PlanBackend {
    plan: SynthesizedPlan,
}

impl Default for PlanBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl PlanBackend {
    /// Create an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self {
            plan: SynthesizedPlan {
                project: String::new(),
                environment: String::new(),
                account: String::new(),
                region: String::new(),
                generated_at: Utc::now(),
                stacks: Vec::new(),
            },
        }
    }

    /// The plan recorded so far.
    #[must_use]
    pub fn plan(&self) -> &SynthesizedPlan {
        &self.plan
    }

    /// Consume the backend and return the recorded plan.
    #[must_use]
    pub fn finish(self) -> SynthesizedPlan {
        self.plan
    }

    fn record(&mut self, ctx: &StackContext, component: Component, resources: Vec<PlannedResource>) {
        let plan = &mut self.plan;
        if plan.environment.is_empty() {
            plan.project.clone_from(&ctx.project_name);
            plan.environment.clone_from(&ctx.environment);
            plan.account.clone_from(&ctx.account);
            plan.region.clone_from(&ctx.region);
        }

        let name = ctx.stack_name(component);
        log::debug!("Recorded stack {name} with {} resources", resources.len());
        plan.stacks.push(StackPlan {
            name,
            component,
            resources,
        });
    }
}

fn removal_policy(ctx: &StackContext) -> &'static str {
    if ctx.retain_on_delete() {
        "retain"
    } else {
        "destroy"
    }
}

fn closest(allowed: &[u32], requested: u32) -> u32 {
    allowed
        .iter()
        .copied()
        .min_by_key(|days| days.abs_diff(requested))
        .unwrap_or(requested)
}

fn max_availability_zones(ctx: &StackContext, networking: &NetworkingConfig) -> usize {
    if let Some(zones) = networking.availability_zones.as_ref().filter(|z| !z.is_empty()) {
        zones.len()
    } else if ctx.is_production() {
        3
    } else if ctx.environment.eq_ignore_ascii_case("staging") {
        2
    } else {
        1
    }
}

fn ids(handles: &[ResourceHandle]) -> Vec<&str> {
    handles.iter().map(ResourceHandle::as_str).collect()
}

/// Tunnel settings when the environment is reached through a tunnel.
fn tunnel(ctx: &StackContext) -> Option<CloudflareConfig> {
    let access = ctx.settings.access.as_ref()?.normalized();
    if access.kind != AccessType::Cloudflare {
        return None;
    }
    access.cloudflare.filter(|cf| cf.enabled)
}

fn tunnel_domain(ctx: &StackContext, cf: &CloudflareConfig) -> String {
    cf.tunnel_domain
        .clone()
        .unwrap_or_else(|| format!("n8n-{}.example.com", ctx.environment))
}

fn feature_enabled(ctx: &StackContext, name: &str) -> bool {
    ctx.settings
        .features
        .as_ref()
        .and_then(|features| features.get(name))
        .and_then(serde_yaml::Value::as_bool)
        .unwrap_or(false)
}

#[allow(clippy::too_many_arguments)]
fn alarm(
    ctx: &StackContext,
    topic: &ResourceHandle,
    target: &ResourceHandle,
    name: &str,
    metric: &str,
    threshold: f64,
    evaluation_periods: u32,
    comparison: &str,
) -> PlannedResource {
    PlannedResource::new(
        ctx.resource_name("alarm", name),
        "alarm",
        json!({
            "metric_name": metric,
            "threshold": threshold,
            "evaluation_periods": evaluation_periods,
            "comparison": comparison,
            "alarm_actions": [topic.as_str()],
        }),
    )
    .after(&[topic, target])
}

impl SynthesisBackend for PlanBackend {
    fn build_network(&mut self, ctx: &StackContext) -> Result<NetworkOutputs> {
        let networking = ctx.settings.networking.clone().unwrap_or_default();
        let mut resources = Vec::new();

        let (vpc, subnets) = if networking.use_existing_vpc {
            let vpc_id = networking.vpc_id.as_deref().ok_or_else(|| {
                Error::invalid(
                    "settings.networking.vpc_id",
                    "vpc_id is required when use_existing_vpc is true",
                )
            })?;
            let vpc = PlannedResource::new(
                ctx.resource_name("vpc", ""),
                "vpc-import",
                json!({ "vpc_id": vpc_id }),
            );
            let vpc_handle = vpc.handle();
            resources.push(vpc);

            let subnets = match networking.subnet_ids.as_deref() {
                Some(subnet_ids) if !subnet_ids.is_empty() => subnet_ids
                    .iter()
                    .enumerate()
                    .map(|(index, subnet_id)| {
                        let subnet = PlannedResource::new(
                            ctx.resource_name("subnet", &index.to_string()),
                            "subnet-import",
                            json!({ "subnet_id": subnet_id }),
                        )
                        .after(&[&vpc_handle]);
                        let handle = subnet.handle();
                        resources.push(subnet);
                        handle
                    })
                    .collect(),
                _ => {
                    let lookup = PlannedResource::new(
                        ctx.resource_name("subnets", "private"),
                        "subnet-lookup",
                        json!({ "vpc_id": vpc_id, "subnet_type": "private" }),
                    )
                    .after(&[&vpc_handle]);
                    let handle = lookup.handle();
                    resources.push(lookup);
                    vec![handle]
                }
            };
            (vpc_handle, subnets)
        } else {
            let zones = max_availability_zones(ctx, &networking);
            let private = networking.nat_gateways > 0;
            let vpc = PlannedResource::new(
                ctx.resource_name("vpc", ""),
                "vpc",
                json!({
                    "cidr": networking.vpc_cidr,
                    "max_azs": zones,
                    "availability_zones": networking.availability_zones,
                    "nat_gateways": networking.nat_gateways,
                    "enable_dns_hostnames": true,
                    "enable_dns_support": true,
                }),
            );
            let vpc_handle = vpc.handle();
            resources.push(vpc);

            let mut public = Vec::new();
            let mut isolated = Vec::new();
            for zone in 0..zones {
                let subnet = PlannedResource::new(
                    ctx.resource_name("subnet", &format!("public-{zone}")),
                    "subnet",
                    json!({ "subnet_type": "public", "zone_index": zone, "cidr_mask": 24 }),
                )
                .after(&[&vpc_handle]);
                public.push(subnet.handle());
                resources.push(subnet);

                if private {
                    let subnet = PlannedResource::new(
                        ctx.resource_name("subnet", &format!("private-{zone}")),
                        "subnet",
                        json!({ "subnet_type": "private", "zone_index": zone, "cidr_mask": 24 }),
                    )
                    .after(&[&vpc_handle]);
                    isolated.push(subnet.handle());
                    resources.push(subnet);
                }
            }

            let nat_count = usize::try_from(networking.nat_gateways)
                .unwrap_or(usize::MAX)
                .min(public.len());
            for (index, subnet) in public.iter().take(nat_count).enumerate() {
                resources.push(
                    PlannedResource::new(
                        ctx.resource_name("nat", &index.to_string()),
                        "nat-gateway",
                        json!({ "subnet": subnet.as_str() }),
                    )
                    .after(&[subnet]),
                );
            }

            if ctx.is_production() {
                resources.push(
                    PlannedResource::new(
                        ctx.resource_name("flow-logs", ""),
                        "flow-log",
                        json!({ "vpc": vpc_handle.as_str(), "traffic_type": "ALL" }),
                    )
                    .after(&[&vpc_handle]),
                );
            }

            let subnets = if private { isolated } else { public };
            (vpc_handle, subnets)
        };

        let service_sg = PlannedResource::new(
            ctx.resource_name("sg", "n8n"),
            "security-group",
            json!({
                "vpc": vpc.as_str(),
                "description": format!("Security group for n8n {}", ctx.environment),
                "allow_all_outbound": true,
                "ingress": [{ "source": "self", "protocol": "all" }],
            }),
        )
        .after(&[&vpc]);
        let service_sg_handle = service_sg.handle();
        resources.push(service_sg);

        let efs_sg = PlannedResource::new(
            ctx.resource_name("sg", "efs"),
            "security-group",
            json!({
                "vpc": vpc.as_str(),
                "description": format!("Security group for n8n {} file system", ctx.environment),
                "allow_all_outbound": false,
                "ingress": [{
                    "source": service_sg_handle.as_str(),
                    "protocol": "tcp",
                    "port": 2049,
                }],
            }),
        )
        .after(&[&vpc, &service_sg_handle]);
        let efs_sg_handle = efs_sg.handle();
        resources.push(efs_sg);

        self.record(ctx, Component::Network, resources);
        Ok(NetworkOutputs {
            vpc,
            subnets,
            service_security_group: service_sg_handle,
            file_system_security_group: efs_sg_handle,
        })
    }

    fn build_storage(
        &mut self,
        ctx: &StackContext,
        network: &NetworkOutputs,
    ) -> Result<StorageOutputs> {
        let requested = ctx
            .defaults
            .as_ref()
            .and_then(|defaults| defaults.efs.as_ref())
            .map_or(30, |efs| efs.lifecycle_days);
        let lifecycle_days = closest(&EFS_LIFECYCLE_DAYS, requested);
        let mut resources = Vec::new();

        let efs = PlannedResource::new(
            ctx.resource_name("efs", "n8n"),
            "efs-file-system",
            json!({
                "encrypted": true,
                "performance_mode": "general_purpose",
                "throughput_mode": "bursting",
                "lifecycle_policy": format!("AFTER_{lifecycle_days}_DAYS"),
                "automatic_backups": ctx.is_production(),
                "subnets": ids(&network.subnets),
                "security_group": network.file_system_security_group.as_str(),
                "removal_policy": removal_policy(ctx),
            }),
        )
        .after(&[&network.vpc, &network.file_system_security_group]);
        let efs_handle = efs.handle();
        resources.push(efs);

        let access_point = PlannedResource::new(
            ctx.resource_name("efs-ap", "n8n"),
            "efs-access-point",
            json!({
                "file_system": efs_handle.as_str(),
                "path": ACCESS_POINT_PATH,
                "posix_user": { "uid": "1000", "gid": "1000" },
                "creation_info": {
                    "owner_uid": "1000",
                    "owner_gid": "1000",
                    "permissions": "755",
                },
            }),
        )
        .after(&[&efs_handle]);
        let access_point_handle = access_point.handle();
        resources.push(access_point);

        let backup = ctx.settings.backup.clone().unwrap_or_else(|| BackupConfig {
            enabled: false,
            ..BackupConfig::default()
        });
        if backup.enabled {
            let vault = PlannedResource::new(
                ctx.resource_name("backup-vault", ""),
                "backup-vault",
                json!({ "removal_policy": removal_policy(ctx) }),
            );
            let vault_handle = vault.handle();
            resources.push(vault);

            let copy_regions: Vec<&str> = if backup.cross_region_backup {
                backup
                    .backup_regions
                    .iter()
                    .flatten()
                    .map(String::as_str)
                    .collect()
            } else {
                Vec::new()
            };
            let copies: Vec<Value> = copy_regions
                .iter()
                .map(|region| {
                    json!({
                        "region": region,
                        "destination_vault": format!(
                            "arn:aws:backup:{region}:{}:backup-vault:{}-{region}",
                            ctx.account,
                            vault_handle,
                        ),
                        "delete_after_days": backup.retention_days,
                    })
                })
                .collect();

            resources.push(
                PlannedResource::new(
                    ctx.resource_name("backup-plan", ""),
                    "backup-plan",
                    json!({
                        "vault": vault_handle.as_str(),
                        "rules": [{
                            "name": "daily",
                            "schedule": "cron(0 3 * * ? *)",
                            "delete_after_days": backup.retention_days,
                            "continuous_backup": ctx.is_production(),
                            "copy_actions": copies,
                        }],
                        "resources": [efs_handle.as_str()],
                    }),
                )
                .after(&[&vault_handle, &efs_handle]),
            );
        }

        self.record(ctx, Component::Storage, resources);
        Ok(StorageOutputs {
            mount: MountConfig {
                file_system: efs_handle.clone(),
                access_point: access_point_handle.clone(),
                container_path: N8N_DATA_PATH.to_string(),
                read_only: false,
            },
            file_system: efs_handle,
            access_point: access_point_handle,
        })
    }

    fn build_database(
        &mut self,
        ctx: &StackContext,
        network: &NetworkOutputs,
    ) -> Result<DatabaseOutputs> {
        let db = ctx.settings.database.clone().unwrap_or_default();
        let mut resources = Vec::new();

        let sg = PlannedResource::new(
            ctx.resource_name("sg", "database"),
            "security-group",
            json!({
                "vpc": network.vpc.as_str(),
                "description": format!("Security group for n8n {} database", ctx.environment),
                "allow_all_outbound": false,
                "ingress": [{
                    "source": network.service_security_group.as_str(),
                    "protocol": "tcp",
                    "port": 5432,
                }],
            }),
        )
        .after(&[&network.vpc, &network.service_security_group]);
        let sg_handle = sg.handle();
        resources.push(sg);

        let outputs = if db.use_existing {
            let arn = db.connection_secret_arn.as_deref().ok_or_else(|| {
                Error::invalid(
                    "settings.database.connection_secret_arn",
                    "connection_secret_arn is required when use_existing is true",
                )
            })?;
            let secret = PlannedResource::new(
                ctx.resource_name("secret", "database"),
                "secret-import",
                json!({ "secret_arn": arn }),
            );
            let secret_handle = secret.handle();
            resources.push(secret);
            DatabaseOutputs {
                endpoint: secret_handle.clone(),
                credentials: secret_handle,
            }
        } else {
            let secret = PlannedResource::new(
                ctx.resource_name("secret", "database"),
                "secret",
                json!({
                    "secret_name": format!("n8n/{}/db-credentials", ctx.environment),
                    "template": { "username": "n8nadmin" },
                    "generate_key": "password",
                    "password_length": 30,
                }),
            );
            let secret_handle = secret.handle();
            resources.push(secret);

            let subnet_group = PlannedResource::new(
                ctx.resource_name("db-subnets", ""),
                "db-subnet-group",
                json!({ "subnets": ids(&network.subnets), "removal_policy": removal_policy(ctx) }),
            )
            .after(&[&network.vpc]);
            let subnet_group_handle = subnet_group.handle();
            resources.push(subnet_group);

            let database = if let Some(aurora) = &db.aurora_serverless {
                PlannedResource::new(
                    ctx.resource_name("aurora", ""),
                    "aurora-postgres-cluster",
                    json!({
                        "engine_version": "15.3",
                        "database_name": "n8n",
                        "credentials": secret_handle.as_str(),
                        "serverless_v2": {
                            "min_capacity": aurora.min_capacity,
                            "max_capacity": aurora.max_capacity,
                        },
                        "writer_instance_class": "db.serverless",
                        "subnet_group": subnet_group_handle.as_str(),
                        "security_groups": [sg_handle.as_str()],
                        "backup_retention_days": db.backup_retention_days,
                        "preferred_backup_window": "03:00-04:00",
                        "storage_encrypted": true,
                        "enable_data_api": true,
                        "performance_insights": ctx.is_production(),
                        "deletion_protection": ctx.is_production(),
                        "removal_policy": removal_policy(ctx),
                    }),
                )
            } else {
                PlannedResource::new(
                    ctx.resource_name("rds", ""),
                    "rds-postgres-instance",
                    json!({
                        "engine_version": "15.3",
                        "database_name": "n8n",
                        "credentials": secret_handle.as_str(),
                        "instance_class": db.instance_class.as_deref().unwrap_or("db.t4g.micro"),
                        "allocated_storage_gb": 20,
                        "storage_type": "gp3",
                        "multi_az": db.multi_az,
                        "subnet_group": subnet_group_handle.as_str(),
                        "security_groups": [sg_handle.as_str()],
                        "backup_retention_days": db.backup_retention_days,
                        "preferred_backup_window": "03:00-04:00",
                        "preferred_maintenance_window": "sun:04:00-sun:05:00",
                        "storage_encrypted": true,
                        "publicly_accessible": false,
                        "performance_insights": ctx.is_production(),
                        "deletion_protection": ctx.is_production(),
                        "removal_policy": removal_policy(ctx),
                    }),
                )
            }
            .after(&[&secret_handle, &subnet_group_handle, &sg_handle]);
            let endpoint = database.handle();
            resources.push(database);
            DatabaseOutputs {
                endpoint,
                credentials: secret_handle,
            }
        };

        self.record(ctx, Component::Database, resources);
        Ok(outputs)
    }

    #[allow(clippy::too_many_lines)]
    fn build_compute(
        &mut self,
        ctx: &StackContext,
        inputs: &ComputeInputs,
    ) -> Result<ComputeOutputs> {
        let fargate = ctx.settings.fargate.clone().unwrap_or_default();
        let scaling = ctx.settings.scaling.clone().unwrap_or_default();
        let monitoring = ctx.settings.monitoring.clone();
        let network = &inputs.network;
        let storage = &inputs.storage;
        let mut resources = Vec::new();

        let container_insights = monitoring
            .as_ref()
            .map_or_else(|| ctx.is_production(), |m| m.enable_container_insights);
        let cluster = PlannedResource::new(
            ctx.resource_name("ecs-cluster", ""),
            "ecs-cluster",
            json!({ "vpc": network.vpc.as_str(), "container_insights": container_insights }),
        )
        .after(&[&network.vpc]);
        let cluster_handle = cluster.handle();
        resources.push(cluster);

        let retention = closest(
            &LOG_RETENTION_DAYS,
            monitoring.as_ref().map_or(30, |m| m.log_retention_days),
        );
        let log_group = PlannedResource::new(
            ctx.resource_name("logs", "n8n"),
            "log-group",
            json!({
                "log_group_name": format!("/ecs/{}", ctx.stack_prefix()),
                "retention_days": retention,
                "removal_policy": removal_policy(ctx),
            }),
        );
        let log_group_handle = log_group.handle();
        resources.push(log_group);

        let encryption_key = PlannedResource::new(
            ctx.resource_name("secret", "encryption-key"),
            "secret",
            json!({
                "secret_name": format!("n8n/{}/encryption-key", ctx.environment),
                "password_length": 32,
            }),
        );
        let encryption_key_handle = encryption_key.handle();
        resources.push(encryption_key);

        let mut environment = BTreeMap::from([
            ("N8N_HOST".to_string(), "0.0.0.0".to_string()),
            ("N8N_PORT".to_string(), N8N_PORT.to_string()),
            ("N8N_PROTOCOL".to_string(), "https".to_string()),
            ("N8N_USER_FOLDER".to_string(), N8N_DATA_PATH.to_string()),
            ("N8N_SECURE_COOKIE".to_string(), "true".to_string()),
            ("N8N_METRICS".to_string(), "true".to_string()),
            ("N8N_METRICS_PREFIX".to_string(), "n8n_".to_string()),
        ]);
        let mut secrets = BTreeMap::from([(
            "N8N_ENCRYPTION_KEY".to_string(),
            encryption_key_handle.to_string(),
        )]);
        let mut depends = vec![&encryption_key_handle, &log_group_handle, &storage.file_system];

        if let Some(database) = &inputs.database {
            environment.insert("DB_TYPE".into(), "postgresdb".into());
            environment.insert("DB_POSTGRESDB_HOST".into(), database.endpoint.to_string());
            environment.insert("DB_POSTGRESDB_DATABASE".into(), "n8n".into());
            environment.insert("DB_POSTGRESDB_SCHEMA".into(), "public".into());
            secrets.insert(
                "DB_POSTGRESDB_USER".into(),
                format!("{}:username", database.credentials),
            );
            secrets.insert(
                "DB_POSTGRESDB_PASSWORD".into(),
                format!("{}:password", database.credentials),
            );
            depends.push(&database.endpoint);
        } else {
            environment.insert("DB_TYPE".into(), "sqlite".into());
            environment.insert(
                "DB_SQLITE_DATABASE".into(),
                format!("{N8N_DATA_PATH}/database.sqlite"),
            );
        }

        let basic_auth = ctx
            .settings
            .auth
            .as_ref()
            .is_some_and(|auth| auth.basic_auth_enabled);
        let basic_auth_handle = if basic_auth {
            let secret = PlannedResource::new(
                ctx.resource_name("secret", "basic-auth"),
                "secret",
                json!({
                    "secret_name": format!("n8n/{}/basic-auth", ctx.environment),
                    "template": { "username": "admin" },
                    "generate_key": "password",
                    "password_length": 20,
                }),
            );
            let handle = secret.handle();
            resources.push(secret);
            environment.insert("N8N_BASIC_AUTH_ACTIVE".into(), "true".into());
            secrets.insert("N8N_BASIC_AUTH_USER".into(), format!("{handle}:username"));
            secrets.insert("N8N_BASIC_AUTH_PASSWORD".into(), format!("{handle}:password"));
            Some(handle)
        } else {
            None
        };
        if let Some(handle) = &basic_auth_handle {
            depends.push(handle);
        }

        let mut containers = vec![json!({
            "name": "n8n",
            "image": format!("n8nio/n8n:{}", fargate.n8n_version),
            "essential": true,
            "port_mappings": [{ "container_port": N8N_PORT, "protocol": "tcp" }],
            "health_check": {
                "command": format!(
                    "wget --no-verbose --tries=1 --spider http://localhost:{N8N_PORT}/healthz || exit 1"
                ),
                "interval_seconds": 30,
                "timeout_seconds": 5,
                "retries": 3,
                "start_period_seconds": 60,
            },
            "mount_points": [{
                "file_system": storage.mount.file_system.as_str(),
                "access_point": storage.mount.access_point.as_str(),
                "container_path": storage.mount.container_path,
                "read_only": storage.mount.read_only,
            }],
            "environment": environment,
            "secrets": secrets,
            "log_group": log_group_handle.as_str(),
        })];

        let tunnel_secret_handle = if let Some(cf) = tunnel(ctx) {
            let secret = match cf.tunnel_token_secret_name.as_deref() {
                Some(name) if !cf.provisional => PlannedResource::new(
                    ctx.resource_name("secret", "tunnel-token"),
                    "secret-import",
                    json!({ "secret_name": name }),
                ),
                _ => PlannedResource::new(
                    ctx.resource_name("secret", "tunnel-token"),
                    "secret",
                    json!({
                        "secret_name": format!("n8n/{}/cloudflare-tunnel-token", ctx.environment),
                        "description": "Cloudflare tunnel token, set after tunnel creation",
                    }),
                ),
            };
            let handle = secret.handle();
            resources.push(secret);
            containers.push(json!({
                "name": "cloudflared",
                "image": "cloudflare/cloudflared:latest",
                "essential": true,
                "command": ["tunnel", "--no-autoupdate", "--metrics", "0.0.0.0:2000", "run"],
                "secrets": { "TUNNEL_TOKEN": handle.as_str() },
                "port_mappings": [{ "container_port": 2000, "protocol": "tcp" }],
                "tunnel_name": cf.tunnel_name.clone().unwrap_or_else(|| format!("n8n-{}", ctx.environment)),
                "log_group": log_group_handle.as_str(),
            }));
            Some(handle)
        } else {
            None
        };
        if let Some(handle) = &tunnel_secret_handle {
            depends.push(handle);
        }

        let task_definition = PlannedResource::new(
            ctx.resource_name("task", "n8n"),
            "fargate-task-definition",
            json!({
                "family": ctx.resource_name("n8n", ""),
                "cpu": fargate.cpu,
                "memory": fargate.memory,
                "volumes": [{
                    "name": "n8n-data",
                    "file_system": storage.mount.file_system.as_str(),
                    "access_point": storage.mount.access_point.as_str(),
                    "transit_encryption": true,
                }],
                "containers": containers,
            }),
        )
        .after(&depends);
        let task_handle = task_definition.handle();
        resources.push(task_definition);

        let strategies = if fargate.spot_percentage == 0 {
            vec![json!({ "capacity_provider": "FARGATE", "weight": 100 })]
        } else if fargate.spot_percentage >= 100 {
            vec![json!({ "capacity_provider": "FARGATE_SPOT", "weight": 100 })]
        } else {
            vec![
                json!({ "capacity_provider": "FARGATE_SPOT", "weight": fargate.spot_percentage }),
                json!({ "capacity_provider": "FARGATE", "weight": 100 - fargate.spot_percentage }),
            ]
        };
        let service = PlannedResource::new(
            ctx.resource_name("service", "n8n"),
            "fargate-service",
            json!({
                "service_name": format!("n8n-{}", ctx.environment),
                "cluster": cluster_handle.as_str(),
                "task_definition": task_handle.as_str(),
                "subnets": ids(&network.subnets),
                "security_groups": [network.service_security_group.as_str()],
                "desired_count": scaling.min_tasks,
                "capacity_provider_strategies": strategies,
                "enable_execute_command": true,
                "health_check_grace_period_seconds": 120,
                "service_discovery_namespace": format!("n8n-{}.local", ctx.environment),
            }),
        )
        .after(&[&cluster_handle, &task_handle, &network.service_security_group]);
        let service_handle = service.handle();
        resources.push(service);

        let ha_allows = ctx
            .settings
            .high_availability
            .as_ref()
            .map_or(true, |ha| ha.auto_scaling_enabled);
        let auto_scaling = if scaling.auto_scaling_possible() && ha_allows {
            let target = PlannedResource::new(
                ctx.resource_name("scaling", "target"),
                "scalable-target",
                json!({
                    "service": service_handle.as_str(),
                    "min_capacity": scaling.min_tasks,
                    "max_capacity": scaling.max_tasks,
                }),
            )
            .after(&[&service_handle]);
            let target_handle = target.handle();
            resources.push(target);

            resources.push(
                PlannedResource::new(
                    ctx.resource_name("scaling", "cpu"),
                    "target-tracking-policy",
                    json!({
                        "target": target_handle.as_str(),
                        "metric": "CPUUtilization",
                        "target_value": scaling.target_cpu_utilization,
                        "scale_in_cooldown_seconds": scaling.scale_in_cooldown,
                        "scale_out_cooldown_seconds": scaling.scale_out_cooldown,
                    }),
                )
                .after(&[&target_handle]),
            );

            if ctx.is_production() {
                resources.push(
                    PlannedResource::new(
                        ctx.resource_name("scaling", "memory"),
                        "step-scaling-policy",
                        json!({
                            "target": target_handle.as_str(),
                            "metric": "MemoryUtilization",
                            "steps": [
                                { "lower": 80, "change": 1 },
                                { "lower": 90, "change": 2 },
                            ],
                        }),
                    )
                    .after(&[&target_handle]),
                );
            }
            Some(target_handle)
        } else {
            None
        };

        if feature_enabled(ctx, "resilience_enabled") {
            let topic = PlannedResource::new(
                ctx.resource_name("resilience-alerts", ""),
                "notification-topic",
                json!({ "display_name": format!("n8n {} resilience alerts", ctx.environment) }),
            );
            let topic_handle = topic.handle();
            resources.push(topic);
            for queue in ["webhook", "workflow"] {
                resources.push(
                    PlannedResource::new(
                        ctx.resource_name("dlq", queue),
                        "queue",
                        json!({
                            "dead_letter": true,
                            "retention_days": 14,
                            "alarm_topic": topic_handle.as_str(),
                        }),
                    )
                    .after(&[&topic_handle, &service_handle]),
                );
            }
        }

        self.record(ctx, Component::Compute, resources);
        Ok(ComputeOutputs {
            service: service_handle,
            security_group: network.service_security_group.clone(),
            log_group: log_group_handle,
            auto_scaling,
        })
    }

    fn build_access(
        &mut self,
        ctx: &StackContext,
        compute: &ComputeOutputs,
    ) -> Result<AccessOutputs> {
        let access = ctx
            .settings
            .access
            .as_ref()
            .map_or_else(AccessConfig::default, AccessConfig::normalized);
        let mut resources = Vec::new();

        let outputs = if let (AccessType::Cloudflare, Some(cf)) = (access.kind, tunnel(ctx)) {
            let hostname = tunnel_domain(ctx, &cf);
            let route = PlannedResource::new(
                ctx.resource_name("tunnel", "route"),
                "tunnel-route",
                json!({
                    "tunnel_name": cf.tunnel_name.clone().unwrap_or_else(|| format!("n8n-{}", ctx.environment)),
                    "hostname": hostname,
                    "service_url": format!("http://localhost:{N8N_PORT}"),
                    "access_policy": cf.access_enabled.then(|| json!({
                        "allowed_emails": cf.access_allowed_emails,
                        "allowed_domains": cf.access_allowed_domains,
                    })),
                }),
            )
            .after(&[&compute.service]);
            let entry_point = route.handle();
            resources.push(route);
            AccessOutputs {
                entry_point,
                url: format!("https://{hostname}"),
            }
        } else {
            let vpc_link = PlannedResource::new(
                ctx.resource_name("vpc-link", ""),
                "vpc-link",
                json!({ "security_groups": [compute.security_group.as_str()] }),
            )
            .after(&[&compute.security_group]);
            let vpc_link_handle = vpc_link.handle();
            resources.push(vpc_link);

            let api = PlannedResource::new(
                ctx.resource_name("api", ""),
                "http-api",
                json!({
                    "description": format!("n8n API for {}", ctx.environment),
                    "cors": {
                        "allow_origins": access.cors_origins,
                        "allow_methods": ["ANY"],
                        "allow_headers": ["*"],
                    },
                    "throttle_rate_limit": access.api_gateway_throttle,
                    "routes": ["/{proxy+}", "/"],
                    "integration": {
                        "vpc_link": vpc_link_handle.as_str(),
                        "service": compute.service.as_str(),
                    },
                }),
            )
            .after(&[&vpc_link_handle, &compute.service]);
            let api_handle = api.handle();
            resources.push(api);

            let certificate = access
                .domain_name
                .as_ref()
                .and(ctx.shared_resource(SharedCategory::Security, "certificate_arn"));

            let web_acl = if access.cloudfront_enabled && access.waf_enabled {
                let mut rules = vec![
                    json!({ "name": "AWSManagedRulesCommonRuleSet", "priority": 10 }),
                    json!({ "name": "RateLimitRule", "priority": 20, "limit": 2000, "action": "block" }),
                ];
                let mut depends = Vec::new();
                let ip_set_handle = match access.ip_whitelist.as_deref() {
                    Some(addresses) if !addresses.is_empty() => {
                        let ip_set = PlannedResource::new(
                            ctx.resource_name("ip-whitelist", ""),
                            "waf-ip-set",
                            json!({ "scope": "CLOUDFRONT", "ip_version": "IPV4", "addresses": addresses }),
                        );
                        let handle = ip_set.handle();
                        resources.push(ip_set);
                        rules.insert(
                            0,
                            json!({ "name": "IPWhitelistRule", "priority": 1, "ip_set": handle.as_str(), "action": "allow" }),
                        );
                        Some(handle)
                    }
                    _ => None,
                };
                if let Some(handle) = &ip_set_handle {
                    depends.push(handle);
                }
                let default_action = if ip_set_handle.is_some() { "block" } else { "allow" };
                let acl = PlannedResource::new(
                    ctx.resource_name("waf", ""),
                    "waf-web-acl",
                    json!({
                        "scope": "CLOUDFRONT",
                        "default_action": default_action,
                        "rules": rules,
                    }),
                )
                .after(&depends);
                let handle = acl.handle();
                resources.push(acl);
                Some(handle)
            } else {
                None
            };

            let distribution_handle = if access.cloudfront_enabled {
                let price_class = if ctx.is_development() {
                    "PriceClass_100"
                } else {
                    "PriceClass_All"
                };
                let mut depends = vec![&api_handle];
                if let Some(handle) = &web_acl {
                    depends.push(handle);
                }
                let distribution = PlannedResource::new(
                    ctx.resource_name("cdn", ""),
                    "cloudfront-distribution",
                    json!({
                        "origin": api_handle.as_str(),
                        "viewer_protocol_policy": "redirect-to-https",
                        "uncached_paths": ["/webhook/*", "/rest/*"],
                        "price_class": price_class,
                        "aliases": access.domain_name.iter().collect::<Vec<_>>(),
                        "certificate_arn": certificate,
                        "web_acl": web_acl.as_ref().map(ResourceHandle::as_str),
                    }),
                )
                .after(&depends);
                let handle = distribution.handle();
                resources.push(distribution);
                Some(handle)
            } else {
                None
            };

            let zone = ctx.shared_resource(SharedCategory::Networking, "route53_zone_id");
            if let (Some(domain), Some(zone), Some(distribution)) =
                (access.domain_name.as_deref(), zone, distribution_handle.as_ref())
            {
                let zone_name = domain
                    .rsplitn(3, '.')
                    .take(2)
                    .collect::<Vec<_>>()
                    .into_iter()
                    .rev()
                    .collect::<Vec<_>>()
                    .join(".");
                resources.push(
                    PlannedResource::new(
                        ctx.resource_name("dns", ""),
                        "dns-alias-record",
                        json!({
                            "hosted_zone_id": zone,
                            "zone_name": zone_name,
                            "record_name": domain,
                            "target": distribution.as_str(),
                        }),
                    )
                    .after(&[distribution]),
                );
            }

            let url = match (&access.domain_name, &distribution_handle) {
                (Some(domain), _) => format!("https://{domain}"),
                (None, Some(distribution)) => format!("https://{distribution}.cloudfront.net"),
                (None, None) => format!(
                    "https://{api_handle}.execute-api.{}.amazonaws.com",
                    ctx.region
                ),
            };
            AccessOutputs {
                entry_point: distribution_handle.unwrap_or(api_handle),
                url,
            }
        };

        self.record(ctx, Component::Access, resources);
        Ok(outputs)
    }

    fn build_monitoring(
        &mut self,
        ctx: &StackContext,
        inputs: &MonitoringInputs,
    ) -> Result<MonitoringOutputs> {
        let monitoring = ctx.settings.monitoring.clone().unwrap_or_default();
        let mut resources = Vec::new();
        let mut alarms = Vec::new();

        let topic = PlannedResource::new(
            ctx.resource_name("alarms", ""),
            "notification-topic",
            json!({ "display_name": format!("n8n {} alarms", ctx.environment) }),
        );
        let topic_handle = topic.handle();
        resources.push(topic);

        if let Some(email) = &monitoring.alarm_email {
            resources.push(
                PlannedResource::new(
                    ctx.resource_name("alarms", "email"),
                    "email-subscription",
                    json!({ "topic": topic_handle.as_str(), "endpoint": email }),
                )
                .after(&[&topic_handle]),
            );
        }

        let mut push_alarm = |resource: PlannedResource, resources: &mut Vec<PlannedResource>| {
            alarms.push(resource.handle());
            resources.push(resource);
        };

        if let Some(compute) = &inputs.compute {
            let service = &compute.service;
            push_alarm(
                alarm(ctx, &topic_handle, service, "cpu", "CPUUtilization", 80.0, 3, "greater_than"),
                &mut resources,
            );
            push_alarm(
                alarm(ctx, &topic_handle, service, "memory", "MemoryUtilization", 85.0, 3, "greater_than"),
                &mut resources,
            );
            push_alarm(
                alarm(ctx, &topic_handle, service, "tasks", "RunningTaskCount", 1.0, 2, "less_than"),
                &mut resources,
            );
        }

        if let Some(storage) = &inputs.storage {
            push_alarm(
                alarm(
                    ctx,
                    &topic_handle,
                    &storage.file_system,
                    "efs-burst-credits",
                    "BurstCreditBalance",
                    1_000_000_000_000.0,
                    1,
                    "less_than",
                ),
                &mut resources,
            );
        }

        let imported_database = ctx.settings.database.as_ref().is_some_and(|db| db.use_existing);
        if let Some(database) = inputs.database.as_ref().filter(|_| !imported_database) {
            let endpoint = &database.endpoint;
            push_alarm(
                alarm(ctx, &topic_handle, endpoint, "db-cpu", "CPUUtilization", 80.0, 3, "greater_than"),
                &mut resources,
            );
            push_alarm(
                alarm(
                    ctx,
                    &topic_handle,
                    endpoint,
                    "db-connections",
                    "DatabaseConnections",
                    50.0,
                    2,
                    "greater_than",
                ),
                &mut resources,
            );
        }

        if let (Some(_), Some(compute)) = (tunnel(ctx), &inputs.compute) {
            let service = &compute.service;
            push_alarm(
                alarm(ctx, &topic_handle, service, "tunnel-health", "ContainerHealthCheck", 1.0, 3, "less_than"),
                &mut resources,
            );
            push_alarm(
                alarm(
                    ctx,
                    &topic_handle,
                    service,
                    "tunnel-errors",
                    "TunnelConnectionErrors",
                    10.0,
                    2,
                    "greater_than",
                ),
                &mut resources,
            );
        }

        let mut widgets = Vec::new();
        if inputs.compute.is_some() {
            widgets.push(json!({ "title": "Service", "metrics": ["CPUUtilization", "MemoryUtilization", "RunningTaskCount", "DesiredTaskCount"] }));
        }
        if inputs.storage.is_some() {
            widgets.push(json!({ "title": "File system", "metrics": ["ClientConnections", "BurstCreditBalance"] }));
        }
        if inputs.database.is_some() {
            widgets.push(json!({ "title": "Database", "metrics": ["CPUUtilization", "DatabaseConnections"] }));
        }
        widgets.push(json!({ "title": "n8n", "namespace": monitoring.custom_metrics_namespace, "metrics": ["WorkflowExecutionSuccess", "WorkflowExecutionFailure", "WorkflowExecutionDuration"] }));

        let dashboard = PlannedResource::new(
            ctx.resource_name("dashboard", ""),
            "dashboard",
            json!({ "dashboard_name": ctx.stack_prefix(), "widgets": widgets }),
        )
        .after(&alarms.iter().collect::<Vec<_>>());
        let dashboard_handle = dashboard.handle();
        resources.push(dashboard);

        self.record(ctx, Component::Monitoring, resources);
        Ok(MonitoringOutputs {
            alarm_topic: topic_handle,
            alarms,
            dashboard: dashboard_handle,
        })
    }

    fn apply_tags(&mut self, tags: &BTreeMap<String, String>) -> Result<()> {
        for resource in self
            .plan
            .stacks
            .iter_mut()
            .flat_map(|stack| stack.resources.iter_mut())
        {
            resource
                .tags
                .extend(tags.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::StackComposer;
    use crate::config::schema::N8nConfig;
    use tempfile::TempDir;

    fn config(settings: &str) -> N8nConfig {
        serde_yaml::from_str(&format!(
            r#"
global: {{ project_name: n8n, organization: acme }}
defaults:
  efs: {{ lifecycle_days: 45 }}
environments:
  production:
    account: "123456789012"
    region: us-west-2
    settings: {settings}
shared_resources:
  security: {{ certificate_arn: "arn:aws:acm:us-east-1:1:certificate/x" }}
  networking: {{ route53_zone_id: Z123 }}
"#
        ))
        .unwrap()
    }

    fn synthesize(settings: &str) -> SynthesizedPlan {
        let config = config(settings);
        let mut backend = PlanBackend::new();
        StackComposer::new(&config, "production", None)
            .compose(&mut backend)
            .unwrap();
        backend.finish()
    }

    #[test]
    fn test_closest_prefers_smaller_on_tie() {
        assert_eq!(closest(&EFS_LIFECYCLE_DAYS, 45), 30);
        assert_eq!(closest(&EFS_LIFECYCLE_DAYS, 400), 365);
        assert_eq!(closest(&LOG_RETENTION_DAYS, 30), 30);
    }

    #[test]
    fn test_created_network_uses_three_zones_in_production() {
        let plan = synthesize("{}");
        let network = plan.stack(Component::Network).unwrap();
        let vpc = network.resource("n8n-production-vpc").unwrap();
        assert_eq!(vpc.kind, "vpc");
        assert_eq!(vpc.properties["max_azs"], 3);
        assert!(network.resource("n8n-production-flow-logs").is_some());
        assert_eq!(network.resources_of_kind("security-group").count(), 2);
    }

    #[test]
    fn test_existing_vpc_is_imported() {
        let plan = synthesize(
            "{ networking: { use_existing_vpc: true, vpc_id: vpc-1, subnet_ids: [subnet-a, subnet-b] } }",
        );
        let network = plan.stack(Component::Network).unwrap();
        assert_eq!(network.resource("n8n-production-vpc").unwrap().kind, "vpc-import");
        assert_eq!(network.resources_of_kind("subnet-import").count(), 2);
        assert_eq!(network.resources_of_kind("vpc").count(), 0);
    }

    #[test]
    fn test_storage_lifecycle_and_mount() {
        let plan = synthesize("{ backup: { enabled: true, retention_days: 14, cross_region_backup: true, backup_regions: [us-east-1] } }");
        let storage = plan.stack(Component::Storage).unwrap();
        let efs = storage.resource("n8n-production-efs-n8n").unwrap();
        assert_eq!(efs.properties["lifecycle_policy"], "AFTER_30_DAYS");
        assert_eq!(efs.properties["removal_policy"], "retain");
        let ap = storage.resource("n8n-production-efs-ap-n8n").unwrap();
        assert_eq!(ap.properties["path"], ACCESS_POINT_PATH);

        let backup = storage.resource("n8n-production-backup-plan").unwrap();
        let copies = backup.properties["rules"][0]["copy_actions"].as_array().unwrap();
        assert_eq!(copies.len(), 1);
        assert_eq!(copies[0]["region"], "us-east-1");
    }

    #[test]
    fn test_fixed_scaling_creates_no_autoscaling() {
        let plan = synthesize("{ scaling: { min_tasks: 2, max_tasks: 2 } }");
        let compute = plan.stack(Component::Compute).unwrap();
        assert_eq!(compute.resources_of_kind("scalable-target").count(), 0);
        let service = compute.resource("n8n-production-service-n8n").unwrap();
        assert_eq!(service.properties["desired_count"], 2);
    }

    #[test]
    fn test_autoscaling_in_production_adds_memory_policy() {
        let plan = synthesize("{ scaling: { min_tasks: 2, max_tasks: 10 } }");
        let compute = plan.stack(Component::Compute).unwrap();
        assert_eq!(compute.resources_of_kind("scalable-target").count(), 1);
        assert_eq!(compute.resources_of_kind("step-scaling-policy").count(), 1);
    }

    #[test]
    fn test_high_availability_can_disable_autoscaling() {
        let plan = synthesize(
            "{ scaling: { min_tasks: 1, max_tasks: 4 }, high_availability: { auto_scaling_enabled: false } }",
        );
        let compute = plan.stack(Component::Compute).unwrap();
        assert_eq!(compute.resources_of_kind("scalable-target").count(), 0);
    }

    #[test]
    fn test_postgres_wires_database_into_task() {
        let plan = synthesize("{ database: { type: postgres, instance_class: db.t4g.small } }");
        let database = plan.stack(Component::Database).unwrap();
        let rds = database.resource("n8n-production-rds").unwrap();
        assert_eq!(rds.properties["instance_class"], "db.t4g.small");

        let compute = plan.stack(Component::Compute).unwrap();
        let task = compute.resource("n8n-production-task-n8n").unwrap();
        let env = &task.properties["containers"][0]["environment"];
        assert_eq!(env["DB_TYPE"], "postgresdb");
        assert_eq!(env["DB_POSTGRESDB_HOST"], "n8n-production-rds");
        assert!(task.depends_on.contains(&"n8n-production-rds".to_string()));
    }

    #[test]
    fn test_aurora_serverless_cluster() {
        let plan = synthesize(
            "{ database: { type: postgres, aurora_serverless: { min_capacity: 0.5, max_capacity: 2.0 } } }",
        );
        let database = plan.stack(Component::Database).unwrap();
        let cluster = database.resource("n8n-production-aurora").unwrap();
        assert_eq!(cluster.properties["serverless_v2"]["max_capacity"], 2.0);
        assert_eq!(cluster.properties["deletion_protection"], true);
    }

    #[test]
    fn test_sqlite_task_without_database_stack() {
        let plan = synthesize("{}");
        assert!(plan.stack(Component::Database).is_none());
        let task = plan
            .stack(Component::Compute)
            .and_then(|stack| stack.resource("n8n-production-task-n8n"))
            .unwrap();
        assert_eq!(task.properties["containers"][0]["environment"]["DB_TYPE"], "sqlite");
        assert_eq!(
            task.properties["containers"][0]["image"],
            format!("n8nio/n8n:{}", crate::config::schema::DEFAULT_N8N_VERSION)
        );
    }

    #[test]
    fn test_tunnel_access_adds_sidecar_and_route() {
        let plan = synthesize(
            "{ access: { type: cloudflare, cloudflare: { enabled: true, tunnel_token_secret_name: tok, tunnel_domain: n8n.acme.io } } }",
        );
        let compute = plan.stack(Component::Compute).unwrap();
        let secret = compute.resource("n8n-production-secret-tunnel-token").unwrap();
        assert_eq!(secret.kind, "secret-import");
        let task = compute.resource("n8n-production-task-n8n").unwrap();
        assert_eq!(task.properties["containers"][1]["name"], "cloudflared");

        let access = plan.stack(Component::Access).unwrap();
        assert_eq!(access.resources_of_kind("http-api").count(), 0);
        let route = access.resource("n8n-production-tunnel-route").unwrap();
        assert_eq!(route.properties["hostname"], "n8n.acme.io");
    }

    #[test]
    fn test_api_gateway_with_waf_and_domain() {
        let plan = synthesize(
            "{ access: { domain_name: n8n.acme.io, waf_enabled: true, ip_whitelist: [10.0.0.0/8] } }",
        );
        let access = plan.stack(Component::Access).unwrap();
        assert_eq!(access.resources_of_kind("waf-ip-set").count(), 1);
        let acl = access.resource("n8n-production-waf").unwrap();
        assert_eq!(acl.properties["default_action"], "block");
        let cdn = access.resource("n8n-production-cdn").unwrap();
        assert_eq!(cdn.properties["aliases"][0], "n8n.acme.io");
        let dns = access.resource("n8n-production-dns").unwrap();
        assert_eq!(dns.properties["zone_name"], "acme.io");
    }

    #[test]
    fn test_monitoring_alarms_follow_built_components() {
        let plan = synthesize("{ monitoring: { alarm_email: ops@acme.io } }");
        let monitoring = plan.stack(Component::Monitoring).unwrap();
        assert_eq!(monitoring.resources_of_kind("email-subscription").count(), 1);
        // compute (3) + storage (1)
        assert_eq!(monitoring.resources_of_kind("alarm").count(), 4);
    }

    #[test]
    fn test_tags_stamped_on_every_resource() {
        let plan = synthesize("{}");
        assert!(plan.resource_count() > 0);
        for resource in plan.stacks.iter().flat_map(|s| &s.resources) {
            assert_eq!(resource.tags["Environment"], "production");
            assert_eq!(resource.tags["ManagedBy"], "n8n-deploy");
        }
    }

    #[test]
    fn test_write_plan_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out").join("plan.json");
        let plan = synthesize("{}");
        plan.write_to(&path).unwrap();

        let written: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["project"], "n8n");
        assert_eq!(written["stacks"][0]["component"], "network");
        assert_eq!(written["stacks"][0]["name"], "n8n-production-network");
    }
}
