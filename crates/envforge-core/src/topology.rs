//! Profile → descriptors → plan
//!
//! Input is validated and identifiers resolved before any descriptor is
//! built, so every problem here surfaces ahead of the first backend call.

use crate::error::{ProvisionError, Result};
use crate::naming;
use crate::params::{ProvisionParams, field};
use crate::profile::Profile;
use crate::resolve::{ResolvedConfig, resolve};
use envforge_cloud::descriptor::param;
use envforge_cloud::{Plan, ResourceDescriptor, ResourceId, ResourceKind, Secret, Step};
use envforge_config::Settings;
use serde_json::json;

/// A validated plan for one profile
#[derive(Debug, Clone)]
pub struct ProfilePlan {
    pub profile: Profile,
    pub config: ResolvedConfig,
    pub plan: Plan,
}

/// Build the plan for `profile`
pub fn build_plan(
    profile: Profile,
    params: &ProvisionParams,
    settings: &Settings,
) -> Result<ProfilePlan> {
    params.validate(profile)?;
    let config = resolve(profile, params, settings)?;

    let descriptors = profile
        .kinds()
        .iter()
        .map(|&kind| describe(profile, kind, params, settings, &config))
        .collect::<Result<Vec<_>>>()?;

    let group_id = descriptors
        .iter()
        .find(|d| d.kind() == ResourceKind::ResourceGroup)
        .map(ResourceDescriptor::id);
    let middle_tier: Vec<ResourceId> = descriptors
        .iter()
        .filter(|d| is_middle_tier(d.kind()))
        .map(ResourceDescriptor::id)
        .collect();

    let steps = descriptors
        .into_iter()
        .map(|descriptor| {
            let kind = descriptor.kind();
            let mut step = Step::new(descriptor);
            if let Some(group) = group_id.as_ref().filter(|_| kind != ResourceKind::ResourceGroup) {
                step = step.depends_on(group.clone());
            }
            if matches!(kind, ResourceKind::DatabaseServer | ResourceKind::Gateway) {
                step = step.after(middle_tier.iter().cloned());
            }
            step
        })
        .collect();

    let plan = Plan::new(steps)?;
    tracing::debug!(profile = %profile, steps = plan.len(), "Plan built");

    Ok(ProfilePlan {
        profile,
        config,
        plan,
    })
}

fn is_middle_tier(kind: ResourceKind) -> bool {
    matches!(
        kind,
        ResourceKind::StorageAccount | ResourceKind::Network | ResourceKind::ComputeCluster
    )
}

fn describe(
    profile: Profile,
    kind: ResourceKind,
    params: &ProvisionParams,
    settings: &Settings,
    config: &ResolvedConfig,
) -> Result<ResourceDescriptor> {
    let defaults = &settings.defaults;
    let cluster = field(&params.cluster_name);
    let group = config.resource_group.as_str();
    // Group-level resources live next to the group; the cluster picks its own region
    let group_region = params
        .rg_region
        .as_deref()
        .or(params.region.as_deref())
        .unwrap_or_default()
        .trim()
        .to_string();

    let descriptor = match kind {
        ResourceKind::ResourceGroup => ResourceDescriptor::new(kind, group, group_region),

        ResourceKind::StorageAccount => {
            let name = defaults
                .storage_account_name
                .clone()
                .unwrap_or_else(|| naming::storage_account_name(&cluster));
            if !naming::is_valid_storage_account_name(&name) {
                return Err(ProvisionError::invalid(format!(
                    "storage account name '{}' must be 3-24 lowercase letters and digits",
                    name
                )));
            }
            ResourceDescriptor::new(kind, name, group_region)
                .with_parent(group)
                .with_parameter(param::SKU_NAME, json!(defaults.storage_sku))
                .with_parameter(param::STORAGE_KIND, json!(defaults.storage_kind))
        }

        ResourceKind::Network => {
            ResourceDescriptor::new(kind, naming::network_name(&cluster), group_region)
                .with_parent(group)
                .with_parameter(
                    param::ADDRESS_PREFIX,
                    json!(defaults.network_address_prefix),
                )
        }

        ResourceKind::ComputeCluster => {
            let node_count = match (params.node_count(), profile) {
                (Some(count), _) => count,
                (None, Profile::Aks) => positive("defaults.aksNodeCount", defaults.aks_node_count)?,
                (None, Profile::DevEnv | Profile::DevEnvFull) => {
                    positive("defaults.devEnvNodeCount", defaults.dev_env_node_count)?
                }
            };
            ResourceDescriptor::new(kind, cluster.clone(), field(&params.region))
                .with_parent(group)
                .with_parameter(param::DNS_PREFIX, json!(naming::dns_prefix(&cluster)))
                .with_parameter(param::NODE_POOL_NAME, json!(defaults.node_pool_name))
                .with_parameter(param::NODE_COUNT, json!(node_count))
                .with_parameter(param::VM_SIZE, json!(field(&params.node_size)))
                .with_parameter(param::OS_TYPE, json!("Linux"))
                .with_parameter(param::POOL_MODE, json!("System"))
                .with_parameter(param::POOL_TYPE, json!("VirtualMachineScaleSets"))
                .with_parameter(param::IDENTITY_TYPE, json!("SystemAssigned"))
        }

        ResourceKind::DatabaseServer => {
            let storage_gb = positive("defaults.databaseStorageGb", defaults.database_storage_gb)?;
            let retention_days = positive(
                "defaults.databaseBackupRetentionDays",
                defaults.database_backup_retention_days,
            )?;
            ResourceDescriptor::new(kind, field(&params.pg_server_name), group_region)
                .with_parent(group)
                .with_parameter(param::ADMIN_LOGIN, json!(field(&params.pg_admin_username)))
                .with_secret(
                    param::ADMIN_PASSWORD,
                    Secret::new(params.pg_admin_password.clone().unwrap_or_default()),
                )
                .with_parameter(
                    param::AVAILABILITY_ZONE,
                    json!(defaults.database_availability_zone),
                )
                .with_parameter(param::BACKUP_RETENTION_DAYS, json!(retention_days))
                .with_parameter(param::GEO_REDUNDANT_BACKUP, json!("Disabled"))
                .with_parameter(param::CREATE_MODE, json!("Create"))
                .with_parameter(param::SKU_NAME, json!(field(&params.pg_sku)))
                .with_parameter(param::SKU_TIER, json!(defaults.database_tier))
                .with_parameter(param::STORAGE_SIZE_GB, json!(storage_gb))
                .with_parameter(param::VERSION, json!(field(&params.pg_version)))
                .with_parameter(param::TAGS, json!({ "elasticServer": "1" }))
        }

        ResourceKind::Gateway => {
            let email = params
                .publisher_email
                .iter()
                .chain(&defaults.gateway_publisher_email)
                .map(|e| e.trim())
                .find(|e| !e.is_empty())
                .ok_or_else(|| ProvisionError::MissingConfig {
                    key: "defaults.gatewayPublisherEmail".to_string(),
                    hint: "--publisher-email or defaults.gatewayPublisherEmail in envforge.yaml"
                        .to_string(),
                })?;
            ResourceDescriptor::new(kind, naming::gateway_name(&cluster), group_region)
                .with_parent(group)
                .with_parameter(param::SKU_NAME, json!(defaults.gateway_sku))
                .with_parameter(param::PUBLISHER_NAME, json!(defaults.gateway_publisher_name))
                .with_parameter(param::PUBLISHER_EMAIL, json!(email))
        }
    };

    Ok(descriptor)
}

/// Counts taken from settings must be positive, like `--node-count`
fn positive(key: &str, value: u32) -> Result<u32> {
    if value == 0 {
        return Err(ProvisionError::invalid(format!(
            "{} must be a positive integer, got 0",
            key
        )));
    }
    Ok(value)
}
