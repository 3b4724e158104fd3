//! Azure bindings for each resource kind
//!
//! Every binding turns a [`ResourceDescriptor`] into az invocations.
//! Resource groups, storage accounts, virtual networks and API management
//! services are created with ARM PUT semantics, so `create` doubles as
//! update. Managed clusters and PostgreSQL flexible servers are looked up
//! first and updated in place when they exist.

use crate::az::{AzArgs, AzCli};
use crate::error::{AzureError, Result};
use async_trait::async_trait;
use envforge_cloud::descriptor::param;
use envforge_cloud::{
    BackendRegistry, BackendResult, Handle, ProvisioningBackend, ResourceDescriptor, ResourceKind,
};
use std::sync::Arc;

/// Binding of one resource kind to the az CLI
pub struct AzureBinding {
    az: Arc<AzCli>,
    kind: ResourceKind,
    name: String,
}

impl AzureBinding {
    pub fn new(az: Arc<AzCli>, kind: ResourceKind) -> Self {
        Self {
            az,
            kind,
            name: format!("azure-{}", kind.as_str()),
        }
    }

    fn check_kind(&self, descriptor: &ResourceDescriptor) -> Result<()> {
        if descriptor.kind() != self.kind {
            return Err(AzureError::KindMismatch {
                expected: self.kind.to_string(),
                actual: descriptor.kind().to_string(),
            });
        }
        Ok(())
    }

    async fn create_or_update_inner(&self, descriptor: &ResourceDescriptor) -> Result<String> {
        self.check_kind(descriptor)?;
        match self.kind {
            ResourceKind::ComputeCluster | ResourceKind::DatabaseServer => {
                let args = match self.az.show(&show_args(descriptor)?).await? {
                    Some(existing) => {
                        tracing::info!(
                            "{} '{}' exists ({}), updating",
                            self.kind,
                            descriptor.name(),
                            existing
                        );
                        update_args(descriptor)?
                    }
                    None => create_args(descriptor)?,
                };
                self.az.apply(&args).await
            }
            _ => self.az.apply(&create_args(descriptor)?).await,
        }
    }

    async fn get_inner(&self, descriptor: &ResourceDescriptor) -> Result<Option<String>> {
        self.check_kind(descriptor)?;
        self.az.show(&show_args(descriptor)?).await
    }
}

#[async_trait]
impl ProvisioningBackend for AzureBinding {
    fn name(&self) -> &str {
        &self.name
    }

    async fn create_or_update(&self, descriptor: &ResourceDescriptor) -> BackendResult<Handle> {
        Ok(Handle::new(self.create_or_update_inner(descriptor).await?))
    }

    async fn get(&self, descriptor: &ResourceDescriptor) -> BackendResult<Option<Handle>> {
        Ok(self.get_inner(descriptor).await?.map(Handle::new))
    }
}

/// Registry with an Azure binding for every resource kind
pub fn azure_registry(az: AzCli) -> BackendRegistry {
    let az = Arc::new(az);
    let mut registry = BackendRegistry::new();
    for kind in ResourceKind::ALL {
        registry.register(kind, Arc::new(AzureBinding::new(az.clone(), kind)));
    }
    registry
}

fn required<T: serde::de::DeserializeOwned>(
    descriptor: &ResourceDescriptor,
    key: &str,
) -> Result<T> {
    descriptor
        .get_parameter(key)
        .ok_or_else(|| AzureError::MissingParameter {
            resource: descriptor.id().to_string(),
            key: key.to_string(),
        })
}

fn parent(descriptor: &ResourceDescriptor) -> Result<&str> {
    descriptor.parent().ok_or_else(|| AzureError::MissingParameter {
        resource: descriptor.id().to_string(),
        key: "resourceGroup".to_string(),
    })
}

fn tags(descriptor: &ResourceDescriptor) -> Option<String> {
    let tags: std::collections::BTreeMap<String, String> = descriptor.get_parameter(param::TAGS)?;
    if tags.is_empty() {
        return None;
    }
    Some(
        tags.iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(" "),
    )
}

/// az arguments to look a resource up
pub fn show_args(descriptor: &ResourceDescriptor) -> Result<AzArgs> {
    let name = descriptor.name();
    let args = match descriptor.kind() {
        ResourceKind::ResourceGroup => AzArgs::new(["group", "show"]).flag("--name", name),
        ResourceKind::StorageAccount => AzArgs::new(["storage", "account", "show"])
            .flag("--name", name)
            .flag("--resource-group", parent(descriptor)?),
        ResourceKind::Network => AzArgs::new(["network", "vnet", "show"])
            .flag("--name", name)
            .flag("--resource-group", parent(descriptor)?),
        ResourceKind::ComputeCluster => AzArgs::new(["aks", "show"])
            .flag("--name", name)
            .flag("--resource-group", parent(descriptor)?),
        ResourceKind::DatabaseServer => AzArgs::new(["postgres", "flexible-server", "show"])
            .flag("--name", name)
            .flag("--resource-group", parent(descriptor)?),
        ResourceKind::Gateway => AzArgs::new(["apim", "show"])
            .flag("--name", name)
            .flag("--resource-group", parent(descriptor)?),
    };
    Ok(args)
}

/// az arguments to create a resource
pub fn create_args(descriptor: &ResourceDescriptor) -> Result<AzArgs> {
    let name = descriptor.name();
    let location = descriptor.location();
    let args = match descriptor.kind() {
        ResourceKind::ResourceGroup => AzArgs::new(["group", "create"])
            .flag("--name", name)
            .flag("--location", location),
        ResourceKind::StorageAccount => AzArgs::new(["storage", "account", "create"])
            .flag("--name", name)
            .flag("--resource-group", parent(descriptor)?)
            .flag("--location", location)
            .flag("--sku", required::<String>(descriptor, param::SKU_NAME)?)
            .flag("--kind", required::<String>(descriptor, param::STORAGE_KIND)?),
        ResourceKind::Network => AzArgs::new(["network", "vnet", "create"])
            .flag("--name", name)
            .flag("--resource-group", parent(descriptor)?)
            .flag("--location", location)
            .flag(
                "--address-prefixes",
                required::<String>(descriptor, param::ADDRESS_PREFIX)?,
            ),
        ResourceKind::ComputeCluster => {
            let identity: Option<String> = descriptor.get_parameter(param::IDENTITY_TYPE);
            let args = AzArgs::new(["aks", "create"])
                .flag("--name", name)
                .flag("--resource-group", parent(descriptor)?)
                .flag("--location", location)
                .flag("--dns-name-prefix", required::<String>(descriptor, param::DNS_PREFIX)?)
                .flag("--nodepool-name", required::<String>(descriptor, param::NODE_POOL_NAME)?)
                .flag(
                    "--node-count",
                    required::<u32>(descriptor, param::NODE_COUNT)?.to_string(),
                )
                .flag("--node-vm-size", required::<String>(descriptor, param::VM_SIZE)?)
                .flag_opt("--os-sku", os_sku(descriptor))
                .flag_opt("--vm-set-type", descriptor.get_parameter::<String>(param::POOL_TYPE))
                .switch("--generate-ssh-keys");
            if identity.as_deref() == Some("SystemAssigned") {
                args.switch("--enable-managed-identity")
            } else {
                args
            }
        }
        ResourceKind::DatabaseServer => {
            let password = descriptor.secret(param::ADMIN_PASSWORD).ok_or_else(|| {
                AzureError::MissingParameter {
                    resource: descriptor.id().to_string(),
                    key: param::ADMIN_PASSWORD.to_string(),
                }
            })?;
            AzArgs::new(["postgres", "flexible-server", "create"])
                .flag("--name", name)
                .flag("--resource-group", parent(descriptor)?)
                .flag("--location", location)
                .flag("--admin-user", required::<String>(descriptor, param::ADMIN_LOGIN)?)
                .secret("--admin-password", password.expose())
                .flag("--sku-name", required::<String>(descriptor, param::SKU_NAME)?)
                .flag("--tier", required::<String>(descriptor, param::SKU_TIER)?)
                .flag("--version", required::<String>(descriptor, param::VERSION)?)
                .flag(
                    "--storage-size",
                    required::<u32>(descriptor, param::STORAGE_SIZE_GB)?.to_string(),
                )
                .flag(
                    "--backup-retention",
                    required::<u32>(descriptor, param::BACKUP_RETENTION_DAYS)?.to_string(),
                )
                .flag_opt(
                    "--geo-redundant-backup",
                    descriptor.get_parameter::<String>(param::GEO_REDUNDANT_BACKUP),
                )
                .flag_opt(
                    "--zone",
                    descriptor.get_parameter::<String>(param::AVAILABILITY_ZONE),
                )
                .flag_opt("--tags", tags(descriptor))
                .switch("--yes")
        }
        ResourceKind::Gateway => AzArgs::new(["apim", "create"])
            .flag("--name", name)
            .flag("--resource-group", parent(descriptor)?)
            .flag("--location", location)
            .flag(
                "--publisher-name",
                required::<String>(descriptor, param::PUBLISHER_NAME)?,
            )
            .flag(
                "--publisher-email",
                required::<String>(descriptor, param::PUBLISHER_EMAIL)?,
            )
            .flag("--sku-name", required::<String>(descriptor, param::SKU_NAME)?),
    };
    Ok(args)
}

/// az arguments to update an existing resource in place
pub fn update_args(descriptor: &ResourceDescriptor) -> Result<AzArgs> {
    let name = descriptor.name();
    match descriptor.kind() {
        ResourceKind::ComputeCluster => Ok(AzArgs::new(["aks", "scale"])
            .flag("--name", name)
            .flag("--resource-group", parent(descriptor)?)
            .flag("--nodepool-name", required::<String>(descriptor, param::NODE_POOL_NAME)?)
            .flag(
                "--node-count",
                required::<u32>(descriptor, param::NODE_COUNT)?.to_string(),
            )),
        ResourceKind::DatabaseServer => Ok(AzArgs::new(["postgres", "flexible-server", "update"])
            .flag("--name", name)
            .flag("--resource-group", parent(descriptor)?)
            .flag("--sku-name", required::<String>(descriptor, param::SKU_NAME)?)
            .flag("--tier", required::<String>(descriptor, param::SKU_TIER)?)
            .flag(
                "--storage-size",
                required::<u32>(descriptor, param::STORAGE_SIZE_GB)?.to_string(),
            )
            .flag(
                "--backup-retention",
                required::<u32>(descriptor, param::BACKUP_RETENTION_DAYS)?.to_string(),
            )
            .flag_opt("--tags", tags(descriptor))),
        _ => create_args(descriptor),
    }
}

/// AKS expects an OS SKU rather than an OS type; Linux pools default to Ubuntu
fn os_sku(descriptor: &ResourceDescriptor) -> Option<String> {
    match descriptor.get_parameter::<String>(param::OS_TYPE)?.as_str() {
        "Linux" => Some("Ubuntu".to_string()),
        "Windows" => Some("Windows2022".to_string()),
        _ => None,
    }
}
