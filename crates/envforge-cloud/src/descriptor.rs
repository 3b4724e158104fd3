//! Resource descriptors
//!
//! A [`ResourceDescriptor`] is the immutable description of one cloud
//! resource to provision. Descriptors are built once from caller input and
//! handed to the backend by reference.

use crate::error::{CloudError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Kind of resource a descriptor provisions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    ResourceGroup,
    StorageAccount,
    Network,
    ComputeCluster,
    DatabaseServer,
    Gateway,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 6] = [
        ResourceKind::ResourceGroup,
        ResourceKind::StorageAccount,
        ResourceKind::Network,
        ResourceKind::ComputeCluster,
        ResourceKind::DatabaseServer,
        ResourceKind::Gateway,
    ];

    /// Machine-readable identifier (e.g. "compute-cluster")
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::ResourceGroup => "resource-group",
            ResourceKind::StorageAccount => "storage-account",
            ResourceKind::Network => "network",
            ResourceKind::ComputeCluster => "compute-cluster",
            ResourceKind::DatabaseServer => "database-server",
            ResourceKind::Gateway => "gateway",
        }
    }

    /// Name of the workflow output carrying this kind's handle
    pub fn output_name(&self) -> &'static str {
        match self {
            ResourceKind::ResourceGroup => "resourceGroupId",
            ResourceKind::StorageAccount => "storageAccountId",
            ResourceKind::Network => "networkId",
            ResourceKind::ComputeCluster => "clusterId",
            ResourceKind::DatabaseServer => "databaseServerId",
            ResourceKind::Gateway => "gatewayId",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceKind::ResourceGroup => write!(f, "resource group"),
            ResourceKind::StorageAccount => write!(f, "storage account"),
            ResourceKind::Network => write!(f, "network"),
            ResourceKind::ComputeCluster => write!(f, "compute cluster"),
            ResourceKind::DatabaseServer => write!(f, "database server"),
            ResourceKind::Gateway => write!(f, "gateway"),
        }
    }
}

impl FromStr for ResourceKind {
    type Err = CloudError;

    fn from_str(s: &str) -> Result<Self> {
        ResourceKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| CloudError::InvalidInput(format!("unknown resource kind '{}'", s)))
    }
}

/// Parameter keys shared by descriptor builders and backends
pub mod param {
    pub const DNS_PREFIX: &str = "dnsPrefix";
    pub const NODE_POOL_NAME: &str = "nodePoolName";
    pub const NODE_COUNT: &str = "nodeCount";
    pub const VM_SIZE: &str = "vmSize";
    pub const OS_TYPE: &str = "osType";
    pub const POOL_MODE: &str = "mode";
    pub const POOL_TYPE: &str = "type";
    pub const IDENTITY_TYPE: &str = "identityType";

    pub const SKU_NAME: &str = "skuName";
    pub const SKU_TIER: &str = "skuTier";
    pub const STORAGE_KIND: &str = "kind";
    pub const ADDRESS_PREFIX: &str = "addressPrefix";

    pub const ADMIN_LOGIN: &str = "administratorLogin";
    pub const ADMIN_PASSWORD: &str = "administratorLoginPassword";
    pub const AVAILABILITY_ZONE: &str = "availabilityZone";
    pub const BACKUP_RETENTION_DAYS: &str = "backupRetentionDays";
    pub const GEO_REDUNDANT_BACKUP: &str = "geoRedundantBackup";
    pub const CREATE_MODE: &str = "createMode";
    pub const STORAGE_SIZE_GB: &str = "storageSizeGB";
    pub const VERSION: &str = "version";
    pub const TAGS: &str = "tags";

    pub const PUBLISHER_NAME: &str = "publisherName";
    pub const PUBLISHER_EMAIL: &str = "publisherEmail";
}

/// Identity of a descriptor within one provisioning run
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceId {
    pub kind: ResourceKind,
    pub name: String,
}

impl ResourceId {
    pub fn new(kind: ResourceKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind.as_str(), self.name)
    }
}

/// Secret value passed through to a backend without being logged or persisted
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// Description of a single resource to provision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    kind: ResourceKind,
    name: String,
    location: String,
    /// Owning resource group; `None` for the group itself
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parent: Option<String>,
    #[serde(default)]
    parameters: BTreeMap<String, serde_json::Value>,
    #[serde(skip)]
    secrets: BTreeMap<String, Secret>,
}

impl ResourceDescriptor {
    pub fn new(kind: ResourceKind, name: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            location: location.into(),
            parent: None,
            parameters: BTreeMap::new(),
            secrets: BTreeMap::new(),
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.parameters.insert(key.into(), value);
        self
    }

    pub fn with_secret(mut self, key: impl Into<String>, value: Secret) -> Self {
        self.secrets.insert(key.into(), value);
        self
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn parameters(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.parameters
    }

    pub fn id(&self) -> ResourceId {
        ResourceId::new(self.kind, self.name.clone())
    }

    /// Get a parameter value as a specific type
    pub fn get_parameter<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.parameters
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn secret(&self, key: &str) -> Option<&Secret> {
        self.secrets.get(key)
    }

    /// Check the structural invariants of the descriptor
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(CloudError::InvalidInput(format!(
                "{} name must not be empty",
                self.kind
            )));
        }
        if !is_region_token(&self.location) {
            return Err(CloudError::InvalidInput(format!(
                "{} '{}' has invalid location '{}'",
                self.kind, self.name, self.location
            )));
        }
        if self.kind != ResourceKind::ResourceGroup
            && self.parent.as_deref().is_some_and(|p| p.trim().is_empty())
        {
            return Err(CloudError::InvalidInput(format!(
                "{} '{}' has an empty resource group",
                self.kind, self.name
            )));
        }
        Ok(())
    }
}

/// Provider region tokens are lowercase ASCII letters and digits ("eastus", "westeurope2")
pub fn is_region_token(location: &str) -> bool {
    !location.is_empty()
        && location
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
}
