//! Provisioning profiles

use crate::error::{ProvisionError, Result};
use envforge_cloud::ResourceKind;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A fixed resource topology that can be provisioned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Profile {
    /// A single compute cluster in an existing resource group
    Aks,
    /// Group, storage, cluster and database server
    DevEnv,
    /// `dev-env` plus a virtual network and an API gateway
    DevEnvFull,
}

impl Profile {
    pub const ALL: [Profile; 3] = [Profile::Aks, Profile::DevEnv, Profile::DevEnvFull];

    pub fn name(&self) -> &'static str {
        match self {
            Profile::Aks => "aks",
            Profile::DevEnv => "dev-env",
            Profile::DevEnvFull => "dev-env-full",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Profile::Aks => "Managed Kubernetes cluster in an existing resource group",
            Profile::DevEnv => {
                "Resource group, storage account, Kubernetes cluster and PostgreSQL server"
            }
            Profile::DevEnvFull => "dev-env plus a virtual network and API Management",
        }
    }

    /// Resource kinds in declaration order
    pub fn kinds(&self) -> &'static [ResourceKind] {
        match self {
            Profile::Aks => &[ResourceKind::ComputeCluster],
            Profile::DevEnv => &[
                ResourceKind::ResourceGroup,
                ResourceKind::StorageAccount,
                ResourceKind::ComputeCluster,
                ResourceKind::DatabaseServer,
            ],
            Profile::DevEnvFull => &[
                ResourceKind::ResourceGroup,
                ResourceKind::StorageAccount,
                ResourceKind::Network,
                ResourceKind::ComputeCluster,
                ResourceKind::DatabaseServer,
                ResourceKind::Gateway,
            ],
        }
    }

    /// Whether the profile creates its own resource group
    pub fn creates_group(&self) -> bool {
        self.kinds().contains(&ResourceKind::ResourceGroup)
    }

    /// Kind whose handle is the run's primary output
    pub fn primary(&self) -> ResourceKind {
        ResourceKind::ComputeCluster
    }

    /// Output name of the primary resource (`clusterId`)
    pub fn primary_output(&self) -> &'static str {
        self.primary().output_name()
    }
}

impl FromStr for Profile {
    type Err = ProvisionError;

    fn from_str(s: &str) -> Result<Self> {
        Profile::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| ProvisionError::UnknownProfile(s.to_string()))
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
