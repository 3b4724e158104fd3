//! Caller-supplied provisioning parameters

use crate::error::{ProvisionError, Result};
use crate::profile::Profile;
use envforge_cloud::is_region_token;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Input parameter set for one run.
///
/// Every field is optional at the type level; [`ProvisionParams::validate`]
/// decides what a given profile requires.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProvisionParams {
    pub cluster_name: Option<String>,
    pub region: Option<String>,
    pub node_size: Option<String>,
    /// Signed so that out-of-range input is reported as invalid, not unparseable
    pub node_count: Option<i64>,

    pub rg_name: Option<String>,
    pub rg_region: Option<String>,

    pub pg_server_name: Option<String>,
    pub pg_sku: Option<String>,
    pub pg_version: Option<String>,
    pub pg_admin_username: Option<String>,
    #[serde(skip_serializing)]
    pub pg_admin_password: Option<String>,

    pub publisher_email: Option<String>,
}

impl std::fmt::Debug for ProvisionParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProvisionParams")
            .field("cluster_name", &self.cluster_name)
            .field("region", &self.region)
            .field("node_size", &self.node_size)
            .field("node_count", &self.node_count)
            .field("rg_name", &self.rg_name)
            .field("rg_region", &self.rg_region)
            .field("pg_server_name", &self.pg_server_name)
            .field("pg_sku", &self.pg_sku)
            .field("pg_version", &self.pg_version)
            .field("pg_admin_username", &self.pg_admin_username)
            .field(
                "pg_admin_password",
                &self.pg_admin_password.as_ref().map(|_| "***"),
            )
            .field("publisher_email", &self.publisher_email)
            .finish()
    }
}

impl ProvisionParams {
    /// Read a JSON parameter file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ProvisionError::ParamsFile {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        serde_json::from_str(&content).map_err(|e| ProvisionError::ParamsFile {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Fields set in `overrides` replace the ones in `self`
    pub fn merge(self, overrides: ProvisionParams) -> Self {
        Self {
            cluster_name: overrides.cluster_name.or(self.cluster_name),
            region: overrides.region.or(self.region),
            node_size: overrides.node_size.or(self.node_size),
            node_count: overrides.node_count.or(self.node_count),
            rg_name: overrides.rg_name.or(self.rg_name),
            rg_region: overrides.rg_region.or(self.rg_region),
            pg_server_name: overrides.pg_server_name.or(self.pg_server_name),
            pg_sku: overrides.pg_sku.or(self.pg_sku),
            pg_version: overrides.pg_version.or(self.pg_version),
            pg_admin_username: overrides.pg_admin_username.or(self.pg_admin_username),
            pg_admin_password: overrides.pg_admin_password.or(self.pg_admin_password),
            publisher_email: overrides.publisher_email.or(self.publisher_email),
        }
    }

    /// Check the parameters a profile needs.
    ///
    /// All missing required fields are reported together.
    pub fn validate(&self, profile: Profile) -> Result<()> {
        let mut missing = Vec::new();

        let mut require = |key: &'static str, value: &Option<String>| {
            if value.as_deref().is_none_or(|v| v.trim().is_empty()) {
                missing.push(key);
            }
        };

        require("clusterName", &self.cluster_name);
        require("region", &self.region);
        require("nodeSize", &self.node_size);

        if profile.creates_group() {
            require("rgName", &self.rg_name);
            require("rgRegion", &self.rg_region);
            require("pgServerName", &self.pg_server_name);
            require("pgSku", &self.pg_sku);
            require("pgVersion", &self.pg_version);
            require("pgAdminUsername", &self.pg_admin_username);
            require("pgAdminPassword", &self.pg_admin_password);
        }

        if !missing.is_empty() {
            return Err(ProvisionError::invalid(format!(
                "missing required parameter(s) for profile '{}': {}",
                profile,
                missing.join(", ")
            )));
        }

        if let Some(count) = self.node_count.filter(|c| *c <= 0 || *c > i64::from(u32::MAX)) {
            return Err(ProvisionError::invalid(format!(
                "nodeCount must be a positive integer, got {}",
                count
            )));
        }

        for (key, value) in [("region", &self.region), ("rgRegion", &self.rg_region)] {
            if let Some(region) = value.as_deref().filter(|r| !is_region_token(r)) {
                return Err(ProvisionError::invalid(format!(
                    "{} '{}' is not a region token (lowercase letters and digits)",
                    key, region
                )));
            }
        }

        if self.rg_name.as_deref().is_some_and(|rg| rg.trim().is_empty()) {
            return Err(ProvisionError::invalid("rgName must not be blank"));
        }

        Ok(())
    }

    /// Node count as validated by [`ProvisionParams::validate`]
    pub fn node_count(&self) -> Option<u32> {
        self.node_count.and_then(|c| u32::try_from(c).ok())
    }
}

/// Field accessor for validated parameters
pub(crate) fn field(value: &Option<String>) -> String {
    value.as_deref().map(str::trim).unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> ProvisionParams {
        ProvisionParams {
            cluster_name: Some("demo".to_string()),
            region: Some("eastus".to_string()),
            node_size: Some("Standard_D2s_v3".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_minimal_params_valid_for_aks() {
        minimal().validate(Profile::Aks).unwrap();
    }

    #[test]
    fn test_blank_cluster_name_rejected() {
        let params = ProvisionParams {
            cluster_name: Some("   ".to_string()),
            ..minimal()
        };
        let err = params.validate(Profile::Aks).unwrap_err();
        assert!(err.to_string().contains("clusterName"));
    }

    #[test]
    fn test_missing_fields_reported_together() {
        let err = minimal().validate(Profile::DevEnv).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("rgName"));
        assert!(message.contains("pgAdminPassword"));
    }

    #[test]
    fn test_node_count_must_be_positive() {
        for count in [0, -3] {
            let params = ProvisionParams {
                node_count: Some(count),
                ..minimal()
            };
            assert!(matches!(
                params.validate(Profile::Aks),
                Err(ProvisionError::InvalidInput(_))
            ));
        }
    }

    #[test]
    fn test_region_must_be_token() {
        let params = ProvisionParams {
            region: Some("East US".to_string()),
            ..minimal()
        };
        assert!(params.validate(Profile::Aks).is_err());
    }

    #[test]
    fn test_merge_prefers_overrides() {
        let file = ProvisionParams {
            node_count: Some(2),
            ..minimal()
        };
        let flags = ProvisionParams {
            region: Some("westeurope".to_string()),
            ..Default::default()
        };
        let merged = file.merge(flags);
        assert_eq!(merged.region.as_deref(), Some("westeurope"));
        assert_eq!(merged.cluster_name.as_deref(), Some("demo"));
        assert_eq!(merged.node_count(), Some(2));
    }

    #[test]
    fn test_password_not_serialized_or_debugged() {
        let params = ProvisionParams {
            pg_admin_password: Some("hunter2".to_string()),
            ..minimal()
        };
        assert!(!serde_json::to_string(&params).unwrap().contains("hunter2"));
        assert!(!format!("{:?}", params).contains("hunter2"));
    }

    #[test]
    fn test_from_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("params.json");
        std::fs::write(
            &path,
            r#"{"clusterName": "demo", "region": "eastus", "nodeSize": "Standard_D2s_v3", "nodeCount": 2}"#,
        )
        .unwrap();

        let params = ProvisionParams::from_file(&path).unwrap();
        assert_eq!(params.cluster_name.as_deref(), Some("demo"));
        assert_eq!(params.node_count(), Some(2));

        let missing = temp_dir.path().join("nope.json");
        assert!(matches!(
            ProvisionParams::from_file(&missing),
            Err(ProvisionError::ParamsFile { .. })
        ));
    }
}
