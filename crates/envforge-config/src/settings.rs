//! Process-level settings
//!
//! Settings come from an optional YAML file, then environment variables
//! override individual values.

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const SUBSCRIPTION_ENV: &str = "CONTAINERSERVICE_SUBSCRIPTION_ID";
pub const RESOURCE_GROUP_ENV: &str = "CONTAINERSERVICE_RESOURCE_GROUP";
pub const ENVIRONMENT_ENV: &str = "ENVFORGE_ENVIRONMENT";

/// Deployment environment the settings are meant for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Shipped fallbacks may stand in for missing identifiers
    Development,
    /// Every identifier must be configured explicitly
    #[default]
    Production,
}

impl Environment {
    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }
}

impl std::str::FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(ConfigError::InvalidValue {
                key: ENVIRONMENT_ENV.to_string(),
                value: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Default counts and SKUs applied when the input leaves them out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Defaults {
    pub aks_node_count: u32,
    pub dev_env_node_count: u32,
    pub node_pool_name: String,

    pub storage_sku: String,
    pub storage_kind: String,
    /// Storage account name; derived from the cluster name when unset
    pub storage_account_name: Option<String>,

    pub network_address_prefix: String,

    pub database_tier: String,
    pub database_storage_gb: u32,
    pub database_backup_retention_days: u32,
    pub database_availability_zone: String,

    pub gateway_sku: String,
    pub gateway_publisher_name: String,
    pub gateway_publisher_email: Option<String>,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            aks_node_count: 1,
            dev_env_node_count: 3,
            node_pool_name: "nodepool1".to_string(),
            storage_sku: "Standard_LRS".to_string(),
            storage_kind: "StorageV2".to_string(),
            storage_account_name: None,
            network_address_prefix: "10.0.0.0/16".to_string(),
            database_tier: "Burstable".to_string(),
            database_storage_gb: 512,
            database_backup_retention_days: 7,
            database_availability_zone: "1".to_string(),
            gateway_sku: "Developer".to_string(),
            gateway_publisher_name: "envforge".to_string(),
            gateway_publisher_email: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleMode {
    #[default]
    Sequential,
    Concurrent,
}

/// How provisioning steps are scheduled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExecutionSettings {
    pub mode: ScheduleMode,
    pub max_parallel: usize,
    pub check_existing: bool,
}

impl Default for ExecutionSettings {
    fn default() -> Self {
        Self {
            mode: ScheduleMode::Sequential,
            max_parallel: 4,
            check_existing: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Billing scope
    pub subscription_id: Option<String>,
    /// Resource group used by profiles that do not create their own
    pub resource_group_name: Option<String>,
    pub environment: Environment,
    pub defaults: Defaults,
    pub execution: ExecutionSettings,

    /// File the settings were read from
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl Settings {
    /// Discover, parse and apply environment overrides
    pub fn load() -> Result<Self> {
        let settings = match crate::find_settings_file()? {
            Some(path) => Self::from_file(&path)?,
            None => {
                tracing::debug!("No settings file found, using defaults");
                Self::default()
            }
        };
        settings.with_env_overrides()
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut settings = Self::from_yaml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        settings.source = Some(path.to_path_buf());
        tracing::debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn from_yaml(content: &str) -> std::result::Result<Self, serde_yaml::Error> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }

    /// Apply `CONTAINERSERVICE_*` and `ENVFORGE_ENVIRONMENT` overrides
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Some(subscription) = non_empty_var(SUBSCRIPTION_ENV) {
            self.subscription_id = Some(subscription);
        }
        if let Some(group) = non_empty_var(RESOURCE_GROUP_ENV) {
            self.resource_group_name = Some(group);
        }
        if let Some(environment) = non_empty_var(ENVIRONMENT_ENV) {
            self.environment = environment.parse()?;
        }
        Ok(self)
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
