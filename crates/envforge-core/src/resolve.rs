//! Environment-derived identifiers
//!
//! The subscription and the default resource group come from settings.
//! Outside development a missing value is an error; in development the
//! shipped fallback stands in and a warning is logged.

use crate::error::{ProvisionError, Result};
use crate::params::ProvisionParams;
use crate::profile::Profile;
use envforge_config::Settings;
use envforge_config::settings::{RESOURCE_GROUP_ENV, SUBSCRIPTION_ENV};
use serde::Serialize;
use tracing::warn;

pub const FALLBACK_SUBSCRIPTION_ID: &str = "00000000-0000-0000-0000-000000000000";
pub const FALLBACK_RESOURCE_GROUP: &str = "aks_rg";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedConfig {
    pub subscription_id: String,
    pub resource_group: String,
    /// True when any development fallback was used
    pub uses_fallback: bool,
}

pub fn resolve(
    profile: Profile,
    params: &ProvisionParams,
    settings: &Settings,
) -> Result<ResolvedConfig> {
    let development = settings.environment.is_development();
    let mut uses_fallback = false;

    let subscription_id = match non_blank(&settings.subscription_id) {
        Some(id) => id,
        None if development => {
            warn!(
                "No subscription configured, using non-production fallback {}",
                FALLBACK_SUBSCRIPTION_ID
            );
            uses_fallback = true;
            FALLBACK_SUBSCRIPTION_ID.to_string()
        }
        None => {
            return Err(ProvisionError::MissingConfig {
                key: "subscriptionId".to_string(),
                hint: format!("{} or subscriptionId in envforge.yaml", SUBSCRIPTION_ENV),
            });
        }
    };

    // Profiles that create their group take it from the input
    let resource_group = match non_blank(&params.rg_name) {
        Some(rg) => rg,
        None if profile.creates_group() => {
            return Err(ProvisionError::invalid("rgName is required"));
        }
        None => match non_blank(&settings.resource_group_name) {
            Some(rg) => rg,
            None if development => {
                warn!(
                    "No resource group configured, using non-production fallback {}",
                    FALLBACK_RESOURCE_GROUP
                );
                uses_fallback = true;
                FALLBACK_RESOURCE_GROUP.to_string()
            }
            None => {
                return Err(ProvisionError::MissingConfig {
                    key: "resourceGroupName".to_string(),
                    hint: format!(
                        "--rg-name, {} or resourceGroupName in envforge.yaml",
                        RESOURCE_GROUP_ENV
                    ),
                });
            }
        },
    };

    Ok(ResolvedConfig {
        subscription_id,
        resource_group,
        uses_fallback,
    })
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
