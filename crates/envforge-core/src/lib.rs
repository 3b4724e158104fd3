//! envforge provisioning profiles
//!
//! Turns a typed parameter set into a validated [`envforge_cloud::Plan`]
//! for one of the fixed [`Profile`]s and runs it.

pub mod error;
pub mod naming;
pub mod params;
pub mod profile;
pub mod provision;
pub mod resolve;
pub mod topology;

pub use error::{ProvisionError, Result};
pub use params::ProvisionParams;
pub use profile::Profile;
pub use provision::{provision, run_options};
pub use resolve::{FALLBACK_RESOURCE_GROUP, FALLBACK_SUBSCRIPTION_ID, ResolvedConfig, resolve};
pub use topology::{ProfilePlan, build_plan};
