//! Azure provisioning backends for envforge
//!
//! Binds every [`envforge_cloud::ResourceKind`] to the Azure control plane
//! through the `az` CLI.
//!
//! # Requirements
//!
//! - `az` must be installed and logged in (`az login`, managed identity,
//!   or service principal environment variables)
//!
//! # Example
//!
//! ```ignore
//! use envforge_cloud::Orchestrator;
//! use envforge_cloud_azure::{AzCli, azure_registry};
//!
//! let az = AzCli::new(Some(subscription_id));
//! let account = az.check_auth().await?;
//! let orchestrator = Orchestrator::new(azure_registry(az));
//! let outcome = orchestrator.run("aks", &plan).await?;
//! ```

pub mod az;
pub mod binding;
pub mod error;

pub use az::{AzAccount, AzArgs, AzCli};
pub use binding::{AzureBinding, azure_registry};
pub use error::{AzureError, Result, classify};
