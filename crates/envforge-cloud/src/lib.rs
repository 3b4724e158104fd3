//! envforge provisioning orchestrator
//!
//! This crate sequences the creation of a small, fixed topology of cloud
//! resources against pluggable provisioning backends.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                  envforge CLI                    │
//! │               (envforge up/plan)                 │
//! └─────────────────┬───────────────────────────────┘
//!                   │  Plan (ordered Steps)
//! ┌─────────────────▼───────────────────────────────┐
//! │                envforge-cloud                    │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │              Orchestrator                 │   │
//! │  │  dependency order, fail fast, Outcome     │   │
//! │  └──────────────────┬───────────────────────┘   │
//! │  ┌──────────────────▼───────────────────────┐   │
//! │  │  trait ProvisioningBackend (per kind)     │   │
//! │  └──────────────────────────────────────────┘   │
//! └───────┬─────────────────┬───────────────────────┘
//!         │                 │
//! ┌───────▼───────┐ ┌───────▼───────┐
//! │  azure (az)   │ │   simulated   │
//! └───────────────┘ └───────────────┘
//! ```

pub mod descriptor;
pub mod error;
pub mod memory;
pub mod orchestrator;
pub mod outcome;
pub mod plan;
pub mod provider;
pub mod state;

// Re-exports
pub use descriptor::{ResourceDescriptor, ResourceId, ResourceKind, Secret, is_region_token};
pub use error::{BackendError, BackendErrorKind, CloudError, Result};
pub use memory::{BackendCall, SimulatedCloud};
pub use orchestrator::{ExecutionMode, Orchestrator, RunOptions};
pub use outcome::{ErrorInfo, Outcome, OutcomeSummary, RunStatus, StepResult, StepStatus};
pub use plan::{ActionType, Plan, PlanSummary, PlannedAction, Step};
pub use provider::{BackendRegistry, BackendResult, Handle, ProvisioningBackend};
pub use state::{ReportStore, RunReport};
