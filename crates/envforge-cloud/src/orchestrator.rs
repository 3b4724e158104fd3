//! Provisioning orchestrator
//!
//! Executes a [`Plan`] against the registered backends. A step runs only
//! when every dependency has succeeded. The first failure aborts the run:
//! steps that have not started are recorded as skipped and nothing that was
//! already created is rolled back.

use crate::descriptor::ResourceId;
use crate::error::{CloudError, Result};
use crate::outcome::{ErrorInfo, Outcome, StepResult, StepStatus};
use crate::plan::{ActionType, Plan, PlannedAction, Step};
use crate::provider::{BackendRegistry, ProvisioningBackend};
use chrono::Utc;
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// How steps are scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum ExecutionMode {
    /// One step at a time, in plan order
    #[default]
    Sequential,
    /// Steps of the same dependency wave run together, at most `max_parallel` at once
    Concurrent { max_parallel: usize },
}

/// Options for a single run
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub mode: ExecutionMode,
    /// Look each resource up before creating it, to report pre-existing resources
    pub check_existing: bool,
}

pub struct Orchestrator {
    backends: BackendRegistry,
    options: RunOptions,
}

impl Orchestrator {
    pub fn new(backends: BackendRegistry) -> Self {
        Self {
            backends,
            options: RunOptions::default(),
        }
    }

    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Backend for every plan position; fails before any backend call when
    /// a step has nobody to run it
    fn preflight(&self, plan: &Plan) -> Result<Vec<Arc<dyn ProvisioningBackend>>> {
        if let ExecutionMode::Concurrent { max_parallel: 0 } = self.options.mode {
            return Err(CloudError::InvalidInput(
                "max_parallel must be at least 1".to_string(),
            ));
        }
        plan.steps()
            .iter()
            .map(|step| {
                let kind = step.descriptor().kind();
                self.backends
                    .get(kind)
                    .cloned()
                    .ok_or(CloudError::MissingBackend(kind))
            })
            .collect()
    }

    /// Report whether each step would create or update its resource
    pub async fn preview(&self, plan: &Plan) -> Result<Vec<PlannedAction>> {
        let backends = self.preflight(plan)?;

        let mut actions = Vec::with_capacity(plan.len());
        for (step, backend) in plan.steps().iter().zip(&backends) {
            let existing = backend.get(step.descriptor()).await?;
            actions.push(PlannedAction {
                resource: step.id(),
                action_type: if existing.is_some() {
                    ActionType::Update
                } else {
                    ActionType::Create
                },
                existing,
            });
        }
        Ok(actions)
    }

    /// Execute the plan.
    ///
    /// Returns `Err` only for problems found before the first backend call.
    /// A failed step yields `Ok` with an aborted [`Outcome`].
    pub async fn run(&self, profile: &str, plan: &Plan) -> Result<Outcome> {
        let backends = self.preflight(plan)?;

        let started_at = Utc::now();
        info!(
            profile,
            steps = plan.len(),
            mode = ?self.options.mode,
            "Provisioning run started"
        );

        let mut slots: Vec<Option<StepResult>> = vec![None; plan.len()];
        let mut aborted = false;

        for batch in self.batches(plan) {
            if aborted {
                for position in batch {
                    slots[position] = Some(StepResult::skipped(plan.steps()[position].clone()));
                }
                continue;
            }

            let mut runnable = Vec::with_capacity(batch.len());
            for position in batch {
                let step = &plan.steps()[position];
                if dependencies_succeeded(step, plan, &slots) {
                    runnable.push(position);
                } else {
                    warn!(resource = %step.id(), "Dependency did not succeed, skipping");
                    slots[position] = Some(StepResult::skipped(step.clone()));
                }
            }

            let results = join_all(
                runnable
                    .iter()
                    .map(|&position| self.execute(&plan.steps()[position], &backends[position])),
            )
            .await;

            for (position, result) in runnable.into_iter().zip(results) {
                aborted |= result.is_failed();
                slots[position] = Some(result);
            }
        }

        let results: Vec<StepResult> = slots
            .into_iter()
            .zip(plan.steps())
            .map(|(slot, step)| slot.unwrap_or_else(|| StepResult::skipped(step.clone())))
            .collect();

        let outcome = Outcome::from_results(profile, results, started_at);
        match outcome.diagnostic() {
            Some(diagnostic) => error!(profile, "Provisioning run aborted: {}", diagnostic),
            None => info!(profile, summary = %outcome.summary(), "Provisioning run completed"),
        }
        Ok(outcome)
    }

    /// Groups of plan positions that may start together
    fn batches(&self, plan: &Plan) -> Vec<Vec<usize>> {
        match self.options.mode {
            ExecutionMode::Sequential => (0..plan.len()).map(|p| vec![p]).collect(),
            ExecutionMode::Concurrent { max_parallel } => plan
                .waves()
                .into_iter()
                .flat_map(|wave| {
                    wave.chunks(max_parallel.max(1))
                        .map(<[usize]>::to_vec)
                        .collect::<Vec<_>>()
                })
                .collect(),
        }
    }

    async fn execute(&self, step: &Step, backend: &Arc<dyn ProvisioningBackend>) -> StepResult {
        let descriptor = step.descriptor();
        let id = step.id();
        let started = Instant::now();

        info!(resource = %id, backend = backend.name(), "Provisioning {}", descriptor.kind());

        let mut existing = false;
        if self.options.check_existing {
            match backend.get(descriptor).await {
                Ok(found) => existing = found.is_some(),
                Err(e) => {
                    error!(resource = %id, "Lookup failed: {}", e);
                    return StepResult::failed(
                        step.clone(),
                        ErrorInfo::from(&e),
                        elapsed_ms(started),
                    );
                }
            }
        }

        match backend.create_or_update(descriptor).await {
            Ok(handle) => {
                info!(
                    resource = %id,
                    handle = %handle,
                    existing,
                    "Provisioned {}",
                    descriptor.kind()
                );
                StepResult::succeeded(step.clone(), handle, existing, elapsed_ms(started))
            }
            Err(e) => {
                error!(
                    resource = %id,
                    "Failed to provision {} '{}': {}",
                    descriptor.kind(),
                    descriptor.name(),
                    e
                );
                StepResult::failed(step.clone(), ErrorInfo::from(&e), elapsed_ms(started))
            }
        }
    }
}

fn dependencies_succeeded(step: &Step, plan: &Plan, slots: &[Option<StepResult>]) -> bool {
    step.dependencies().iter().all(|dep: &ResourceId| {
        plan.position(dep)
            .and_then(|p| slots[p].as_ref())
            .is_some_and(|r| r.status == StepStatus::Succeeded)
    })
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{ResourceDescriptor, ResourceKind};
    use crate::error::BackendError;
    use crate::memory::SimulatedCloud;
    use crate::outcome::RunStatus;
    use std::sync::Arc;

    fn dev_plan() -> Plan {
        let group = ResourceId::new(ResourceKind::ResourceGroup, "rg");
        let storage = ResourceId::new(ResourceKind::StorageAccount, "sto");
        let network = ResourceId::new(ResourceKind::Network, "vnet");
        let cluster = ResourceId::new(ResourceKind::ComputeCluster, "demo");
        let middle = [storage.clone(), network.clone(), cluster.clone()];
        let d = |kind, name: &str| {
            let descriptor = ResourceDescriptor::new(kind, name, "eastus");
            if kind == ResourceKind::ResourceGroup {
                descriptor
            } else {
                descriptor.with_parent("rg")
            }
        };
        Plan::new(vec![
            Step::new(d(ResourceKind::ResourceGroup, "rg")),
            Step::new(d(ResourceKind::StorageAccount, "sto")).depends_on(group.clone()),
            Step::new(d(ResourceKind::Network, "vnet")).depends_on(group.clone()),
            Step::new(d(ResourceKind::ComputeCluster, "demo")).depends_on(group.clone()),
            Step::new(d(ResourceKind::DatabaseServer, "pg"))
                .depends_on(group.clone())
                .after(middle.clone()),
            Step::new(d(ResourceKind::Gateway, "apim"))
                .depends_on(group)
                .after(middle),
        ])
        .unwrap()
    }

    fn statuses(outcome: &Outcome) -> Vec<StepStatus> {
        outcome.results().iter().map(|r| r.status).collect()
    }

    #[tokio::test]
    async fn test_sequential_run_completes_in_order() {
        let cloud = Arc::new(SimulatedCloud::new());
        let orchestrator = Orchestrator::new(BackendRegistry::uniform(cloud.clone()));

        let outcome = orchestrator.run("dev-env-full", &dev_plan()).await.unwrap();

        assert_eq!(outcome.status(), RunStatus::Completed);
        let calls: Vec<String> = cloud
            .calls()
            .into_iter()
            .map(|c| c.resource.to_string())
            .collect();
        assert_eq!(
            calls,
            vec![
                "resource-group:rg",
                "storage-account:sto",
                "network:vnet",
                "compute-cluster:demo",
                "database-server:pg",
                "gateway:apim"
            ]
        );
    }

    #[tokio::test]
    async fn test_failure_skips_remaining_steps() {
        let cloud = Arc::new(SimulatedCloud::new());
        cloud.fail_on(
            ResourceKind::Network,
            BackendError::Conflict("address space overlaps".into()),
        );
        let orchestrator = Orchestrator::new(BackendRegistry::uniform(cloud.clone()));

        let outcome = orchestrator.run("dev-env-full", &dev_plan()).await.unwrap();

        assert_eq!(outcome.status(), RunStatus::Aborted);
        assert_eq!(
            statuses(&outcome),
            vec![
                StepStatus::Succeeded,
                StepStatus::Succeeded,
                StepStatus::Failed,
                StepStatus::Skipped,
                StepStatus::Skipped,
                StepStatus::Skipped
            ]
        );
        // nothing after the failing step reached the backend
        assert_eq!(cloud.calls().len(), 3);
        assert!(outcome.handle_for(ResourceKind::StorageAccount).is_some());
    }

    #[tokio::test]
    async fn test_concurrent_run_keeps_plan_order_and_short_circuits() {
        let cloud = Arc::new(SimulatedCloud::new());
        cloud.fail_on(
            ResourceKind::ComputeCluster,
            BackendError::QuotaExceeded("standardDSv3Family".into()),
        );
        let orchestrator = Orchestrator::new(BackendRegistry::uniform(cloud.clone()))
            .with_options(RunOptions {
                mode: ExecutionMode::Concurrent { max_parallel: 4 },
                check_existing: false,
            });

        let outcome = orchestrator.run("dev-env-full", &dev_plan()).await.unwrap();

        // the middle wave ran together; the last wave never started
        assert_eq!(
            statuses(&outcome),
            vec![
                StepStatus::Succeeded,
                StepStatus::Succeeded,
                StepStatus::Succeeded,
                StepStatus::Failed,
                StepStatus::Skipped,
                StepStatus::Skipped
            ]
        );
        assert_eq!(cloud.calls().len(), 4);
    }

    #[tokio::test]
    async fn test_concurrent_batches_respect_limit() {
        let cloud = Arc::new(SimulatedCloud::new());
        let orchestrator = Orchestrator::new(BackendRegistry::uniform(cloud))
            .with_options(RunOptions {
                mode: ExecutionMode::Concurrent { max_parallel: 2 },
                check_existing: false,
            });

        let batches = orchestrator.batches(&dev_plan());
        assert_eq!(batches, vec![vec![0], vec![1, 2], vec![3], vec![4, 5]]);
    }

    #[tokio::test]
    async fn test_zero_parallelism_rejected_before_any_call() {
        let cloud = Arc::new(SimulatedCloud::new());
        let orchestrator = Orchestrator::new(BackendRegistry::uniform(cloud.clone()))
            .with_options(RunOptions {
                mode: ExecutionMode::Concurrent { max_parallel: 0 },
                check_existing: false,
            });

        let err = orchestrator.run("dev-env", &dev_plan()).await.unwrap_err();
        assert!(matches!(err, CloudError::InvalidInput(_)));
        assert!(cloud.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_backend_rejected_before_any_call() {
        let cloud = Arc::new(SimulatedCloud::new());
        let registry = BackendRegistry::new()
            .with(ResourceKind::ResourceGroup, cloud.clone())
            .with(ResourceKind::ComputeCluster, cloud.clone());
        let orchestrator = Orchestrator::new(registry);

        let err = orchestrator.run("dev-env", &dev_plan()).await.unwrap_err();
        assert!(matches!(
            err,
            CloudError::MissingBackend(ResourceKind::StorageAccount)
        ));
        assert!(cloud.calls().is_empty());
    }

    #[tokio::test]
    async fn test_check_existing_marks_preexisting_resources() {
        let cloud = Arc::new(SimulatedCloud::new());
        let orchestrator = Orchestrator::new(BackendRegistry::uniform(cloud.clone()))
            .with_options(RunOptions {
                mode: ExecutionMode::Sequential,
                check_existing: true,
            });

        let first = orchestrator.run("dev-env-full", &dev_plan()).await.unwrap();
        assert!(first.results().iter().all(|r| !r.existing));

        let second = orchestrator.run("dev-env-full", &dev_plan()).await.unwrap();
        assert!(second.results().iter().all(|r| r.existing));
        assert_eq!(first.outputs(), second.outputs());
    }

    #[tokio::test]
    async fn test_preview_reports_create_then_update() {
        let cloud = Arc::new(SimulatedCloud::new());
        let orchestrator = Orchestrator::new(BackendRegistry::uniform(cloud.clone()));
        let plan = dev_plan();

        let before = orchestrator.preview(&plan).await.unwrap();
        assert!(before.iter().all(|a| a.action_type == ActionType::Create));

        orchestrator.run("dev-env-full", &plan).await.unwrap();

        let after = orchestrator.preview(&plan).await.unwrap();
        assert!(after.iter().all(|a| a.action_type == ActionType::Update));
    }
    struct LookupDenied;

    #[async_trait::async_trait]
    impl ProvisioningBackend for LookupDenied {
        fn name(&self) -> &str {
            "lookup-denied"
        }

        async fn create_or_update(
            &self,
            descriptor: &ResourceDescriptor,
        ) -> crate::provider::BackendResult<crate::provider::Handle> {
            Ok(crate::provider::Handle::new(descriptor.id().to_string()))
        }

        async fn get(
            &self,
            _descriptor: &ResourceDescriptor,
        ) -> crate::provider::BackendResult<Option<crate::provider::Handle>> {
            Err(BackendError::Unauthorized("token expired".to_string()))
        }
    }

    #[tokio::test]
    async fn test_preview_surfaces_lookup_errors() {
        let orchestrator = Orchestrator::new(BackendRegistry::uniform(Arc::new(LookupDenied)));

        let err = orchestrator.preview(&dev_plan()).await.unwrap_err();
        assert!(matches!(
            err,
            CloudError::Backend(BackendError::Unauthorized(_))
        ));
    }
}
