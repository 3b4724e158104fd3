//! Run a profile against an orchestrator

use crate::error::Result;
use crate::params::ProvisionParams;
use crate::profile::Profile;
use crate::topology::{ProfilePlan, build_plan};
use envforge_cloud::{ExecutionMode, Orchestrator, Outcome, PlannedAction, RunOptions};
use envforge_config::{ExecutionSettings, ScheduleMode, Settings};
use tracing::info;

/// Translate the `execution` settings into orchestrator options
pub fn run_options(execution: &ExecutionSettings) -> RunOptions {
    let mode = match execution.mode {
        ScheduleMode::Sequential => ExecutionMode::Sequential,
        ScheduleMode::Concurrent => ExecutionMode::Concurrent {
            max_parallel: execution.max_parallel,
        },
    };
    RunOptions {
        mode,
        check_existing: execution.check_existing,
    }
}

impl ProfilePlan {
    pub async fn run(&self, orchestrator: &Orchestrator) -> Result<Outcome> {
        if self.config.uses_fallback {
            info!(profile = %self.profile, "Running with development fallbacks");
        }
        Ok(orchestrator.run(self.profile.name(), &self.plan).await?)
    }

    pub async fn preview(&self, orchestrator: &Orchestrator) -> Result<Vec<PlannedAction>> {
        Ok(orchestrator.preview(&self.plan).await?)
    }
}

/// Validate, build and run in one go.
///
/// Invalid input fails before the orchestrator sees the plan. A failing
/// step yields `Ok` with an aborted [`Outcome`].
pub async fn provision(
    orchestrator: &Orchestrator,
    profile: Profile,
    params: &ProvisionParams,
    settings: &Settings,
) -> Result<Outcome> {
    let plan = build_plan(profile, params, settings)?;
    plan.run(orchestrator).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_options_from_settings() {
        let sequential = run_options(&ExecutionSettings::default());
        assert_eq!(sequential.mode, ExecutionMode::Sequential);
        assert!(!sequential.check_existing);

        let concurrent = run_options(&ExecutionSettings {
            mode: ScheduleMode::Concurrent,
            max_parallel: 2,
            check_existing: true,
        });
        assert_eq!(concurrent.mode, ExecutionMode::Concurrent { max_parallel: 2 });
        assert!(concurrent.check_existing);
    }
}
