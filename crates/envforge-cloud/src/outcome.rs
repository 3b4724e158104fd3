//! Run outcomes
//!
//! An [`Outcome`] is the final record of one provisioning run. It is built
//! once from the per-step results and never changes afterwards.

use crate::descriptor::{ResourceId, ResourceKind};
use crate::error::{BackendError, BackendErrorKind, CloudError, Result};
use crate::plan::Step;
use crate::provider::Handle;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Backend failure as recorded in a step result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub kind: BackendErrorKind,
    pub message: String,
}

impl From<&BackendError> for ErrorInfo {
    fn from(error: &BackendError) -> Self {
        Self {
            kind: error.kind(),
            message: error.message().to_string(),
        }
    }
}

impl From<BackendError> for ErrorInfo {
    fn from(error: BackendError) -> Self {
        Self::from(&error)
    }
}

impl std::fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Status of a single step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Succeeded,
    Failed,
    /// Never attempted because the run aborted or a dependency did not succeed
    Skipped,
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepStatus::Succeeded => write!(f, "succeeded"),
            StepStatus::Failed => write!(f, "failed"),
            StepStatus::Skipped => write!(f, "skipped"),
        }
    }
}

/// Result of one step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub step: Step,
    pub status: StepStatus,
    pub handle: Option<Handle>,
    pub error: Option<ErrorInfo>,
    /// The resource was found before the step ran
    #[serde(default)]
    pub existing: bool,
    #[serde(default)]
    pub duration_ms: u64,
}

impl StepResult {
    pub fn succeeded(step: Step, handle: Handle, existing: bool, duration_ms: u64) -> Self {
        Self {
            step,
            status: StepStatus::Succeeded,
            handle: Some(handle),
            error: None,
            existing,
            duration_ms,
        }
    }

    pub fn failed(step: Step, error: ErrorInfo, duration_ms: u64) -> Self {
        Self {
            step,
            status: StepStatus::Failed,
            handle: None,
            error: Some(error),
            existing: false,
            duration_ms,
        }
    }

    pub fn skipped(step: Step) -> Self {
        Self {
            step,
            status: StepStatus::Skipped,
            handle: None,
            error: None,
            existing: false,
            duration_ms: 0,
        }
    }

    pub fn id(&self) -> ResourceId {
        self.step.id()
    }

    pub fn is_succeeded(&self) -> bool {
        self.status == StepStatus::Succeeded
    }

    pub fn is_failed(&self) -> bool {
        self.status == StepStatus::Failed
    }
}

/// Overall status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    Aborted,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Completed => write!(f, "completed"),
            RunStatus::Aborted => write!(f, "aborted"),
        }
    }
}

/// Final record of a provisioning run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outcome {
    profile: String,
    status: RunStatus,
    results: Vec<StepResult>,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
}

impl Outcome {
    /// Finalize a run from its step results, in plan order.
    ///
    /// The status is `Aborted` as soon as any step failed.
    pub fn from_results(
        profile: impl Into<String>,
        results: Vec<StepResult>,
        started_at: DateTime<Utc>,
    ) -> Self {
        let status = if results.iter().any(StepResult::is_failed) {
            RunStatus::Aborted
        } else {
            RunStatus::Completed
        };
        Self {
            profile: profile.into(),
            status,
            results,
            started_at,
            finished_at: Utc::now(),
        }
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn is_completed(&self) -> bool {
        self.status == RunStatus::Completed
    }

    pub fn results(&self) -> &[StepResult] {
        &self.results
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn finished_at(&self) -> DateTime<Utc> {
        self.finished_at
    }

    /// Handle produced for the first successful step of `kind`
    pub fn handle_for(&self, kind: ResourceKind) -> Option<&Handle> {
        self.results
            .iter()
            .filter(|r| r.is_succeeded() && r.step.descriptor().kind() == kind)
            .find_map(|r| r.handle.as_ref())
    }

    /// Named outputs of the run (e.g. `clusterId`), for every successful step
    pub fn outputs(&self) -> BTreeMap<String, String> {
        self.results
            .iter()
            .filter(|r| r.is_succeeded())
            .filter_map(|r| {
                r.handle.as_ref().map(|h| {
                    (
                        r.step.descriptor().kind().output_name().to_string(),
                        h.to_string(),
                    )
                })
            })
            .collect()
    }

    pub fn first_failure(&self) -> Option<&StepResult> {
        self.results.iter().find(|r| r.is_failed())
    }

    /// One-line description of the failure that aborted the run
    pub fn diagnostic(&self) -> Option<String> {
        let failed = self.first_failure()?;
        let descriptor = failed.step.descriptor();
        let error = failed
            .error
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| "no error recorded".to_string());
        Some(format!(
            "{} '{}' failed: {}",
            descriptor.kind(),
            descriptor.name(),
            error
        ))
    }

    pub fn summary(&self) -> OutcomeSummary {
        self.results
            .iter()
            .fold(OutcomeSummary::default(), |mut summary, r| {
                match r.status {
                    StepStatus::Succeeded => summary.succeeded += 1,
                    StepStatus::Failed => summary.failed += 1,
                    StepStatus::Skipped => summary.skipped += 1,
                }
                summary
            })
    }

    /// Turn an aborted outcome into the terminal error of the run
    pub fn into_result(self) -> Result<Outcome> {
        let failure = self.first_failure().map(|failed| {
            let descriptor = failed.step.descriptor();
            CloudError::StepFailed {
                kind: descriptor.kind(),
                name: descriptor.name().to_string(),
                error: failed.error.clone().unwrap_or(ErrorInfo {
                    kind: BackendErrorKind::Unknown,
                    message: "no error recorded".to_string(),
                }),
            }
        });
        match failure {
            Some(err) => Err(err),
            None => Ok(self),
        }
    }
}

/// Counts of step statuses
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutcomeSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl std::fmt::Display for OutcomeSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} succeeded, {} failed, {} skipped",
            self.succeeded, self.failed, self.skipped
        )
    }
}
