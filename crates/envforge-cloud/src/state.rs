//! Run report persistence
//!
//! Keeps the last [`Outcome`] in `.envforge/last-run.json` so a later
//! invocation can show which resources exist and resume after an abort.

use crate::error::{CloudError, Result};
use crate::outcome::Outcome;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

const REPORT_VERSION: u32 = 1;
const STATE_DIR: &str = ".envforge";
const REPORT_FILE: &str = "last-run.json";
const REPORT_BACKUP: &str = "last-run.json.backup";

/// Persisted form of an outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Report file version
    pub version: u32,

    /// When the report was written
    pub saved_at: DateTime<Utc>,

    pub outcome: Outcome,
}

impl RunReport {
    pub fn new(outcome: Outcome) -> Self {
        Self {
            version: REPORT_VERSION,
            saved_at: Utc::now(),
            outcome,
        }
    }
}

/// Reads and writes run reports under a project directory
pub struct ReportStore {
    project_root: PathBuf,
}

impl ReportStore {
    pub fn new(project_root: impl AsRef<Path>) -> Self {
        Self {
            project_root: project_root.as_ref().to_path_buf(),
        }
    }

    fn state_dir(&self) -> PathBuf {
        self.project_root.join(STATE_DIR)
    }

    pub fn report_path(&self) -> PathBuf {
        self.state_dir().join(REPORT_FILE)
    }

    fn backup_path(&self) -> PathBuf {
        self.state_dir().join(REPORT_BACKUP)
    }

    async fn ensure_state_dir(&self) -> Result<()> {
        let dir = self.state_dir();
        if !dir.exists() {
            fs::create_dir_all(&dir).await?;
            tracing::debug!("Created state directory: {}", dir.display());
        }
        Ok(())
    }

    /// Load the last report, if one was written
    pub async fn load(&self) -> Result<Option<RunReport>> {
        let path = self.report_path();
        if !path.exists() {
            tracing::debug!("No run report at {}", path.display());
            return Ok(None);
        }

        let content = fs::read_to_string(&path).await?;
        let report: RunReport = serde_json::from_str(&content)?;

        if report.version > REPORT_VERSION {
            return Err(CloudError::StateError(format!(
                "Report version {} is newer than supported version {}",
                report.version, REPORT_VERSION
            )));
        }

        Ok(Some(report))
    }

    /// Save an outcome, keeping the previous report as a backup
    pub async fn save(&self, outcome: &Outcome) -> Result<RunReport> {
        self.ensure_state_dir().await?;

        let path = self.report_path();
        let backup = self.backup_path();

        if path.exists() {
            if backup.exists() {
                fs::remove_file(&backup).await?;
            }
            fs::rename(&path, &backup).await?;
        }

        let report = RunReport::new(outcome.clone());
        let content = serde_json::to_string_pretty(&report)?;
        fs::write(&path, content).await?;

        tracing::debug!(
            "Saved run report with {} steps to {}",
            outcome.results().len(),
            path.display()
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{ResourceDescriptor, ResourceKind, Secret};
    use crate::outcome::StepResult;
    use crate::plan::Step;
    use crate::provider::Handle;
    use tempfile::tempdir;

    fn outcome(handle: &str) -> Outcome {
        let step = Step::new(
            ResourceDescriptor::new(ResourceKind::DatabaseServer, "pg", "eastus")
                .with_parent("rg")
                .with_secret("administratorLoginPassword", Secret::new("s3cret!")),
        );
        Outcome::from_results(
            "dev-env",
            vec![StepResult::succeeded(step, Handle::new(handle), false, 1)],
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_report_save_load() {
        let temp_dir = tempdir().unwrap();
        let store = ReportStore::new(temp_dir.path());

        store.save(&outcome("/pg/1")).await.unwrap();

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded.version, REPORT_VERSION);
        assert_eq!(
            loaded
                .outcome
                .handle_for(ResourceKind::DatabaseServer)
                .map(Handle::as_str),
            Some("/pg/1")
        );
    }

    #[tokio::test]
    async fn test_no_report() {
        let temp_dir = tempdir().unwrap();
        let store = ReportStore::new(temp_dir.path());

        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_previous_report_is_backed_up() {
        let temp_dir = tempdir().unwrap();
        let store = ReportStore::new(temp_dir.path());

        store.save(&outcome("/pg/1")).await.unwrap();
        store.save(&outcome("/pg/2")).await.unwrap();

        let backup = std::fs::read_to_string(store.backup_path()).unwrap();
        assert!(backup.contains("/pg/1"));
        let current = std::fs::read_to_string(store.report_path()).unwrap();
        assert!(current.contains("/pg/2"));
    }

    #[tokio::test]
    async fn test_secrets_not_written() {
        let temp_dir = tempdir().unwrap();
        let store = ReportStore::new(temp_dir.path());

        store.save(&outcome("/pg/1")).await.unwrap();

        let content = std::fs::read_to_string(store.report_path()).unwrap();
        assert!(!content.contains("s3cret!"));
    }

    #[tokio::test]
    async fn test_newer_version_rejected() {
        let temp_dir = tempdir().unwrap();
        let store = ReportStore::new(temp_dir.path());
        store.save(&outcome("/pg/1")).await.unwrap();

        let content = std::fs::read_to_string(store.report_path()).unwrap();
        let bumped = content.replacen("\"version\": 1", "\"version\": 99", 1);
        std::fs::write(store.report_path(), bumped).unwrap();

        assert!(matches!(
            store.load().await,
            Err(CloudError::StateError(_))
        ));
    }
}
