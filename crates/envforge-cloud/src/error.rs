//! Provisioning error types

use crate::descriptor::ResourceKind;
use crate::outcome::ErrorInfo;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error reported by a provisioning backend.
///
/// The variants are the backend's own taxonomy. The orchestrator never
/// re-classifies them; they are carried verbatim into [`ErrorInfo`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("transient failure: {0}")]
    Transient(String),

    #[error("{0}")]
    Unknown(String),
}

impl BackendError {
    pub fn kind(&self) -> BackendErrorKind {
        match self {
            BackendError::Unauthorized(_) => BackendErrorKind::Unauthorized,
            BackendError::QuotaExceeded(_) => BackendErrorKind::QuotaExceeded,
            BackendError::Conflict(_) => BackendErrorKind::Conflict,
            BackendError::Transient(_) => BackendErrorKind::Transient,
            BackendError::Unknown(_) => BackendErrorKind::Unknown,
        }
    }

    /// Raw backend message without the kind prefix
    pub fn message(&self) -> &str {
        match self {
            BackendError::Unauthorized(m)
            | BackendError::QuotaExceeded(m)
            | BackendError::Conflict(m)
            | BackendError::Transient(m)
            | BackendError::Unknown(m) => m,
        }
    }

    /// Whether a later re-run could succeed without operator action.
    ///
    /// Informational only: every backend call is attempted exactly once.
    pub fn is_transient(&self) -> bool {
        matches!(self, BackendError::Transient(_))
    }
}

/// Classification of a backend failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendErrorKind {
    Unauthorized,
    QuotaExceeded,
    Conflict,
    Transient,
    Unknown,
}

impl std::fmt::Display for BackendErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendErrorKind::Unauthorized => write!(f, "unauthorized"),
            BackendErrorKind::QuotaExceeded => write!(f, "quota exceeded"),
            BackendErrorKind::Conflict => write!(f, "conflict"),
            BackendErrorKind::Transient => write!(f, "transient failure"),
            BackendErrorKind::Unknown => write!(f, "unknown error"),
        }
    }
}

/// Orchestration errors
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Circular dependency between steps: {0}")]
    CircularDependency(String),

    #[error("No provisioning backend registered for {0}")]
    MissingBackend(ResourceKind),

    #[error("Deployment failed: {kind} '{name}': {error}")]
    StepFailed {
        kind: ResourceKind,
        name: String,
        error: ErrorInfo,
    },

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Report file error: {0}")]
    StateError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CloudError>;
