//! Azure backend error types

use envforge_cloud::BackendError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AzureError {
    #[error("az not found. Please install the Azure CLI: https://aka.ms/installazurecli")]
    AzNotFound,

    #[error("az authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("az command failed: {0}")]
    CommandFailed(String),

    #[error("Missing parameter '{key}' for {resource}")]
    MissingParameter { resource: String, key: String },

    #[error("Descriptor for {actual} passed to the {expected} binding")]
    KindMismatch { expected: String, actual: String },

    #[error("az returned no resource id: {0}")]
    MissingId(String),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AzureError>;

impl From<AzureError> for BackendError {
    fn from(error: AzureError) -> Self {
        match error {
            AzureError::AuthenticationFailed(message) => BackendError::Unauthorized(message),
            AzureError::CommandFailed(stderr) => classify(&stderr),
            other => BackendError::Unknown(other.to_string()),
        }
    }
}

const UNAUTHORIZED_MARKERS: &[&str] = &[
    "AuthorizationFailed",
    "AuthenticationFailed",
    "InvalidAuthenticationToken",
    "Please run 'az login'",
    "az login",
    "does not have authorization",
];

const QUOTA_MARKERS: &[&str] = &[
    "QuotaExceeded",
    "exceeding approved",
    "quota",
];

const CONFLICT_MARKERS: &[&str] = &[
    "Conflict",
    "AlreadyExists",
    "already exists",
    "InUse",
    "is already taken",
    "StorageAccountAlreadyTaken",
];

const TRANSIENT_MARKERS: &[&str] = &[
    "Throttl",
    "TooManyRequests",
    "timed out",
    "InternalServerError",
    "ServiceUnavailable",
    "GatewayTimeout",
    "RetryableError",
];

const NOT_FOUND_MARKERS: &[&str] = &[
    "ResourceNotFound",
    "ResourceGroupNotFound",
    "NotFound",
    "could not be found",
    "was not found",
];

/// Map az stderr onto the backend error taxonomy.
///
/// The raw message is kept; only the kind is inferred.
pub fn classify(stderr: &str) -> BackendError {
    let message = stderr.trim().to_string();
    let matches = |markers: &[&str]| markers.iter().any(|m| stderr.contains(m));

    if matches(UNAUTHORIZED_MARKERS) {
        BackendError::Unauthorized(message)
    } else if matches(QUOTA_MARKERS) {
        BackendError::QuotaExceeded(message)
    } else if matches(CONFLICT_MARKERS) {
        BackendError::Conflict(message)
    } else if matches(TRANSIENT_MARKERS) {
        BackendError::Transient(message)
    } else {
        BackendError::Unknown(message)
    }
}

/// Whether az stderr reports a missing resource
pub fn is_not_found(stderr: &str) -> bool {
    NOT_FOUND_MARKERS.iter().any(|m| stderr.contains(m))
}
