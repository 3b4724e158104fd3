use envforge_cloud::CloudError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Missing configuration: {key}\nHint: set {hint}")]
    MissingConfig { key: String, hint: String },

    #[error("Unknown profile '{0}' (available: aks, dev-env, dev-env-full)")]
    UnknownProfile(String),

    #[error("Failed to read parameters from {path}: {message}")]
    ParamsFile { path: String, message: String },

    #[error(transparent)]
    Cloud(#[from] CloudError),
}

impl ProvisionError {
    pub fn invalid(message: impl Into<String>) -> Self {
        ProvisionError::InvalidInput(message.into())
    }

    /// Input or configuration problem found before any backend call
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            ProvisionError::InvalidInput(_)
                | ProvisionError::MissingConfig { .. }
                | ProvisionError::UnknownProfile(_)
                | ProvisionError::ParamsFile { .. }
                | ProvisionError::Cloud(CloudError::InvalidInput(_))
        )
    }
}

pub type Result<T> = std::result::Result<T, ProvisionError>;
