//! Provisioning backend trait definition

use crate::descriptor::{ResourceDescriptor, ResourceKind};
use crate::error::BackendError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Opaque identifier of a provisioned resource (e.g. a cloud resource ID)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Handle(String);

impl Handle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Control-plane binding for one kind of resource
///
/// Calls may block for minutes while the provider creates the resource.
/// Implementations report failures using the [`BackendError`] taxonomy.
#[async_trait]
pub trait ProvisioningBackend: Send + Sync {
    /// Returns the backend name used in logs (e.g. "azure-aks")
    fn name(&self) -> &str;

    /// Create the resource, or update it in place when it already exists.
    ///
    /// Calling this again with an unchanged descriptor must succeed and
    /// return the same logical handle.
    async fn create_or_update(&self, descriptor: &ResourceDescriptor) -> BackendResult<Handle>;

    /// Look up the resource; `Ok(None)` when it does not exist
    async fn get(&self, descriptor: &ResourceDescriptor) -> BackendResult<Option<Handle>>;
}

/// Backends indexed by the resource kind they provision
#[derive(Clone, Default)]
pub struct BackendRegistry {
    backends: HashMap<ResourceKind, Arc<dyn ProvisioningBackend>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the same backend for every resource kind
    pub fn uniform(backend: Arc<dyn ProvisioningBackend>) -> Self {
        let mut registry = Self::new();
        for kind in ResourceKind::ALL {
            registry.register(kind, backend.clone());
        }
        registry
    }

    pub fn register(&mut self, kind: ResourceKind, backend: Arc<dyn ProvisioningBackend>) {
        self.backends.insert(kind, backend);
    }

    pub fn with(mut self, kind: ResourceKind, backend: Arc<dyn ProvisioningBackend>) -> Self {
        self.register(kind, backend);
        self
    }

    pub fn get(&self, kind: ResourceKind) -> Option<&Arc<dyn ProvisioningBackend>> {
        self.backends.get(&kind)
    }

    pub fn contains(&self, kind: ResourceKind) -> bool {
        self.backends.contains_key(&kind)
    }
}

impl std::fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut entries: Vec<_> = self
            .backends
            .iter()
            .map(|(kind, backend)| (kind.as_str(), backend.name().to_string()))
            .collect();
        entries.sort();
        f.debug_struct("BackendRegistry")
            .field("backends", &entries)
            .finish()
    }
}
