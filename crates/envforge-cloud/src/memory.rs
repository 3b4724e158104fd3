//! In-memory simulated cloud
//!
//! Answers every resource kind from a process-local table. Used for
//! `--simulate` runs and as a backend double in tests.

use crate::descriptor::{ResourceDescriptor, ResourceId, ResourceKind};
use crate::error::BackendError;
use crate::provider::{BackendResult, Handle, ProvisioningBackend};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A recorded `create_or_update` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendCall {
    pub resource: ResourceId,
    pub parent: Option<String>,
}

#[derive(Default)]
struct Inner {
    resources: HashMap<ResourceId, Handle>,
    failures: HashMap<ResourceKind, BackendError>,
    calls: Vec<BackendCall>,
    lookups: usize,
}

/// Idempotent in-memory backend
pub struct SimulatedCloud {
    scope: String,
    inner: Mutex<Inner>,
}

impl SimulatedCloud {
    pub fn new() -> Self {
        Self::with_scope("simulated")
    }

    /// Billing scope embedded in generated handles
    pub fn with_scope(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            inner: Mutex::new(Inner::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make every `create_or_update` for `kind` fail with `error`
    pub fn fail_on(&self, kind: ResourceKind, error: BackendError) {
        self.lock().failures.insert(kind, error);
    }

    pub fn clear_failures(&self) {
        self.lock().failures.clear();
    }

    /// Seed a resource as if it had been created out of band
    pub fn insert_existing(&self, id: ResourceId, handle: Handle) {
        self.lock().resources.insert(id, handle);
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.lock().calls.clone()
    }

    pub fn lookups(&self) -> usize {
        self.lock().lookups
    }

    pub fn resource_count(&self) -> usize {
        self.lock().resources.len()
    }

    fn handle_for(&self, descriptor: &ResourceDescriptor) -> Handle {
        match descriptor.parent() {
            Some(parent) => Handle::new(format!(
                "sim://{}/{}/{}/{}",
                self.scope,
                parent,
                descriptor.kind().as_str(),
                descriptor.name()
            )),
            None => Handle::new(format!(
                "sim://{}/{}/{}",
                self.scope,
                descriptor.kind().as_str(),
                descriptor.name()
            )),
        }
    }
}

impl Default for SimulatedCloud {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProvisioningBackend for SimulatedCloud {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn create_or_update(&self, descriptor: &ResourceDescriptor) -> BackendResult<Handle> {
        let handle = self.handle_for(descriptor);
        let mut inner = self.lock();
        inner.calls.push(BackendCall {
            resource: descriptor.id(),
            parent: descriptor.parent().map(str::to_string),
        });
        if let Some(error) = inner.failures.get(&descriptor.kind()) {
            return Err(error.clone());
        }
        let handle = inner
            .resources
            .entry(descriptor.id())
            .or_insert(handle)
            .clone();
        tracing::debug!("Simulated {} -> {}", descriptor.id(), handle);
        Ok(handle)
    }

    async fn get(&self, descriptor: &ResourceDescriptor) -> BackendResult<Option<Handle>> {
        let mut inner = self.lock();
        inner.lookups += 1;
        Ok(inner.resources.get(&descriptor.id()).cloned())
    }
}
