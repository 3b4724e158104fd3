use async_trait::async_trait;
use envforge_cloud::{
    BackendError, BackendRegistry, BackendResult, Handle, Orchestrator, ProvisioningBackend,
    ResourceDescriptor, ResourceId, ResourceKind,
};
use envforge_config::{Environment, Settings};
use envforge_core::ProvisionParams;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// Stub backend that records every call in order
#[derive(Default)]
pub struct RecordingBackend {
    fixed_handle: Option<String>,
    failing: Mutex<HashSet<ResourceKind>>,
    created: Mutex<HashMap<ResourceId, Handle>>,
    calls: Mutex<Vec<ResourceId>>,
}

impl RecordingBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Every create returns the same handle
    pub fn with_fixed_handle(handle: &str) -> Arc<Self> {
        Arc::new(Self {
            fixed_handle: Some(handle.to_string()),
            ..Default::default()
        })
    }

    pub fn fail(&self, kind: ResourceKind) {
        self.failing.lock().unwrap().insert(kind);
    }

    pub fn calls(&self) -> Vec<ResourceId> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    #[allow(dead_code)]
    pub fn position(&self, kind: ResourceKind) -> Option<usize> {
        self.calls().iter().position(|id| id.kind == kind)
    }
}

#[async_trait]
impl ProvisioningBackend for RecordingBackend {
    fn name(&self) -> &str {
        "recording"
    }

    async fn create_or_update(&self, descriptor: &ResourceDescriptor) -> BackendResult<Handle> {
        let id = descriptor.id();
        self.calls.lock().unwrap().push(id.clone());

        if self.failing.lock().unwrap().contains(&id.kind) {
            return Err(BackendError::QuotaExceeded(format!(
                "Operation could not be completed as it results in exceeding approved quota for {}",
                id
            )));
        }

        let handle = match &self.fixed_handle {
            Some(fixed) => Handle::new(fixed.clone()),
            None => Handle::new(format!("/stub/{}", id)),
        };
        Ok(self
            .created
            .lock()
            .unwrap()
            .entry(id)
            .or_insert(handle)
            .clone())
    }

    async fn get(&self, descriptor: &ResourceDescriptor) -> BackendResult<Option<Handle>> {
        Ok(self.created.lock().unwrap().get(&descriptor.id()).cloned())
    }
}

pub fn orchestrator(backend: &Arc<RecordingBackend>) -> Orchestrator {
    Orchestrator::new(BackendRegistry::uniform(backend.clone()))
}

pub fn settings() -> Settings {
    Settings {
        subscription_id: Some("11111111-2222-3333-4444-555555555555".to_string()),
        resource_group_name: Some("aks_rg".to_string()),
        environment: Environment::Production,
        ..Default::default()
    }
}

pub fn minimal_params() -> ProvisionParams {
    ProvisionParams {
        cluster_name: Some("demo".to_string()),
        region: Some("eastus".to_string()),
        node_size: Some("Standard_D2s_v3".to_string()),
        ..Default::default()
    }
}

#[allow(dead_code)]
pub fn dev_env_params() -> ProvisionParams {
    ProvisionParams {
        rg_name: Some("demo-rg".to_string()),
        rg_region: Some("westeurope".to_string()),
        pg_server_name: Some("demo-pg".to_string()),
        pg_sku: Some("Standard_B1ms".to_string()),
        pg_version: Some("16".to_string()),
        pg_admin_username: Some("pgadmin".to_string()),
        pg_admin_password: Some("P@ssw0rd-for-tests".to_string()),
        publisher_email: Some("platform@example.com".to_string()),
        ..minimal_params()
    }
}
