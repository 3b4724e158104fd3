mod common;

use common::{RecordingBackend, dev_env_params, minimal_params, orchestrator, settings};
use envforge_cloud::{
    BackendErrorKind, CloudError, ExecutionMode, ResourceKind, RunOptions, RunStatus, StepStatus,
};
use envforge_core::{Profile, ProvisionError, ProvisionParams, build_plan, provision};

#[tokio::test]
async fn test_minimal_profile_end_to_end() {
    let backend = RecordingBackend::with_fixed_handle(
        "/subscriptions/s/resourceGroups/aks_rg/providers/Microsoft.ContainerService/managedClusters/demo",
    );

    let outcome = provision(
        &orchestrator(&backend),
        Profile::Aks,
        &minimal_params(),
        &settings(),
    )
    .await
    .unwrap();

    assert_eq!(outcome.status(), RunStatus::Completed);
    assert_eq!(outcome.results().len(), 1);

    let result = &outcome.results()[0];
    assert_eq!(result.step.descriptor().kind(), ResourceKind::ComputeCluster);
    assert_eq!(result.status, StepStatus::Succeeded);
    assert_eq!(
        result.handle.as_ref().unwrap().as_str(),
        "/subscriptions/s/resourceGroups/aks_rg/providers/Microsoft.ContainerService/managedClusters/demo"
    );
    assert_eq!(
        outcome.outputs().get("clusterId").map(String::as_str),
        Some(result.handle.as_ref().unwrap().as_str())
    );
}

#[tokio::test]
async fn test_blank_cluster_name_makes_no_backend_call() {
    let backend = RecordingBackend::new();
    let params = ProvisionParams {
        cluster_name: Some("".to_string()),
        ..minimal_params()
    };

    let err = provision(&orchestrator(&backend), Profile::Aks, &params, &settings())
        .await
        .unwrap_err();

    assert!(matches!(err, ProvisionError::InvalidInput(_)));
    assert!(err.is_input_error());
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn test_zero_node_count_from_settings_makes_no_backend_call() {
    let backend = RecordingBackend::new();
    let mut settings = settings();
    settings.defaults.aks_node_count = 0;

    let err = provision(&orchestrator(&backend), Profile::Aks, &minimal_params(), &settings)
        .await
        .unwrap_err();

    assert!(matches!(err, ProvisionError::InvalidInput(ref m) if m.contains("aksNodeCount")));
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn test_missing_subscription_makes_no_backend_call() {
    let backend = RecordingBackend::new();
    let settings = envforge_config::Settings {
        subscription_id: None,
        ..settings()
    };

    let err = provision(&orchestrator(&backend), Profile::Aks, &minimal_params(), &settings)
        .await
        .unwrap_err();

    assert!(matches!(err, ProvisionError::MissingConfig { .. }));
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn test_database_never_runs_before_group() {
    let backend = RecordingBackend::new();

    let outcome = provision(
        &orchestrator(&backend),
        Profile::DevEnv,
        &dev_env_params(),
        &settings(),
    )
    .await
    .unwrap();

    assert!(outcome.is_completed());
    let group = backend.position(ResourceKind::ResourceGroup).unwrap();
    let cluster = backend.position(ResourceKind::ComputeCluster).unwrap();
    let database = backend.position(ResourceKind::DatabaseServer).unwrap();
    assert_eq!(group, 0);
    assert!(group < database);
    assert!(cluster < database);
}

#[tokio::test]
async fn test_cluster_failure_skips_database() {
    let backend = RecordingBackend::new();
    backend.fail(ResourceKind::ComputeCluster);

    let outcome = provision(
        &orchestrator(&backend),
        Profile::DevEnv,
        &dev_env_params(),
        &settings(),
    )
    .await
    .unwrap();

    assert_eq!(outcome.status(), RunStatus::Aborted);

    let statuses: Vec<_> = outcome
        .results()
        .iter()
        .map(|r| (r.step.descriptor().kind(), r.status))
        .collect();
    assert_eq!(
        statuses,
        vec![
            (ResourceKind::ResourceGroup, StepStatus::Succeeded),
            (ResourceKind::StorageAccount, StepStatus::Succeeded),
            (ResourceKind::ComputeCluster, StepStatus::Failed),
            (ResourceKind::DatabaseServer, StepStatus::Skipped),
        ]
    );
    assert!(backend.position(ResourceKind::DatabaseServer).is_none());

    // earlier handles stay queryable
    assert!(outcome.handle_for(ResourceKind::ResourceGroup).is_some());
    assert!(outcome.handle_for(ResourceKind::ComputeCluster).is_none());

    let failure = outcome.first_failure().unwrap();
    assert_eq!(
        failure.error.as_ref().unwrap().kind,
        BackendErrorKind::QuotaExceeded
    );

    let diagnostic = outcome.diagnostic().unwrap();
    assert!(diagnostic.starts_with("compute cluster 'demo' failed: quota exceeded"));

    let err = outcome.into_result().unwrap_err();
    assert!(matches!(
        err,
        CloudError::StepFailed { kind: ResourceKind::ComputeCluster, ref name, .. } if name == "demo"
    ));
}

#[tokio::test]
async fn test_cluster_failure_skips_database_concurrently() {
    let backend = RecordingBackend::new();
    backend.fail(ResourceKind::ComputeCluster);

    let orchestrator = orchestrator(&backend).with_options(RunOptions {
        mode: ExecutionMode::Concurrent { max_parallel: 4 },
        check_existing: false,
    });

    let outcome = provision(&orchestrator, Profile::DevEnvFull, &dev_env_params(), &settings())
        .await
        .unwrap();

    assert_eq!(outcome.status(), RunStatus::Aborted);
    for kind in [ResourceKind::DatabaseServer, ResourceKind::Gateway] {
        let result = outcome
            .results()
            .iter()
            .find(|r| r.step.descriptor().kind() == kind)
            .unwrap();
        assert_eq!(result.status, StepStatus::Skipped);
        assert!(backend.position(kind).is_none());
    }
}

#[tokio::test]
async fn test_rerun_is_idempotent() {
    let backend = RecordingBackend::new();
    let orchestrator = orchestrator(&backend);

    let first = provision(&orchestrator, Profile::DevEnv, &dev_env_params(), &settings())
        .await
        .unwrap();
    let second = provision(&orchestrator, Profile::DevEnv, &dev_env_params(), &settings())
        .await
        .unwrap();

    assert!(first.is_completed());
    assert!(second.is_completed());
    assert_eq!(first.outputs(), second.outputs());
    assert_eq!(backend.call_count(), 8);
}

#[tokio::test]
async fn test_check_existing_reports_previous_run() {
    let backend = RecordingBackend::new();
    let orchestrator = orchestrator(&backend).with_options(RunOptions {
        mode: ExecutionMode::Sequential,
        check_existing: true,
    });
    let plan = build_plan(Profile::Aks, &minimal_params(), &settings()).unwrap();

    let first = plan.run(&orchestrator).await.unwrap();
    assert!(!first.results()[0].existing);

    let second = plan.run(&orchestrator).await.unwrap();
    assert!(second.results()[0].existing);
    assert_eq!(first.outputs(), second.outputs());
}

#[tokio::test]
async fn test_preview_does_not_create() {
    let backend = RecordingBackend::new();
    let orchestrator = orchestrator(&backend);
    let plan = build_plan(Profile::DevEnv, &dev_env_params(), &settings()).unwrap();

    let actions = plan.preview(&orchestrator).await.unwrap();
    assert_eq!(actions.len(), 4);
    assert_eq!(backend.call_count(), 0);
}
