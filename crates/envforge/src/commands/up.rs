use super::{backends, print_outcome};
use crate::OutputFormat;
use colored::Colorize;
use envforge_cloud::{Orchestrator, ReportStore};
use envforge_config::Settings;
use envforge_core::{Profile, ProvisionParams, build_plan, run_options};
use std::path::Path;

pub async fn handle(
    profile: Profile,
    params: &ProvisionParams,
    settings: &Settings,
    project_root: &Path,
    simulate: bool,
    output: OutputFormat,
) -> anyhow::Result<()> {
    // Input problems stop here, before any backend is contacted
    let plan = build_plan(profile, params, settings)?;

    if output == OutputFormat::Text {
        println!("{}", format!("Provisioning profile '{}'", profile).blue().bold());
        println!("  Resource group: {}", plan.config.resource_group.cyan());
        if plan.config.uses_fallback {
            println!(
                "  {}",
                "Using development fallbacks; not for production".yellow()
            );
        }
        println!("  Steps: {}", plan.plan.len());
    }

    let registry = backends(&plan.config, simulate, output == OutputFormat::Json).await?;
    let orchestrator = Orchestrator::new(registry).with_options(run_options(&settings.execution));
    let outcome = plan.run(&orchestrator).await?;

    let store = ReportStore::new(project_root);
    match store.save(&outcome).await {
        Ok(_) => tracing::debug!("Run report saved to {}", store.report_path().display()),
        Err(e) => tracing::warn!("Failed to save run report: {}", e),
    }

    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcome)?),
        OutputFormat::Text => print_outcome(&outcome),
    }

    match outcome.diagnostic() {
        Some(diagnostic) => anyhow::bail!("Deployment failed: {}", diagnostic),
        None => Ok(()),
    }
}
