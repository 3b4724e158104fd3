pub mod plan;
pub mod profiles;
pub mod status;
pub mod up;

use colored::Colorize;
use envforge_cloud::{BackendRegistry, Outcome, SimulatedCloud, StepStatus};
use envforge_cloud_azure::{AzCli, azure_registry};
use envforge_core::ResolvedConfig;
use std::sync::Arc;

/// Backends for a run: the Azure control plane, or the in-memory simulation.
///
/// With `quiet` nothing is printed to stdout.
pub async fn backends(
    config: &ResolvedConfig,
    simulate: bool,
    quiet: bool,
) -> anyhow::Result<BackendRegistry> {
    if simulate {
        if !quiet {
            println!("{}", "Simulation mode: no cloud resources are touched".yellow());
        }
        let cloud = SimulatedCloud::with_scope(config.subscription_id.clone());
        return Ok(BackendRegistry::uniform(Arc::new(cloud)));
    }

    let az = AzCli::new(Some(config.subscription_id.clone()));
    let account = az.check_auth().await?;
    tracing::info!(subscription = %account.id, "Authenticated with Azure");
    if !quiet {
        println!(
            "  Subscription: {} ({})",
            account.name.cyan(),
            account.id.dimmed()
        );
        if let Some(user) = &account.user {
            println!("  Signed in as: {}", user.name);
        }
    }
    Ok(azure_registry(az))
}

pub fn print_outcome(outcome: &Outcome) {
    println!();
    for result in outcome.results() {
        let descriptor = result.step.descriptor();
        let marker = match result.status {
            StepStatus::Succeeded => "✓".green(),
            StepStatus::Failed => "✗".red(),
            StepStatus::Skipped => "-".dimmed(),
        };
        let label = format!("{} {}", descriptor.kind(), descriptor.name().cyan());
        match result.status {
            StepStatus::Succeeded => {
                let existing = if result.existing { " (existing)" } else { "" };
                println!(
                    "  {} {}{} [{:.1}s]",
                    marker,
                    label,
                    existing.dimmed(),
                    result.duration_ms as f64 / 1000.0
                );
            }
            StepStatus::Failed => {
                println!("  {} {}", marker, label);
                if let Some(error) = &result.error {
                    println!("      {}", error.to_string().red());
                }
            }
            StepStatus::Skipped => println!("  {} {} {}", marker, label, "(skipped)".dimmed()),
        }
    }

    let outputs = outcome.outputs();
    if !outputs.is_empty() {
        println!();
        println!("{}", "Outputs:".bold());
        for (name, value) in &outputs {
            println!("  {} = {}", name.cyan(), value);
        }
    }

    println!();
    println!(
        "{} {} ({})",
        "Status:".bold(),
        match outcome.is_completed() {
            true => outcome.status().to_string().green(),
            false => outcome.status().to_string().red(),
        },
        outcome.summary()
    );
}
