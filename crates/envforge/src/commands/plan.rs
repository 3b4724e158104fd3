use super::backends;
use colored::Colorize;
use envforge_cloud::{ActionType, Orchestrator, PlanSummary};
use envforge_config::Settings;
use envforge_core::{Profile, ProvisionParams, build_plan};

pub async fn handle(
    profile: Profile,
    params: &ProvisionParams,
    settings: &Settings,
    offline: bool,
    simulate: bool,
) -> anyhow::Result<()> {
    let plan = build_plan(profile, params, settings)?;

    println!("{}", format!("Plan for profile '{}'", profile).blue().bold());
    println!("  Subscription: {}", plan.config.subscription_id.dimmed());
    println!("  Resource group: {}", plan.config.resource_group.cyan());
    if plan.config.uses_fallback {
        println!(
            "  {}",
            "Using development fallbacks; not for production".yellow()
        );
    }
    println!();

    for (index, step) in plan.plan.steps().iter().enumerate() {
        let descriptor = step.descriptor();
        println!(
            "  {}. {} {} ({})",
            index + 1,
            descriptor.kind(),
            descriptor.name().cyan(),
            descriptor.location()
        );
        if !step.dependencies().is_empty() {
            let deps: Vec<String> = step.dependencies().iter().map(|d| d.to_string()).collect();
            println!("     {} {}", "after".dimmed(), deps.join(", ").dimmed());
        }
    }

    if offline {
        return Ok(());
    }

    let registry = backends(&plan.config, simulate, false).await?;
    let actions = plan.preview(&Orchestrator::new(registry)).await?;

    println!();
    for action in &actions {
        let marker = match action.action_type {
            ActionType::Create => "+".green(),
            ActionType::Update => "~".yellow(),
        };
        println!("  {} {} {}", marker, action.action_type, action.resource);
    }
    println!();
    println!("{} {}", "Plan:".bold(), PlanSummary::from_actions(&actions));

    Ok(())
}
