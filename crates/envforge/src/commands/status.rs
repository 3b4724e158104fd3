use super::print_outcome;
use crate::OutputFormat;
use colored::Colorize;
use envforge_cloud::ReportStore;
use std::path::Path;

pub async fn handle(project_root: &Path, output: OutputFormat) -> anyhow::Result<()> {
    let store = ReportStore::new(project_root);
    let Some(report) = store.load().await? else {
        println!("{}", "No run recorded yet. Run `envforge up <profile>` first.".yellow());
        return Ok(());
    };

    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => {
            let outcome = &report.outcome;
            println!(
                "{} {}",
                "Last run:".bold(),
                outcome.profile().cyan()
            );
            println!(
                "  Started:  {}",
                outcome.started_at().format("%Y-%m-%d %H:%M:%S UTC")
            );
            println!(
                "  Finished: {}",
                outcome.finished_at().format("%Y-%m-%d %H:%M:%S UTC")
            );
            print_outcome(outcome);
            if let Some(diagnostic) = outcome.diagnostic() {
                println!("{} {}", "Failure:".red().bold(), diagnostic);
            }
        }
    }
    Ok(())
}
