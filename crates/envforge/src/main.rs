mod commands;

use clap::{Args, Parser, Subcommand, ValueEnum};
use envforge_config::{ScheduleMode, Settings};
use envforge_core::{Profile, ProvisionParams};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "envforge")]
#[command(about = "Provision cloud development environments in dependency order", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Provision a profile
    Up {
        /// Profile name (aks, dev-env, dev-env-full)
        profile: Profile,
        #[command(flatten)]
        params: ParamArgs,
        #[command(flatten)]
        execution: ExecutionArgs,
        /// Use the in-memory backend instead of Azure
        #[arg(long)]
        simulate: bool,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    },
    /// Validate input and show the ordered steps
    Plan {
        /// Profile name (aks, dev-env, dev-env-full)
        profile: Profile,
        #[command(flatten)]
        params: ParamArgs,
        /// Do not ask the backend whether resources exist
        #[arg(long)]
        offline: bool,
        /// Use the in-memory backend instead of Azure
        #[arg(long)]
        simulate: bool,
    },
    /// Show the last saved run
    Status {
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    },
    /// List available profiles
    Profiles,
    /// Show version information
    Version,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Provisioning parameters; flags override values from `--params`
#[derive(Args, Debug, Default)]
struct ParamArgs {
    /// JSON parameter file
    #[arg(long = "params", value_name = "FILE")]
    params_file: Option<PathBuf>,
    #[arg(long)]
    cluster_name: Option<String>,
    #[arg(long)]
    region: Option<String>,
    #[arg(long)]
    node_size: Option<String>,
    #[arg(long, allow_negative_numbers = true)]
    node_count: Option<i64>,
    #[arg(long)]
    rg_name: Option<String>,
    #[arg(long)]
    rg_region: Option<String>,
    #[arg(long)]
    pg_server_name: Option<String>,
    #[arg(long)]
    pg_sku: Option<String>,
    #[arg(long)]
    pg_version: Option<String>,
    #[arg(long)]
    pg_admin_username: Option<String>,
    #[arg(long, env = "ENVFORGE_PG_ADMIN_PASSWORD", hide_env_values = true)]
    pg_admin_password: Option<String>,
    /// API Management publisher email (dev-env-full)
    #[arg(long)]
    publisher_email: Option<String>,
}

impl ParamArgs {
    fn resolve(self) -> anyhow::Result<ProvisionParams> {
        let base = match &self.params_file {
            Some(path) => ProvisionParams::from_file(path)?,
            None => ProvisionParams::default(),
        };
        Ok(base.merge(ProvisionParams {
            cluster_name: self.cluster_name,
            region: self.region,
            node_size: self.node_size,
            node_count: self.node_count,
            rg_name: self.rg_name,
            rg_region: self.rg_region,
            pg_server_name: self.pg_server_name,
            pg_sku: self.pg_sku,
            pg_version: self.pg_version,
            pg_admin_username: self.pg_admin_username,
            pg_admin_password: self.pg_admin_password,
            publisher_email: self.publisher_email,
        }))
    }
}

#[derive(Args, Debug, Default)]
struct ExecutionArgs {
    /// Run independent steps together
    #[arg(long)]
    concurrent: bool,
    /// Upper bound on steps running at once (implies --concurrent)
    #[arg(long, value_name = "N")]
    max_parallel: Option<usize>,
    /// Look resources up before creating them
    #[arg(long)]
    check_existing: bool,
}

impl ExecutionArgs {
    fn apply(&self, settings: &mut Settings) {
        if self.concurrent || self.max_parallel.is_some() {
            settings.execution.mode = ScheduleMode::Concurrent;
        }
        if let Some(n) = self.max_parallel {
            settings.execution.max_parallel = n;
        }
        if self.check_existing {
            settings.execution.check_existing = true;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // stdout carries outputs; logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Version => {
            println!("envforge {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::Profiles => {
            commands::profiles::handle();
            Ok(())
        }
        Commands::Status { output } => {
            let project_root = std::env::current_dir()?;
            commands::status::handle(&project_root, output).await
        }
        Commands::Plan {
            profile,
            params,
            offline,
            simulate,
        } => {
            let settings = Settings::load()?;
            let params = params.resolve()?;
            commands::plan::handle(profile, &params, &settings, offline, simulate).await
        }
        Commands::Up {
            profile,
            params,
            execution,
            simulate,
            output,
        } => {
            let mut settings = Settings::load()?;
            execution.apply(&mut settings);
            let params = params.resolve()?;
            let project_root = std::env::current_dir()?;
            commands::up::handle(profile, &params, &settings, &project_root, simulate, output)
                .await
        }
    }
}
