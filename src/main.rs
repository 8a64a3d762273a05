//! secmgr - command-line access to a Security Manager server
//!
//! # Configuration
//!
//! Set the following environment variables (or use a `.env` file):
//!
//! - `SECMGR_HOST`: Base URL of the server
//! - `SECMGR_USERNAME`, `SECMGR_PASSWORD`: Login credentials
//! - `SECMGR_WORKFLOW`: Workflow name, needed by `stage`
//!
//! # Usage
//!
//! ```bash
//! # Verify credentials
//! secmgr check
//!
//! # Show the current stage of a Policy Planner ticket
//! secmgr stage 42
//!
//! # Import supplemental routes, failing if any line fails
//! secmgr import-routes routes.csv --strict
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use secmgr::config::Config;
use secmgr::policy_optimizer::PolicyOptimizerClient;
use secmgr::policy_planner::PolicyPlannerClient;
use secmgr::security_manager::SecurityManagerClient;
use secmgr::session::Session;
use secmgr::stage::StageTracker;

#[derive(Parser)]
#[command(name = "secmgr")]
#[command(about = "Security Manager, Policy Planner and Policy Optimizer client")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and out to verify the configuration
    Check,

    /// Show the current stage ids of a ticket
    Stage {
        /// Ticket id
        ticket_id: String,

        /// Look the ticket up in Policy Optimizer instead of Policy Planner
        #[arg(long)]
        optimizer: bool,
    },

    /// Import supplemental routes from a comma-delimited file
    ImportRoutes {
        /// File with a header row and one route per line
        path: PathBuf,

        /// Exit with an error if any line failed
        #[arg(long)]
        strict: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let filter = if cli.debug {
        EnvFilter::new("secmgr=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("secmgr=info"))
    };
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::debug!(host = %config.host, domain_id = %config.domain_id, "Configuration loaded");

    match cli.command {
        Commands::Check => check(&config).await,
        Commands::Stage {
            ticket_id,
            optimizer,
        } => stage(&config, &ticket_id, optimizer).await,
        Commands::ImportRoutes { path, strict } => import_routes(&config, &path, strict).await,
    }
}

async fn check(config: &Config) -> Result<()> {
    let session = Session::login(config)
        .await
        .context("Failed to log in")?;
    println!("Logged in to {} as {}", config.host, config.username);
    session.logout().await.context("Failed to log out")?;
    Ok(())
}

async fn stage(config: &Config, ticket_id: &str, optimizer: bool) -> Result<()> {
    if optimizer {
        let mut client = PolicyOptimizerClient::from_config(config)
            .await
            .context("Failed to connect to Policy Optimizer")?;
        let ticket = client
            .pull_ticket(ticket_id)
            .await
            .with_context(|| format!("Failed to fetch ticket {}", ticket_id))?;
        print_stage(ticket_id, &ticket.status, client.desk().stage());
        client.logout().await.context("Failed to log out")?;
    } else {
        let mut client = PolicyPlannerClient::from_config(config)
            .await
            .context("Failed to connect to Policy Planner")?;
        let ticket = client
            .pull_ticket(ticket_id)
            .await
            .with_context(|| format!("Failed to fetch ticket {}", ticket_id))?;
        print_stage(ticket_id, &ticket.status, client.desk().stage());
        client.logout().await.context("Failed to log out")?;
    }
    Ok(())
}

fn print_stage(ticket_id: &str, status: &str, stage: &StageTracker) {
    match (stage.workflow_task_id(), stage.workflow_packet_task_id()) {
        (Some(task), Some(packet_task)) => println!(
            "ticket {}: stage {:?}, workflow task {}, packet task {}",
            ticket_id, status, task, packet_task
        ),
        _ => println!("ticket {}: stage {:?} has no open task", ticket_id, status),
    }
}

async fn import_routes(config: &Config, path: &Path, strict: bool) -> Result<()> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let client = SecurityManagerClient::from_config(config)
        .await
        .context("Failed to connect to Security Manager")?;
    let report = client.bulk_add_supplemental_routes(&contents).await;

    for outcome in report.outcomes() {
        match &outcome.result {
            Ok(status) => println!("{}: {}", outcome.key, status),
            Err(e) => println!("{}: {}", outcome.key, e),
        }
    }
    println!("Processed {} lines: {}", report.len(), report.summary());

    client.logout().await.context("Failed to log out")?;

    if strict {
        report.ensure_complete()?;
    }
    Ok(())
}
