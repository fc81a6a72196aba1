//! crowdsale-deploy CLI - inspect and update a persisted deployment session.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use deploy_core::{DeploymentOptions, StepState};
use deploy_progress::DeploymentProgressTracker;
use deploy_storage::{JsonSnapshotStore, SnapshotStore};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "crowdsale-deploy")]
#[command(about = "Crowdsale deployment progress tracker", long_about = None)]
struct Cli {
    /// Session directory
    #[arg(long, global = true, default_value = ".crowdsale-deploy")]
    dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a new deployment session
    Init {
        /// JSON file with deployment options
        #[arg(long)]
        config: Option<PathBuf>,
        /// Reserved tokens are not configured
        #[arg(long)]
        no_reserved_tokens: bool,
        /// Whitelisting is disabled
        #[arg(long)]
        no_whitelist: bool,
    },
    /// Show every step and the overall state
    Status,
    /// Print the next pending step
    Next,
    /// Mark a step as successful
    Succeed {
        /// Step name
        step: String,
    },
    /// Record a failed step
    Fail {
        /// Step name
        step: String,
        /// Failure description
        #[arg(long)]
        reason: String,
    },
    /// Mark a step as not successful
    ResetStep {
        /// Step name
        step: String,
    },
    /// Mark a step as required
    Require {
        /// Step name
        step: String,
    },
    /// Mark a step as not required
    Skip {
        /// Step name
        step: String,
    },
    /// Remove the persisted session
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut store = JsonSnapshotStore::new(&cli.dir);

    match cli.command {
        Commands::Init { config, no_reserved_tokens, no_whitelist } => {
            let mut options = load_options(config.as_deref())?;
            if no_reserved_tokens {
                options.reserved_tokens = false;
            }
            if no_whitelist {
                options.whitelist = false;
            }

            let tracker = DeploymentProgressTracker::with_options(&options);
            store.save(&tracker.snapshot()).await?;
            info!("Started session {} in {}", tracker.session_id(), cli.dir.display());
            println!("Session: {}", tracker.session_id());
            println!("  Required steps: {}", tracker.required_count());
            println!("  Next: {}", tracker.next_pending_name());
        }
        Commands::Status => {
            let tracker = store.load_tracker().await?;
            print_status(&tracker);
        }
        Commands::Next => {
            let tracker = store.load_tracker().await?;
            match tracker.next_pending_transaction() {
                Some(step) => println!("{}", step),
                None => println!("(none)"),
            }
        }
        Commands::Succeed { step } => {
            update(&mut store, |t| t.set_successful_by_name(&step)).await?;
        }
        Commands::Fail { step, reason } => {
            update(&mut store, |t| {
                t.set_not_successful_by_name(&step)?;
                t.set_failure_reason(reason.as_str());
                Ok(())
            })
            .await?;
        }
        Commands::ResetStep { step } => {
            update(&mut store, |t| t.set_not_successful_by_name(&step)).await?;
        }
        Commands::Require { step } => {
            update(&mut store, |t| t.set_required_by_name(&step)).await?;
        }
        Commands::Skip { step } => {
            update(&mut store, |t| t.set_not_required_by_name(&step)).await?;
        }
        Commands::Clear => {
            store.clear().await?;
            println!("Session cleared");
        }
    }

    Ok(())
}

/// Load the session, apply `change`, save it back, and report what is next.
async fn update<F>(store: &mut JsonSnapshotStore, change: F) -> Result<()>
where
    F: FnOnce(&mut DeploymentProgressTracker) -> deploy_core::Result<()>,
{
    let mut tracker = store.load_tracker().await?;
    change(&mut tracker)?;
    store.save(&tracker.snapshot()).await?;

    if tracker.deployment_has_finished() {
        println!("Deployment finished");
    } else {
        println!("Next: {}", tracker.next_pending_name());
    }
    Ok(())
}

fn load_options(path: Option<&Path>) -> Result<DeploymentOptions> {
    let Some(path) = path else {
        return Ok(DeploymentOptions::default());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    DeploymentOptions::from_json(&json).with_context(|| format!("parsing {}", path.display()))
}

fn print_status(tracker: &DeploymentProgressTracker) {
    println!("Session {}", tracker.session_id());
    for (i, (step, state)) in tracker.steps().enumerate() {
        let marker = if step.is_conditional() { "*" } else { " " };
        println!("  {:>2}{} {:<26} {}", i + 1, marker, step.as_str(), format_state(state));
    }
    println!(
        "Progress: {}/{}",
        tracker.successful_required_count(),
        tracker.required_count()
    );
    if let Some(reason) = tracker.failure_reason() {
        println!("Last failure: {}", reason);
    }
    println!("Finished: {}", tracker.deployment_has_finished());
    if let Some(next) = tracker.next_pending_transaction() {
        println!("Next: {}", next);
    }
}

fn format_state(state: StepState) -> &'static str {
    match (state.required, state.successful) {
        (true, true) => "DONE",
        (true, false) => "PENDING",
        (false, true) => "STALE",
        (false, false) => "SKIPPED",
    }
}
