//! thingsync: mirror collections of things from a remote catalog API.
//!
//! Walks each configured collection page by page and writes every thing's
//! description, shortcut, ancestry, preview images and attached files to a
//! deterministic folder layout. Re-running only fills in what is missing.

#![warn(clippy::all)]

mod api;
mod cli;
mod config;
mod retry;
mod shutdown;
mod sync;
mod types;

use std::time::{Duration, Instant};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use api::fetch::ReqwestTransport;
use api::{Fetcher, ThingsApi};
use cli::Command;

/// Run the status command.
fn run_status(args: cli::StatusArgs) -> anyhow::Result<()> {
    let directory = config::expand_tilde(&args.directory);

    if !directory.exists() {
        println!("No synced collections found at {}", directory.display());
        println!("Run a sync first.");
        return Ok(());
    }

    let statuses = sync::status::scan(&directory)?;
    println!("Output directory: {}", directory.display());
    println!();

    for status in &statuses {
        println!("{}:", status.name);
        println!("  Things:     {}", status.things);
        println!("  Complete:   {}", status.complete);
        println!("  Incomplete: {}", status.incomplete.len());
        if args.incomplete {
            for path in &status.incomplete {
                println!("    {}", path.display());
            }
        }
    }

    Ok(())
}

/// Run the sync command over every selected collection.
async fn run_sync(args: cli::SyncArgs) -> anyhow::Result<()> {
    let config = config::Config::from_cli(args)?;
    tracing::debug!(?config, "Loaded configuration");
    tracing::info!(collections = config.collections.len(), "Starting thingsync");

    let transport = ReqwestTransport::with_timeout(Duration::from_secs(config.timeout_secs))?;
    let api = ThingsApi::new(
        config.base_url.as_str(),
        config.token.as_str(),
        Fetcher::new(Box::new(transport), config.retry),
    );
    let sync_config = sync::SyncConfig {
        directory: config.directory.clone(),
        completion: config.completion,
        dry_run: config.dry_run,
        no_progress_bar: config.no_progress_bar,
    };

    let shutdown_token = shutdown::install_signal_handler()?;
    let started = Instant::now();
    let mut failed: Vec<&str> = Vec::new();

    for collection in &config.collections {
        if shutdown_token.is_cancelled() {
            tracing::info!("Shutdown requested, exiting...");
            break;
        }

        tracing::info!("── Collection '{}' ({}) ──", collection.name, collection.id);
        match sync::sync_collection(&api, collection, &sync_config, &shutdown_token).await {
            Ok(summary) => {
                tracing::info!(
                    "  {} things: {} synced, {} already complete, {} partial ({} failed steps), {} unavailable, {} failed",
                    summary.seen,
                    summary.synced,
                    summary.already_complete,
                    summary.partial,
                    summary.failed_steps,
                    summary.unavailable,
                    summary.failed
                );
                if config.dry_run {
                    tracing::info!("  [DRY RUN] {} things would be synced", summary.dry_run);
                }
                if summary.interrupted {
                    tracing::info!("  Interrupted after {} pages", summary.pages_fetched);
                }
            }
            Err(e) => {
                tracing::error!("Collection '{}' failed: {}", collection.name, e);
                failed.push(collection.name.as_str());
            }
        }
    }

    tracing::info!("── Summary ──");
    tracing::info!("  destination: {}", config.directory.display());
    tracing::info!("  elapsed: {}", format_duration(started.elapsed()));

    if !failed.is_empty() {
        anyhow::bail!(
            "{} of {} collections failed: {}",
            failed.len(),
            config.collections.len(),
            failed.join(", ")
        );
    }

    Ok(())
}

fn format_duration(d: Duration) -> String {
    let total_secs = d.as_secs();
    let hours = total_secs / 3600;
    let mins = (total_secs % 3600) / 60;
    let secs = total_secs % 60;

    if hours > 0 {
        format!("{}h {:02}m {:02}s", hours, mins, secs)
    } else if mins > 0 {
        format!("{}m {:02}s", mins, secs)
    } else {
        format!("{}s", secs)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cli.log_level.as_filter())),
        )
        .init();

    match cli.effective_command() {
        Command::Status(args) => run_status(args),
        Command::Sync(args) => run_sync(args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration_seconds_only() {
        assert_eq!(format_duration(Duration::from_secs(42)), "42s");
    }

    #[test]
    fn test_format_duration_minutes_and_seconds() {
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 05s");
    }

    #[test]
    fn test_format_duration_hours() {
        assert_eq!(format_duration(Duration::from_secs(3661)), "1h 01m 01s");
    }
}
