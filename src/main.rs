//! Bestseller-Scout main entry point
//!
//! This is the command-line interface for the best-seller catalog explorer.

use anyhow::{bail, Context};
use bestseller_scout::api;
use bestseller_scout::catalog::IdSpace;
use bestseller_scout::config::{load_config_with_hash, Config};
use bestseller_scout::crawler::{Collaborators, RunSummary};
use bestseller_scout::job::{JobController, Supervisor};
use bestseller_scout::output::{export_snapshot, load_statistics, print_statistics, print_status};
use bestseller_scout::storage::open_store;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Bestseller-Scout: a resumable best-seller catalog explorer
///
/// Bestseller-Scout walks the best-seller category ID space of a marketplace,
/// records every category it finds with its top products, and resumes from
/// the last persisted position after an interruption.
#[derive(Parser, Debug)]
#[command(name = "bestseller-scout")]
#[command(version = "1.0.0")]
#[command(about = "A resumable best-seller catalog explorer", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Restart exploration so that the first explored ID is this one
    #[arg(long, value_name = "ID")]
    resume_from: Option<i64>,

    /// Validate config and show the ID space and cadences without exploring
    #[arg(long, conflicts_with_all = ["status", "show", "export", "release", "resume_from"])]
    dry_run: bool,

    /// Show the exploration status and exit
    #[arg(long, conflicts_with_all = ["show", "export", "release", "resume_from"])]
    status: bool,

    /// Show catalog statistics, starting an exploration if nothing is stored yet
    #[arg(long, conflicts_with_all = ["export", "release", "resume_from"])]
    show: bool,

    /// Write the stored snapshot to this file and exit
    #[arg(long, value_name = "PATH", conflicts_with_all = ["release", "resume_from"])]
    export: Option<PathBuf>,

    /// Clear an in-progress flag left behind by a run that died
    #[arg(long, conflicts_with = "resume_from")]
    release: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    let store = open_store(&config.storage).context("Failed to open snapshot store")?;
    let collaborators = Collaborators::http(&config).context("Failed to build page fetcher")?;
    let controller = JobController::new(
        store,
        collaborators,
        config.explorer.clone(),
        Arc::new(Supervisor::new()),
    );

    if cli.status {
        let status = api::handle_status(&controller).await?;
        print_status(&status);
    } else if cli.show {
        handle_show(&controller).await?;
    } else if let Some(path) = cli.export {
        handle_export(&controller, &path).await?;
    } else if cli.release {
        if controller.release().await? {
            println!("✓ Cleared stale in-progress flag");
        } else {
            println!("Nothing to release");
        }
    } else {
        handle_explore(&controller, cli.resume_from).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("bestseller_scout=info,warn"),
            1 => EnvFilter::new("bestseller_scout=debug,info"),
            2 => EnvFilter::new("bestseller_scout=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be explored
fn handle_dry_run(config: &Config) {
    let space = IdSpace::from_config(&config.explorer);
    let explorer = &config.explorer;

    println!("=== Bestseller-Scout Dry Run ===\n");

    println!("ID Space:");
    println!(
        "  {} through {} ({} IDs)",
        space.category_id(1),
        space.category_id(space.upper_bound()),
        space.upper_bound()
    );
    println!("  Listing URL: {}{}", config.fetcher.listing_url, space.category_id(1));

    println!("\nCadences:");
    println!("  Progress write every {} IDs", explorer.progress_every);
    println!(
        "  Flush every {} categories or {} IDs",
        explorer.flush_every_categories, explorer.flush_every_ids
    );
    println!(
        "  Back off {}ms after {} consecutive misses",
        explorer.backoff_cooldown_ms, explorer.backoff_threshold
    );
    println!("  Detail pages per category: {}", explorer.detail_limit);
    println!("  Delay after a failed fetch: {}ms", explorer.error_delay_ms);

    println!("\nFetcher:");
    println!("  Listing timeout: {}s", config.fetcher.timeout_secs);
    println!("  Detail timeout: {}s", config.fetcher.detail_timeout_secs);
    println!("  User agent: {}", config.user_agent.header_value());

    println!("\nStorage:");
    println!("  Backend: {:?}", config.storage.backend);
    println!("  Path: {}", config.storage.path);

    println!("\n✓ Configuration is valid");
}

/// Handles the --show mode: prints statistics of the stored catalog
async fn handle_show(controller: &JobController) -> anyhow::Result<()> {
    let snapshot = api::handle_read(controller).await?;
    print_statistics(&load_statistics(&snapshot, 10));

    if controller.supervisor().is_running() {
        println!("No catalog stored yet, exploration started");
        report_run(controller).await?;
    }
    Ok(())
}

/// Handles the --export mode: writes the stored snapshot to a file
async fn handle_export(controller: &JobController, path: &Path) -> anyhow::Result<()> {
    let Some(snapshot) = controller.snapshot().await? else {
        bail!("No snapshot stored in {}", controller.store().describe());
    };

    export_snapshot(&snapshot, path)?;
    println!(
        "✓ Exported {} categories / {} products to: {}",
        snapshot.total_categories,
        snapshot.total_products,
        path.display()
    );
    Ok(())
}

/// Handles the main exploration: force or resume, then wait for the run
async fn handle_explore(controller: &JobController, resume_from: Option<i64>) -> anyhow::Result<()> {
    let launched = match resume_from {
        Some(from_id) => controller.resume(from_id).await?,
        None => controller.force_start().await?,
    };

    if !launched {
        println!("An exploration is already in progress (use --status to follow it)");
        return Ok(());
    }

    report_run(controller).await
}

async fn report_run(controller: &JobController) -> anyhow::Result<()> {
    let Some(outcome) = controller.supervisor().wait().await else {
        return Ok(());
    };

    let summary: RunSummary = outcome.context("Exploration failed")?;
    println!(
        "✓ Explored {} IDs from {}: {} categories found, {} not found, {} failed, {} skipped",
        summary.explored,
        controller.id_space().category_id(summary.first_id),
        summary.found,
        summary.not_found,
        summary.failed,
        summary.skipped
    );
    Ok(())
}
