//! Canopy main entry point
//!
//! This is the command-line interface for the Canopy category-tree harvester.

use anyhow::{bail, Context};
use canopy::config::{load_config_with_hash, Config};
use canopy::crawler::{Harvester, HtmlExtractor, HttpFetcher};
use canopy::output::{
    print_state_status, print_tree_statistics, write_markdown_outline, write_tree_json,
    TreeStatistics,
};
use canopy::state::StateStore;
use canopy::url::canonical;
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Canopy: a resumable category-tree harvester
///
/// Canopy walks a site's category hierarchy depth-first from a target page,
/// checkpointing after every node, and attaches consolidated text to the
/// leaves. Re-running the same command resumes an interrupted session.
#[derive(Parser, Debug)]
#[command(name = "canopy")]
#[command(version = "1.0.0")]
#[command(about = "A resumable category-tree harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// URL of the category or page to harvest
    #[arg(value_name = "TARGET")]
    target: String,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Discard the checkpoint (keeping a backup) and start over
    #[arg(long, conflicts_with_all = ["status", "dry_run"])]
    fresh: bool,

    /// Show the checkpoint for TARGET and exit
    #[arg(long, conflicts_with_all = ["dry_run", "retry_failed", "retry"])]
    status: bool,

    /// Resolve and print the root-to-target trail without harvesting
    #[arg(long, conflicts_with_all = ["retry_failed", "retry"])]
    dry_run: bool,

    /// Clear every recorded failure before resuming
    #[arg(long, conflicts_with = "retry")]
    retry_failed: bool,

    /// Clear the recorded failure of one URL before resuming
    #[arg(long, value_name = "URL")]
    retry: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    let target = canonical(&cli.target);
    let store = StateStore::new(&config.output.state_dir);

    if cli.status {
        return handle_status(&store, &target);
    }
    if cli.dry_run {
        return handle_dry_run(&config, &target).await;
    }

    if cli.fresh {
        match store.reset(&target)? {
            Some(backup) => tracing::info!("Previous checkpoint moved to {}", backup.display()),
            None => tracing::info!("No previous checkpoint for {}", target),
        }
    }

    if cli.retry_failed || !cli.retry.is_empty() {
        handle_retry(&store, &target, cli.retry_failed, &cli.retry)?;
    }

    handle_harvest(&config, &target).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("canopy=info,warn"),
            1 => EnvFilter::new("canopy=debug,info"),
            2 => EnvFilter::new("canopy=trace,debug"),
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

fn build_harvester(config: &Config) -> anyhow::Result<Harvester<HttpFetcher, HtmlExtractor>> {
    let fetcher = HttpFetcher::new(&config.user_agent, &config.crawler)
        .context("Failed to build HTTP client")?;
    let extractor = HtmlExtractor::new(&config.extractor)?;
    Ok(Harvester::new(config, fetcher, extractor)?)
}

/// Handles --status: prints the checkpoint for the target
fn handle_status(store: &StateStore, target: &str) -> anyhow::Result<()> {
    let state = store.load(target);
    if !state.has_progress() && state.started_at.is_none() {
        println!("No checkpoint for {}", target);
        println!("  (would be stored at {})", store.state_path(target).display());
        return Ok(());
    }

    print_state_status(&state);
    Ok(())
}

/// Handles --dry-run: resolves and prints the trail
async fn handle_dry_run(config: &Config, target: &str) -> anyhow::Result<()> {
    println!("=== Canopy Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Max depth: {}", config.crawler.max_depth);
    println!("  Max fan-out: {}", config.crawler.max_fan_out);
    println!(
        "  Delay: {}-{}ms",
        config.crawler.delay_min_ms, config.crawler.delay_max_ms
    );
    println!("  Treat target as leaf: {}", config.crawler.treat_target_as_leaf);

    println!("\nOutput:");
    println!("  State directory: {}", config.output.state_dir);
    println!("  Tree: {}", config.output.tree_path);
    if let Some(summary) = &config.output.summary_path {
        println!("  Summary: {}", summary);
    }

    let harvester = build_harvester(config)?;
    let trail = harvester.resolve_trail(target).await;

    println!("\nTrail ({} levels):", trail.len());
    for (depth, crumb) in trail.iter().enumerate() {
        println!("  {}{} <{}>", "  ".repeat(depth), crumb.name, crumb.url);
    }

    println!("\n=== Dry run complete ===");
    Ok(())
}

/// Handles --retry-failed and --retry: clears failures so they are fetched again
fn handle_retry(
    store: &StateStore,
    target: &str,
    all: bool,
    urls: &[String],
) -> anyhow::Result<()> {
    let mut state = store.load(target);

    if all {
        let cleared = store.clear_all_failed(&mut state)?;
        tracing::info!("Cleared {} failed URLs", cleared);
        return Ok(());
    }

    for url in urls {
        let url = canonical(url);
        if store.clear_failed(&mut state, &url)? {
            tracing::info!("Cleared failure of {}", url);
        } else {
            tracing::warn!("{} is not recorded as failed", url);
        }
    }

    Ok(())
}

/// Runs (or resumes) the session and writes its outputs
async fn handle_harvest(config: &Config, target: &str) -> anyhow::Result<()> {
    let harvester = build_harvester(config)?;
    let harvest = harvester.harvest(target).await;

    let tree_path = Path::new(&config.output.tree_path);
    write_tree_json(&harvest.tree, tree_path)
        .with_context(|| format!("Failed to write {}", tree_path.display()))?;
    tracing::info!("Tree written to {}", tree_path.display());

    if let Some(summary) = &config.output.summary_path {
        let summary_path = Path::new(summary);
        write_markdown_outline(&harvest.tree, summary_path)
            .with_context(|| format!("Failed to write {}", summary_path.display()))?;
        tracing::info!("Outline written to {}", summary_path.display());
    }

    print_tree_statistics(&TreeStatistics::from_tree(&harvest.tree));

    if !harvest.state.failed_urls.is_empty() {
        println!(
            "{} node(s) failed; re-run with --retry-failed to fetch them again",
            harvest.state.failed_urls.len()
        );
    }

    if !harvest.is_complete() {
        bail!(
            "Session failed: {}",
            harvest
                .state
                .failure_reason
                .as_deref()
                .unwrap_or("unknown reason")
        );
    }

    Ok(())
}
