//! Sumi-Rank main entry point
//!
//! This is the command-line interface for the Sumi-Rank link-authority analyzer.

use anyhow::{bail, Context};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use sumi_rank::config::{load_config_with_hash, Config};
use sumi_rank::output::{generate_markdown_summary, print_summary, CrawlReport};
use sumi_rank::{CrawlEvent, CrawlRequest, SessionManager};
use tracing_subscriber::EnvFilter;

/// Sumi-Rank: link authority for a single website
///
/// Sumi-Rank crawls a site from a seed URL, builds its internal link graph,
/// scores every page with PageRank and reports orphan, dead-end and
/// low-authority pages.
#[derive(Parser, Debug)]
#[command(name = "sumi-rank")]
#[command(version)]
#[command(about = "Link authority analyzer for a single website", long_about = None)]
struct Cli {
    /// Seed URL; https:// is assumed when no scheme is given
    #[arg(value_name = "SEED")]
    seed: String,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Maximum number of pages to crawl (clamped to 5-200)
    #[arg(short = 'n', long)]
    max_pages: Option<usize>,

    /// PageRank damping factor, strictly between 0 and 1
    #[arg(short, long)]
    alpha: Option<f64>,

    /// Print every event as a JSON line instead of human-readable progress
    #[arg(long)]
    json: bool,

    /// Write a markdown summary to this file when the crawl completes
    #[arg(long, value_name = "FILE")]
    summary: Option<PathBuf>,

    /// Number of top pages shown in the console summary
    #[arg(long, default_value_t = 10)]
    top: usize,

    /// Validate the request and show what would be crawled without crawling
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    let mut request = CrawlRequest::new(cli.seed.clone());
    request.max_pages = cli.max_pages;
    request.alpha = cli.alpha;

    if cli.dry_run {
        handle_dry_run(&config, &request)
    } else {
        handle_crawl(config, request, &cli).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_rank=info,warn"),
            1 => EnvFilter::new("sumi_rank=debug,info"),
            2 => EnvFilter::new("sumi_rank=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Handles the --dry-run mode: validates the request and shows the settings
fn handle_dry_run(config: &Config, request: &CrawlRequest) -> anyhow::Result<()> {
    let settings = request.resolve(config)?;

    println!("=== Sumi-Rank Dry Run ===\n");

    println!("Crawl:");
    println!("  Seed: {}", settings.seed);
    println!("  Max pages: {}", settings.max_pages);
    println!("  Concurrent fetches: {}", settings.max_concurrent_fetches);
    println!(
        "  Politeness delay: {}ms",
        settings.politeness_delay.as_millis()
    );
    println!("  Max body size: {} bytes", settings.max_body_bytes);

    println!("\nFetch:");
    println!("  Timeout: {}s", config.fetch.timeout_secs);
    println!("  Max redirects: {}", config.fetch.max_redirects);
    println!("  User agent: {}", config.user_agent.header_value());

    println!("\nPageRank:");
    println!("  Alpha: {}", settings.alpha());
    println!("  Tolerance: {:e}", settings.rank.tolerance);
    println!("  Max iterations: {}", settings.rank.max_iterations);
    println!("  Low authority: {:?}", settings.low_authority);

    println!("\n✓ Request is valid");

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, request: CrawlRequest, cli: &Cli) -> anyhow::Result<()> {
    let reap_every = Duration::from_secs(config.session.reap_interval_secs);
    let manager = Arc::new(SessionManager::new(config));
    let reaper = manager.spawn_reaper(reap_every);
    let (id, mut events) = manager.start(request)?;

    let interrupt = {
        let manager = Arc::clone(&manager);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupt received, cancelling crawl");
                if let Err(e) = manager.cancel(id).await {
                    tracing::error!("Failed to cancel session: {}", e);
                }
            }
        })
    };

    let mut report: Option<CrawlReport> = None;
    let mut failure: Option<String> = None;

    while let Some(event) = events.next_event().await {
        if cli.json {
            println!("{}", event.to_json()?);
        } else if !cli.quiet {
            print_event(&event);
        }

        match event {
            CrawlEvent::Complete(final_report) => report = Some(final_report),
            CrawlEvent::Error {
                reason,
                fatal: true,
                ..
            } => failure = Some(reason),
            _ => {}
        }
    }
    interrupt.abort();
    reaper.abort();

    if let Some(reason) = failure {
        bail!("crawl failed: {}", reason);
    }

    let Some(report) = report else {
        tracing::info!("Crawl cancelled, no report produced");
        return Ok(());
    };

    if !cli.json && !cli.quiet {
        println!();
        print_summary(&report, cli.top);
    }

    if let Some(path) = &cli.summary {
        generate_markdown_summary(&report, path)?;
        tracing::info!("Summary written to: {}", path.display());
    }

    Ok(())
}

fn print_event(event: &CrawlEvent) {
    match event {
        CrawlEvent::PageCrawled {
            url,
            status,
            pages_done,
            estimate,
            links_found,
            ..
        } => println!(
            "[{}/{}] {} {} ({} links)",
            pages_done, estimate, status, url, links_found
        ),
        CrawlEvent::Error {
            url: Some(url),
            reason,
            fatal: false,
        } => println!("  ! {}: {}", url, reason),
        CrawlEvent::Cancelled { pages_done } => {
            println!("Cancelled after {} pages", pages_done)
        }
        _ => {}
    }
}
