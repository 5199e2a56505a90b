//! web-grabber command-line entry point

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use web_grabber::config::{load_config, validate_seed_url, Config};
use web_grabber::crawler::{Crawler, HttpFetcher, RetryPolicy};
use web_grabber::output::print_summary;
use web_grabber::scrape::{format_scraped, scrape, write_scraped, ScrapeFormat};
use web_grabber::{CrawlConfig, RateLimitScope};

/// web-grabber: mirror a website into a local directory
///
/// Walks a site from a seed URL, downloads its pages, images and videos, and
/// stores them in a directory tree that follows the site's URL hierarchy.
#[derive(Parser, Debug)]
#[command(name = "web-grabber")]
#[command(version)]
#[command(about = "A concurrent website grabber", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl a site and mirror it to disk
    Grab(GrabArgs),
    /// Fetch one page and extract elements matching a CSS selector
    Scrape(ScrapeArgs),
}

#[derive(Args, Debug)]
struct GrabArgs {
    /// Seed URL; the crawl stays on its host
    #[arg(value_name = "URL")]
    url: String,

    /// TOML configuration file; flags override its values
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Root directory of the mirror
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Maximum link depth from the seed
    #[arg(short, long)]
    depth: Option<u32>,

    /// Number of concurrent workers
    #[arg(short, long)]
    threads: Option<usize>,

    /// Seconds between requests to the same host
    #[arg(long, value_name = "SECS")]
    delay: Option<f64>,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// User-Agent header sent with every request
    #[arg(long)]
    user_agent: Option<String>,

    /// Retries for transient failures
    #[arg(long)]
    retries: Option<u32>,

    /// Also crawl subdomains of the seed host
    #[arg(long)]
    include_subdomains: bool,

    /// Space requests per worker instead of per host
    #[arg(long)]
    per_worker_rate_limit: bool,

    /// Do not follow links to other pages
    #[arg(long)]
    no_links: bool,

    /// Do not download images, videos and other embedded resources
    #[arg(long)]
    no_resources: bool,

    /// Also re-fetch the URLs listed in the output's failed_urls.txt
    #[arg(long)]
    retry_failed: bool,
}

#[derive(Args, Debug)]
struct ScrapeArgs {
    /// Page to scrape
    #[arg(value_name = "URL")]
    url: String,

    /// CSS selector; empty selects the whole body
    #[arg(short, long, default_value = "")]
    selector: String,

    /// Write results here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output_file: Option<PathBuf>,

    /// Output format: json or txt
    #[arg(short, long, default_value = "json")]
    format: ScrapeFormat,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// User-Agent header
    #[arg(long)]
    user_agent: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let result = match cli.command {
        Command::Grab(args) => handle_grab(args).await,
        Command::Scrape(args) => handle_scrape(args).await,
    };

    if let Err(e) = &result {
        tracing::error!("{:#}", e);
    }
    result
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("web_grabber=info,warn"),
            1 => EnvFilter::new("web_grabber=debug,info"),
            2 => EnvFilter::new("web_grabber=trace,debug"),
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

/// Merges the optional config file with command-line overrides
fn build_config(args: &GrabArgs) -> anyhow::Result<CrawlConfig> {
    let mut config = match &args.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?
        }
        None => Config::default(),
    };

    if let Some(dir) = &args.output_dir {
        config.output.output_dir = dir.display().to_string();
    }
    if let Some(depth) = args.depth {
        config.crawler.max_depth = depth;
    }
    if let Some(threads) = args.threads {
        config.crawler.max_threads = threads;
    }
    if let Some(delay) = args.delay {
        anyhow::ensure!(
            delay.is_finite() && delay >= 0.0,
            "--delay must be a non-negative number of seconds"
        );
        config.crawler.delay_ms = (delay * 1000.0).round() as u64;
    }
    if let Some(timeout) = args.timeout {
        config.fetch.timeout_secs = timeout;
    }
    if let Some(user_agent) = &args.user_agent {
        config.fetch.user_agent = user_agent.clone();
    }
    if let Some(retries) = args.retries {
        config.fetch.max_retries = retries;
    }
    if args.include_subdomains {
        config.crawler.include_subdomains = true;
    }
    if args.per_worker_rate_limit {
        config.crawler.rate_limit = RateLimitScope::PerWorker;
    }
    if args.no_links {
        config.crawler.follow_links = false;
    }
    if args.no_resources {
        config.crawler.download_resources = false;
    }
    if args.retry_failed {
        config.output.retry_failed = true;
    }

    Ok(CrawlConfig::from_config(&args.url, &config)?)
}

async fn handle_grab(args: GrabArgs) -> anyhow::Result<()> {
    let config = build_config(&args)?;

    let fetcher = HttpFetcher::new(&config.user_agent).context("Failed to build HTTP client")?;
    let crawler = Crawler::new(config, Arc::new(fetcher))?;

    let token = crawler.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, stopping crawl");
            token.cancel();
        }
    });

    let summary = crawler.run().await?;
    print_summary(&summary);
    Ok(())
}

async fn handle_scrape(args: ScrapeArgs) -> anyhow::Result<()> {
    let url = validate_seed_url(&args.url)?;
    anyhow::ensure!(args.timeout > 0, "--timeout must be greater than zero");

    let user_agent = args
        .user_agent
        .unwrap_or_else(|| web_grabber::config::DEFAULT_USER_AGENT.to_string());
    let fetcher = HttpFetcher::new(&user_agent).context("Failed to build HTTP client")?;

    let elements = scrape(
        &fetcher,
        &url,
        &args.selector,
        Duration::from_secs(args.timeout),
        &RetryPolicy::default(),
    )
    .await?;

    match &args.output_file {
        Some(path) => write_scraped(path, &elements, args.format)?,
        None => print!("{}", format_scraped(&elements, args.format)?),
    }
    Ok(())
}
