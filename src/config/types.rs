use crate::crawler::RetryPolicy;
use crate::url::Scope;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Default user agent, a desktop browser string like the one most sites expect
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/94.0.4606.81 Safari/537.36";

/// Configuration file structure for web-grabber
///
/// Every section and key is optional; missing values fall back to the
/// defaults below and may be overridden again from the command line.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub fetch: FetchConfig,
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Maximum depth to crawl from the seed URL (the seed is depth 0)
    pub max_depth: u32,

    /// Number of concurrent worker tasks
    pub max_threads: usize,

    /// Minimum time between requests sharing a rate-limit key (milliseconds)
    pub delay_ms: u64,

    /// Whether subdomains of the seed host are in scope
    pub include_subdomains: bool,

    /// How request spacing is keyed
    pub rate_limit: RateLimitScope,

    /// Follow hyperlinks to other pages
    pub follow_links: bool,

    /// Download images, videos and other embedded resources
    pub download_resources: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: 100,
            max_threads: 5,
            delay_ms: 500,
            include_subdomains: false,
            rate_limit: RateLimitScope::PerDomain,
            follow_links: true,
            download_resources: true,
        }
    }
}

/// HTTP fetch configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FetchConfig {
    /// Per-request timeout (seconds)
    pub timeout_secs: u64,

    /// Retries for transient failures (429/503, timeouts, connection errors)
    pub max_retries: u32,

    /// Delay before the first retry; doubles on each subsequent retry (milliseconds)
    pub retry_base_delay_ms: u64,

    /// User agent sent with every request
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_retries: 3,
            retry_base_delay_ms: 500,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Root directory of the local mirror
    pub output_dir: String,

    /// Re-queue URLs listed in the previous run's failed_urls.txt
    pub retry_failed: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: "./grabbed_site".to_string(),
            retry_failed: false,
        }
    }
}

/// How the rate limiter keys its request spacing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RateLimitScope {
    /// One delay window per host, shared by all workers
    #[default]
    PerDomain,
    /// One delay window per worker, regardless of host
    PerWorker,
}

/// Immutable snapshot of everything a crawl needs
///
/// Built once from a [`Config`] plus the seed URL and shared read-only with
/// every worker for the whole crawl.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub seed: Url,
    pub output_dir: PathBuf,
    pub max_depth: u32,
    pub max_threads: usize,
    pub delay: Duration,
    pub timeout: Duration,
    pub user_agent: String,
    pub scope: Scope,
    pub rate_limit: RateLimitScope,
    pub retry: RetryPolicy,
    pub follow_links: bool,
    pub download_resources: bool,
    pub retry_failed: bool,
}
