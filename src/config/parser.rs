use crate::config::types::{Config, CrawlConfig};
use crate::config::validation::{validate, validate_crawl_config, validate_seed_url};
use crate::crawler::RetryPolicy;
use crate::url::{Scope, ScopePolicy};
use crate::ConfigError;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use web_grabber::config::load_config;
///
/// let config = load_config(Path::new("grabber.toml")).unwrap();
/// println!("Max depth: {}", config.crawler.max_depth);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

impl CrawlConfig {
    /// Builds the immutable crawl snapshot for a seed URL
    ///
    /// The seed is normalized and becomes the scope anchor; every other value
    /// is taken from `config`.
    pub fn from_config(seed: &str, config: &Config) -> Result<Self, ConfigError> {
        validate(config)?;
        let seed = validate_seed_url(seed)?;

        let policy = if config.crawler.include_subdomains {
            ScopePolicy::IncludeSubdomains
        } else {
            ScopePolicy::SameHost
        };
        let scope = Scope::from_seed(&seed, policy)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e)))?;

        let retry = RetryPolicy {
            max_retries: config.fetch.max_retries,
            base_delay: Duration::from_millis(config.fetch.retry_base_delay_ms),
            ..RetryPolicy::default()
        };

        let crawl_config = Self {
            seed,
            output_dir: PathBuf::from(&config.output.output_dir),
            max_depth: config.crawler.max_depth,
            max_threads: config.crawler.max_threads,
            delay: Duration::from_millis(config.crawler.delay_ms),
            timeout: Duration::from_secs(config.fetch.timeout_secs),
            user_agent: config.fetch.user_agent.clone(),
            scope,
            rate_limit: config.crawler.rate_limit,
            retry,
            follow_links: config.crawler.follow_links,
            download_resources: config.crawler.download_resources,
            retry_failed: config.output.retry_failed,
        };

        validate_crawl_config(&crawl_config)?;
        Ok(crawl_config)
    }
}
