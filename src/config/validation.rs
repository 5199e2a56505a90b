use crate::config::types::{Config, CrawlConfig, CrawlerConfig, FetchConfig, OutputConfig};
use crate::url::normalize_absolute;
use crate::ConfigError;
use url::Url;

/// Upper bound on the worker pool size
pub const MAX_THREADS: usize = 100;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_fetch_config(&config.fetch)?;
    validate_output_config(&config.output)?;
    Ok(())
}

fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    validate_threads(config.max_threads)
}

fn validate_threads(threads: usize) -> Result<(), ConfigError> {
    if threads < 1 || threads > MAX_THREADS {
        return Err(ConfigError::Validation(format!(
            "max_threads must be between 1 and {}, got {}",
            MAX_THREADS, threads
        )));
    }
    Ok(())
}

fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout_secs must be at least 1".to_string(),
        ));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.output_dir.trim().is_empty() {
        return Err(ConfigError::Validation(
            "output_dir cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Parses and normalizes a seed URL
///
/// The seed must be an absolute http(s) URL with a host.
pub fn validate_seed_url(seed: &str) -> Result<Url, ConfigError> {
    normalize_absolute(seed)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e)))
}

/// Validates an assembled crawl snapshot
///
/// Called again by the crawler itself because a `CrawlConfig` can be built by
/// hand without going through [`CrawlConfig::from_config`].
pub fn validate_crawl_config(config: &CrawlConfig) -> Result<(), ConfigError> {
    validate_threads(config.max_threads)?;

    if config.timeout.is_zero() {
        return Err(ConfigError::Validation(
            "timeout must be greater than zero".to_string(),
        ));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.output_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "output_dir cannot be empty".to_string(),
        ));
    }

    if !config.scope.contains(&config.seed) {
        return Err(ConfigError::InvalidUrl(format!(
            "Seed URL '{}' is outside its own scope '{}'",
            config.seed,
            config.scope.host()
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_threads() {
        assert!(validate_threads(1).is_ok());
        assert!(validate_threads(5).is_ok());
        assert!(validate_threads(MAX_THREADS).is_ok());

        assert!(validate_threads(0).is_err());
        assert!(validate_threads(MAX_THREADS + 1).is_err());
    }

    #[test]
    fn test_validate_fetch_config() {
        let mut config = FetchConfig::default();
        assert!(validate_fetch_config(&config).is_ok());

        config.timeout_secs = 0;
        assert!(validate_fetch_config(&config).is_err());

        config.timeout_secs = 5;
        config.user_agent = "   ".to_string();
        assert!(validate_fetch_config(&config).is_err());
    }

    #[test]
    fn test_validate_output_config() {
        let config = OutputConfig {
            output_dir: String::new(),
            retry_failed: false,
        };
        assert!(validate_output_config(&config).is_err());
    }

    #[test]
    fn test_validate_seed_url() {
        assert!(validate_seed_url("https://example.com/").is_ok());
        assert!(validate_seed_url("http://127.0.0.1:8080/docs").is_ok());

        assert!(validate_seed_url("").is_err());
        assert!(validate_seed_url("/relative/path").is_err());
        assert!(validate_seed_url("mailto:someone@example.com").is_err());
        assert!(validate_seed_url("file:///etc/passwd").is_err());
    }
}
