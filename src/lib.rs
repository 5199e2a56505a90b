//! web-grabber: a concurrent website mirroring crawler
//!
//! This crate implements a crawler that walks a single site from a seed URL,
//! downloads pages and the resources they embed, and mirrors them into a local
//! directory tree that follows the site's URL hierarchy.

pub mod config;
pub mod crawler;
pub mod output;
pub mod scrape;
pub mod state;
pub mod storage;
pub mod url;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for web-grabber operations
///
/// Only setup-time failures reach callers as a `GrabError`; failures of
/// individual crawl tasks are recorded in the crawl statistics instead.
#[derive(Debug, Error)]
pub enum GrabError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Fetching {url} failed: {reason}")]
    Fetch { url: String, reason: String },

    #[error("Invalid CSS selector '{0}'")]
    Selector(String),

    #[error("Invalid crawl phase transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::CrawlPhase,
        to: state::CrawlPhase,
    },

    #[error("Failed to write {path}: {source}")]
    Report {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UrlError {
    #[error("Empty URL reference")]
    Empty,

    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Result type alias for web-grabber operations
pub type Result<T> = std::result::Result<T, GrabError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::{CrawlConfig, RateLimitScope};
pub use crawler::{grab, Crawler, Fetcher, HttpFetcher};
pub use output::{CrawlStats, CrawlSummary, StatsSnapshot};
pub use state::CrawlPhase;
pub use url::{in_scope, normalize, ResourceKind, Scope, ScopePolicy};
