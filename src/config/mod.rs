//! Configuration module for web-grabber
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files, and turning them into the immutable [`CrawlConfig`] snapshot a crawl
//! runs against.
//!
//! # Example
//!
//! ```no_run
//! use web_grabber::config::{load_config, CrawlConfig};
//! use std::path::Path;
//!
//! let config = load_config(Path::new("grabber.toml")).unwrap();
//! let crawl = CrawlConfig::from_config("https://example.com/", &config).unwrap();
//! println!("Crawler will use max depth: {}", crawl.max_depth);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlConfig, CrawlerConfig, FetchConfig, OutputConfig, RateLimitScope,
    DEFAULT_USER_AGENT,
};

// Re-export parser and validation functions
pub use parser::{load_config, parse_config};
pub use validation::{validate, validate_crawl_config, validate_seed_url, MAX_THREADS};
