//! Crawler module: fetching, link extraction and the worker pool
//!
//! - [`fetcher`]: the [`Fetcher`] transport seam and its reqwest implementation
//! - [`retry`]: bounded exponential backoff around a fetcher
//! - [`rate_limiter`]: per-key request spacing
//! - [`parser`]: lazy extraction of child URLs from HTML
//! - [`frontier`]: the shared queue and visited set
//! - [`scheduler`]: the worker pool
//! - [`coordinator`]: setup, run and reporting

mod coordinator;
pub mod fetcher;
pub mod frontier;
pub mod parser;
pub mod rate_limiter;
pub mod retry;
pub mod scheduler;

pub use coordinator::{grab, Crawler};
pub use fetcher::{
    build_http_client, fetch_url, FailureKind, FetchFailure, FetchResult, FetchedResource,
    Fetcher, HttpFetcher,
};
pub use frontier::{Admission, CrawlTask, Frontier, InFlight, NextTask};
pub use parser::{extract, ExtractedLink, LinkRole, ParsedPage};
pub use rate_limiter::RateLimiter;
pub use retry::{fetch_with_retry, RetryOutcome, RetryPolicy};
pub use scheduler::{run_workers, CrawlContext};
