//! Output module for crawl statistics and reports
//!
//! This module handles:
//! - Live crawl counters shared by all workers
//! - The ledger of failed and out-of-scope URLs
//! - End-of-run artifacts: failed-URL list, JSON report, markdown summary

mod ledger;
mod markdown;
pub mod report;
pub mod stats;

pub use ledger::{CrawlLedger, FailedUrl};
pub use markdown::format_markdown_summary;
pub use report::{load_failed_urls, write_failed_urls, write_report, CrawlSummary};
pub use stats::{print_summary, CrawlStats, StatsSnapshot};
