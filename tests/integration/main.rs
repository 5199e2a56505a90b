//! Integration tests for web-grabber
//!
//! `crawl_tests` drives full crawls over HTTP against wiremock servers;
//! `retry_tests` uses scripted fetchers and paused time.

mod crawl_tests;
mod retry_tests;
