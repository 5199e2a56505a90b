//! Retry timing, setup failures and cancellation, driven by scripted fetchers

use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::{NamedTempFile, TempDir};
use tokio::sync::Notify;
use tokio::time::Instant;
use url::Url;
use web_grabber::config::Config;
use web_grabber::crawler::{FailureKind, FetchResult, FetchedResource};
use web_grabber::output::report::{FAILED_URLS_FILE, REPORT_FILE};
use web_grabber::{CrawlConfig, Crawler, Fetcher, GrabError};

/// Returns queued results in order, then successes
struct ScriptedFetcher {
    script: Mutex<VecDeque<FailureKind>>,
    calls: AtomicUsize,
}

impl ScriptedFetcher {
    fn new(script: Vec<FailureKind>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, url: &Url, _timeout: Duration) -> FetchResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(kind) = self.script.lock().unwrap().pop_front() {
            return FetchResult::failure(kind);
        }
        FetchResult::Success(FetchedResource {
            final_url: url.clone(),
            status_code: 200,
            content_type: Some("text/html".to_string()),
            body: b"<html><body>ok</body></html>".to_vec(),
        })
    }
}

/// Fails every request with the same error
struct AlwaysFailing {
    kind: FailureKind,
    calls: AtomicUsize,
}

#[async_trait]
impl Fetcher for AlwaysFailing {
    async fn fetch(&self, _url: &Url, _timeout: Duration) -> FetchResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        FetchResult::failure(self.kind.clone())
    }
}

/// Never answers; signals once a request is underway
struct HangingFetcher {
    started: Notify,
    calls: AtomicUsize,
}

#[async_trait]
impl Fetcher for HangingFetcher {
    async fn fetch(&self, _url: &Url, _timeout: Duration) -> FetchResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.started.notify_one();
        std::future::pending::<FetchResult>().await
    }
}

fn create_test_config(output_dir: &Path, max_retries: u32) -> CrawlConfig {
    let mut config = Config::default();
    config.crawler.delay_ms = 0;
    config.crawler.max_threads = 2;
    config.fetch.max_retries = max_retries;
    config.fetch.retry_base_delay_ms = 500;
    config.output.output_dir = output_dir.display().to_string();
    CrawlConfig::from_config("https://example.com/", &config).expect("valid test config")
}

#[tokio::test(start_paused = true)]
async fn test_two_503s_then_success() {
    let out = TempDir::new().unwrap();
    let fetcher = ScriptedFetcher::new(vec![
        FailureKind::HttpError(503),
        FailureKind::HttpError(503),
    ]);

    let crawler = Crawler::new(create_test_config(out.path(), 3), fetcher.clone()).unwrap();
    let start = Instant::now();
    let summary = crawler.run().await.unwrap();

    assert_eq!(fetcher.calls(), 3);
    // 500ms before the first retry, 1000ms before the second
    assert!(start.elapsed() >= Duration::from_millis(1500));
    assert_eq!(summary.stats.retries, 2);
    assert_eq!(summary.stats.fetched, 1);
    assert_eq!(summary.stats.pages_saved, 1);
    assert_eq!(summary.stats.fetch_failures, 0);
    assert!(out.path().join("example.com").join("index.html").is_file());
}

#[tokio::test(start_paused = true)]
async fn test_retries_exhausted() {
    let out = TempDir::new().unwrap();
    let fetcher = Arc::new(AlwaysFailing {
        kind: FailureKind::Timeout,
        calls: AtomicUsize::new(0),
    });

    let crawler = Crawler::new(create_test_config(out.path(), 2), fetcher.clone()).unwrap();
    let summary = crawler.run().await.unwrap();

    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 3);
    assert_eq!(summary.stats.retries, 2);
    assert_eq!(summary.stats.fetch_failures, 1);
    assert_eq!(summary.failures[0].reason, "timeout");

    let failed = std::fs::read_to_string(out.path().join(FAILED_URLS_FILE)).unwrap();
    assert_eq!(failed, "https://example.com/\n");
}

#[tokio::test]
async fn test_terminal_failure_is_not_retried() {
    let out = TempDir::new().unwrap();
    let fetcher = Arc::new(AlwaysFailing {
        kind: FailureKind::HttpError(404),
        calls: AtomicUsize::new(0),
    });

    let crawler = Crawler::new(create_test_config(out.path(), 3), fetcher.clone()).unwrap();
    let summary = crawler.run().await.unwrap();

    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    assert_eq!(summary.stats.retries, 0);
    assert_eq!(summary.stats.fetch_failures, 1);
}

#[tokio::test]
async fn test_unwritable_root_fails_before_any_fetch() {
    let blocker = NamedTempFile::new().unwrap();
    let fetcher = ScriptedFetcher::new(Vec::new());

    let config = create_test_config(&blocker.path().join("mirror"), 3);
    let result = Crawler::new(config, fetcher.clone());

    assert!(matches!(result, Err(GrabError::Storage(_))));
    assert_eq!(fetcher.calls(), 0);
}

#[tokio::test]
async fn test_zero_threads_is_rejected() {
    let out = TempDir::new().unwrap();
    let fetcher = ScriptedFetcher::new(Vec::new());

    let mut config = create_test_config(out.path(), 3);
    config.max_threads = 0;

    assert!(matches!(
        Crawler::new(config, fetcher.clone()),
        Err(GrabError::Config(_))
    ));
    assert_eq!(fetcher.calls(), 0);
}

#[tokio::test]
async fn test_cancelled_crawl_terminates() {
    let out = TempDir::new().unwrap();
    let fetcher = ScriptedFetcher::new(Vec::new());

    let crawler = Crawler::new(create_test_config(out.path(), 3), fetcher.clone()).unwrap();
    crawler.cancellation_token().cancel();
    let summary = crawler.run().await.unwrap();

    assert!(summary.cancelled);
    assert_eq!(summary.phase, web_grabber::CrawlPhase::Terminated);
    assert_eq!(fetcher.calls(), 0);
}

#[tokio::test]
async fn test_cancel_during_fetch() {
    let out = TempDir::new().unwrap();
    let fetcher = Arc::new(HangingFetcher {
        started: Notify::new(),
        calls: AtomicUsize::new(0),
    });

    let crawler = Crawler::new(create_test_config(out.path(), 3), fetcher.clone()).unwrap();
    let token = crawler.cancellation_token();
    let ctx = crawler.context().clone();
    let run = tokio::spawn(crawler.run());

    tokio::time::timeout(Duration::from_secs(5), fetcher.started.notified())
        .await
        .expect("fetch started");
    assert_eq!(ctx.frontier.in_flight_len(), 1);
    token.cancel();

    let summary = tokio::time::timeout(Duration::from_secs(5), run)
        .await
        .expect("crawl stops after cancel")
        .unwrap()
        .unwrap();

    assert!(summary.cancelled);
    assert_eq!(summary.phase, web_grabber::CrawlPhase::Terminated);
    assert_eq!(summary.stats.fetched, 0);
    assert_eq!(summary.stats.completed, 0);
    assert_eq!(ctx.frontier.in_flight_len(), 0);
    assert!(ctx.frontier.is_closed());
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);

    let report = std::fs::read_to_string(out.path().join(REPORT_FILE)).unwrap();
    let report: serde_json::Value = serde_json::from_str(&report).unwrap();
    assert_eq!(report["cancelled"], true);
}
