//! End-to-end crawls against mock HTTP servers
//!
//! Each test mirrors a small wiremock site into a temporary directory and
//! checks what was fetched, what landed on disk and what was reported.

use std::path::{Path, PathBuf};
use tempfile::TempDir;
use url::Url;
use web_grabber::config::Config;
use web_grabber::output::report::{FAILED_URLS_FILE, REPORT_FILE, SUMMARY_FILE};
use web_grabber::storage::relative_path;
use web_grabber::{grab, CrawlConfig, CrawlPhase, ResourceKind};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a crawl configuration for a mock server seed
fn create_test_config(seed: &str, output_dir: &Path, max_depth: u32) -> CrawlConfig {
    let mut config = Config::default();
    config.crawler.max_depth = max_depth;
    config.crawler.delay_ms = 0;
    config.crawler.max_threads = 4;
    config.fetch.timeout_secs = 5;
    config.fetch.retry_base_delay_ms = 10;
    config.output.output_dir = output_dir.display().to_string();
    CrawlConfig::from_config(seed, &config).expect("valid test config")
}

fn html(body: impl Into<String>) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.into().into_bytes(), "text/html")
}

async fn mount_page(server: &MockServer, route: &str, body: impl Into<String>, times: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html(body))
        .expect(times)
        .mount(server)
        .await;
}

fn stored_path(root: &Path, url: &str, kind: ResourceKind) -> PathBuf {
    let url = Url::parse(url).expect("valid url");
    root.join(relative_path(&url, kind).expect("mappable url"))
}

#[tokio::test]
async fn test_depth_one_fetches_seed_and_direct_links() {
    let server = MockServer::start().await;
    let base = server.uri();
    let out = TempDir::new().expect("temp dir");

    mount_page(
        &server,
        "/",
        r#"<html><head><title>Home</title></head><body>
            <a href="/a">A</a>
            <a href="/b">B</a>
            <a href="https://other.com/c">Elsewhere</a>
        </body></html>"#,
        1,
    )
    .await;
    mount_page(&server, "/a", r#"<a href="/a/deeper">deeper</a>"#, 1).await;
    mount_page(&server, "/b", "<p>leaf</p>", 1).await;
    mount_page(&server, "/a/deeper", "<p>too deep</p>", 0).await;

    let config = create_test_config(&format!("{}/", base), out.path(), 1);
    let summary = grab(config).await.expect("crawl runs");

    assert_eq!(summary.phase, CrawlPhase::Terminated);
    assert!(!summary.cancelled);
    assert_eq!(summary.stats.fetched, 3);
    assert_eq!(summary.stats.pages_saved, 3);
    assert_eq!(summary.stats.depth_exceeded, 1);
    assert_eq!(summary.stats.out_of_scope, 1);
    assert_eq!(summary.out_of_scope, vec!["https://other.com/c".to_string()]);
    assert!(summary.failures.is_empty());

    let index = stored_path(out.path(), &format!("{}/", base), ResourceKind::Page);
    assert!(index.ends_with("index.html"));
    assert!(std::fs::read_to_string(&index)
        .expect("index saved")
        .contains("<title>Home</title>"));
    assert!(stored_path(out.path(), &format!("{}/a", base), ResourceKind::Page).is_file());
    assert!(stored_path(out.path(), &format!("{}/b", base), ResourceKind::Page).is_file());
    assert!(!stored_path(out.path(), &format!("{}/a/deeper", base), ResourceKind::Page).exists());
}

#[tokio::test]
async fn test_self_link_is_fetched_once() {
    let server = MockServer::start().await;
    let base = server.uri();
    let out = TempDir::new().expect("temp dir");

    mount_page(
        &server,
        "/loop",
        r##"<a href="/loop">again</a><a href="/loop#top">top</a><a href="#">here</a>"##,
        1,
    )
    .await;

    let config = create_test_config(&format!("{}/loop", base), out.path(), 100);
    let summary = grab(config).await.expect("crawl runs");

    assert_eq!(summary.stats.fetched, 1);
    assert_eq!(summary.stats.completed, 1);
    assert_eq!(summary.urls_admitted, 1);
}

#[tokio::test]
async fn test_embedded_resources_inherit_page_depth() {
    let server = MockServer::start().await;
    let base = server.uri();
    let out = TempDir::new().expect("temp dir");

    mount_page(
        &server,
        "/",
        r#"<html><head><link rel="stylesheet" href="/style.css"></head><body>
            <img src="/logo.png">
            <video src="/clip.mp4"></video>
            <a href="/next">next</a>
        </body></html>"#,
        1,
    )
    .await;
    mount_page(&server, "/next", "<p>next</p>", 0).await;

    let png = vec![0x89, b'P', b'N', b'G', 0, 1, 2, 3];
    Mock::given(method("GET"))
        .and(path("/logo.png"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(png.clone(), "image/png"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/clip.mp4"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"mp4".to_vec(), "video/mp4"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/style.css"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"body{}".to_vec(), "text/css"))
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(&format!("{}/", base), out.path(), 0);
    let summary = grab(config).await.expect("crawl runs");

    assert_eq!(summary.stats.pages_saved, 1);
    assert_eq!(summary.stats.images_saved, 1);
    assert_eq!(summary.stats.videos_saved, 1);
    assert_eq!(summary.stats.other_saved, 1);
    assert_eq!(summary.stats.depth_exceeded, 1);

    let logo = stored_path(out.path(), &format!("{}/logo.png", base), ResourceKind::Image);
    assert!(logo.ends_with("logo.png"));
    assert_eq!(std::fs::read(&logo).expect("logo saved"), png);
}

#[tokio::test]
async fn test_no_resources_and_no_links() {
    let server = MockServer::start().await;
    let base = server.uri();
    let out = TempDir::new().expect("temp dir");

    mount_page(
        &server,
        "/",
        r#"<img src="/logo.png"><a href="/next">next</a>"#,
        1,
    )
    .await;
    mount_page(&server, "/next", "next", 0).await;
    mount_page(&server, "/logo.png", "never", 0).await;

    let mut config = create_test_config(&format!("{}/", base), out.path(), 5);
    config.follow_links = false;
    config.download_resources = false;
    let summary = grab(config).await.expect("crawl runs");

    assert_eq!(summary.stats.fetched, 1);
    assert_eq!(summary.urls_admitted, 1);
}

#[tokio::test]
async fn test_failures_are_reported() {
    let server = MockServer::start().await;
    let base = server.uri();
    let out = TempDir::new().expect("temp dir");

    mount_page(&server, "/", r#"<a href="/missing">gone</a><a href="/ok">ok</a>"#, 1).await;
    mount_page(&server, "/ok", "fine", 1).await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(&format!("{}/", base), out.path(), 3);
    let summary = grab(config).await.expect("crawl runs");

    assert_eq!(summary.stats.fetch_failures, 1);
    assert_eq!(summary.stats.retries, 0);
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].url, format!("{}/missing", base));
    assert_eq!(summary.failures[0].reason, "HTTP 404");

    let failed = std::fs::read_to_string(out.path().join(FAILED_URLS_FILE)).expect("ledger");
    assert_eq!(failed, format!("{}/missing\n", base));

    let report = std::fs::read_to_string(out.path().join(REPORT_FILE)).expect("report");
    let report: serde_json::Value = serde_json::from_str(&report).expect("valid json");
    assert_eq!(report["phase"], "terminated");
    assert_eq!(report["stats"]["fetch_failures"], 1);

    let markdown = std::fs::read_to_string(out.path().join(SUMMARY_FILE)).expect("summary");
    assert!(markdown.contains("/missing"));
}

#[tokio::test]
async fn test_retry_failed_requeues_previous_failures() {
    let server = MockServer::start().await;
    let base = server.uri();
    let out = TempDir::new().expect("temp dir");

    std::fs::write(
        out.path().join(FAILED_URLS_FILE),
        format!("{}/orphan\nhttps://other.com/x\n", base),
    )
    .expect("seed ledger");

    mount_page(&server, "/", "<p>no links</p>", 1).await;
    mount_page(&server, "/orphan", "<p>back again</p>", 1).await;

    let mut config = create_test_config(&format!("{}/", base), out.path(), 3);
    config.retry_failed = true;
    let summary = grab(config).await.expect("crawl runs");

    assert_eq!(summary.stats.fetched, 2);
    assert!(summary.failures.is_empty());
    // nothing failed this time, so the old list is gone
    assert!(!out.path().join(FAILED_URLS_FILE).exists());
    assert!(stored_path(out.path(), &format!("{}/orphan", base), ResourceKind::Page).is_file());
}

#[tokio::test]
async fn test_redirect_within_site_is_saved_under_request_url() {
    let server = MockServer::start().await;
    let base = server.uri();
    let out = TempDir::new().expect("temp dir");

    mount_page(&server, "/", r#"<a href="/old">old</a>"#, 1).await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/new"))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/new", "<p>moved</p>", 1).await;

    let config = create_test_config(&format!("{}/", base), out.path(), 3);
    let summary = grab(config).await.expect("crawl runs");

    assert_eq!(summary.stats.pages_saved, 2);
    let old = stored_path(out.path(), &format!("{}/old", base), ResourceKind::Page);
    assert!(std::fs::read_to_string(old).expect("saved").contains("moved"));
}
