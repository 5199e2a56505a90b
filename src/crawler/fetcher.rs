//! HTTP fetcher implementation
//!
//! This module defines the `Fetcher` capability the crawler depends on and
//! ships the plain HTTP implementation of it:
//! - Building HTTP clients with the configured user agent and browser-like headers
//! - GET requests with a per-request timeout
//! - Redirect handling (bounded hop count)
//! - Error classification into retriable and terminal failures

use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{redirect::Policy, Client, StatusCode};
use std::fmt;
use std::time::Duration;
use url::Url;

/// Maximum number of redirects followed for a single request
pub const MAX_REDIRECTS: usize = 10;

const ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";
const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.5";

/// Why a fetch failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// No response within the timeout
    Timeout,

    /// DNS, TCP or TLS failure before a response arrived
    ConnectionError(String),

    /// The server answered with a non-success status
    HttpError(u16),

    /// The response body could not be read or decoded
    DecodeError(String),

    /// Redirect loop or more than [`MAX_REDIRECTS`] hops
    RedirectLimit(String),
}

impl FailureKind {
    /// Returns true if a later attempt may succeed
    ///
    /// Timeouts, connection errors and HTTP 429/503 are transient; every
    /// other failure is terminal for the URL.
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::Timeout | Self::ConnectionError(_) => true,
            Self::HttpError(status) => {
                *status == StatusCode::TOO_MANY_REQUESTS.as_u16()
                    || *status == StatusCode::SERVICE_UNAVAILABLE.as_u16()
            }
            Self::DecodeError(_) | Self::RedirectLimit(_) => false,
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "timeout"),
            Self::ConnectionError(e) => write!(f, "connection error: {}", e),
            Self::HttpError(status) => write!(f, "HTTP {}", status),
            Self::DecodeError(e) => write!(f, "decode error: {}", e),
            Self::RedirectLimit(e) => write!(f, "redirect error: {}", e),
        }
    }
}

/// A failed fetch and whether it is worth retrying
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    pub kind: FailureKind,
    pub retriable: bool,
}

impl FetchFailure {
    pub fn new(kind: FailureKind) -> Self {
        let retriable = kind.is_retriable();
        Self { kind, retriable }
    }
}

impl From<FailureKind> for FetchFailure {
    fn from(kind: FailureKind) -> Self {
        Self::new(kind)
    }
}

/// A successfully retrieved resource
#[derive(Debug, Clone)]
pub struct FetchedResource {
    /// Final URL after redirects
    pub final_url: Url,
    pub status_code: u16,
    /// Content-Type header value, if the server sent one
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

/// Result of a fetch operation
#[derive(Debug, Clone)]
pub enum FetchResult {
    Success(FetchedResource),
    Failure(FetchFailure),
}

impl FetchResult {
    pub fn failure(kind: FailureKind) -> Self {
        Self::Failure(FetchFailure::new(kind))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// One HTTP(S) retrieval
///
/// Implementations are shared by every worker and must be safe to call
/// concurrently. Browser-rendered or proxied transports plug in here.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &Url, timeout: Duration) -> FetchResult;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - Value sent in the `User-Agent` header
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client (for example an invalid user agent)
///
/// # Example
///
/// ```no_run
/// use web_grabber::crawler::build_http_client;
///
/// let client = build_http_client("web-grabber/0.3").unwrap();
/// ```
pub fn build_http_client(user_agent: &str) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(header::ACCEPT, HeaderValue::from_static(ACCEPT));
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static(ACCEPT_LANGUAGE),
    );

    Client::builder()
        .user_agent(user_agent)
        .default_headers(headers)
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Plain HTTP fetcher backed by a shared `reqwest::Client`
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(user_agent)?,
        })
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url, timeout: Duration) -> FetchResult {
        fetch_url(&self.client, url, timeout).await
    }
}

/// Fetches a URL and classifies the outcome
///
/// # Classification
///
/// | Condition | Result |
/// |-----------|--------|
/// | 2xx | Success |
/// | HTTP 429 / 503 | HttpError, retriable |
/// | Other 4xx / 5xx | HttpError, terminal |
/// | Timeout | Timeout, retriable |
/// | DNS / connect / TLS failure | ConnectionError, retriable |
/// | Redirect loop or > 10 hops | RedirectLimit, terminal |
/// | Body read failure | DecodeError, terminal |
pub async fn fetch_url(client: &Client, url: &Url, timeout: Duration) -> FetchResult {
    let response = match client.get(url.clone()).timeout(timeout).send().await {
        Ok(response) => response,
        Err(e) => return FetchResult::failure(classify_error(&e)),
    };

    let status = response.status();
    if !status.is_success() {
        return FetchResult::failure(FailureKind::HttpError(status.as_u16()));
    }

    let final_url = response.url().clone();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    match response.bytes().await {
        Ok(body) => FetchResult::Success(FetchedResource {
            final_url,
            status_code: status.as_u16(),
            content_type,
            body: body.to_vec(),
        }),
        Err(e) if e.is_timeout() => FetchResult::failure(FailureKind::Timeout),
        Err(e) => FetchResult::failure(FailureKind::DecodeError(e.to_string())),
    }
}

fn classify_error(e: &reqwest::Error) -> FailureKind {
    if e.is_timeout() {
        FailureKind::Timeout
    } else if e.is_redirect() {
        FailureKind::RedirectLimit(e.to_string())
    } else if e.is_decode() || e.is_body() {
        FailureKind::DecodeError(e.to_string())
    } else {
        // connect, request and builder errors alike: nothing came back
        FailureKind::ConnectionError(e.to_string())
    }
}
