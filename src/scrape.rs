//! One-shot selector scraping
//!
//! Fetches a single page through a [`Fetcher`], applies a CSS selector and
//! returns the text, inner HTML and attributes of every match. An empty
//! selector selects the whole `body`.

use crate::crawler::{fetch_with_retry, FetchResult, Fetcher, RateLimiter, RetryPolicy};
use crate::GrabError;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// One element matched by a selector
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScrapedElement {
    pub tag: String,
    /// Text content with whitespace runs collapsed
    pub text: String,
    pub html: String,
    pub attributes: BTreeMap<String, String>,
}

/// Output format of `write_scraped`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrapeFormat {
    #[default]
    Json,
    Text,
}

impl FromStr for ScrapeFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "txt" | "text" => Ok(Self::Text),
            other => Err(format!("unknown format '{}' (expected json or txt)", other)),
        }
    }
}

/// Applies `selector` to an HTML document
///
/// # Errors
///
/// Returns `GrabError::Selector` if the selector does not parse.
pub fn select_elements(html: &[u8], selector: &str) -> Result<Vec<ScrapedElement>, GrabError> {
    let selector = selector.trim();
    let selector = if selector.is_empty() { "body" } else { selector };
    let parsed =
        Selector::parse(selector).map_err(|e| GrabError::Selector(format!("{}: {}", selector, e)))?;

    let text = String::from_utf8_lossy(html);
    let document = Html::parse_document(&text);

    Ok(document.select(&parsed).map(to_scraped).collect())
}

fn to_scraped(element: ElementRef<'_>) -> ScrapedElement {
    let text = element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ");

    ScrapedElement {
        tag: element.value().name().to_string(),
        text,
        html: element.inner_html(),
        attributes: element
            .value()
            .attrs()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect(),
    }
}

/// Fetches `url` and applies `selector` to the response
pub async fn scrape(
    fetcher: &dyn Fetcher,
    url: &Url,
    selector: &str,
    timeout: Duration,
    policy: &RetryPolicy,
) -> Result<Vec<ScrapedElement>, GrabError> {
    let limiter = RateLimiter::new(Duration::ZERO);
    let key = url.host_str().unwrap_or_default().to_string();

    let outcome = fetch_with_retry(fetcher, &limiter, &key, url, timeout, policy).await;
    let resource = match outcome.result {
        FetchResult::Success(resource) => resource,
        FetchResult::Failure(failure) => {
            return Err(GrabError::Fetch {
                url: url.to_string(),
                reason: failure.kind.to_string(),
            })
        }
    };

    let elements = select_elements(&resource.body, selector)?;
    tracing::info!(
        "Selector '{}' matched {} element(s) on {}",
        selector,
        elements.len(),
        resource.final_url
    );
    Ok(elements)
}

/// Renders scraped elements in the requested format
pub fn format_scraped(elements: &[ScrapedElement], format: ScrapeFormat) -> Result<String, GrabError> {
    match format {
        ScrapeFormat::Json => Ok(serde_json::to_string_pretty(elements)?),
        ScrapeFormat::Text => {
            let mut out = String::new();
            for element in elements {
                let _ = writeln!(out, "[{}]", element.tag);
                for (name, value) in &element.attributes {
                    let _ = writeln!(out, "  {}=\"{}\"", name, value);
                }
                let _ = writeln!(out, "{}", element.text);
                out.push('\n');
            }
            Ok(out)
        }
    }
}

/// Writes scraped elements to `path`
pub fn write_scraped(
    path: &Path,
    elements: &[ScrapedElement],
    format: ScrapeFormat,
) -> Result<(), GrabError> {
    let content = format_scraped(elements, format)?;
    std::fs::write(path, content).map_err(|source| GrabError::Report {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!("Wrote {} element(s) to {}", elements.len(), path.display());
    Ok(())
}
