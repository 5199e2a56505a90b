//! HTML parser for extracting links and embedded resources
//!
//! This module handles parsing fetched HTML to find:
//! - Hyperlinks to other pages (`<a href>`, canonical links)
//! - Embedded resources (images, video, audio, stylesheets, scripts, icons)
//! - Background images referenced from inline `style` attributes
//! - The page title
//!
//! Parsing never fails: broken markup yields whatever the HTML parser can
//! recover, and references that do not resolve to an http(s) URL surface as
//! `Err` items for the caller to count.

use crate::url::{normalize, ResourceKind};
use crate::UrlError;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::node::Element;
use scraper::{Html, Selector};
use url::Url;

/// A child URL discovered on a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedLink {
    pub url: Url,
    pub kind: ResourceKind,
    pub role: LinkRole,
}

/// How a page refers to a child URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LinkRole {
    /// A hop to another document (`a[href]`, canonical); always one level deeper
    #[default]
    Navigation,
    /// Something the page embeds or offers for download; same level as the page
    Embedded,
}

/// How the resource kind of a reference is decided
#[derive(Debug, Clone, Copy)]
enum KindRule {
    /// From the URL's extension; extensionless URLs are pages
    ByExtension,
    /// From the extension, falling back to the given kind where that says Page
    ByExtensionOr(ResourceKind),
    Fixed(ResourceKind),
}

impl KindRule {
    fn resolve(self, url: &Url) -> ResourceKind {
        match self {
            Self::ByExtension => ResourceKind::from_url(url),
            Self::ByExtensionOr(fallback) => match ResourceKind::from_url(url) {
                ResourceKind::Page => fallback,
                kind => kind,
            },
            Self::Fixed(kind) => kind,
        }
    }
}

/// How references are read out of an attribute value
#[derive(Debug, Clone, Copy)]
enum AttrFormat {
    /// The whole value is one URL
    Plain,
    /// `srcset`: comma-separated candidates, URL first in each
    Srcset,
    /// CSS declarations; every `url(...)` is a reference
    StyleUrls,
}

struct LinkRule {
    selector: Selector,
    attr: &'static str,
    format: AttrFormat,
    kind: KindRule,
    role: LinkRole,
}

impl LinkRule {
    fn new(css: &str, attr: &'static str, format: AttrFormat, kind: KindRule) -> Option<Self> {
        let selector = Selector::parse(css).ok()?;
        Some(Self {
            selector,
            attr,
            format,
            kind,
            role: LinkRole::Embedded,
        })
    }

    fn navigation(css: &str, kind: KindRule) -> Option<Self> {
        let mut rule = Self::new(css, "href", AttrFormat::Plain, kind)?;
        rule.role = LinkRole::Navigation;
        Some(rule)
    }

    fn references(&self, element: &Element) -> Vec<String> {
        let value = match element.attr(self.attr) {
            Some(value) => value,
            None => return Vec::new(),
        };

        match self.format {
            AttrFormat::Plain => vec![value.to_string()],
            AttrFormat::Srcset => parse_srcset(value),
            AttrFormat::StyleUrls => parse_style_urls(value),
        }
    }
}

static LINK_RULES: Lazy<Vec<LinkRule>> = Lazy::new(|| {
    use AttrFormat::*;
    use KindRule::*;
    use ResourceKind::{Image, Other, Page, Video};

    [
        LinkRule::navigation("a[href]:not([download])", ByExtension),
        LinkRule::navigation("link[rel~=canonical][href]", Fixed(Page)),
        LinkRule::new("a[href][download]", "href", Plain, ByExtensionOr(Other)),
        LinkRule::new("img[src]", "src", Plain, Fixed(Image)),
        LinkRule::new("img[srcset]", "srcset", Srcset, Fixed(Image)),
        LinkRule::new("source[srcset]", "srcset", Srcset, Fixed(Image)),
        LinkRule::new("video[src]", "src", Plain, Fixed(Video)),
        LinkRule::new("video source[src]", "src", Plain, Fixed(Video)),
        LinkRule::new("video[poster]", "poster", Plain, Fixed(Image)),
        LinkRule::new("audio[src]", "src", Plain, Fixed(Other)),
        LinkRule::new("audio source[src]", "src", Plain, Fixed(Other)),
        LinkRule::new("link[rel~=stylesheet][href]", "href", Plain, Fixed(Other)),
        LinkRule::new("link[rel~=icon][href]", "href", Plain, Fixed(Image)),
        LinkRule::new("script[src]", "src", Plain, Fixed(Other)),
        LinkRule::new("[style]", "style", StyleUrls, ByExtensionOr(Image)),
    ]
    .into_iter()
    .flatten()
    .collect()
});

static STYLE_URL: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r#"url\(\s*['"]?([^'")]+?)['"]?\s*\)"#).ok());

static TITLE: Lazy<Option<Selector>> = Lazy::new(|| Selector::parse("title").ok());

static BASE_HREF: Lazy<Option<Selector>> = Lazy::new(|| Selector::parse("base[href]").ok());

fn parse_srcset(value: &str) -> Vec<String> {
    value
        .split(',')
        .filter_map(|candidate| candidate.split_whitespace().next())
        .map(str::to_string)
        .collect()
}

fn parse_style_urls(value: &str) -> Vec<String> {
    match STYLE_URL.as_ref() {
        Some(re) => re
            .captures_iter(value)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
            .collect(),
        None => Vec::new(),
    }
}

/// Returns true for references that never point at a fetchable resource
///
/// - `javascript:`, `mailto:`, `tel:`, `data:` schemes
/// - Fragment-only references (`#section`)
fn is_ignored_reference(raw: &str) -> bool {
    let raw = raw.trim();
    if raw.is_empty() || raw.starts_with('#') {
        return true;
    }

    let lower = raw.to_ascii_lowercase();
    ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
}

/// A parsed HTML document ready for link extraction
///
/// Holds the parsed tree, so it is not `Send`; parse, extract and drop it
/// within one synchronous scope.
pub struct ParsedPage {
    document: Html,
    base: Url,
}

/// Parses fetched bytes as HTML
///
/// Invalid UTF-8 is replaced rather than rejected. A `<base href>` in the
/// document overrides `page_url` as the base for resolving references.
///
/// # Example
///
/// ```
/// use web_grabber::crawler::extract;
/// use url::Url;
///
/// let html = br#"<html><head><title>Test</title></head><body><a href="/page">Link</a></body></html>"#;
/// let page_url = Url::parse("https://example.com/").unwrap();
/// let page = extract(html, &page_url);
/// assert_eq!(page.title(), Some("Test".to_string()));
/// assert_eq!(page.links().count(), 1);
/// ```
pub fn extract(html: &[u8], page_url: &Url) -> ParsedPage {
    let text = String::from_utf8_lossy(html);
    let document = Html::parse_document(&text);

    let base = BASE_HREF
        .as_ref()
        .and_then(|selector| document.select(selector).next())
        .and_then(|element| element.value().attr("href"))
        .and_then(|href| normalize(href, page_url).ok())
        .unwrap_or_else(|| page_url.clone());

    ParsedPage { document, base }
}

impl ParsedPage {
    /// Base URL references are resolved against
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// The page title (from the `<title>` tag)
    pub fn title(&self) -> Option<String> {
        let selector = TITLE.as_ref()?;
        self.document
            .select(selector)
            .next()
            .map(|element| element.text().collect::<String>().trim().to_string())
            .filter(|s| !s.is_empty())
    }

    /// Lazily yields every child reference on the page
    ///
    /// Each call starts a fresh pass over the document. Ignored references
    /// are skipped silently; references that fail to normalize are yielded
    /// as `Err`. The same URL may appear more than once.
    pub fn links(&self) -> impl Iterator<Item = Result<ExtractedLink, UrlError>> + '_ {
        LINK_RULES.iter().flat_map(move |rule| {
            self.document.select(&rule.selector).flat_map(move |element| {
                rule.references(element.value())
                    .into_iter()
                    .filter(|raw| !is_ignored_reference(raw))
                    .map(move |raw| {
                        normalize(&raw, &self.base).map(|url| {
                            let kind = rule.kind.resolve(&url);
                            ExtractedLink {
                                url,
                                kind,
                                role: rule.role,
                            }
                        })
                    })
            })
        })
    }
}
