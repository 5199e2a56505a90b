use crate::UrlError;
use url::Url;

/// Resolves a raw reference against `base` and canonicalizes the result
///
/// # Normalization Steps
///
/// 1. Trim surrounding whitespace; reject empty references
/// 2. Resolve relative, root-relative and scheme-relative (`//host/x`)
///    references against `base`
/// 3. Reject schemes other than http and https
/// 4. Reject URLs without a host
/// 5. Lower-case scheme and host, drop default ports and resolve dot
///    segments (done by the `url` parser)
/// 6. Strip a trailing dot from the host
/// 7. Remove the fragment
/// 8. Remove an empty query string (trailing `?`)
///
/// Trailing slashes and query parameters are kept as-is: on a mirrored site
/// `/docs` and `/docs/` are different files, and so are `/list?page=1` and
/// `/list?page=2`.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use web_grabber::url::normalize;
///
/// let base = Url::parse("https://example.com/blog/post").unwrap();
/// let url = normalize("../about#team", &base).unwrap();
/// assert_eq!(url.as_str(), "https://example.com/about");
/// ```
pub fn normalize(raw: &str, base: &Url) -> Result<Url, UrlError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(UrlError::Empty);
    }

    let url = base.join(raw).map_err(|e| UrlError::Parse(e.to_string()))?;
    canonicalize(url)
}

/// Parses and canonicalizes an absolute URL, such as a seed
///
/// Applies the same rules as [`normalize`], but there is no base to resolve
/// against, so relative references are rejected.
pub fn normalize_absolute(raw: &str) -> Result<Url, UrlError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(UrlError::Empty);
    }

    let url = Url::parse(raw).map_err(|e| UrlError::Parse(e.to_string()))?;
    canonicalize(url)
}

fn canonicalize(mut url: Url) -> Result<Url, UrlError> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    let host = match url.host_str() {
        Some(host) if !host.is_empty() => host.to_string(),
        _ => return Err(UrlError::MissingDomain),
    };

    if let Some(stripped) = host.strip_suffix('.') {
        if stripped.is_empty() {
            return Err(UrlError::MissingDomain);
        }
        url.set_host(Some(stripped))
            .map_err(|e| UrlError::Malformed(format!("Failed to set host: {}", e)))?;
    }

    url.set_fragment(None);

    if url.query() == Some("") {
        url.set_query(None);
    }

    Ok(url)
}
