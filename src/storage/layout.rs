//! Deterministic mapping from URLs to mirror paths
//!
//! `https://example.com:8080/docs/guide/intro.html` is stored at
//! `example.com_8080/docs/guide/intro.html` under the output root.
//!
//! The last path segment is used verbatim only when it is a plain file name:
//! it has an extension, there is no query string, it needs no escaping and
//! it cannot be mistaken for a generated name. Anything else gets a
//! generated name `<stem>-<hash>.<ext>`, where `hash` is the first 8 hex
//! digits of the SHA-256 of the last segment plus `?query`. That keeps
//! `/list?page=1`, `/list?page=2`, `/list` and `/list/` apart.

use crate::storage::{StorageError, StorageResult};
use crate::url::ResourceKind;
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use url::Url;

/// File name used for directory URLs (`/` and anything ending in `/`)
pub const INDEX_FILE: &str = "index.html";

/// Generated stems are cut to this many bytes
const MAX_STEM_LEN: usize = 100;

/// Directory segments longer than this are shortened with a hash suffix
const MAX_SEGMENT_LEN: usize = 200;

/// Bytes that may appear unescaped in a stored path segment
fn is_safe_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"-._~!$&'()+,;=@".contains(&b)
}

/// Percent-encodes every byte that is unsafe in a file name
///
/// `%` itself is encoded too, so a raw `*` (`%2A`) and an escaped `%2A` in
/// the URL (`%252A`) stay distinct.
fn sanitize_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for &b in segment.as_bytes() {
        if is_safe_byte(b) {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{:02X}", b));
        }
    }

    match out.as_str() {
        // never let a segment climb out of the mirror
        "." => "%2E".to_string(),
        ".." => "%2E%2E".to_string(),
        _ => out,
    }
}

/// First 8 hex digits of the SHA-256 of `input`
fn short_hash(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    hex::encode(&digest[..4])
}

/// Truncates an ASCII-safe string to at most `max` bytes
fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Splits a file name into stem and lower-cased extension
fn split_extension(name: &str) -> (&str, Option<String>) {
    match name.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && !ext.is_empty()
                && ext.len() <= 10
                && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            (stem, Some(ext.to_ascii_lowercase()))
        }
        _ => (name, None),
    }
}

/// True for names shaped like our own generated `<stem>-<8 hex>.<ext>`
fn looks_generated(name: &str) -> bool {
    let (stem, ext) = split_extension(name);
    if ext.is_none() {
        return false;
    }
    match stem.rsplit_once('-') {
        Some((_, hash)) => hash.len() == 8 && hash.bytes().all(|b| b.is_ascii_hexdigit()),
        None => false,
    }
}

/// Directory name for the URL's authority: the host, plus `_port` when the
/// port is not the scheme default
fn host_dir(url: &Url) -> StorageResult<String> {
    let host = url
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| StorageError::MissingHost(url.to_string()))?;

    let host = sanitize_segment(&host.to_ascii_lowercase());
    Ok(match url.port() {
        Some(port) => format!("{}_{}", host, port),
        None => host,
    })
}

fn dir_segment(segment: &str) -> String {
    if segment.is_empty() {
        return "_".to_string();
    }

    let safe = sanitize_segment(segment);
    if safe.len() > MAX_SEGMENT_LEN {
        format!("{}-{}", truncate(&safe, MAX_STEM_LEN), short_hash(segment))
    } else {
        safe
    }
}

fn file_name(last: &str, query: Option<&str>, kind: ResourceKind) -> String {
    if last.is_empty() && query.is_none() {
        return INDEX_FILE.to_string();
    }

    let safe = sanitize_segment(last);
    let (stem, ext) = split_extension(&safe);

    let verbatim = ext.is_some()
        && query.is_none()
        && safe == last
        && !last.eq_ignore_ascii_case(INDEX_FILE)
        && !looks_generated(last)
        && safe.len() <= MAX_SEGMENT_LEN;
    if verbatim {
        return safe;
    }

    let tail = match query {
        Some(q) => format!("{}?{}", last, q),
        None => last.to_string(),
    };
    let stem = if stem.is_empty() { "index" } else { stem };
    let ext = ext.unwrap_or_else(|| kind.default_extension().to_string());

    format!(
        "{}-{}.{}",
        truncate(stem, MAX_STEM_LEN),
        short_hash(&tail),
        ext
    )
}

/// Maps a URL to its path relative to the output root
///
/// The mapping is a pure function of the URL and the resource kind; the kind
/// only picks the extension of generated names that would otherwise have none.
pub fn relative_path(url: &Url, kind: ResourceKind) -> StorageResult<PathBuf> {
    let mut path = PathBuf::from(host_dir(url)?);

    let mut segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.collect())
        .unwrap_or_default();
    let last = segments.pop().unwrap_or("");

    for segment in segments {
        path.push(dir_segment(segment));
    }
    path.push(file_name(last, url.query(), kind));

    Ok(path)
}
