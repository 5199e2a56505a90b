use serde::Serialize;
use std::fmt;
use url::Url;

const PAGE_EXTENSIONS: &[&str] = &[
    "html", "htm", "xhtml", "shtml", "php", "asp", "aspx", "jsp", "cfm",
];

const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "svg", "webp", "bmp", "ico", "tif", "tiff", "avif",
];

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "avi", "mov", "wmv", "flv", "mkv", "ogv", "m4v"];

/// Category of a fetched resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// An HTML document; the only kind that is parsed for links
    Page,
    Image,
    Video,
    /// Documents, stylesheets, scripts, audio, archives and anything else
    Other,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 4] = [Self::Page, Self::Image, Self::Video, Self::Other];

    /// Classifies a URL by the extension of its last path segment
    ///
    /// URLs without an extension are assumed to be pages, since that is how
    /// most sites route their HTML.
    pub fn from_url(url: &Url) -> Self {
        match extension_of(url) {
            None => Self::Page,
            Some(ext) => Self::from_extension(&ext),
        }
    }

    /// Classifies a lower-case file extension (without the dot)
    pub fn from_extension(ext: &str) -> Self {
        if PAGE_EXTENSIONS.contains(&ext) {
            Self::Page
        } else if IMAGE_EXTENSIONS.contains(&ext) {
            Self::Image
        } else if VIDEO_EXTENSIONS.contains(&ext) {
            Self::Video
        } else {
            Self::Other
        }
    }

    /// Classifies a `Content-Type` header value
    ///
    /// Returns `None` for an empty value so the caller can fall back to the
    /// URL-based guess.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();

        if mime.is_empty() {
            return None;
        }

        let kind = if mime == "text/html" || mime == "application/xhtml+xml" {
            Self::Page
        } else if mime.starts_with("image/") {
            Self::Image
        } else if mime.starts_with("video/") {
            Self::Video
        } else {
            Self::Other
        };
        Some(kind)
    }

    /// Extension used for stored files whose URL carries none
    pub fn default_extension(&self) -> &'static str {
        match self {
            Self::Page => "html",
            Self::Image => "jpg",
            Self::Video => "mp4",
            Self::Other => "bin",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Page => "page",
            Self::Image => "image",
            Self::Video => "video",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lower-case extension of the URL's last path segment, if it has one
pub fn extension_of(url: &Url) -> Option<String> {
    let last = url.path_segments()?.last()?;
    let (stem, ext) = last.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}
