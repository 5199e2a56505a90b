use crate::UrlError;
use serde::Serialize;
use url::Url;

/// Which hosts count as part of the crawled site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScopePolicy {
    /// Only the seed host itself
    #[default]
    SameHost,
    /// The seed host and any of its subdomains
    IncludeSubdomains,
}

/// The crawl boundary, anchored on the seed host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    host: String,
    policy: ScopePolicy,
}

impl Scope {
    /// Creates a scope for the given host
    pub fn new(host: impl Into<String>, policy: ScopePolicy) -> Self {
        let host = host.into().to_lowercase();
        let host = host.trim_end_matches('.').to_string();
        Self { host, policy }
    }

    /// Creates a scope anchored on the host of a seed URL
    pub fn from_seed(seed: &Url, policy: ScopePolicy) -> Result<Self, UrlError> {
        let host = seed.host_str().ok_or(UrlError::MissingDomain)?;
        Ok(Self::new(host, policy))
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn policy(&self) -> ScopePolicy {
        self.policy
    }

    /// Returns true if the URL belongs to the crawled site
    ///
    /// Only the host is compared; scheme and port are ignored so that
    /// `http://` and `https://` links into the same site stay in scope.
    pub fn contains(&self, url: &Url) -> bool {
        match url.host_str() {
            Some(host) => self.matches_host(host),
            None => false,
        }
    }

    fn matches_host(&self, candidate: &str) -> bool {
        let candidate = candidate.trim_end_matches('.');
        if candidate.eq_ignore_ascii_case(&self.host) {
            return true;
        }

        match self.policy {
            ScopePolicy::SameHost => false,
            // "*.host" semantics: any number of labels in front of the seed host
            ScopePolicy::IncludeSubdomains => {
                let candidate = candidate.to_lowercase();
                candidate
                    .strip_suffix(&self.host)
                    .map(|prefix| prefix.len() > 1 && prefix.ends_with('.'))
                    .unwrap_or(false)
            }
        }
    }
}

/// Returns true iff the URL's host is within the crawl scope
pub fn in_scope(url: &Url, scope: &Scope) -> bool {
    scope.contains(url)
}
