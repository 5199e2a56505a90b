//! Per-URL record of what went wrong during a crawl
//!
//! Counters live in [`crate::output::CrawlStats`]; the ledger keeps the
//! URLs themselves so they can be written to `failed_urls.txt` and the crawl
//! report. Both collections are ordered so that output is deterministic.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, PoisonError};

/// A URL that could not be fetched or stored, with the last reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedUrl {
    pub url: String,
    pub reason: String,
}

#[derive(Debug, Default)]
struct LedgerInner {
    failures: BTreeMap<String, String>,
    out_of_scope: BTreeSet<String>,
}

/// Shared ledger of failed and out-of-scope URLs
#[derive(Debug, Default)]
pub struct CrawlLedger {
    inner: Mutex<LedgerInner>,
}

impl CrawlLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a failure; a later failure for the same URL replaces the reason
    pub fn record_failure(&self, url: &str, reason: impl Into<String>) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.failures.insert(url.to_string(), reason.into());
    }

    /// Records an out-of-scope URL; returns false if it was already known
    pub fn record_out_of_scope(&self, url: &str) -> bool {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.out_of_scope.insert(url.to_string())
    }

    /// Failed URLs in sorted order
    pub fn failed_urls(&self) -> Vec<String> {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.failures.keys().cloned().collect()
    }

    pub fn failures(&self) -> Vec<FailedUrl> {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner
            .failures
            .iter()
            .map(|(url, reason)| FailedUrl {
                url: url.clone(),
                reason: reason.clone(),
            })
            .collect()
    }

    /// Out-of-scope URLs in sorted order
    pub fn out_of_scope(&self) -> Vec<String> {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.out_of_scope.iter().cloned().collect()
    }

    pub fn has_failures(&self) -> bool {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        !inner.failures.is_empty()
    }
}
