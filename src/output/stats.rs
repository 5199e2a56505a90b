//! Live crawl counters and their printable form
//!
//! Workers bump the counters in [`CrawlStats`] concurrently; a
//! [`StatsSnapshot`] is a plain copy taken for reporting.

use crate::output::CrawlSummary;
use crate::url::ResourceKind;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic crawl counters shared by all workers
#[derive(Debug, Default)]
pub struct CrawlStats {
    fetched: AtomicU64,
    pages_saved: AtomicU64,
    images_saved: AtomicU64,
    videos_saved: AtomicU64,
    other_saved: AtomicU64,
    fetch_failures: AtomicU64,
    write_failures: AtomicU64,
    invalid_urls: AtomicU64,
    out_of_scope: AtomicU64,
    depth_exceeded: AtomicU64,
    retries: AtomicU64,
    completed: AtomicU64,
}

impl CrawlStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// A resource was retrieved successfully (before it is stored)
    pub fn record_fetched(&self) {
        self.fetched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_saved(&self, kind: ResourceKind) {
        let counter = match kind {
            ResourceKind::Page => &self.pages_saved,
            ResourceKind::Image => &self.images_saved,
            ResourceKind::Video => &self.videos_saved,
            ResourceKind::Other => &self.other_saved,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fetch_failure(&self) {
        self.fetch_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_write_failure(&self) {
        self.write_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_invalid_url(&self) {
        self.invalid_urls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_out_of_scope(&self) {
        self.out_of_scope.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_depth_exceeded(&self) {
        self.depth_exceeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_retries(&self, retries: u32) {
        if retries > 0 {
            self.retries.fetch_add(u64::from(retries), Ordering::Relaxed);
        }
    }

    /// Marks one task as fully processed and returns the new total
    pub fn record_completed(&self) -> u64 {
        self.completed.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            fetched: self.fetched.load(Ordering::Relaxed),
            pages_saved: self.pages_saved.load(Ordering::Relaxed),
            images_saved: self.images_saved.load(Ordering::Relaxed),
            videos_saved: self.videos_saved.load(Ordering::Relaxed),
            other_saved: self.other_saved.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            write_failures: self.write_failures.load(Ordering::Relaxed),
            invalid_urls: self.invalid_urls.load(Ordering::Relaxed),
            out_of_scope: self.out_of_scope.load(Ordering::Relaxed),
            depth_exceeded: self.depth_exceeded.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`CrawlStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Resources retrieved successfully
    pub fetched: u64,
    pub pages_saved: u64,
    pub images_saved: u64,
    pub videos_saved: u64,
    pub other_saved: u64,
    /// URLs abandoned after a terminal or exhausted fetch failure
    pub fetch_failures: u64,
    pub write_failures: u64,
    pub invalid_urls: u64,
    pub out_of_scope: u64,
    /// URLs discovered beyond the depth ceiling
    pub depth_exceeded: u64,
    /// Extra fetch attempts made after transient failures
    pub retries: u64,
    /// Tasks that left a worker, whatever their outcome
    pub completed: u64,
}

impl StatsSnapshot {
    pub fn saved(&self, kind: ResourceKind) -> u64 {
        match kind {
            ResourceKind::Page => self.pages_saved,
            ResourceKind::Image => self.images_saved,
            ResourceKind::Video => self.videos_saved,
            ResourceKind::Other => self.other_saved,
        }
    }

    pub fn total_saved(&self) -> u64 {
        self.pages_saved + self.images_saved + self.videos_saved + self.other_saved
    }

    pub fn total_failures(&self) -> u64 {
        self.fetch_failures + self.write_failures
    }
}

/// Prints a crawl summary to stdout in a formatted manner
pub fn print_summary(summary: &CrawlSummary) {
    let stats = &summary.stats;

    println!("=== Crawl Summary ===\n");

    println!("Overview:");
    println!("  Seed: {}", summary.seed);
    println!("  Output: {}", summary.output_dir.display());
    println!("  Duration: {:.1}s", summary.duration_seconds);
    println!("  Final phase: {}", summary.phase);
    if summary.cancelled {
        println!("  Crawl was cancelled before the frontier drained");
    }
    println!();

    println!("Resources:");
    println!("  URLs admitted: {}", summary.urls_admitted);
    println!("  Fetched: {}", stats.fetched);
    for kind in ResourceKind::ALL {
        println!("  Saved ({}): {}", kind, stats.saved(kind));
    }
    println!();

    println!("Skipped:");
    println!("  Out of scope: {}", stats.out_of_scope);
    println!("  Beyond max depth: {}", stats.depth_exceeded);
    println!("  Invalid URLs: {}", stats.invalid_urls);
    println!();

    if stats.total_failures() > 0 {
        println!("Failures:");
        println!("  Fetch failures: {}", stats.fetch_failures);
        println!("  Write failures: {}", stats.write_failures);
        println!("  Retries: {}", stats.retries);
        println!();
    }

    let success_rate = if stats.completed > 0 {
        (stats.total_saved() as f64 / stats.completed as f64) * 100.0
    } else {
        0.0
    };

    println!(
        "Success Rate: {:.1}% ({} / {} tasks saved)",
        success_rate,
        stats.total_saved(),
        stats.completed
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let stats = CrawlStats::new();
        stats.record_fetched();
        stats.record_fetched();
        stats.record_saved(ResourceKind::Page);
        stats.record_saved(ResourceKind::Image);
        stats.record_saved(ResourceKind::Image);
        stats.record_fetch_failure();
        stats.record_retries(2);
        stats.record_retries(0);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.fetched, 2);
        assert_eq!(snapshot.saved(ResourceKind::Page), 1);
        assert_eq!(snapshot.saved(ResourceKind::Image), 2);
        assert_eq!(snapshot.total_saved(), 3);
        assert_eq!(snapshot.total_failures(), 1);
        assert_eq!(snapshot.retries, 2);
    }

    #[test]
    fn test_record_completed_returns_total() {
        let stats = CrawlStats::new();
        assert_eq!(stats.record_completed(), 1);
        assert_eq!(stats.record_completed(), 2);
        assert_eq!(stats.snapshot().completed, 2);
    }

    #[test]
    fn test_concurrent_updates() {
        let stats = std::sync::Arc::new(CrawlStats::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let stats = stats.clone();
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        stats.record_fetched();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(stats.snapshot().fetched, 8000);
    }

    #[test]
    fn test_snapshot_serializes() {
        let snapshot = StatsSnapshot {
            fetched: 3,
            ..StatsSnapshot::default()
        };
        let json = serde_json::to_value(snapshot).unwrap();
        assert_eq!(json["fetched"], 3);
        assert_eq!(json["write_failures"], 0);
    }
}
