//! Crawl orchestration
//!
//! [`Crawler`] owns the setup that can fail (config validation and opening
//! the output root) and then hands a fully built [`CrawlContext`] to the
//! worker pool. Once `run` starts, nothing short of
//! a bug makes it return an error: per-URL failures end up in the summary.

use crate::config::{validate_crawl_config, CrawlConfig};
use crate::crawler::fetcher::{Fetcher, HttpFetcher};
use crate::crawler::frontier::{Admission, CrawlTask};
use crate::crawler::scheduler::{run_workers, CrawlContext};
use crate::output::{load_failed_urls, write_failed_urls, write_report, CrawlSummary};
use crate::storage::{FsStorage, Storage};
use crate::url::{normalize_absolute, ResourceKind};
use crate::GrabError;
use chrono::Utc;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// A configured, ready-to-run crawl
pub struct Crawler {
    ctx: Arc<CrawlContext>,
}

impl Crawler {
    /// Validates `config` and opens the output root
    ///
    /// # Errors
    ///
    /// Returns an error, without fetching anything, if the configuration is
    /// invalid or the output root cannot be created or written.
    pub fn new(config: CrawlConfig, fetcher: Arc<dyn Fetcher>) -> Result<Self, GrabError> {
        validate_crawl_config(&config)?;

        let storage = FsStorage::open(config.output_dir.clone()).map_err(|e| {
            tracing::error!("Output directory is not usable: {}", e);
            e
        })?;

        Ok(Self::with_storage(config, fetcher, Arc::new(storage)))
    }

    /// Builds a crawler over an already opened storage backend
    ///
    /// The configuration is assumed to be valid.
    pub fn with_storage(
        config: CrawlConfig,
        fetcher: Arc<dyn Fetcher>,
        storage: Arc<dyn Storage>,
    ) -> Self {
        Self {
            ctx: Arc::new(CrawlContext::new(Arc::new(config), fetcher, storage)),
        }
    }

    /// Token that stops the crawl when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.ctx.cancel.clone()
    }

    pub fn context(&self) -> &Arc<CrawlContext> {
        &self.ctx
    }

    /// Runs the crawl to completion or cancellation
    pub async fn run(self) -> Result<CrawlSummary, GrabError> {
        let ctx = self.ctx;
        let config = ctx.config.clone();
        let started_at = Utc::now();
        let timer = std::time::Instant::now();

        tracing::info!(
            "Grabbing {} into {}",
            config.seed,
            config.output_dir.display()
        );

        ctx.admit(CrawlTask::seed(config.seed.clone()));
        if config.retry_failed {
            seed_failed_urls(&ctx);
        }

        let phase = run_workers(ctx.clone()).await?;
        let cancelled = ctx.cancel.is_cancelled();

        let summary = CrawlSummary {
            seed: config.seed.to_string(),
            output_dir: config.output_dir.clone(),
            started_at,
            finished_at: Utc::now(),
            duration_seconds: timer.elapsed().as_secs_f64(),
            phase,
            cancelled,
            urls_admitted: ctx.frontier.visited_len(),
            stats: ctx.stats.snapshot(),
            failures: ctx.ledger.failures(),
            out_of_scope: ctx.ledger.out_of_scope(),
        };

        if let Err(e) = write_failed_urls(ctx.storage.root(), &ctx.ledger.failed_urls()) {
            tracing::warn!("Failed to write failed URL list: {}", e);
        }
        match write_report(ctx.storage.root(), &summary) {
            Ok(paths) => {
                for path in paths {
                    tracing::debug!("Wrote {}", path.display());
                }
            }
            Err(e) => tracing::warn!("Failed to write crawl report: {}", e),
        }

        tracing::info!(
            "Crawl {} after {:.1}s: {} saved, {} failed",
            if cancelled { "cancelled" } else { "finished" },
            summary.duration_seconds,
            summary.stats.total_saved(),
            summary.stats.total_failures()
        );

        Ok(summary)
    }
}

/// Re-queues the URLs listed in the previous run's `failed_urls.txt`
fn seed_failed_urls(ctx: &CrawlContext) {
    let urls = match load_failed_urls(ctx.storage.root()) {
        Ok(urls) => urls,
        Err(e) => {
            tracing::warn!("Could not read previous failures: {}", e);
            return;
        }
    };

    let mut queued = 0;
    for raw in urls {
        let url = match normalize_absolute(&raw) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("Skipping unreadable failed URL {}: {}", raw, e);
                continue;
            }
        };
        if !ctx.config.scope.contains(&url) {
            tracing::debug!("Skipping failed URL outside scope: {}", url);
            continue;
        }

        let kind = ResourceKind::from_url(&url);
        if ctx.admit(CrawlTask::new(url, 0, kind)) == Admission::Enqueued {
            queued += 1;
        }
    }

    if queued > 0 {
        tracing::info!("Retrying {} previously failed URLs", queued);
    }
}

/// Crawls with the default HTTP transport
pub async fn grab(config: CrawlConfig) -> Result<CrawlSummary, GrabError> {
    let fetcher = HttpFetcher::new(&config.user_agent)?;
    Crawler::new(config, Arc::new(fetcher))?.run().await
}
