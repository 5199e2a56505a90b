//! Worker pool and per-task processing
//!
//! A fixed number of workers pull tasks from the shared [`Frontier`]. Each
//! task goes through the same steps:
//! 1. Rate-limited fetch with retries
//! 2. For pages: extract children, scope-check them, admit them
//! 3. Persist the payload on the blocking pool
//! 4. Update stats
//!
//! Failures of a single task are recorded and never stop the crawl.

use crate::config::{CrawlConfig, RateLimitScope};
use crate::crawler::fetcher::{FetchResult, FetchedResource, Fetcher};
use crate::crawler::frontier::{Admission, CrawlTask, Frontier, NextTask};
use crate::crawler::parser::{extract, ExtractedLink, LinkRole};
use crate::crawler::rate_limiter::RateLimiter;
use crate::crawler::retry::fetch_with_retry;
use crate::output::{CrawlLedger, CrawlStats};
use crate::state::{CrawlPhase, PhaseCell};
use crate::storage::Storage;
use crate::url::ResourceKind;
use crate::{GrabError, UrlError};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use url::Url;

/// How long an idle worker waits before re-checking the frontier
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Log a progress line every this many completed tasks
const PROGRESS_EVERY: u64 = 10;

/// Everything the workers of one crawl share
///
/// Created once per crawl and handed to every worker behind an `Arc`; there
/// is no other shared state.
pub struct CrawlContext {
    pub config: Arc<CrawlConfig>,
    pub frontier: Frontier,
    pub stats: CrawlStats,
    pub ledger: CrawlLedger,
    pub rate_limiter: RateLimiter,
    pub fetcher: Arc<dyn Fetcher>,
    pub storage: Arc<dyn Storage>,
    pub phase: PhaseCell,
    pub cancel: CancellationToken,
}

impl CrawlContext {
    pub fn new(
        config: Arc<CrawlConfig>,
        fetcher: Arc<dyn Fetcher>,
        storage: Arc<dyn Storage>,
    ) -> Self {
        let rate_limiter = RateLimiter::new(config.delay);
        Self {
            config,
            frontier: Frontier::new(),
            stats: CrawlStats::new(),
            ledger: CrawlLedger::new(),
            rate_limiter,
            fetcher,
            storage,
            phase: PhaseCell::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Offers a URL to the frontier and records why it was not queued
    pub fn admit(&self, task: CrawlTask) -> Admission {
        let url = task.url().clone();
        let depth = task.depth();
        let admission = self.frontier.admit(task, self.config.max_depth);
        match admission {
            Admission::Enqueued => tracing::trace!("Queued {} (depth {})", url, depth),
            Admission::BeyondDepth => {
                self.stats.record_depth_exceeded();
                tracing::debug!("Not following {}: depth {} exceeds max", url, depth);
            }
            Admission::Duplicate | Admission::Closed => {}
        }
        admission
    }

    fn rate_key(&self, url: &Url, worker_id: usize) -> String {
        match self.config.rate_limit {
            RateLimitScope::PerDomain => url.host_str().unwrap_or_default().to_string(),
            RateLimitScope::PerWorker => format!("worker-{}", worker_id),
        }
    }
}

/// Runs the worker pool until the frontier drains or the crawl is cancelled
///
/// Returns the final phase, which is always `Terminated`.
pub async fn run_workers(ctx: Arc<CrawlContext>) -> Result<CrawlPhase, GrabError> {
    ctx.phase.transition(CrawlPhase::Running)?;
    tracing::info!(
        "Starting {} workers (max depth {}, delay {:?})",
        ctx.config.max_threads,
        ctx.config.max_depth,
        ctx.config.delay
    );

    let mut workers = JoinSet::new();
    for id in 0..ctx.config.max_threads {
        workers.spawn(worker_loop(ctx.clone(), id));
    }

    while let Some(result) = workers.join_next().await {
        if let Err(e) = result {
            tracing::error!("Worker task failed: {}", e);
        }
    }

    if ctx.cancel.is_cancelled() {
        ctx.frontier.close();
        tracing::info!(
            "Crawl cancelled with {} tasks still queued",
            ctx.frontier.pending_len()
        );
    } else {
        ctx.phase.transition(CrawlPhase::Draining)?;
    }

    ctx.phase.transition(CrawlPhase::Terminated)?;
    Ok(CrawlPhase::Terminated)
}

async fn worker_loop(ctx: Arc<CrawlContext>, id: usize) {
    tracing::trace!("[worker {}] started", id);

    loop {
        let next = tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => break,
            next = ctx.frontier.next(POLL_INTERVAL) => next,
        };

        let guard = match next {
            NextTask::Task(guard) => guard,
            NextTask::Drained => {
                // benign if another worker got there first
                let _ = ctx.phase.transition(CrawlPhase::Draining);
                break;
            }
            NextTask::Closed => break,
        };

        tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => {
                tracing::debug!("[worker {}] abandoning {}", id, guard.task().url());
                break;
            }
            _ = process_task(&ctx, id, guard.task()) => {}
        }

        // children are admitted before the task is released
        drop(guard);

        let done = ctx.stats.record_completed();
        if done % PROGRESS_EVERY == 0 {
            let snapshot = ctx.stats.snapshot();
            tracing::info!(
                "Progress: {} tasks done, {} saved, {} failed, {} queued, {} in flight",
                done,
                snapshot.total_saved(),
                snapshot.total_failures(),
                ctx.frontier.pending_len(),
                ctx.frontier.in_flight_len()
            );
        }
    }

    tracing::trace!("[worker {}] exiting", id);
}

/// Fetches, expands and stores a single task
pub async fn process_task(ctx: &CrawlContext, worker_id: usize, task: &CrawlTask) {
    let url = task.url();
    tracing::debug!("[worker {}] Fetching {} (depth {})", worker_id, url, task.depth());

    let key = ctx.rate_key(url, worker_id);
    let outcome = fetch_with_retry(
        ctx.fetcher.as_ref(),
        &ctx.rate_limiter,
        &key,
        url,
        ctx.config.timeout,
        &ctx.config.retry,
    )
    .await;
    ctx.stats.record_retries(outcome.retries());

    let resource = match outcome.result {
        FetchResult::Success(resource) => resource,
        FetchResult::Failure(failure) => {
            ctx.stats.record_fetch_failure();
            ctx.ledger.record_failure(url.as_str(), failure.kind.to_string());
            tracing::warn!(
                "Failed to fetch {} after {} attempt(s): {}",
                url,
                outcome.attempts,
                failure.kind
            );
            return;
        }
    };
    ctx.stats.record_fetched();

    // a redirect may leave the site; nothing off-site is stored
    if !ctx.config.scope.contains(&resource.final_url) {
        if ctx.ledger.record_out_of_scope(resource.final_url.as_str()) {
            ctx.stats.record_out_of_scope();
        }
        tracing::debug!("{} redirected out of scope to {}", url, resource.final_url);
        return;
    }

    let kind = effective_kind(task, &resource);

    if kind == ResourceKind::Page && (ctx.config.follow_links || ctx.config.download_resources) {
        let (title, children) = extract_children(&resource.body, &resource.final_url);
        if let Some(title) = title {
            tracing::debug!("{}: \"{}\"", url, title);
        }
        admit_children(ctx, task, children);
    }

    persist(ctx, task, resource.body, kind).await;
}

/// Kind the response says it is, falling back to sniffing and then to the
/// kind guessed from the URL
fn effective_kind(task: &CrawlTask, resource: &FetchedResource) -> ResourceKind {
    resource
        .content_type
        .as_deref()
        .and_then(ResourceKind::from_content_type)
        .unwrap_or_else(|| {
            if looks_like_html(&resource.body) {
                ResourceKind::Page
            } else {
                task.kind()
            }
        })
}

fn looks_like_html(body: &[u8]) -> bool {
    let head = &body[..body.len().min(512)];
    let head = String::from_utf8_lossy(head).trim_start().to_ascii_lowercase();
    head.starts_with("<!doctype html") || head.starts_with("<html")
}

/// Parses a page and collects its child references
///
/// Kept synchronous: the parsed document is not `Send` and must not live
/// across an await point.
fn extract_children(
    body: &[u8],
    base: &Url,
) -> (Option<String>, Vec<Result<ExtractedLink, UrlError>>) {
    let page = extract(body, base);
    (page.title(), page.links().collect())
}

fn admit_children(
    ctx: &CrawlContext,
    parent: &CrawlTask,
    children: Vec<Result<ExtractedLink, UrlError>>,
) {
    let mut queued = 0;

    for child in children {
        let link = match child {
            Ok(link) => link,
            Err(e) => {
                ctx.stats.record_invalid_url();
                tracing::warn!("Dropping invalid URL on {}: {}", parent.url(), e);
                continue;
            }
        };

        let is_page = link.kind == ResourceKind::Page;
        if (is_page && !ctx.config.follow_links) || (!is_page && !ctx.config.download_resources)
        {
            continue;
        }

        if !ctx.config.scope.contains(&link.url) {
            if ctx.ledger.record_out_of_scope(link.url.as_str()) {
                ctx.stats.record_out_of_scope();
                tracing::debug!("Out of scope: {}", link.url);
            }
            continue;
        }

        let depth = child_depth(parent, link.role);
        let task = CrawlTask::new(link.url, depth, link.kind).with_role(link.role);

        match ctx.admit(task) {
            Admission::Enqueued => queued += 1,
            Admission::Closed => break,
            Admission::Duplicate | Admission::BeyondDepth => {}
        }
    }

    if queued > 0 {
        tracing::debug!("Queued {} new URLs from {}", queued, parent.url());
    }
}

/// Navigation is one hop deeper. An embedded resource shares the depth of
/// the page embedding it, unless that page was itself reached by embedding.
fn child_depth(parent: &CrawlTask, role: LinkRole) -> u32 {
    match (role, parent.role()) {
        (LinkRole::Embedded, LinkRole::Navigation) => parent.depth(),
        _ => parent.depth() + 1,
    }
}

async fn persist(ctx: &CrawlContext, task: &CrawlTask, body: Vec<u8>, kind: ResourceKind) {
    let storage = ctx.storage.clone();
    let url = task.url().clone();

    let result = tokio::task::spawn_blocking(move || storage.save(&url, &body, kind)).await;

    match result {
        Ok(Ok(path)) => {
            ctx.stats.record_saved(kind);
            tracing::debug!("Saved {} -> {}", task.url(), path.display());
        }
        Ok(Err(e)) => {
            ctx.stats.record_write_failure();
            ctx.ledger
                .record_failure(task.url().as_str(), format!("write error: {}", e));
            tracing::warn!("Failed to save {}: {}", task.url(), e);
        }
        Err(e) => {
            ctx.stats.record_write_failure();
            ctx.ledger
                .record_failure(task.url().as_str(), format!("write task failed: {}", e));
            tracing::error!("Storage task for {} failed: {}", task.url(), e);
        }
    }
}
