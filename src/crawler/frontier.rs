//! Shared work queue with deduplication and drain detection
//!
//! The queue, the visited set and the in-flight counter live behind one
//! mutex so that "is there more work?" is always answered from a consistent
//! view: the crawl is drained only when the queue is empty *and* no worker
//! still holds a task that might discover more.

use crate::crawler::parser::LinkRole;
use crate::url::ResourceKind;
use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;
use url::Url;

/// A unit of crawl work: fetch `url`, found at `depth`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTask {
    url: Url,
    depth: u32,
    kind: ResourceKind,
    role: LinkRole,
}

impl CrawlTask {
    pub fn new(url: Url, depth: u32, kind: ResourceKind) -> Self {
        Self {
            url,
            depth,
            kind,
            role: LinkRole::Navigation,
        }
    }

    /// Sets how the task was reached from its parent page
    pub fn with_role(mut self, role: LinkRole) -> Self {
        self.role = role;
        self
    }

    /// The seed task: depth 0, expected to be a page
    pub fn seed(url: Url) -> Self {
        Self::new(url, 0, ResourceKind::Page)
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Kind guessed at discovery time; the response may override it
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn role(&self) -> LinkRole {
        self.role
    }
}

/// Outcome of offering a task to the frontier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// First sighting; queued for fetching
    Enqueued,
    /// Already admitted earlier in this crawl
    Duplicate,
    /// First sighting, but deeper than the ceiling; remembered, never fetched
    BeyondDepth,
    /// The frontier was closed by cancellation
    Closed,
}

#[derive(Debug, Default)]
struct FrontierState {
    queue: VecDeque<CrawlTask>,
    visited: HashSet<String>,
    in_flight: usize,
    closed: bool,
}

#[derive(Debug, Default)]
pub struct Frontier {
    state: Mutex<FrontierState>,
    notify: Notify,
}

/// A task checked out of the frontier
///
/// Dropping the guard marks the task complete, whatever path the worker
/// took, so the in-flight count cannot leak.
#[derive(Debug)]
pub struct InFlight<'a> {
    frontier: &'a Frontier,
    task: CrawlTask,
}

impl InFlight<'_> {
    pub fn task(&self) -> &CrawlTask {
        &self.task
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.frontier.complete();
    }
}

/// Result of asking the frontier for work
#[derive(Debug)]
pub enum NextTask<'a> {
    Task(InFlight<'a>),
    /// Queue empty and nothing in flight: the crawl is over
    Drained,
    Closed,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FrontierState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Offers a task; it is queued only the first time its URL is seen
    ///
    /// Tasks deeper than `max_depth` are added to the visited set so they are
    /// never reconsidered, but are not queued.
    pub fn admit(&self, task: CrawlTask, max_depth: u32) -> Admission {
        let mut state = self.lock();
        if state.closed {
            return Admission::Closed;
        }

        if !state.visited.insert(task.url.as_str().to_string()) {
            return Admission::Duplicate;
        }

        if task.depth > max_depth {
            return Admission::BeyondDepth;
        }

        state.queue.push_back(task);
        drop(state);

        self.notify.notify_one();
        Admission::Enqueued
    }

    /// Takes the next task, waiting while other workers may still add work
    ///
    /// The wait is re-checked at least every `poll` even without a wakeup.
    pub async fn next(&self, poll: Duration) -> NextTask<'_> {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // register before looking, so a notify between the check and the
            // await is not lost
            notified.as_mut().enable();

            {
                let mut state = self.lock();
                if state.closed {
                    return NextTask::Closed;
                }
                if let Some(task) = state.queue.pop_front() {
                    state.in_flight += 1;
                    return NextTask::Task(InFlight {
                        frontier: self,
                        task,
                    });
                }
                if state.in_flight == 0 {
                    return NextTask::Drained;
                }
            }

            let _ = tokio::time::timeout(poll, notified).await;
        }
    }

    fn complete(&self) {
        let mut state = self.lock();
        state.in_flight = state.in_flight.saturating_sub(1);
        let drained = state.in_flight == 0 && state.queue.is_empty();
        drop(state);

        if drained {
            self.notify.notify_waiters();
        }
    }

    /// Stops handing out and accepting work
    pub fn close(&self) {
        self.lock().closed = true;
        self.notify.notify_waiters();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Number of distinct URLs ever admitted, including those beyond depth
    pub fn visited_len(&self) -> usize {
        self.lock().visited.len()
    }

    pub fn is_visited(&self, url: &Url) -> bool {
        self.lock().visited.contains(url.as_str())
    }

    pub fn pending_len(&self) -> usize {
        self.lock().queue.len()
    }

    pub fn in_flight_len(&self) -> usize {
        self.lock().in_flight
    }
}
