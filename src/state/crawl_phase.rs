//! Lifecycle phases of a single crawl
//!
//! A crawl moves strictly forward through these phases:
//! `Idle -> Running -> Draining -> Terminated`. It may also jump straight to
//! `Terminated` when cancelled, either before it starts or while running.

use serde::Serialize;
use std::fmt;

/// Represents the current phase of a crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CrawlPhase {
    /// Seed pushed, no worker started yet
    Idle,

    /// Workers are pulling tasks from the frontier
    Running,

    /// Frontier empty and nothing in flight; workers are exiting
    Draining,

    /// Final; stats no longer change
    Terminated,
}

impl CrawlPhase {
    /// Returns true if no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminated)
    }

    /// Returns true if moving from `self` to `next` is a legal transition
    ///
    /// Staying in the same phase is always allowed and is a no-op.
    pub fn can_transition_to(&self, next: CrawlPhase) -> bool {
        if *self == next {
            return true;
        }

        matches!(
            (self, next),
            (Self::Idle, Self::Running)
                | (Self::Idle, Self::Terminated)
                | (Self::Running, Self::Draining)
                | (Self::Running, Self::Terminated)
                | (Self::Draining, Self::Terminated)
        )
    }

    /// Returns the string representation used in reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Draining => "draining",
            Self::Terminated => "terminated",
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
