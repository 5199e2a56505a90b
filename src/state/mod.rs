//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlPhase`: the lifecycle of a crawl (idle, running, draining, terminated)
//! - `PhaseCell`: a shared, transition-checked holder for the current phase

mod crawl_phase;

pub use crawl_phase::CrawlPhase;

use crate::GrabError;
use std::sync::{Mutex, PoisonError};

/// Shared holder for the current crawl phase
///
/// Every change goes through [`PhaseCell::transition`], which rejects moves
/// the lifecycle does not allow.
#[derive(Debug)]
pub struct PhaseCell {
    phase: Mutex<CrawlPhase>,
}

impl PhaseCell {
    pub fn new() -> Self {
        Self {
            phase: Mutex::new(CrawlPhase::Idle),
        }
    }

    pub fn get(&self) -> CrawlPhase {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Moves to `next`, returning the previous phase
    pub fn transition(&self, next: CrawlPhase) -> Result<CrawlPhase, GrabError> {
        let mut phase = self.phase.lock().unwrap_or_else(PoisonError::into_inner);
        let from = *phase;
        if !from.can_transition_to(next) {
            return Err(GrabError::InvalidTransition { from, to: next });
        }
        if from != next {
            tracing::debug!("Crawl phase {} -> {}", from, next);
        }
        *phase = next;
        Ok(from)
    }
}

impl Default for PhaseCell {
    fn default() -> Self {
        Self::new()
    }
}
