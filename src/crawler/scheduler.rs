//! Scheduler for the exploration cadences and backoff policy
//!
//! This module decides, per explored ID:
//! - whether a progress write is due
//! - whether buffered categories must be flushed
//! - whether the run has seen enough consecutive not-found IDs to back off

use crate::config::ExplorerConfig;
use std::time::Duration;

/// Cadence and backoff bookkeeping for one run
///
/// The scheduler never sleeps itself; the explorer asks it what to do and
/// performs the waits.
#[derive(Debug, Clone)]
pub struct Scheduler {
    backoff_threshold: u32,
    backoff_cooldown: Duration,
    progress_every: u32,
    flush_every_categories: usize,
    flush_every_ids: u32,
    error_delay: Duration,

    /// Not-found responses since the last found page or backoff pause
    consecutive_not_found: u32,

    /// Buffer size at the last failed flush; those categories wait for the
    /// next cadence point
    failed_flush_size: usize,
}

impl Scheduler {
    pub fn new(config: &ExplorerConfig) -> Self {
        Self {
            backoff_threshold: config.backoff_threshold,
            backoff_cooldown: config.backoff_cooldown(),
            progress_every: config.progress_every.max(1),
            flush_every_categories: config.flush_every_categories.max(1),
            flush_every_ids: config.flush_every_ids.max(1),
            error_delay: config.error_delay(),
            consecutive_not_found: 0,
            failed_flush_size: 0,
        }
    }

    /// Records a not-found ID
    ///
    /// Returns true once the counter exceeds the threshold, meaning the caller
    /// must pause for `backoff_cooldown` and then call `reset_after_backoff`.
    pub fn record_not_found(&mut self) -> bool {
        self.consecutive_not_found = self.consecutive_not_found.saturating_add(1);
        self.consecutive_not_found > self.backoff_threshold
    }

    /// Records a found page, which ends the not-found streak
    pub fn record_found(&mut self) {
        self.consecutive_not_found = 0;
    }

    pub fn reset_after_backoff(&mut self) {
        self.consecutive_not_found = 0;
    }

    pub fn consecutive_not_found(&self) -> u32 {
        self.consecutive_not_found
    }

    /// Returns true if a status-only progress write is due after `id`
    pub fn is_progress_point(&self, id: u32) -> bool {
        id % self.progress_every == 0
    }

    /// Returns true if the buffered categories must be merged after `id`
    ///
    /// After a failed flush the category trigger counts only discoveries made
    /// since that attempt.
    pub fn should_flush(&self, buffered: usize, id: u32) -> bool {
        let fresh = buffered.saturating_sub(self.failed_flush_size);
        buffered > 0 && (fresh >= self.flush_every_categories || id % self.flush_every_ids == 0)
    }

    pub fn record_flush_failure(&mut self, buffered: usize) {
        self.failed_flush_size = buffered;
    }

    pub fn record_flush_success(&mut self) {
        self.failed_flush_size = 0;
    }

    pub fn backoff_cooldown(&self) -> Duration {
        self.backoff_cooldown
    }

    pub fn error_delay(&self) -> Duration {
        self.error_delay
    }
}
