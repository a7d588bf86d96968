//! States of one exploration run
//!
//! ```text
//! Idle -> Running <-> PausedOnBackoff
//!           |-> Completed
//!           |-> Idle          (unrecoverable error)
//! ```

use crate::ScoutError;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExplorerState {
    /// Not scanning
    Idle,

    /// Walking the ID space
    Running,

    /// Cooling down after too many consecutive not-found responses
    PausedOnBackoff,

    /// Reached the upper bound and persisted the terminal state
    Completed,
}

impl ExplorerState {
    /// Returns true if moving from `self` to `to` is a legal step
    pub fn can_transition_to(&self, to: ExplorerState) -> bool {
        use ExplorerState::*;
        matches!(
            (self, to),
            (Idle, Running)
                | (Running, PausedOnBackoff)
                | (PausedOnBackoff, Running)
                | (Running, Completed)
                | (Running, Idle)
        )
    }

    /// Performs a transition, rejecting illegal steps
    pub fn transition(&mut self, to: ExplorerState) -> Result<(), ScoutError> {
        if !self.can_transition_to(to) {
            return Err(ScoutError::InvalidTransition { from: *self, to });
        }
        *self = to;
        Ok(())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::PausedOnBackoff => "paused_on_backoff",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for ExplorerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
