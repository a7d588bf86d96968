//! Job state derived from the persisted exploration flags
//!
//! The snapshot stores two booleans (`jobInProgress`, `jobComplete`); this
//! enum is the single place that interprets them.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobState {
    /// Never run, or the last run stopped before completing
    Idle,

    /// A run holds the single-flight slot
    Running,

    /// The whole ID space has been explored
    Completed,
}

impl JobState {
    /// Interprets the persisted flags
    ///
    /// A document claiming both flags is treated as running so the
    /// single-flight gate stays closed.
    pub fn from_flags(in_progress: bool, complete: bool) -> Self {
        match (in_progress, complete) {
            (true, _) => Self::Running,
            (false, true) => Self::Completed,
            (false, false) => Self::Idle,
        }
    }

    /// Returns true if a new run may be launched from this state
    pub fn accepts_new_run(&self) -> bool {
        !matches!(self, Self::Running)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
