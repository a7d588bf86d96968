//! Job control for background explorations
//!
//! - `JobController` gates runs on the persisted job flags
//! - `Supervisor` owns the handle of the running explorer
//! - `JobStatus` is the observer's view of the job

mod controller;
mod supervisor;

pub use controller::JobController;
pub use supervisor::Supervisor;

use crate::catalog::{CatalogSnapshot, IdSpace};
use serde::Serialize;

/// Status reported to observers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatus {
    pub in_progress: bool,
    pub complete: bool,
    pub categories_found: usize,
    pub last_explored_id: Option<u32>,
    /// Rounded percentage of the ID space covered, absent before any progress
    pub progress: Option<u8>,
}

impl JobStatus {
    pub fn from_snapshot(snapshot: Option<&CatalogSnapshot>, id_space: &IdSpace) -> Self {
        match snapshot {
            Some(snapshot) => Self {
                in_progress: snapshot.job_in_progress,
                complete: snapshot.job_complete,
                categories_found: snapshot.total_categories,
                last_explored_id: snapshot.last_explored_id,
                progress: snapshot
                    .last_explored_id
                    .map(|last| id_space.progress_percent(last)),
            },
            None => Self {
                in_progress: false,
                complete: false,
                categories_found: 0,
                last_explored_id: None,
                progress: None,
            },
        }
    }
}
