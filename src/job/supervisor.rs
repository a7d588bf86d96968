//! Owner of the background exploration task
//!
//! The supervisor holds the handle of at most one running explorer. There is
//! no stop operation: a run ends by reaching the upper bound or by failing.

use crate::crawler::{Explorer, RunSummary};
use crate::ScoutError;
use std::sync::Mutex;
use tokio::task::JoinHandle;

type RunHandle = JoinHandle<Result<RunSummary, ScoutError>>;

#[derive(Default)]
pub struct Supervisor {
    handle: Mutex<Option<RunHandle>>,
}

impl Supervisor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns `explorer` unless a run is still active in this process
    ///
    /// Returns false when a run is already active.
    pub fn launch(&self, explorer: Explorer) -> bool {
        let Ok(mut slot) = self.handle.lock() else {
            tracing::error!("Supervisor lock poisoned, refusing to launch");
            return false;
        };

        if slot.as_ref().is_some_and(|handle| !handle.is_finished()) {
            tracing::warn!("Exploration already running in this process");
            return false;
        }

        let handle = tokio::spawn(async move {
            let result = explorer.run().await;
            match &result {
                Ok(summary) => tracing::info!(
                    "Background exploration finished: {} categories found from ID {}",
                    summary.found,
                    summary.first_id
                ),
                Err(e) => tracing::error!("Background exploration failed: {}", e),
            }
            result
        });
        *slot = Some(handle);
        true
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .lock()
            .map(|slot| slot.as_ref().is_some_and(|handle| !handle.is_finished()))
            .unwrap_or(false)
    }

    /// Waits for the current run, returning its outcome
    ///
    /// Returns `None` when nothing was launched since the last wait.
    pub async fn wait(&self) -> Option<Result<RunSummary, ScoutError>> {
        let handle = self.handle.lock().ok()?.take()?;
        Some(match handle.await {
            Ok(result) => result,
            Err(e) => Err(ScoutError::Task(e.to_string())),
        })
    }
}
