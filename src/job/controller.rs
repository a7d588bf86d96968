//! Single-flight gate over the explorer
//!
//! The controller keeps no job state of its own. Every call re-reads the
//! snapshot store, and every claim of the job slot is an atomic
//! read-modify-write on the persisted `jobInProgress` flag, so the gate holds
//! across process restarts.

use crate::catalog::{CatalogSnapshot, IdSpace};
use crate::config::ExplorerConfig;
use crate::crawler::{write_snapshot, Collaborators, Explorer};
use crate::job::{JobStatus, Supervisor};
use crate::storage::SnapshotStore;
use crate::ScoutError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub struct JobController {
    store: Arc<dyn SnapshotStore>,
    collaborators: Collaborators,
    explorer_config: ExplorerConfig,
    id_space: IdSpace,
    supervisor: Arc<Supervisor>,
}

impl JobController {
    pub fn new(
        store: Arc<dyn SnapshotStore>,
        collaborators: Collaborators,
        explorer_config: ExplorerConfig,
        supervisor: Arc<Supervisor>,
    ) -> Self {
        Self {
            store,
            collaborators,
            id_space: IdSpace::from_config(&explorer_config),
            explorer_config,
            supervisor,
        }
    }

    pub fn store(&self) -> &Arc<dyn SnapshotStore> {
        &self.store
    }

    pub fn supervisor(&self) -> &Arc<Supervisor> {
        &self.supervisor
    }

    pub fn id_space(&self) -> &IdSpace {
        &self.id_space
    }

    /// Current job status, read from the store
    pub async fn status(&self) -> Result<JobStatus, ScoutError> {
        let snapshot = self.snapshot().await?;
        Ok(JobStatus::from_snapshot(snapshot.as_ref(), &self.id_space))
    }

    /// Current snapshot, `None` when nothing has been persisted yet
    pub async fn snapshot(&self) -> Result<Option<CatalogSnapshot>, ScoutError> {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || store.load())
            .await
            .map_err(|e| ScoutError::Task(e.to_string()))
    }

    /// Starts a run continuing from the persisted position
    ///
    /// Returns false without side effects when a run is already in progress.
    pub async fn force_start(&self) -> Result<bool, ScoutError> {
        self.start(None).await
    }

    /// Starts a run whose first explored ID is `from_id`
    ///
    /// A `from_id` outside `[1, upper_bound)` is ignored and the run continues
    /// from the persisted position. Returns false when a run is already in
    /// progress.
    pub async fn resume(&self, from_id: i64) -> Result<bool, ScoutError> {
        if self.id_space.accepts_resume_point(from_id) {
            // from_id < upper_bound, so it fits in u32
            let resume_after = u32::try_from(from_id - 1).unwrap_or(0);
            self.start(Some(resume_after)).await
        } else {
            tracing::warn!(
                "Ignoring resume point {} outside [1, {})",
                from_id,
                self.id_space.upper_bound()
            );
            self.start(None).await
        }
    }

    async fn start(&self, resume_after: Option<u32>) -> Result<bool, ScoutError> {
        if self.supervisor.is_running() {
            tracing::info!("Exploration already running, start request ignored");
            return Ok(false);
        }

        let claimed = Arc::new(AtomicBool::new(false));
        let claim = claimed.clone();
        write_snapshot(self.store.clone(), move |current| {
            let mut snapshot = match current {
                None => CatalogSnapshot::bootstrap(),
                Some(snapshot) if snapshot.job_state().accepts_new_run() => snapshot,
                Some(_) => return None,
            };
            snapshot.mark_started();
            if let Some(last) = resume_after {
                snapshot.last_explored_id = Some(last);
            }
            claim.store(true, Ordering::SeqCst);
            Some(snapshot)
        })
        .await?;

        if !claimed.load(Ordering::SeqCst) {
            tracing::info!("Exploration already in progress, start request ignored");
            return Ok(false);
        }

        match resume_after {
            Some(last) => tracing::info!(
                "Launching exploration from {}",
                self.id_space.category_id(last + 1)
            ),
            None => tracing::info!("Launching exploration from the persisted position"),
        }

        let explorer = Explorer::new(self.store.clone(), &self.collaborators, &self.explorer_config);
        Ok(self.supervisor.launch(explorer))
    }

    /// Clears a stale `jobInProgress` flag left by a run that died
    ///
    /// Refuses while a run is active in this process. Returns true if a flag
    /// was cleared.
    pub async fn release(&self) -> Result<bool, ScoutError> {
        if self.supervisor.is_running() {
            return Ok(false);
        }

        let released = write_snapshot(self.store.clone(), |current| {
            let mut snapshot = current.filter(|s| s.job_in_progress)?;
            snapshot.mark_stopped();
            Some(snapshot)
        })
        .await?;

        if released.is_some() {
            tracing::warn!("Released stale in-progress flag");
        }
        Ok(released.is_some())
    }
}
