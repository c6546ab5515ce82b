//! Job submission and the background worker pool
//!
//! Each submitted job becomes one tokio task. A semaphore caps how many
//! run at once; the task waits for its permit, the submitter never does.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio_util::task::TaskTracker;
use tracing::{info, warn};

use super::{JobId, JobRunner, JobStore};

/// Submission after `shutdown` has started
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Job queue is shutting down")]
pub struct QueueClosed;

pub struct JobQueue {
    store: Arc<JobStore>,
    runner: JobRunner,
    permits: Arc<Semaphore>,
    tracker: TaskTracker,
}

impl JobQueue {
    pub fn new(store: Arc<JobStore>, runner: JobRunner, max_concurrent: usize) -> Self {
        Self {
            store,
            runner,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
            tracker: TaskTracker::new(),
        }
    }

    /// Create a `queued` job for `text` and schedule exactly one run of it.
    ///
    /// Returns as soon as the job is recorded. Refused once `shutdown` has
    /// begun, since the drain would not wait for it. Must be called from
    /// within a tokio runtime.
    pub fn submit(&self, text: impl Into<String>) -> Result<JobId, QueueClosed> {
        if self.tracker.is_closed() {
            warn!("Job refused while shutting down");
            return Err(QueueClosed);
        }
        let id = self.store.create(text);

        let runner = self.runner.clone();
        let permits = self.permits.clone();
        self.tracker.spawn(async move {
            // The semaphore is never closed, so this only fails if that changes.
            let _permit = permits.acquire_owned().await.ok();
            runner.run(id).await;
        });

        Ok(id)
    }

    /// Jobs spawned and not yet finished
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Stop tracking new work and wait up to `timeout` for running jobs.
    ///
    /// Returns `true` if every job finished in time.
    pub async fn shutdown(&self, timeout: Duration) -> bool {
        self.tracker.close();
        let pending = self.tracker.len();
        if pending > 0 {
            info!(pending, "Waiting for in-flight jobs");
        }

        match tokio::time::timeout(timeout, self.tracker.wait()).await {
            Ok(()) => true,
            Err(_) => {
                warn!(pending = self.tracker.len(), "Shutdown timed out with jobs still running");
                false
            }
        }
    }
}
