//! Drives one job from `queued` to a terminal state

use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::{JobId, JobStatus, JobStore, Transition, TransitionError};
use crate::resolver::{Resolver, Source};

#[derive(Clone)]
pub struct JobRunner {
    store: Arc<JobStore>,
    resolver: Resolver,
}

impl JobRunner {
    pub fn new(store: Arc<JobStore>, resolver: Resolver) -> Self {
        Self { store, resolver }
    }

    /// Run the job with `id` to completion.
    ///
    /// Returns the terminal status, or `None` when the job was missing or
    /// not in `queued` (an upstream logic error, logged and dropped).
    pub async fn run(&self, id: JobId) -> Option<JobStatus> {
        let job = match self.store.transition(id, Transition::Start) {
            Ok(job) => job,
            Err(TransitionError::UnknownJob(_)) => {
                error!(job_id = %id, "Job not found during processing");
                return None;
            }
            Err(e) => {
                error!(job_id = %id, error = %e, "Job is not runnable");
                return None;
            }
        };
        debug!(job_id = %id, "Job processing");

        // Resolve on its own task so a panicking provider still ends the job.
        let resolver = self.resolver.clone();
        let text = job.text;
        let outcome = tokio::spawn(async move { resolver.resolve(&text).await }).await;

        let transition = match outcome {
            Ok(Ok(resolution)) => {
                if resolution.source == Source::Cache {
                    debug!(job_id = %id, "Job served from cache");
                }
                Transition::Complete(resolution.improved)
            }
            Ok(Err(e)) => {
                warn!(job_id = %id, error = %e, "Job failed");
                Transition::Fail(format!("Processing error: {}", e))
            }
            Err(e) => {
                error!(job_id = %id, error = %e, "Job task aborted");
                Transition::Fail(format!("Processing error: {}", e))
            }
        };

        match self.store.transition(id, transition) {
            Ok(job) => {
                info!(job_id = %id, status = %job.status, "Job finished");
                Some(job.status)
            }
            Err(e) => {
                error!(job_id = %id, error = %e, "Failed to record job outcome");
                None
            }
        }
    }
}
