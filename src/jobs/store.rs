//! In-memory job store
//!
//! Owns every job record for the lifetime of the process. Completed jobs
//! are never removed, so memory grows with the number of submissions.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use super::{Job, JobId, JobStatus, Transition};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("job {0} not found")]
    UnknownJob(JobId),

    #[error("job {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: JobId,
        from: JobStatus,
        to: JobStatus,
    },
}

/// Number of jobs in each state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobCounts {
    pub queued: usize,
    pub processing: usize,
    pub done: usize,
    pub error: usize,
}

impl JobCounts {
    pub fn total(&self) -> usize {
        self.queued + self.processing + self.done + self.error
    }
}

#[derive(Debug, Default)]
pub struct JobStore {
    jobs: RwLock<HashMap<JobId, Job>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fresh `queued` job and return its id
    pub fn create(&self, text: impl Into<String>) -> JobId {
        let job = Job::new(text.into());
        let id = job.id;
        let mut jobs = self.jobs.write().unwrap_or_else(PoisonError::into_inner);
        jobs.insert(id, job);
        id
    }

    /// Snapshot of a job, `None` if the id was never issued
    pub fn get(&self, id: JobId) -> Option<Job> {
        let jobs = self.jobs.read().unwrap_or_else(PoisonError::into_inner);
        jobs.get(&id).cloned()
    }

    /// Apply a state change. Status, result and `updated_at` change under
    /// one write lock.
    pub fn transition(&self, id: JobId, transition: Transition) -> Result<Job, TransitionError> {
        let mut jobs = self.jobs.write().unwrap_or_else(PoisonError::into_inner);
        let job = jobs.get_mut(&id).ok_or(TransitionError::UnknownJob(id))?;

        let to = transition.target();
        if !job.status.can_transition_to(to) {
            return Err(TransitionError::InvalidTransition {
                id,
                from: job.status,
                to,
            });
        }

        job.status = to;
        job.result = match transition {
            Transition::Start => None,
            Transition::Complete(result) | Transition::Fail(result) => Some(result),
        };
        job.updated_at = Utc::now();

        Ok(job.clone())
    }

    pub fn counts(&self) -> JobCounts {
        let jobs = self.jobs.read().unwrap_or_else(PoisonError::into_inner);
        jobs.values().fold(JobCounts::default(), |mut counts, job| {
            match job.status {
                JobStatus::Queued => counts.queued += 1,
                JobStatus::Processing => counts.processing += 1,
                JobStatus::Done => counts.done += 1,
                JobStatus::Error => counts.error += 1,
            }
            counts
        })
    }

    pub fn len(&self) -> usize {
        self.jobs.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_create_starts_queued() {
        let store = JobStore::new();
        let id = store.create("I has a apple");

        let job = store.get(id).unwrap();
        assert_eq!(job.id, id);
        assert_eq!(job.status, JobStatus::Queued);
        assert_eq!(job.text, "I has a apple");
        assert_eq!(job.result, None);
    }

    #[test]
    fn test_ids_are_unique() {
        let store = JobStore::new();
        let a = store.create("same text");
        let b = store.create("same text");
        assert_ne!(a, b);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_unknown_id_not_found() {
        let store = JobStore::new();
        store.create("some text");
        assert!(store.get(JobId::new()).is_none());
    }

    #[test]
    fn test_happy_path() {
        let store = JobStore::new();
        let id = store.create("I has a apple");

        let job = assert_ok!(store.transition(id, Transition::Start));
        assert_eq!(job.status, JobStatus::Processing);
        assert_eq!(job.result, None);

        let job = assert_ok!(store.transition(id, Transition::Complete("I have an apple.".into())));
        assert_eq!(job.status, JobStatus::Done);
        assert_eq!(job.result.as_deref(), Some("I have an apple."));
        assert!(job.updated_at >= job.created_at);
    }

    #[test]
    fn test_error_path() {
        let store = JobStore::new();
        let id = store.create("I has a apple");
        assert_ok!(store.transition(id, Transition::Start));
        let job = assert_ok!(store.transition(id, Transition::Fail("Processing error: boom".into())));
        assert_eq!(job.status, JobStatus::Error);
        assert_eq!(job.result.as_deref(), Some("Processing error: boom"));
    }

    #[test]
    fn test_cannot_skip_processing() {
        let store = JobStore::new();
        let id = store.create("I has a apple");
        let err = assert_err!(store.transition(id, Transition::Complete("x".into())));
        assert_eq!(
            err,
            TransitionError::InvalidTransition {
                id,
                from: JobStatus::Queued,
                to: JobStatus::Done
            }
        );
        assert_eq!(store.get(id).unwrap().status, JobStatus::Queued);
    }

    #[test]
    fn test_terminal_jobs_are_never_mutated() {
        let store = JobStore::new();
        let id = store.create("I has a apple");
        assert_ok!(store.transition(id, Transition::Start));
        assert_ok!(store.transition(id, Transition::Complete("done".into())));

        assert_err!(store.transition(id, Transition::Start));
        assert_err!(store.transition(id, Transition::Fail("late".into())));
        assert_err!(store.transition(id, Transition::Complete("again".into())));

        let job = store.get(id).unwrap();
        assert_eq!(job.status, JobStatus::Done);
        assert_eq!(job.result.as_deref(), Some("done"));
    }

    #[test]
    fn test_transition_unknown_job() {
        let store = JobStore::new();
        let id = JobId::new();
        assert_eq!(
            store.transition(id, Transition::Start),
            Err(TransitionError::UnknownJob(id))
        );
    }

    #[test]
    fn test_counts() {
        let store = JobStore::new();
        let a = store.create("first text");
        let b = store.create("second text");
        store.create("third text");
        store.transition(a, Transition::Start).unwrap();
        store.transition(b, Transition::Start).unwrap();
        store.transition(b, Transition::Fail("nope".into())).unwrap();

        let counts = store.counts();
        assert_eq!(
            counts,
            JobCounts { queued: 1, processing: 1, done: 0, error: 1 }
        );
        assert_eq!(counts.total(), 3);
    }

    #[test]
    fn test_readers_never_see_torn_updates() {
        let store = std::sync::Arc::new(JobStore::new());
        let id = store.create("I has a apple");

        let reader = {
            let store = store.clone();
            std::thread::spawn(move || {
                for _ in 0..10_000 {
                    let job = store.get(id).unwrap();
                    match job.status {
                        JobStatus::Queued | JobStatus::Processing => assert!(job.result.is_none()),
                        JobStatus::Done | JobStatus::Error => assert!(job.result.is_some()),
                    }
                }
            })
        };

        store.transition(id, Transition::Start).unwrap();
        store.transition(id, Transition::Complete("I have an apple.".into())).unwrap();
        reader.join().unwrap();
    }
}
