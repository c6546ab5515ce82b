//! Improvement service
//!
//! Wires the cache, the job store, the resolver and the worker pool
//! together. Everything is constructed per instance, so tests get fully
//! isolated state.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::cache::TextCache;
use crate::config::Config;
use crate::improver::{self, ImproveError, Improver};
use crate::jobs::{Job, JobCounts, JobId, JobQueue, JobRunner, JobStore, QueueClosed};
use crate::resolver::Resolver;

/// Point-in-time service counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceStats {
    pub cache_entries: usize,
    pub jobs: JobCounts,
}

pub struct ImprovementService {
    cache: Arc<TextCache>,
    store: Arc<JobStore>,
    resolver: Resolver,
    queue: JobQueue,
}

impl ImprovementService {
    pub fn new(improver: Arc<dyn Improver>, max_concurrent_jobs: usize) -> Self {
        let cache = Arc::new(TextCache::new());
        let store = Arc::new(JobStore::new());
        let resolver = Resolver::new(cache.clone(), improver);
        let runner = JobRunner::new(store.clone(), resolver.clone());
        let queue = JobQueue::new(store.clone(), runner, max_concurrent_jobs);

        Self { cache, store, resolver, queue }
    }

    /// Build the service with the improver the config selects
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let improver = improver::from_config(&config.provider)?;
        Ok(Self::new(improver, config.jobs.max_concurrent))
    }

    /// Improve `text` on the caller's task, using the cache when possible
    pub async fn improve_now(&self, text: &str) -> Result<String, ImproveError> {
        match self.resolver.resolve(text).await {
            Ok(resolution) => {
                debug!(source = ?resolution.source, "Resolved synchronously");
                Ok(resolution.improved)
            }
            Err(e) => {
                warn!(error = %e, "Synchronous improvement failed");
                Err(e)
            }
        }
    }

    /// Queue `text` for background improvement and return the job id at once
    pub fn submit(&self, text: impl Into<String>) -> Result<JobId, QueueClosed> {
        self.queue.submit(text)
    }

    /// Snapshot of a job
    pub fn job(&self, id: JobId) -> Option<Job> {
        self.store.get(id)
    }

    pub fn stats(&self) -> ServiceStats {
        ServiceStats {
            cache_entries: self.cache.len(),
            jobs: self.store.counts(),
        }
    }

    pub fn cache(&self) -> &Arc<TextCache> {
        &self.cache
    }

    /// Let in-flight jobs finish, waiting at most `timeout`
    pub async fn shutdown(&self, timeout: Duration) -> bool {
        self.queue.shutdown(timeout).await
    }
}
