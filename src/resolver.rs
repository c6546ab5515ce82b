//! Cache-then-provider resolution
//!
//! Shared by the synchronous endpoint and the job runner so both follow
//! the same policy: a cache hit skips the provider, a provider success is
//! cached, a provider failure is returned and never cached.

use std::sync::Arc;
use tracing::debug;

use crate::cache::TextCache;
use crate::improver::{ImproveError, Improver};

/// Where a resolved value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Cache,
    Provider,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub improved: String,
    pub source: Source,
}

#[derive(Clone)]
pub struct Resolver {
    cache: Arc<TextCache>,
    improver: Arc<dyn Improver>,
}

impl Resolver {
    pub fn new(cache: Arc<TextCache>, improver: Arc<dyn Improver>) -> Self {
        Self { cache, improver }
    }

    /// Resolve `text`, making at most one provider call
    pub async fn resolve(&self, text: &str) -> Result<Resolution, ImproveError> {
        if let Some(improved) = self.cache.get(text) {
            debug!(chars = text.chars().count(), "cache hit");
            return Ok(Resolution { improved, source: Source::Cache });
        }

        let improved = self.improver.improve(text).await?;
        if improved.trim().is_empty() {
            return Err(ImproveError::EmptyCompletion);
        }

        self.cache.put(text, improved.clone());
        Ok(Resolution { improved, source: Source::Provider })
    }
}
