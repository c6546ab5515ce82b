//! Process-lifetime memo of improved text
//!
//! Maps an input text (exactly as it passed validation) to the improved
//! text the provider returned for it. Entries are never evicted: the map
//! grows with the number of distinct inputs for as long as the process
//! lives. Bounding it needs a product decision (LRU, TTL, size cap) that
//! has not been made.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Shared text cache, safe to use from request handlers and job workers
/// at the same time.
#[derive(Debug, Default)]
pub struct TextCache {
    entries: RwLock<HashMap<String, String>>,
}

impl TextCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the improved form of `text`
    pub fn get(&self, text: &str) -> Option<String> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(text).cloned()
    }

    /// Insert or overwrite the improved form of `text`.
    ///
    /// Two resolutions racing on the same unseen text both write; the last
    /// one wins. Either value is a valid improvement of the same input.
    pub fn put(&self, text: impl Into<String>, improved: impl Into<String>) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(text.into(), improved.into());
    }

    /// Number of cached texts
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
