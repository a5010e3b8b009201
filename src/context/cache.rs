//! Bounded FIFO cache for selection results
//!
//! Eviction follows insertion order only: reading an entry never promotes it,
//! and inserting a new key past capacity drops the oldest inserted key.

use super::models::{CachedContext, ContextSelectionResult};
use super::source::SourceDescriptor;
use indexmap::IndexMap;

/// Default number of cached selections
pub const DEFAULT_CACHE_SIZE: usize = 32;

/// Insertion-ordered cache of selection results
#[derive(Debug)]
pub struct ContextCache {
    entries: IndexMap<String, CachedContext>,
    max_size: usize,
}

impl ContextCache {
    /// Create a cache holding at most `max_size` entries (floored to 1)
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: IndexMap::new(),
            max_size: max_size.max(1),
        }
    }

    /// Get a cached result, marked as coming from cache
    pub fn get(&self, key: &str) -> Option<ContextSelectionResult> {
        self.entries.get(key).map(|entry| entry.to_result(true))
    }

    /// Store a result, evicting the oldest inserted key when full
    pub fn store(&mut self, key: String, result: &ContextSelectionResult) {
        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_size {
            self.entries.shift_remove_index(0);
        }

        self.entries.insert(key, CachedContext::from_result(result));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.max_size
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}

/// Deterministic summary of the volatile state of every registered source
pub fn fingerprint<'a, I>(descriptors: I) -> String
where
    I: IntoIterator<Item = &'a SourceDescriptor>,
{
    let mut descriptors: Vec<_> = descriptors.into_iter().collect();
    descriptors.sort_by(|a, b| a.id.cmp(&b.id));

    descriptors
        .iter()
        .map(|d| {
            format!(
                "{}:{}:{:.4}:{:.4}:{:.4}",
                d.id,
                d.last_updated.map_or(0, |ts| ts.timestamp_millis()),
                d.success_rate.unwrap_or(0.0),
                d.pattern_confidence.unwrap_or(0.5),
                d.performance_delta.unwrap_or(0.0),
            )
        })
        .collect::<Vec<_>>()
        .join("|")
}

/// Cache key for a task against the given roster fingerprint
pub fn cache_key(task: &str, fingerprint: &str) -> String {
    format!("{}::{}", task.trim().to_lowercase(), fingerprint)
}
