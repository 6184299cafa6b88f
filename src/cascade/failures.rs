//! Failure memoization for the cover-art cascade.
//!
//! Candidate URLs are derived from their logical asset, so a URL identifies
//! the asset it was built for and a flat set is enough to never retry it.

use dashmap::DashSet;
use std::sync::Arc;

/// Default number of dead URLs remembered before the set starts over.
pub const DEFAULT_FAILURE_CAPACITY: usize = 4_096;

/// Bounded set of candidate URLs known to be dead.
///
/// Reaching `capacity` clears the set before the next insert. Forgetting a
/// failure only costs one extra retry, while the set never outgrows its bound.
pub struct FailureSet {
    failed: DashSet<String>,
    capacity: usize,
}

impl FailureSet {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_capacity(capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            failed: DashSet::new(),
            capacity: capacity.max(1),
        })
    }

    /// Records `url` as failed. Idempotent; returns `true` only the first time.
    pub fn mark_failed(&self, url: &str) -> bool {
        if self.failed.contains(url) {
            return false;
        }

        // Racing inserts may overshoot by the number of concurrent callers.
        if self.failed.len() >= self.capacity {
            tracing::info!(
                "Failure set reached {} entries, forgetting earlier failures",
                self.capacity
            );
            self.failed.clear();
        }

        let inserted = self.failed.insert(url.to_string());
        if inserted {
            tracing::debug!("Marked candidate as failed: {}", url);
        }
        inserted
    }

    pub fn has_failed(&self, url: &str) -> bool {
        self.failed.contains(url)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.failed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failed.is_empty()
    }
}

impl Default for FailureSet {
    fn default() -> Self {
        Self {
            failed: DashSet::new(),
            capacity: DEFAULT_FAILURE_CAPACITY,
        }
    }
}
