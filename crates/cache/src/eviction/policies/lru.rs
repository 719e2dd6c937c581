//! LRU (Least Recently Used) eviction policy implementation

use crate::eviction::traits::{ElementStats, EvictionPolicy};

/// Prefers the oldest last access; ties go to the oldest insertion.
#[derive(Debug, Default, Clone, Copy)]
pub struct LruPolicy;

impl EvictionPolicy for LruPolicy {
    fn name(&self) -> &'static str {
        "lru"
    }

    fn compare(&self, current: &ElementStats, candidate: &ElementStats) -> bool {
        candidate.last_access < current.last_access
            || (candidate.last_access == current.last_access
                && candidate.created < current.created)
    }
}
