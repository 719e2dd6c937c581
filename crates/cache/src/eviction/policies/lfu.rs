//! LFU (Least Frequently Used) eviction policy implementation

use crate::eviction::traits::{ElementStats, EvictionPolicy};

/// Prefers the fewest hits; ties go to the least recently used.
#[derive(Debug, Default, Clone, Copy)]
pub struct LfuPolicy;

impl EvictionPolicy for LfuPolicy {
    fn name(&self) -> &'static str {
        "lfu"
    }

    fn compare(&self, current: &ElementStats, candidate: &ElementStats) -> bool {
        candidate.hit_count < current.hit_count
            || (candidate.hit_count == current.hit_count
                && candidate.last_access < current.last_access)
    }
}
