//! Seams between the pool and the stores it accounts for

use std::fmt;
use std::sync::Arc;

/// A store that lets the pool evictor reclaim bytes from it.
pub trait PoolableStore: Send + Sync {
    /// Name used in logs and statistics
    fn name(&self) -> &str;

    /// Live entry count
    fn entry_count(&self) -> usize;

    /// Bytes currently accounted for this store in the pool
    fn accounted_size(&self) -> u64;

    /// Cumulative hits, used by access-aware evictors
    fn hit_count(&self) -> u64;

    /// Evict up to `count` entries, stopping once `bytes` have been freed.
    ///
    /// Returns the bytes actually released. A store that is busy may free
    /// nothing rather than block.
    fn evict(&self, count: usize, bytes: u64) -> u64;

    /// Drop every entry and unlink from the pool
    fn dispose(&self);
}

/// Reclaims bytes across the live stores of a pool.
///
/// The evictor is not told which store triggered it. References to the
/// stores must not outlive the call.
pub trait PoolEvictor: Send + Sync + fmt::Debug {
    /// True when at least `bytes` were freed.
    fn free_space(&self, stores: &[Arc<dyn PoolableStore>], bytes: u64) -> bool;
}
