//! Resident elements and their bookkeeping

use crate::eviction::ElementStats;
use crate::sizeof::DeepSizeOf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Per-element metadata, accounted in the pool as the container part
#[derive(Debug)]
pub struct ElementHeader {
    hits: AtomicU64,
    created_tick: u64,
    last_access_tick: AtomicU64,
    /// Nanoseconds since the owning store was created
    created_nanos: u64,
    last_access_nanos: AtomicU64,
    time_to_live: Option<Duration>,
    time_to_idle: Option<Duration>,
}

impl ElementHeader {
    pub(crate) fn new(
        tick: u64,
        now_nanos: u64,
        time_to_live: Option<Duration>,
        time_to_idle: Option<Duration>,
    ) -> Self {
        Self {
            hits: AtomicU64::new(0),
            created_tick: tick,
            last_access_tick: AtomicU64::new(tick),
            created_nanos: now_nanos,
            last_access_nanos: AtomicU64::new(now_nanos),
            time_to_live,
            time_to_idle,
        }
    }

    pub(crate) fn record_hit(&self, tick: u64, now_nanos: u64) {
        self.hits.fetch_add(1, Ordering::Relaxed);
        self.last_access_tick.fetch_max(tick, Ordering::Relaxed);
        self.last_access_nanos.fetch_max(now_nanos, Ordering::Relaxed);
    }

    pub fn hit_count(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn stats(&self) -> ElementStats {
        ElementStats {
            hit_count: self.hit_count(),
            last_access: self.last_access_tick.load(Ordering::Relaxed),
            created: self.created_tick,
        }
    }

    pub fn is_expired(&self, now_nanos: u64) -> bool {
        let lived = Duration::from_nanos(now_nanos.saturating_sub(self.created_nanos));
        if self.time_to_live.is_some_and(|ttl| lived > ttl) {
            return true;
        }

        let idle = Duration::from_nanos(
            now_nanos.saturating_sub(self.last_access_nanos.load(Ordering::Relaxed)),
        );
        self.time_to_idle.is_some_and(|tti| idle > tti)
    }
}

impl DeepSizeOf for ElementHeader {
    fn heap_size_of(&self) -> Option<u64> {
        Some(0)
    }
}

/// A value resident in a store together with its header
#[derive(Debug)]
pub struct Element<V> {
    pub(crate) value: Arc<V>,
    pub(crate) header: ElementHeader,
}

impl<V> Element<V> {
    pub fn value(&self) -> &Arc<V> {
        &self.value
    }

    pub fn header(&self) -> &ElementHeader {
        &self.header
    }
}
