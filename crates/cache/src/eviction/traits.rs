//! Core eviction policy trait definition

use std::fmt;

/// Bookkeeping a policy compares, captured when an element is sampled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ElementStats {
    /// Reads served by the element
    pub hit_count: u64,
    /// Store tick of the most recent access
    pub last_access: u64,
    /// Store tick of insertion
    pub created: u64,
}

/// One sampled element
#[derive(Debug, Clone)]
pub struct Candidate<K> {
    pub key: K,
    pub stats: ElementStats,
    /// Already past its time-to-live or time-to-idle
    pub expired: bool,
}

/// Eviction policy trait
pub trait EvictionPolicy: Send + Sync + fmt::Debug {
    /// Policy name as used in configuration
    fn name(&self) -> &'static str;

    /// True when `candidate` should be evicted in preference to `current`
    fn compare(&self, current: &ElementStats, candidate: &ElementStats) -> bool;
}
