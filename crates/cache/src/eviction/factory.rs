//! Factory for creating eviction policies

use super::policies::{FifoPolicy, LfuPolicy, LruPolicy};
use super::traits::EvictionPolicy;
use crate::config::StorePolicy;

/// Eviction policy factory
pub fn create_eviction_policy(policy: StorePolicy) -> Box<dyn EvictionPolicy> {
    match policy {
        StorePolicy::Lfu => Box::new(LfuPolicy),
        StorePolicy::Lru => Box::new(LruPolicy),
        StorePolicy::Fifo => Box::new(FifoPolicy),
    }
}
