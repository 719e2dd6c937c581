//! Shared byte accounting across independent stores
//!
//! A [`Pool`] enforces one aggregate byte ceiling over every store that
//! registered a [`PoolAccessor`]. Stores never see each other; when an
//! addition does not fit, the pool hands every live store to its
//! [`PoolEvictor`] and lets it decide where the bytes come from.
//!
//! The aggregate is recomputed from the per-accessor counters on every read.
//! Concurrent additions through different accessors can overshoot the
//! ceiling by at most the bytes in flight; the next mutation re-checks it.

mod accessor;
mod traits;

pub use accessor::PoolAccessor;
pub use traits::{PoolEvictor, PoolableStore};

use crate::config::PoolConfig;
use crate::evictor::create_pool_evictor;
use crate::sizeof::{create_size_of_engine, SizeOfEngine};
use dashmap::DashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use accessor::AccessorState;

/// Part of a stored triple being replaced in place
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Container,
    Key,
    Value,
}

impl Role {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Container => "container",
            Self::Key => "key",
            Self::Value => "value",
        }
    }
}

/// Byte-bounded pool shared by many stores
#[derive(Clone)]
pub struct Pool {
    inner: Arc<PoolInner>,
}

pub(crate) struct PoolInner {
    capacity: u64,
    evictor: Arc<dyn PoolEvictor>,
    default_engine: Arc<dyn SizeOfEngine>,
    accessors: DashMap<u64, Arc<AccessorState>>,
    next_id: AtomicU64,
}

impl Pool {
    pub fn new(
        capacity: u64,
        evictor: Arc<dyn PoolEvictor>,
        default_engine: Arc<dyn SizeOfEngine>,
    ) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                capacity,
                evictor,
                default_engine,
                accessors: DashMap::new(),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    /// Build a pool with the evictor and engine named by `config`
    pub fn from_config(config: &PoolConfig) -> Self {
        Self::new(
            config.capacity_bytes,
            create_pool_evictor(config.evictor),
            create_size_of_engine(&config.size_of_engine),
        )
    }

    /// Register a store using the pool's default size-of engine
    pub fn create_accessor(
        &self,
        name: impl Into<String>,
        store: Weak<dyn PoolableStore>,
    ) -> PoolAccessor {
        let engine = Arc::clone(&self.inner.default_engine);
        self.create_accessor_with_engine(name, store, engine)
    }

    /// Register a store measured by its own engine
    pub fn create_accessor_with_engine(
        &self,
        name: impl Into<String>,
        store: Weak<dyn PoolableStore>,
        engine: Arc<dyn SizeOfEngine>,
    ) -> PoolAccessor {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let state = Arc::new(AccessorState::new(id, name.into(), store, engine));
        self.inner.accessors.insert(id, Arc::clone(&state));
        tracing::debug!(store = %state.store_name, id, "Registered pool accessor");
        PoolAccessor::new(state, Arc::clone(&self.inner))
    }

    /// Maximum aggregate bytes
    pub fn capacity(&self) -> u64 {
        self.inner.capacity
    }

    /// Sum of all live accessors' sizes
    pub fn total_size(&self) -> u64 {
        self.inner.total_size()
    }

    /// Number of registered (not unlinked) accessors
    pub fn accessor_count(&self) -> usize {
        self.inner.accessors.len()
    }

    /// Live stores participating in this pool
    pub fn poolable_stores(&self) -> Vec<Arc<dyn PoolableStore>> {
        self.inner.poolable_stores()
    }
}

impl PoolInner {
    pub(crate) fn total_size(&self) -> u64 {
        self.accessors
            .iter()
            .map(|entry| entry.value().size())
            .sum()
    }

    pub(crate) fn poolable_stores(&self) -> Vec<Arc<dyn PoolableStore>> {
        self.accessors
            .iter()
            .filter_map(|entry| entry.value().store())
            .collect()
    }
}

impl fmt::Debug for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("capacity", &self.inner.capacity)
            .field("total_size", &self.total_size())
            .field("accessors", &self.inner.accessors.len())
            .field("evictor", &self.inner.evictor)
            .finish()
    }
}

#[cfg(test)]
mod tests;
