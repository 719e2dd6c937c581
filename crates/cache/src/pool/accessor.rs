//! Per-store handle into a pool

use super::{PoolInner, PoolableStore, Role};
use crate::errors::{CacheError, RecoveryHint, Result};
use crate::sizeof::{DeepSizeOf, SizeOfEngine};
use parking_lot::{RwLock, RwLockReadGuard};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// State shared between an accessor and the pool registry
pub(crate) struct AccessorState {
    pub(super) id: u64,
    pub(super) store_name: String,
    store: Weak<dyn PoolableStore>,
    engine: Arc<dyn SizeOfEngine>,
    size: AtomicU64,
    /// Held shared by every mutation and exclusively by unlink, so a
    /// mutation either finishes before unlink or sees the flag set.
    unlinked: RwLock<bool>,
}

impl AccessorState {
    pub(super) fn new(
        id: u64,
        store_name: String,
        store: Weak<dyn PoolableStore>,
        engine: Arc<dyn SizeOfEngine>,
    ) -> Self {
        Self {
            id,
            store_name,
            store,
            engine,
            size: AtomicU64::new(0),
            unlinked: RwLock::new(false),
        }
    }

    pub(super) fn size(&self) -> u64 {
        self.size.load(Ordering::Acquire)
    }

    pub(super) fn store(&self) -> Option<Arc<dyn PoolableStore>> {
        self.store.upgrade()
    }
}

/// The only writer of one store's accounted size.
///
/// Dropping an accessor does not unlink it; stores call
/// [`unlink`](Self::unlink) when they are disposed.
pub struct PoolAccessor {
    state: Arc<AccessorState>,
    pool: Arc<PoolInner>,
}

impl PoolAccessor {
    pub(super) fn new(state: Arc<AccessorState>, pool: Arc<PoolInner>) -> Self {
        Self { state, pool }
    }

    /// Account for a new entry, evicting across the pool if it does not fit.
    ///
    /// Returns the bytes added. A [`CacheError::CapacityExceeded`] means the
    /// entry was not admitted and nothing changed.
    pub fn add(
        &self,
        key: Option<&dyn DeepSizeOf>,
        value: Option<&dyn DeepSizeOf>,
        container: Option<&dyn DeepSizeOf>,
        force: bool,
    ) -> Result<u64> {
        let _live = self.live("add")?;
        let size_of = self.state.engine.size_of(key, value, container)?;
        self.admit(size_of, force)?;
        Ok(size_of)
    }

    /// Release the bytes of an entry leaving the store. Never evicts.
    pub fn delete(
        &self,
        key: Option<&dyn DeepSizeOf>,
        value: Option<&dyn DeepSizeOf>,
        container: Option<&dyn DeepSizeOf>,
    ) -> Result<u64> {
        let _live = self.live("delete")?;
        let size_of = self.state.engine.size_of(key, value, container)?;
        self.release(size_of);
        Ok(size_of)
    }

    /// Swap one part of a resident entry, returning the signed byte delta.
    ///
    /// Shrinking always succeeds. Growth goes through the same admission
    /// check as [`add`](Self::add) for the difference only.
    pub fn replace(
        &self,
        role: Role,
        current: &dyn DeepSizeOf,
        replacement: &dyn DeepSizeOf,
        force: bool,
    ) -> Result<i64> {
        let _live = self.live("replace")?;
        let old = self.measure(role, current)?;
        let new = self.measure(role, replacement)?;

        let delta = if new <= old {
            self.release(old - new);
            i64::try_from(old - new).map_or(i64::MIN, |shrunk| -shrunk)
        } else {
            self.admit(new - old, force)?;
            i64::try_from(new - old).unwrap_or(i64::MAX)
        };
        tracing::trace!(
            store = %self.state.store_name,
            role = role.as_str(),
            delta,
            "Replaced entry part"
        );
        Ok(delta)
    }

    /// Detach from the pool. Idempotent.
    pub fn unlink(&self) {
        let mut unlinked = self.state.unlinked.write();
        if !*unlinked {
            *unlinked = true;
            self.pool.accessors.remove(&self.state.id);
            tracing::debug!(
                store = %self.state.store_name,
                size = self.size(),
                "Unlinked pool accessor"
            );
        }
    }

    pub fn is_unlinked(&self) -> bool {
        *self.state.unlinked.read_recursive()
    }

    /// Bytes currently accounted for this store
    pub fn size(&self) -> u64 {
        self.state.size()
    }

    /// Forget every accounted byte, used when a store drops all entries at once
    pub fn clear(&self) -> Result<()> {
        let _live = self.live("clear")?;
        self.state.size.store(0, Ordering::Release);
        Ok(())
    }

    fn live(&self, operation: &'static str) -> Result<RwLockReadGuard<'_, bool>> {
        // recursive: an eviction triggered by this accessor may re-enter it
        let guard = self.state.unlinked.read_recursive();
        if *guard {
            return Err(CacheError::AccessorUnlinked {
                store: self.state.store_name.clone(),
                operation,
                recovery_hint: RecoveryHint::FixLifecycle,
            });
        }
        Ok(guard)
    }

    fn measure(&self, role: Role, part: &dyn DeepSizeOf) -> Result<u64> {
        match role {
            Role::Container => self.state.engine.size_of(None, None, Some(part)),
            Role::Key => self.state.engine.size_of(Some(part), None, None),
            Role::Value => self.state.engine.size_of(None, Some(part), None),
        }
    }

    fn admit(&self, size_of: u64, force: bool) -> Result<()> {
        let capacity = self.pool.capacity;
        let new_total = self.pool.total_size().saturating_add(size_of);

        if new_total <= capacity {
            self.state.size.fetch_add(size_of, Ordering::AcqRel);
            return Ok(());
        }

        let missing = new_total - capacity;
        if !force && missing > capacity {
            tracing::debug!(
                store = %self.state.store_name,
                size_of,
                capacity,
                "Entry can never fit in pool"
            );
            return Err(self.rejection(size_of, missing));
        }

        tracing::debug!(
            store = %self.state.store_name,
            missing,
            force,
            "Pool full, invoking evictor"
        );
        let stores = self.pool.poolable_stores();
        let freed = self.pool.evictor.free_space(&stores, missing);
        drop(stores);

        if force || freed {
            self.state.size.fetch_add(size_of, Ordering::AcqRel);
            Ok(())
        } else {
            tracing::debug!(
                store = %self.state.store_name,
                missing,
                "Evictor could not free enough space"
            );
            Err(self.rejection(size_of, missing))
        }
    }

    fn release(&self, bytes: u64) {
        let previous = self
            .state
            .size
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |size| {
                Some(size.saturating_sub(bytes))
            })
            .unwrap_or_else(|size| size);
        if previous < bytes {
            tracing::warn!(
                store = %self.state.store_name,
                previous,
                bytes,
                "Released more bytes than were accounted"
            );
        }
    }

    fn rejection(&self, requested_bytes: u64, missing_bytes: u64) -> CacheError {
        CacheError::CapacityExceeded {
            requested_bytes,
            missing_bytes,
            capacity_bytes: self.pool.capacity,
            recovery_hint: if missing_bytes > self.pool.capacity {
                RecoveryHint::IncreaseCapacity {
                    suggested_bytes: self.pool.capacity + missing_bytes,
                }
            } else {
                RecoveryHint::RunEviction
            },
        }
    }
}

impl fmt::Debug for PoolAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolAccessor")
            .field("store", &self.state.store_name)
            .field("size", &self.size())
            .field("unlinked", &self.is_unlinked())
            .finish()
    }
}
