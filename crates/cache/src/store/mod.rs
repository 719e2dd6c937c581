//! Entry-bounded in-memory store accounted in a shared pool
//!
//! A [`MemoryStore`] keeps its elements in a sharded map. Every write is
//! measured and admitted through the store's [`PoolAccessor`], and an entry
//! count ceiling is enforced by evicting a sampled victim before a new key
//! goes in. Writes are serialized per store with a re-entrant lock so that a
//! pool eviction triggered by this store's own write can reach back into it;
//! reads never take that lock.

mod element;
mod events;
mod stats;

pub use element::{Element, ElementHeader};
pub use events::{RemovalCause, StoreEvent, StoreEventListener};
pub use stats::StoreStatsSnapshot;

use crate::config::StoreConfig;
use crate::errors::Result;
use crate::eviction::{
    create_eviction_policy, random_offsets, sample_by_offsets, select_victim, Candidate,
    EvictionPolicy,
};
use crate::pool::{Pool, PoolAccessor, PoolableStore, Role};
use crate::sizeof::{DeepSizeOf, SizeOfEngine};
use dashmap::DashMap;
use parking_lot::{Mutex, ReentrantMutex, RwLock};
use stats::StoreStats;
use std::fmt;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

/// Bounds required of store keys
pub trait StoreKey: Eq + Hash + Clone + DeepSizeOf + Send + Sync + 'static {}

impl<T> StoreKey for T where T: Eq + Hash + Clone + DeepSizeOf + Send + Sync + 'static {}

/// Bounds required of store values
pub trait StoreValue: DeepSizeOf + Send + Sync + 'static {}

impl<T> StoreValue for T where T: DeepSizeOf + Send + Sync + 'static {}

/// Result of a write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    /// A new key was stored
    Inserted,
    /// An existing key got a new value
    Updated,
    /// The pool could not make room; the write was not cached
    Rejected,
}

enum Lookup<V> {
    Hit(Arc<V>),
    Expired,
    Miss,
}

/// In-memory store bounded by entry count and by its pool
pub struct MemoryStore<K, V> {
    name: String,
    map: DashMap<K, Element<V>>,
    accessor: PoolAccessor,
    policy: Box<dyn EvictionPolicy>,
    max_entries: usize,
    sample_size: usize,
    time_to_live: Option<Duration>,
    time_to_idle: Option<Duration>,
    write_lock: ReentrantMutex<()>,
    /// Keys being admitted by in-flight writes; never chosen as victims
    pinned: Mutex<Vec<K>>,
    listeners: RwLock<Vec<Arc<dyn StoreEventListener<K, V>>>>,
    stats: StoreStats,
    ticks: AtomicU64,
    epoch: Instant,
}

impl<K: StoreKey, V: StoreValue> MemoryStore<K, V> {
    /// Create a store measured by the pool's default engine
    pub fn new(name: impl Into<String>, pool: &Pool, config: &StoreConfig) -> Result<Arc<Self>> {
        Self::build(name.into(), pool, config, None)
    }

    /// Create a store measured by its own engine
    pub fn with_engine(
        name: impl Into<String>,
        pool: &Pool,
        config: &StoreConfig,
        engine: Arc<dyn SizeOfEngine>,
    ) -> Result<Arc<Self>> {
        Self::build(name.into(), pool, config, Some(engine))
    }

    fn build(
        name: String,
        pool: &Pool,
        config: &StoreConfig,
        engine: Option<Arc<dyn SizeOfEngine>>,
    ) -> Result<Arc<Self>> {
        config.validate()?;
        tracing::trace!(store = %name, policy = config.policy.as_str(), "Building store");

        Ok(Arc::new_cyclic(|weak: &Weak<Self>| {
            let store: Weak<dyn PoolableStore> = weak.clone();
            let accessor = match engine {
                Some(engine) => pool.create_accessor_with_engine(name.clone(), store, engine),
                None => pool.create_accessor(name.clone(), store),
            };

            Self {
                name,
                map: DashMap::new(),
                accessor,
                policy: create_eviction_policy(config.policy),
                max_entries: config.max_entries,
                sample_size: config.sample_size,
                time_to_live: config.time_to_live(),
                time_to_idle: config.time_to_idle(),
                write_lock: ReentrantMutex::new(()),
                pinned: Mutex::new(Vec::new()),
                listeners: RwLock::new(Vec::new()),
                stats: StoreStats::default(),
                ticks: AtomicU64::new(0),
                epoch: Instant::now(),
            }
        }))
    }

    /// Store `value` under `key` with the store's default expiry
    pub fn put(&self, key: K, value: V) -> Result<PutOutcome> {
        self.put_with_ttl(key, value, self.time_to_live)
    }

    /// Store `value` under `key`, expiring `time_to_live` after creation.
    ///
    /// Replacing a value resets its hit count. A rejection from the pool is
    /// reported as [`PutOutcome::Rejected`] and leaves any previous value in
    /// place.
    pub fn put_with_ttl(
        &self,
        key: K,
        value: V,
        time_to_live: Option<Duration>,
    ) -> Result<PutOutcome> {
        let _guard = self.write_lock.lock();
        let _pin = self.pin(&key);

        let value = Arc::new(value);
        let header =
            ElementHeader::new(self.tick(), self.now_nanos(), time_to_live, self.time_to_idle);
        let current = self.map.get(&key).map(|element| Arc::clone(&element.value));

        let admitted = match &current {
            Some(old) => self
                .accessor
                .replace(Role::Value, &**old, &*value, false)
                .map(|_| PutOutcome::Updated),
            None => {
                if self.max_entries > 0 && self.map.len() >= self.max_entries {
                    self.evict_relatively_unused()?;
                }
                self.accessor
                    .add(Some(&key), Some(&*value), Some(&header), false)
                    .map(|_| PutOutcome::Inserted)
            }
        };

        let outcome = match admitted {
            Ok(outcome) => outcome,
            Err(e) if e.is_rejection() => {
                self.stats.rejections.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(store = %self.name, error = %e, "Entry not cached");
                return Ok(PutOutcome::Rejected);
            }
            Err(e) => return Err(e),
        };

        self.map.insert(key, Element { value, header });
        Ok(outcome)
    }

    /// Look up `key`, counting a hit. Expired elements are removed and miss.
    pub fn get(&self, key: &K) -> Result<Option<Arc<V>>> {
        let now = self.now_nanos();
        let lookup = match self.map.get(key) {
            None => Lookup::Miss,
            Some(element) if element.header.is_expired(now) => Lookup::Expired,
            Some(element) => {
                element.header.record_hit(self.tick(), now);
                Lookup::Hit(Arc::clone(&element.value))
            }
        };

        match lookup {
            Lookup::Hit(value) => {
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                Ok(Some(value))
            }
            Lookup::Miss => {
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                Ok(None)
            }
            Lookup::Expired => {
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                let _guard = self.write_lock.lock();
                let now = self.now_nanos();
                let still_expired = self
                    .map
                    .get(key)
                    .is_some_and(|element| element.header.is_expired(now));
                if still_expired {
                    self.remove_element(key, RemovalCause::Expired)?;
                }
                Ok(None)
            }
        }
    }

    /// True when `key` is resident and not expired. Does not count a hit.
    pub fn contains_key(&self, key: &K) -> bool {
        let now = self.now_nanos();
        self.map
            .get(key)
            .is_some_and(|element| !element.header.is_expired(now))
    }

    /// Remove `key`, returning its value
    pub fn remove(&self, key: &K) -> Result<Option<Arc<V>>> {
        let _guard = self.write_lock.lock();
        Ok(self
            .remove_element(key, RemovalCause::Removed)?
            .map(|(value, _)| value))
    }

    /// Remove every expired element, returning how many were removed
    pub fn evict_expired(&self) -> Result<usize> {
        let _guard = self.write_lock.lock();
        let now = self.now_nanos();
        let expired: Vec<K> = self
            .map
            .iter()
            .filter(|entry| entry.value().header.is_expired(now))
            .map(|entry| entry.key().clone())
            .collect();

        let mut removed = 0;
        for key in expired {
            if self.remove_element(&key, RemovalCause::Expired)?.is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Drop every element without notifications and release their bytes
    pub fn clear(&self) -> Result<()> {
        let _guard = self.write_lock.lock();
        self.accessor.clear()?;
        self.map.clear();
        Ok(())
    }

    /// Sample the store and return the element the policy would evict next.
    pub fn find_relatively_unused(&self) -> Option<Candidate<K>> {
        let pinned = self.pinned.lock().clone();
        let offsets = random_offsets(&mut rand::thread_rng(), self.map.len(), self.sample_size);
        let now = self.now_nanos();

        let sampled = sample_by_offsets(self.map.iter(), &offsets, |entry| Candidate {
            key: entry.key().clone(),
            stats: entry.value().header.stats(),
            expired: entry.value().header.is_expired(now),
        });

        select_victim(self.policy.as_ref(), &sampled, |key| pinned.contains(key)).cloned()
    }

    /// Register a listener for removals
    pub fn add_listener(&self, listener: Arc<dyn StoreEventListener<K, V>>) {
        self.listeners.write().push(listener);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    pub fn accessor(&self) -> &PoolAccessor {
        &self.accessor
    }

    pub fn stats(&self) -> StoreStatsSnapshot {
        self.stats.snapshot()
    }

    /// Evict one sampled victim; `None` when the sample had no usable entry.
    fn evict_relatively_unused(&self) -> Result<Option<u64>> {
        let Some(victim) = self.find_relatively_unused() else {
            tracing::debug!(store = %self.name, "No eviction candidate sampled, store grows by one");
            return Ok(None);
        };

        let cause = if victim.expired {
            RemovalCause::Expired
        } else {
            RemovalCause::Evicted
        };
        Ok(self
            .remove_element(&victim.key, cause)?
            .map(|(_, bytes)| bytes))
    }

    /// Caller must hold the write lock.
    fn remove_element(&self, key: &K, cause: RemovalCause) -> Result<Option<(Arc<V>, u64)>> {
        let Some((key, element)) = self.map.remove(key) else {
            return Ok(None);
        };

        let bytes = self.accessor.delete(
            Some(&key),
            Some(&*element.value),
            Some(&element.header),
        )?;

        match cause {
            RemovalCause::Evicted => {
                self.stats.evictions.fetch_add(1, Ordering::Relaxed);
            }
            RemovalCause::Expired => {
                self.stats.expirations.fetch_add(1, Ordering::Relaxed);
            }
            RemovalCause::Removed => {}
        }
        tracing::trace!(store = %self.name, ?cause, bytes, "Removed element");

        let value = element.value;
        self.notify(key, Arc::clone(&value), cause);
        Ok(Some((value, bytes)))
    }

    fn notify(&self, key: K, value: Arc<V>, cause: RemovalCause) {
        let listeners = self.listeners.read().clone();
        if listeners.is_empty() {
            return;
        }

        let event = StoreEvent {
            store: self.name.clone(),
            key,
            value,
            cause,
        };
        for listener in &listeners {
            listener.on_removal(&event);
        }
    }

    fn pin(&self, key: &K) -> PinGuard<'_, K> {
        self.pinned.lock().push(key.clone());
        PinGuard { slot: &self.pinned }
    }

    fn tick(&self) -> u64 {
        self.ticks.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn now_nanos(&self) -> u64 {
        self.epoch.elapsed().as_nanos() as u64
    }
}

impl<K: StoreKey, V: StoreValue> PoolableStore for MemoryStore<K, V> {
    fn name(&self) -> &str {
        &self.name
    }

    fn entry_count(&self) -> usize {
        self.map.len()
    }

    fn accounted_size(&self) -> u64 {
        self.accessor.size()
    }

    fn hit_count(&self) -> u64 {
        self.stats.hits.load(Ordering::Relaxed)
    }

    fn evict(&self, count: usize, bytes: u64) -> u64 {
        let Some(_guard) = self.write_lock.try_lock() else {
            tracing::trace!(store = %self.name, "Store busy, skipped by pool evictor");
            return 0;
        };

        let mut freed = 0;
        let mut evicted = 0;
        while evicted < count && freed < bytes {
            match self.evict_relatively_unused() {
                Ok(Some(released)) => {
                    freed += released;
                    evicted += 1;
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(store = %self.name, error = %e, "Pool eviction failed");
                    break;
                }
            }
        }
        freed
    }

    fn dispose(&self) {
        let _guard = self.write_lock.lock();
        self.map.clear();
        if self.accessor.clear().is_err() {
            tracing::debug!(store = %self.name, "Store already disposed");
            return;
        }
        self.accessor.unlink();
        tracing::debug!(store = %self.name, "Disposed store");
    }
}

impl<K, V> fmt::Debug for MemoryStore<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStore")
            .field("name", &self.name)
            .field("policy", &self.policy)
            .field("max_entries", &self.max_entries)
            .field("accessor", &self.accessor)
            .finish()
    }
}

/// Unpins the key of a write when it finishes. Writes nest only on the
/// thread holding the store's write lock, so pins unwind in order.
struct PinGuard<'a, K> {
    slot: &'a Mutex<Vec<K>>,
}

impl<K> Drop for PinGuard<'_, K> {
    fn drop(&mut self) {
        self.slot.lock().pop();
    }
}
