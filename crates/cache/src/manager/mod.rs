//! Owner of one pool and the named stores sharing it

mod statistics;

pub use statistics::{PoolStatistics, StoreUsage};

use crate::config::{PoolConfig, PoolConfigLoader, StoreConfig};
use crate::errors::{CacheError, RecoveryHint, Result};
use crate::pool::{Pool, PoolableStore};
use crate::store::{MemoryStore, StoreKey, StoreValue};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

/// Creates stores in a shared pool and disposes them on shutdown.
///
/// Dropping the manager disposes every store it created; handles still held
/// elsewhere fail with a lifecycle error afterwards.
pub struct CacheManager {
    config: PoolConfig,
    pool: Pool,
    stores: DashMap<String, Arc<dyn PoolableStore>>,
}

impl CacheManager {
    pub fn new(config: PoolConfig) -> Result<Self> {
        config.validate()?;
        let pool = Pool::from_config(&config);
        tracing::info!(
            capacity_bytes = config.capacity_bytes,
            evictor = ?config.evictor,
            source = ?config.source,
            "Created cache pool"
        );

        Ok(Self {
            config,
            pool,
            stores: DashMap::new(),
        })
    }

    /// Create a manager from the config file and `MEMBOUND_*` environment
    pub fn load() -> Result<Self> {
        Self::new(PoolConfigLoader::load()?)
    }

    /// Create a store with the manager's default store settings
    pub fn create_store<K: StoreKey, V: StoreValue>(
        &self,
        name: &str,
    ) -> Result<Arc<MemoryStore<K, V>>> {
        let config = self.config.store.clone();
        self.create_store_with(name, &config)
    }

    pub fn create_store_with<K: StoreKey, V: StoreValue>(
        &self,
        name: &str,
        config: &StoreConfig,
    ) -> Result<Arc<MemoryStore<K, V>>> {
        match self.stores.entry(name.to_string()) {
            Entry::Occupied(_) => Err(CacheError::DuplicateStore {
                name: name.to_string(),
                recovery_hint: RecoveryHint::Manual {
                    instructions: format!("Remove store '{name}' first or pick another name"),
                },
            }),
            Entry::Vacant(slot) => {
                let store = MemoryStore::new(name, &self.pool, config)?;
                slot.insert(store.clone());
                tracing::debug!(
                    store = name,
                    policy = store.policy_name(),
                    max_entries = config.max_entries,
                    "Created store"
                );
                Ok(store)
            }
        }
    }

    /// Dispose and forget a store. Returns false if no such store exists.
    pub fn remove_store(&self, name: &str) -> bool {
        match self.stores.remove(name) {
            Some((_, store)) => {
                store.dispose();
                true
            }
            None => false,
        }
    }

    /// Names of all live stores, sorted
    pub fn store_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.stores.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn statistics(&self) -> PoolStatistics {
        let mut stores: Vec<StoreUsage> = self
            .stores
            .iter()
            .map(|entry| {
                let store = entry.value();
                StoreUsage {
                    name: entry.key().clone(),
                    entries: store.entry_count(),
                    bytes: store.accounted_size(),
                    hits: store.hit_count(),
                }
            })
            .collect();
        stores.sort_by(|a, b| a.name.cmp(&b.name));

        PoolStatistics {
            capacity_bytes: self.pool.capacity(),
            total_bytes: self.pool.total_size(),
            stores,
        }
    }

    /// Dispose every store
    pub fn shutdown(&self) {
        let names: Vec<String> = self.stores.iter().map(|e| e.key().clone()).collect();
        for name in &names {
            self.remove_store(name);
        }
        if !names.is_empty() {
            tracing::info!(stores = names.len(), "Cache manager shut down");
        }
    }
}

impl Drop for CacheManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}
