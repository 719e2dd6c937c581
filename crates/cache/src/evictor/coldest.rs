//! Evict from the stores that earn the fewest hits per byte

use super::drain;
use crate::pool::{PoolEvictor, PoolableStore};
use std::cmp::Ordering;
use std::sync::Arc;

/// Drains stores in order of increasing hits per accounted byte.
#[derive(Debug, Clone, Copy)]
pub struct ColdestStoreEvictor {
    /// Entries requested from a store per call
    batch: usize,
}

impl ColdestStoreEvictor {
    pub fn new() -> Self {
        Self { batch: 8 }
    }

    pub fn with_batch(batch: usize) -> Self {
        Self {
            batch: batch.max(1),
        }
    }

    fn heat(store: &dyn PoolableStore) -> f64 {
        store.hit_count() as f64 / store.accounted_size().max(1) as f64
    }
}

impl Default for ColdestStoreEvictor {
    fn default() -> Self {
        Self::new()
    }
}

impl PoolEvictor for ColdestStoreEvictor {
    fn free_space(&self, stores: &[Arc<dyn PoolableStore>], bytes: u64) -> bool {
        let mut ranked: Vec<(f64, &Arc<dyn PoolableStore>)> = stores
            .iter()
            .filter(|store| store.entry_count() > 0)
            .map(|store| (Self::heat(&**store), store))
            .collect();
        ranked.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

        let mut freed = 0;
        for (heat, store) in ranked {
            if freed >= bytes {
                break;
            }
            let got = drain(&**store, bytes - freed, self.batch);
            tracing::trace!(store = store.name(), heat, bytes = got, "Drained cold store");
            freed += got;
        }

        if freed < bytes {
            tracing::warn!(requested = bytes, freed, "Could not free requested pool space");
        }
        freed >= bytes
    }
}
