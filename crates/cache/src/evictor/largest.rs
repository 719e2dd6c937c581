//! Evict from whichever store holds the most bytes

use crate::pool::{PoolEvictor, PoolableStore};
use std::sync::Arc;

/// Repeatedly takes one entry from the currently largest store.
///
/// Re-ranks after every eviction so a single store is never drained far
/// below its peers.
#[derive(Debug, Default, Clone, Copy)]
pub struct FromLargestStoreEvictor;

impl FromLargestStoreEvictor {
    pub fn new() -> Self {
        Self
    }
}

impl PoolEvictor for FromLargestStoreEvictor {
    fn free_space(&self, stores: &[Arc<dyn PoolableStore>], bytes: u64) -> bool {
        let mut freed = 0;
        let mut exhausted = vec![false; stores.len()];

        while freed < bytes {
            let largest = stores
                .iter()
                .enumerate()
                .filter(|(i, _)| !exhausted[*i])
                .max_by_key(|(_, store)| store.accounted_size());

            let Some((index, store)) = largest else {
                break;
            };

            let got = store.evict(1, bytes - freed);
            if got == 0 {
                exhausted[index] = true;
            } else {
                tracing::trace!(store = store.name(), bytes = got, "Evicted from largest store");
                freed += got;
            }
        }

        if freed < bytes {
            tracing::warn!(requested = bytes, freed, "Could not free requested pool space");
        }
        freed >= bytes
    }
}
