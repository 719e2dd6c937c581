//! Pool evictor implementations
//!
//! Each evictor sees every live store of the pool and decides which ones
//! give up entries. Stores pick their own victims through their sampled
//! policy; evictors only choose the order in which stores are asked.

mod coldest;
mod largest;

pub use coldest::ColdestStoreEvictor;
pub use largest::FromLargestStoreEvictor;

use crate::config::EvictorKind;
use crate::pool::{PoolEvictor, PoolableStore};
use std::sync::Arc;

/// Evictor that never frees anything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEvictor;

impl PoolEvictor for NoopEvictor {
    fn free_space(&self, _stores: &[Arc<dyn PoolableStore>], bytes: u64) -> bool {
        bytes == 0
    }
}

/// Pool evictor factory
pub fn create_pool_evictor(kind: EvictorKind) -> Arc<dyn PoolEvictor> {
    match kind {
        EvictorKind::FromLargest => Arc::new(FromLargestStoreEvictor::new()),
        EvictorKind::Coldest => Arc::new(ColdestStoreEvictor::new()),
        EvictorKind::None => Arc::new(NoopEvictor),
    }
}

/// Ask one store for entries until `bytes` are freed or it stops giving any.
fn drain(store: &dyn PoolableStore, bytes: u64, batch: usize) -> u64 {
    let mut freed = 0;
    while freed < bytes {
        let got = store.evict(batch, bytes - freed);
        if got == 0 {
            break;
        }
        freed += got;
    }
    freed
}
