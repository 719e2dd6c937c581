//! Byte-bounded memory pool shared by in-process caches
//!
//! Independent stores register with one [`Pool`] through a
//! [`PoolAccessor`]. Every write is measured by a [`SizeOfEngine`] and
//! admitted against the pool's aggregate capacity; when it does not fit, a
//! [`PoolEvictor`] reclaims bytes from whichever stores it chooses, and each
//! store gives up victims picked by sampled eviction.
//!
//! [`CacheManager`] wires a pool and its stores together from a
//! [`PoolConfig`].

pub mod config;
pub mod errors;
pub mod eviction;
pub mod evictor;
pub mod manager;
pub mod pool;
pub mod sizeof;
pub mod store;

pub use config::{PoolConfig, PoolConfigLoader, StoreConfig};
pub use errors::{CacheError, Error, RecoveryHint, Result};
pub use eviction::{EvictionPolicy, FifoPolicy, LfuPolicy, LruPolicy};
pub use evictor::{ColdestStoreEvictor, FromLargestStoreEvictor, NoopEvictor};
pub use manager::{CacheManager, PoolStatistics};
pub use pool::{Pool, PoolAccessor, PoolEvictor, PoolableStore, Role};
pub use sizeof::{ConstantSizeOfEngine, DeepSizeOf, DeepSizeOfEngine, SizeOfEngine};
pub use store::{MemoryStore, PutOutcome, RemovalCause, StoreEvent, StoreEventListener};
