//! Eviction policy implementations

mod fifo;
mod lfu;
mod lru;

pub use fifo::FifoPolicy;
pub use lfu::LfuPolicy;
pub use lru::LruPolicy;
