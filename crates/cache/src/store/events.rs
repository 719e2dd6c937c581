//! Removal notifications emitted by stores

use std::sync::Arc;

/// Why an element left a store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemovalCause {
    /// Capacity pressure, either entry count or pool bytes
    Evicted,
    /// Time-to-live or time-to-idle elapsed
    Expired,
    /// Explicit removal by the caller
    Removed,
}

/// Notification delivered to store listeners
#[derive(Debug, Clone)]
pub struct StoreEvent<K, V> {
    pub store: String,
    pub key: K,
    pub value: Arc<V>,
    pub cause: RemovalCause,
}

/// Receives removals from a store. Called on the thread that removed the
/// element while the store's write lock is held.
pub trait StoreEventListener<K, V>: Send + Sync {
    fn on_removal(&self, event: &StoreEvent<K, V>);
}
