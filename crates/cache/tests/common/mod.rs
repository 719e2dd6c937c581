//! Shared helpers for the integration tests

#![allow(dead_code)]

use membound_cache::config::{EvictorKind, SizeOfEngineKind, StorePolicy};
use membound_cache::{CacheManager, PoolConfig};
use std::sync::Once;

static TRACING: Once = Once::new();

/// Route `tracing` output through the test harness, filtered by `RUST_LOG`
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// Builder for managers whose entries all cost the same number of bytes
pub struct TestPoolBuilder {
    config: PoolConfig,
}

impl TestPoolBuilder {
    /// Pool of `capacity` bytes where every entry costs `entry_bytes`
    pub fn new(capacity: u64, entry_bytes: u64) -> Self {
        let config = PoolConfig {
            capacity_bytes: capacity,
            size_of_engine: SizeOfEngineKind::Constant {
                key_bytes: 0,
                value_bytes: entry_bytes,
                container_bytes: 0,
            },
            ..PoolConfig::default()
        };
        Self { config }
    }

    pub fn with_evictor(mut self, evictor: EvictorKind) -> Self {
        self.config.evictor = evictor;
        self
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.config.store.max_entries = max_entries;
        self
    }

    pub fn with_sample_size(mut self, sample_size: usize) -> Self {
        self.config.store.sample_size = sample_size;
        self
    }

    pub fn with_policy(mut self, policy: StorePolicy) -> Self {
        self.config.store.policy = policy;
        self
    }

    pub fn build(self) -> CacheManager {
        init_tracing();
        CacheManager::new(self.config).expect("valid test pool config")
    }
}
