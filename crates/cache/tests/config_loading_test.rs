//! Configuration file and environment precedence

mod common;

use membound_cache::config::{EvictorKind, PoolConfigLoader, SizeOfEngineKind, StorePolicy};
use membound_cache::{CacheManager, PoolConfig};
use serial_test::serial;
use std::env;
use std::fs;
use tempfile::TempDir;

fn clear_env() {
    for var in [
        "MEMBOUND_POOL_CAPACITY",
        "MEMBOUND_MAX_ENTRIES",
        "MEMBOUND_SAMPLE_SIZE",
        "MEMBOUND_EVICTOR",
        "MEMBOUND_SIZE_OF_ENGINE",
        "MEMBOUND_STORE_POLICY",
    ] {
        env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_file_then_env_precedence() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    fs::write(
        &path,
        r#"{ "capacity_bytes": 4096, "evictor": "coldest", "store": { "max_entries": 5 } }"#,
    )
    .unwrap();

    let from_file = PoolConfigLoader::load_from_path(&path).unwrap().unwrap();
    assert_eq!(from_file.capacity_bytes, 4096);
    assert_eq!(from_file.evictor, EvictorKind::Coldest);
    assert_eq!(from_file.store.max_entries, 5);

    env::set_var("MEMBOUND_POOL_CAPACITY", "8192");
    env::set_var("MEMBOUND_STORE_POLICY", "lru");
    env::set_var("MEMBOUND_SIZE_OF_ENGINE", "constant:1:2:3");
    let merged = PoolConfigLoader::apply_env(from_file).unwrap();
    clear_env();

    assert_eq!(merged.capacity_bytes, 8192);
    assert_eq!(merged.store.policy, StorePolicy::Lru);
    assert_eq!(merged.store.max_entries, 5);
    assert_eq!(
        merged.size_of_engine,
        SizeOfEngineKind::Constant {
            key_bytes: 1,
            value_bytes: 2,
            container_bytes: 3
        }
    );

    let manager = CacheManager::new(merged).unwrap();
    let store = manager.create_store::<u64, u64>("from-config").unwrap();
    store.put(1, 1).unwrap();
    assert_eq!(manager.pool().total_size(), 6);
    assert_eq!(store.policy_name(), "lru");
}

#[test]
#[serial]
fn test_invalid_env_value_is_an_error() {
    clear_env();
    env::set_var("MEMBOUND_SAMPLE_SIZE", "many");
    let result = PoolConfigLoader::apply_env(PoolConfig::default());
    clear_env();

    assert!(result.is_err());
}
