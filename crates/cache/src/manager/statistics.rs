//! Pool usage reporting

use crate::errors::{CacheError, RecoveryHint, Result, SerializationOp};
use serde::{Deserialize, Serialize};

/// Bytes and entries held by one store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreUsage {
    pub name: String,
    pub entries: usize,
    pub bytes: u64,
    pub hits: u64,
}

/// Snapshot of a pool and every store registered through the manager
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStatistics {
    pub capacity_bytes: u64,
    pub total_bytes: u64,
    pub stores: Vec<StoreUsage>,
}

impl PoolStatistics {
    /// Share of the capacity in use, as a percentage
    pub fn utilization(&self) -> f64 {
        if self.capacity_bytes == 0 {
            0.0
        } else {
            (self.total_bytes as f64 / self.capacity_bytes as f64) * 100.0
        }
    }

    pub fn free_bytes(&self) -> u64 {
        self.capacity_bytes.saturating_sub(self.total_bytes)
    }

    pub fn total_entries(&self) -> usize {
        self.stores.iter().map(|store| store.entries).sum()
    }

    /// Store holding the most bytes
    pub fn largest_store(&self) -> Option<&StoreUsage> {
        self.stores.iter().max_by_key(|store| store.bytes)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| CacheError::Serialization {
            key: "pool_statistics".to_string(),
            operation: SerializationOp::Encode,
            source: Box::new(e),
            recovery_hint: RecoveryHint::Manual {
                instructions: "Report this as a bug".to_string(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usage(name: &str, entries: usize, bytes: u64) -> StoreUsage {
        StoreUsage {
            name: name.to_string(),
            entries,
            bytes,
            hits: 0,
        }
    }

    #[test]
    fn test_statistics_derived_values() {
        let stats = PoolStatistics {
            capacity_bytes: 200,
            total_bytes: 50,
            stores: vec![usage("a", 2, 20), usage("b", 3, 30)],
        };

        assert_eq!(stats.utilization(), 25.0);
        assert_eq!(stats.free_bytes(), 150);
        assert_eq!(stats.total_entries(), 5);
        assert_eq!(stats.largest_store().map(|s| s.name.as_str()), Some("b"));
    }

    #[test]
    fn test_statistics_serialize() {
        let stats = PoolStatistics {
            capacity_bytes: 10,
            total_bytes: 0,
            stores: Vec::new(),
        };
        let json: serde_json::Value = serde_json::from_str(&stats.to_json().unwrap()).unwrap();
        assert_eq!(json["capacity_bytes"], 10);
        assert!(json["stores"].as_array().unwrap().is_empty());
    }
}
