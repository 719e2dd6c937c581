use super::*;
use crate::errors::{CacheError, RecoveryHint};
use crate::evictor::NoopEvictor;
use crate::sizeof::{DeepSizeOf, DeepSizeOfEngine};
use parking_lot::Mutex;
use proptest::prelude::*;
use std::thread;

/// Value measured as exactly its payload
struct Blob(u64);

impl DeepSizeOf for Blob {
    fn heap_size_of(&self) -> Option<u64> {
        Some(0)
    }

    fn deep_size_of(&self) -> Option<u64> {
        Some(self.0)
    }
}

struct Opaque;

impl DeepSizeOf for Opaque {
    fn heap_size_of(&self) -> Option<u64> {
        None
    }
}

/// Records what it was asked to free, frees nothing
#[derive(Debug, Default)]
struct RecordingEvictor {
    requests: Mutex<Vec<u64>>,
}

impl RecordingEvictor {
    fn requests(&self) -> Vec<u64> {
        self.requests.lock().clone()
    }
}

impl PoolEvictor for RecordingEvictor {
    fn free_space(&self, _stores: &[Arc<dyn PoolableStore>], bytes: u64) -> bool {
        self.requests.lock().push(bytes);
        false
    }
}

struct Detached;

impl PoolableStore for Detached {
    fn name(&self) -> &str {
        "detached"
    }

    fn entry_count(&self) -> usize {
        0
    }

    fn accounted_size(&self) -> u64 {
        0
    }

    fn hit_count(&self) -> u64 {
        0
    }

    fn evict(&self, _count: usize, _bytes: u64) -> u64 {
        0
    }

    fn dispose(&self) {}
}

fn no_store() -> Weak<dyn PoolableStore> {
    Weak::<Detached>::new()
}

fn pool(capacity: u64, evictor: Arc<dyn PoolEvictor>) -> Pool {
    Pool::new(capacity, evictor, Arc::new(DeepSizeOfEngine::new()))
}

fn add(accessor: &PoolAccessor, bytes: u64, force: bool) -> Result<u64, CacheError> {
    accessor.add(None, Some(&Blob(bytes)), None, force)
}

#[test]
fn test_add_delete_round_trip() {
    let pool = pool(100, Arc::new(NoopEvictor));
    let accessor = pool.create_accessor("a", no_store());

    assert_eq!(add(&accessor, 40, false).unwrap(), 40);
    assert_eq!(accessor.size(), 40);
    assert_eq!(pool.total_size(), 40);

    assert_eq!(accessor.delete(None, Some(&Blob(40)), None).unwrap(), 40);
    assert_eq!(accessor.size(), 0);
    assert_eq!(pool.total_size(), 0);
}

#[test]
fn test_rejection_leaves_pool_unchanged() {
    let pool = pool(100, Arc::new(NoopEvictor));
    let accessor = pool.create_accessor("a", no_store());
    add(&accessor, 60, false).unwrap();

    let err = add(&accessor, 60, false).unwrap_err();
    assert!(err.is_rejection());
    assert_eq!(err.recovery_hint(), &RecoveryHint::RunEviction);
    assert_eq!(accessor.size(), 60);
    assert_eq!(pool.total_size(), 60);
}

#[test]
fn test_entry_larger_than_pool_skips_evictor() {
    let evictor = Arc::new(RecordingEvictor::default());
    let pool = pool(100, evictor.clone());
    let accessor = pool.create_accessor("a", no_store());

    let err = add(&accessor, 250, false).unwrap_err();
    assert!(matches!(
        err,
        CacheError::CapacityExceeded {
            missing_bytes: 150,
            recovery_hint: RecoveryHint::IncreaseCapacity { suggested_bytes: 250 },
            ..
        }
    ));
    assert!(evictor.requests().is_empty());
    assert_eq!(pool.total_size(), 0);
}

#[test]
fn test_evictor_asked_for_missing_bytes_only() {
    let evictor = Arc::new(RecordingEvictor::default());
    let pool = pool(100, evictor.clone());
    let a = pool.create_accessor("a", no_store());
    let b = pool.create_accessor("b", no_store());

    add(&a, 80, false).unwrap();
    let err = add(&b, 30, false).unwrap_err();

    assert!(err.is_rejection());
    assert_eq!(evictor.requests(), vec![10]);
    assert_eq!(a.size(), 80);
    assert_eq!(b.size(), 0);
    assert_eq!(pool.total_size(), 80);
}

#[test]
fn test_force_admits_even_when_evictor_fails() {
    let evictor = Arc::new(RecordingEvictor::default());
    let pool = pool(100, evictor.clone());
    let a = pool.create_accessor("a", no_store());
    let b = pool.create_accessor("b", no_store());

    add(&a, 80, false).unwrap();
    add(&b, 30, true).unwrap();
    assert_eq!(pool.total_size(), 110);

    // forced additions still try to make room, even for oversized entries
    add(&b, 250, true).unwrap();
    assert_eq!(evictor.requests(), vec![10, 260]);
    assert_eq!(b.size(), 280);
}

#[test]
fn test_replace_shrink_grow_and_reject() {
    let pool = pool(100, Arc::new(NoopEvictor));
    let accessor = pool.create_accessor("a", no_store());
    add(&accessor, 50, false).unwrap();

    assert_eq!(
        accessor.replace(Role::Value, &Blob(50), &Blob(20), false).unwrap(),
        -30
    );
    assert_eq!(accessor.size(), 20);

    assert_eq!(
        accessor.replace(Role::Value, &Blob(20), &Blob(90), false).unwrap(),
        70
    );
    assert_eq!(accessor.size(), 90);

    let err = accessor
        .replace(Role::Value, &Blob(90), &Blob(120), false)
        .unwrap_err();
    assert!(err.is_rejection());
    assert_eq!(accessor.size(), 90);
}

#[test]
fn test_unlinked_accessor_is_excluded_and_fails() {
    let pool = pool(100, Arc::new(NoopEvictor));
    let a = pool.create_accessor("a", no_store());
    let b = pool.create_accessor("b", no_store());
    add(&a, 30, false).unwrap();
    add(&b, 20, false).unwrap();

    a.unlink();
    a.unlink();

    assert!(a.is_unlinked());
    assert_eq!(pool.accessor_count(), 1);
    assert_eq!(pool.total_size(), 20);
    assert!(add(&a, 1, false).unwrap_err().is_usage_violation());
    assert!(a
        .delete(None, Some(&Blob(30)), None)
        .unwrap_err()
        .is_usage_violation());
    assert!(a
        .replace(Role::Key, &Blob(1), &Blob(2), false)
        .unwrap_err()
        .is_usage_violation());
    assert!(a.clear().unwrap_err().is_usage_violation());
    assert_eq!(a.size(), 30);
}

#[test]
fn test_clear_resets_live_accessor() {
    let pool = pool(100, Arc::new(NoopEvictor));
    let accessor = pool.create_accessor("a", no_store());
    add(&accessor, 45, false).unwrap();

    accessor.clear().unwrap();
    assert_eq!(accessor.size(), 0);
    assert_eq!(pool.total_size(), 0);
}

#[test]
fn test_replace_delta_saturates_past_i64_range() {
    let pool = pool(u64::MAX, Arc::new(NoopEvictor));
    let accessor = pool.create_accessor("huge", no_store());
    let huge = u64::MAX - 1;

    assert_eq!(
        accessor.replace(Role::Value, &Blob(0), &Blob(huge), false).unwrap(),
        i64::MAX
    );
    assert_eq!(accessor.size(), huge);

    assert_eq!(
        accessor.replace(Role::Value, &Blob(huge), &Blob(0), false).unwrap(),
        i64::MIN
    );
    assert_eq!(accessor.size(), 0);
}

#[test]
fn test_dropping_accessor_keeps_registration() {
    let pool = pool(100, Arc::new(NoopEvictor));
    let accessor = pool.create_accessor("a", no_store());
    add(&accessor, 10, false).unwrap();
    drop(accessor);

    assert_eq!(pool.accessor_count(), 1);
    assert_eq!(pool.total_size(), 10);
}

#[test]
fn test_measurement_failure_leaves_size_unchanged() {
    let pool = pool(100, Arc::new(NoopEvictor));
    let accessor = pool.create_accessor("a", no_store());
    add(&accessor, 10, false).unwrap();

    let err = accessor.add(None, Some(&Opaque), None, false).unwrap_err();
    assert!(matches!(err, CacheError::Measurement { role: "value", .. }));
    assert_eq!(accessor.size(), 10);
}

#[test]
fn test_stores_listed_only_while_alive() {
    let pool = pool(100, Arc::new(NoopEvictor));
    let store: Arc<dyn PoolableStore> = Arc::new(Detached);
    let _live = pool.create_accessor("live", Arc::downgrade(&store));
    let _gone = pool.create_accessor("gone", no_store());

    let stores = pool.poolable_stores();
    assert_eq!(stores.len(), 1);
    assert_eq!(stores[0].name(), "detached");
}

#[test]
fn test_concurrent_add_delete_balances() {
    let pool = pool(u64::MAX, Arc::new(NoopEvictor));
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let accessor = pool.create_accessor(format!("t{i}"), no_store());
            thread::spawn(move || {
                for _ in 0..1000 {
                    add(&accessor, 10, false).unwrap();
                    accessor.delete(None, Some(&Blob(10)), None).unwrap();
                }
                add(&accessor, 5, false).unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(pool.total_size(), 40);
}

proptest! {
    #[test]
    fn prop_total_matches_resident_bytes(
        ops in prop::collection::vec((1u64..64, any::<bool>()), 1..80)
    ) {
        let pool = pool(u64::MAX / 2, Arc::new(NoopEvictor));
        let accessor = pool.create_accessor("prop", no_store());
        let mut resident = Vec::new();

        for (bytes, remove_one) in ops {
            add(&accessor, bytes, false).unwrap();
            resident.push(bytes);
            if remove_one {
                let gone = resident.remove(0);
                accessor.delete(None, Some(&Blob(gone)), None).unwrap();
            }
            prop_assert_eq!(pool.total_size(), resident.iter().sum::<u64>());
        }
    }

    #[test]
    fn prop_total_never_exceeds_capacity_without_force(
        sizes in prop::collection::vec(1u64..300, 1..60)
    ) {
        let pool = pool(500, Arc::new(NoopEvictor));
        let accessor = pool.create_accessor("prop", no_store());
        for bytes in sizes {
            let before = pool.total_size();
            match add(&accessor, bytes, false) {
                Ok(_) => prop_assert_eq!(pool.total_size(), before + bytes),
                Err(e) => {
                    prop_assert!(e.is_rejection());
                    prop_assert_eq!(pool.total_size(), before);
                }
            }
            prop_assert!(pool.total_size() <= 500);
        }
    }
}
