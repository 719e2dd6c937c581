//! Core error types for the cache system

use std::path::PathBuf;

/// Result type for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;

/// Re-export CacheError as Error for convenience
pub use CacheError as Error;

/// Error type for pool accounting, store operations and configuration
#[derive(Debug)]
pub enum CacheError {
    /// The pool could not make room for an addition
    CapacityExceeded {
        requested_bytes: u64,
        missing_bytes: u64,
        capacity_bytes: u64,
        recovery_hint: RecoveryHint,
    },

    /// A mutation was attempted through an accessor that has been unlinked
    AccessorUnlinked {
        store: String,
        operation: &'static str,
        recovery_hint: RecoveryHint,
    },

    /// The size-of engine could not measure part of an entry
    Measurement {
        role: &'static str,
        reason: String,
        recovery_hint: RecoveryHint,
    },

    /// A store with this name is already registered
    DuplicateStore {
        name: String,
        recovery_hint: RecoveryHint,
    },

    /// I/O errors while loading configuration
    Io {
        path: PathBuf,
        operation: &'static str,
        source: std::io::Error,
        recovery_hint: RecoveryHint,
    },

    /// Configuration file could not be decoded
    Serialization {
        key: String,
        operation: SerializationOp,
        source: Box<dyn std::error::Error + Send + Sync>,
        recovery_hint: RecoveryHint,
    },

    /// Configuration error
    Configuration {
        message: String,
        recovery_hint: RecoveryHint,
    },
}

/// Recovery hints for error handling
#[derive(Debug, Clone, PartialEq)]
pub enum RecoveryHint {
    /// Skip caching this entry and serve it uncached
    ServeUncached,

    /// Increase pool capacity
    IncreaseCapacity { suggested_bytes: u64 },

    /// Run eviction before retrying
    RunEviction,

    /// The caller has a lifecycle bug that must be fixed
    FixLifecycle,

    /// Check file permissions
    CheckPermissions { path: PathBuf },

    /// No automated recovery possible
    Manual { instructions: String },

    /// Use a default value
    UseDefault { value: String },

    /// Update configuration
    UpdateConfiguration,
}

/// Serialization operation types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SerializationOp {
    Encode,
    Decode,
}
