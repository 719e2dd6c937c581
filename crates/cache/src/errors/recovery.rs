//! Recovery utilities for cache errors

use super::types::{CacheError, RecoveryHint};

impl CacheError {
    /// Get the recovery hint for this error
    #[must_use]
    pub const fn recovery_hint(&self) -> &RecoveryHint {
        match self {
            Self::CapacityExceeded { recovery_hint, .. }
            | Self::AccessorUnlinked { recovery_hint, .. }
            | Self::Measurement { recovery_hint, .. }
            | Self::DuplicateStore { recovery_hint, .. }
            | Self::Io { recovery_hint, .. }
            | Self::Serialization { recovery_hint, .. }
            | Self::Configuration { recovery_hint, .. } => recovery_hint,
        }
    }

    /// The pool refused to admit an entry. Callers should serve it uncached.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(self, Self::CapacityExceeded { .. })
    }

    /// A store used its accessor after unlinking it
    #[must_use]
    pub const fn is_usage_violation(&self) -> bool {
        matches!(self, Self::AccessorUnlinked { .. })
    }

    /// Check if retrying after eviction may succeed
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self.recovery_hint(), RecoveryHint::RunEviction)
    }
}
