//! Display implementations for cache errors

use super::types::CacheError;
use std::fmt;

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapacityExceeded {
                requested_bytes,
                missing_bytes,
                capacity_bytes,
                ..
            } => write!(
                f,
                "Pool capacity exceeded: requested {requested_bytes} bytes, {missing_bytes} bytes missing of {capacity_bytes}"
            ),
            Self::AccessorUnlinked {
                store, operation, ..
            } => write!(
                f,
                "Pool accessor for store '{store}' has been unlinked (attempted {operation})"
            ),
            Self::Measurement { role, reason, .. } => {
                write!(f, "Unable to measure {role}: {reason}")
            }
            Self::DuplicateStore { name, .. } => {
                write!(f, "Store '{name}' is already registered")
            }
            Self::Io {
                path,
                operation,
                source,
                ..
            } => write!(
                f,
                "I/O error during {} on '{}': {}",
                operation,
                path.display(),
                source
            ),
            Self::Serialization {
                key,
                operation,
                source,
                ..
            } => write!(f, "Failed to {operation:?} '{key}': {source}"),
            Self::Configuration { message, .. } => {
                write!(f, "Cache configuration error: {message}")
            }
        }
    }
}

impl std::error::Error for CacheError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Serialization { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}
