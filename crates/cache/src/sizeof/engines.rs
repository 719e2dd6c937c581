//! Size-of engine implementations

use super::{DeepSizeOf, SizeOfEngine};
use crate::config::SizeOfEngineKind;
use crate::errors::{CacheError, RecoveryHint, Result};
use std::sync::Arc;

/// Exact engine walking every part through [`DeepSizeOf`].
#[derive(Debug, Default, Clone, Copy)]
pub struct DeepSizeOfEngine;

impl DeepSizeOfEngine {
    pub fn new() -> Self {
        Self
    }

    fn measure(role: &'static str, part: Option<&dyn DeepSizeOf>) -> Result<u64> {
        let Some(part) = part else {
            return Ok(0);
        };
        part.deep_size_of().ok_or_else(|| CacheError::Measurement {
            role,
            reason: "value graph reported itself as unmeasurable".to_string(),
            recovery_hint: RecoveryHint::ServeUncached,
        })
    }
}

impl SizeOfEngine for DeepSizeOfEngine {
    fn size_of(
        &self,
        key: Option<&dyn DeepSizeOf>,
        value: Option<&dyn DeepSizeOf>,
        container: Option<&dyn DeepSizeOf>,
    ) -> Result<u64> {
        Ok(Self::measure("key", key)?
            + Self::measure("value", value)?
            + Self::measure("container", container)?)
    }
}

/// Approximate engine charging a fixed cost per present part.
///
/// Never inspects the values, so it never fails and costs nothing to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstantSizeOfEngine {
    pub key_bytes: u64,
    pub value_bytes: u64,
    pub container_bytes: u64,
}

impl ConstantSizeOfEngine {
    pub const fn new(key_bytes: u64, value_bytes: u64, container_bytes: u64) -> Self {
        Self {
            key_bytes,
            value_bytes,
            container_bytes,
        }
    }
}

impl SizeOfEngine for ConstantSizeOfEngine {
    fn size_of(
        &self,
        key: Option<&dyn DeepSizeOf>,
        value: Option<&dyn DeepSizeOf>,
        container: Option<&dyn DeepSizeOf>,
    ) -> Result<u64> {
        let mut total = 0;
        if key.is_some() {
            total += self.key_bytes;
        }
        if value.is_some() {
            total += self.value_bytes;
        }
        if container.is_some() {
            total += self.container_bytes;
        }
        Ok(total)
    }
}

/// Build the engine named by configuration
pub fn create_size_of_engine(kind: &SizeOfEngineKind) -> Arc<dyn SizeOfEngine> {
    match kind {
        SizeOfEngineKind::Deep => Arc::new(DeepSizeOfEngine::new()),
        SizeOfEngineKind::Constant {
            key_bytes,
            value_bytes,
            container_bytes,
        } => Arc::new(ConstantSizeOfEngine::new(
            *key_bytes,
            *value_bytes,
            *container_bytes,
        )),
    }
}
