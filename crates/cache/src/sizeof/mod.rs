//! Footprint measurement for pooled entries
//!
//! A [`SizeOfEngine`] turns the parts of a stored triple (key, value and the
//! element container wrapping them) into a byte count the pool can account.
//! Engines must be deterministic: measuring an unchanged triple twice yields
//! the same number, so a `delete` exactly cancels the matching `add`.

mod deep;
mod engines;

pub use deep::DeepSizeOf;
pub use engines::{create_size_of_engine, ConstantSizeOfEngine, DeepSizeOfEngine};

use crate::errors::Result;
use std::fmt;

/// Measures the in-memory footprint of cache entries
pub trait SizeOfEngine: Send + Sync + fmt::Debug {
    /// Total bytes of the parts that are present.
    fn size_of(
        &self,
        key: Option<&dyn DeepSizeOf>,
        value: Option<&dyn DeepSizeOf>,
        container: Option<&dyn DeepSizeOf>,
    ) -> Result<u64>;
}
