//! Sampled victim selection for entry-bounded stores
//!
//! Keeping an exact frequency or recency order costs work on every get and
//! put. Instead a store draws a small random sample of its entries only when
//! it overflows and evicts the best candidate of that sample. With the
//! default sample of 30 the chosen victim lies in the lowest quarter of the
//! distribution with very high confidence.

mod factory;
mod policies;
mod sampling;
mod traits;

// Re-export public API
pub use factory::create_eviction_policy;
pub use policies::{FifoPolicy, LfuPolicy, LruPolicy};
pub use sampling::{random_offsets, sample_by_offsets, sample_size, select_victim};
pub use traits::{Candidate, ElementStats, EvictionPolicy};
