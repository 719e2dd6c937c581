//! FIFO (First In First Out) eviction policy implementation

use crate::eviction::traits::{ElementStats, EvictionPolicy};

#[derive(Debug, Default, Clone, Copy)]
pub struct FifoPolicy;

impl EvictionPolicy for FifoPolicy {
    fn name(&self) -> &'static str {
        "fifo"
    }

    fn compare(&self, current: &ElementStats, candidate: &ElementStats) -> bool {
        candidate.created < current.created
    }
}
