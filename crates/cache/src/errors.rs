//! Error handling for the pool and its stores
//!
//! Admission rejection, lifecycle violations and measurement failures are
//! distinct variants so callers can react to each without string matching.

mod display;
mod recovery;
mod types;

pub use types::*;
