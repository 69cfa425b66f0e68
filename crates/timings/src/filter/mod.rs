//! Filter: compiled path matchers for deciding which requests produce metrics.

pub mod engine;
pub mod paths;

pub use engine::{FilterEngine, FilterError, FilterMode};
