#![doc(test(attr(deny(warnings))))]

//! Basic graph patterns, pattern statistics, and the reorderers that choose the execution order of
//! basic graph patterns.

pub mod bgp;
mod error;
pub mod reorder;
pub mod shape;
pub mod stats;

pub use bgp::{AtomicPattern, BasicPattern, PatternSlot};
pub use error::ReorderError;
pub use reorder::{ReorderExplanation, ReorderSelector, ReorderTransformation};
pub use shape::{PatternShape, SlotShape};
pub use stats::{StatsCollector, StatsTable};
