//! Buy Strategies
//!
//! Allocation targets, opportunity scoring and the daily buy selection.

mod allocation;
mod dca;
mod scoring;

pub use allocation::AllocationTargets;
pub use dca::DCAStrategy;
pub use scoring::ScoreWeights;
