//! Input feeding and run statistics.

mod runner;
mod stats;

pub use runner::{Runner, RunnerConfig};
pub use stats::RunStats;
