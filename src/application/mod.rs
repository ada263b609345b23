//! Application layer: loop drivers.

pub mod experiment_loop;

pub use experiment_loop::{ExperimentLoop, LoopSummary};
