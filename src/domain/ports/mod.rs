//! Port traits following hexagonal architecture.

pub mod evaluator;
pub mod memory_store;
pub mod variation;

pub use evaluator::Evaluator;
pub use memory_store::{EvaluationRecord, MemoryStore};
pub use variation::{NullVariationSource, VariationSource};
