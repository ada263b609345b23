//! Business logic: scoring, selection policy, and tree search.

pub mod mcts;
pub mod scoring;
pub mod selection;

pub use mcts::{MctsController, MctsSummary, MctsTree};
pub use scoring::composite_score;
pub use selection::UcbSelector;
