//! ideaforge: idea exploration and scoring engine for trading strategies.
//!
//! Round after round, the engine decides which candidate strategy "idea" to
//! evaluate next (UCB1 bandit selection, optionally Monte Carlo Tree
//! Search), invokes an external evaluator, scores the result, and folds the
//! outcome back into a persistent idea graph so future decisions improve.
//!
//! # Architecture
//!
//! The crate follows hexagonal architecture:
//!
//! - **Domain** (`domain`): models, errors, and port traits
//! - **Services** (`services`): scoring, UCB1 selection, MCTS controller
//! - **Application** (`application`): the experiment loop driver
//! - **Adapters** (`adapters`): SQLite and in-memory stores, HTTP evaluator
//! - **Infrastructure** (`infrastructure`): configuration loading
//! - **CLI** (`cli`): command-line interface

pub mod adapters;
pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use adapters::{HttpEvaluator, InMemoryStore, SqliteMemoryStore};
pub use application::{ExperimentLoop, LoopSummary};
pub use domain::models::{
    Backtest, BacktestMetrics, Config, Context, Idea, RelationKind, Scenario, ScenarioParams,
};
pub use domain::ports::{EvaluationRecord, Evaluator, MemoryStore, VariationSource};
pub use domain::{DomainError, DomainResult};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{composite_score, MctsController, UcbSelector};
