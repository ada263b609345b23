//! Domain models for the idea graph.
//!
//! Four node kinds (Idea, Backtest, Context, Scenario) and four typed
//! relationship kinds connect them. The store owns durable state; these
//! structs are plain values with no persistence logic.

pub mod backtest;
pub mod config;
pub mod context;
pub mod idea;
pub mod relation;
pub mod scenario;

pub use backtest::{Backtest, BacktestMetrics};
pub use config::{
    Config, ContextConfig, DatabaseConfig, EvaluatorConfig, ExperimentConfig, LoggingConfig,
    MctsConfig, ParamRanges, Range, RetryConfig,
};
pub use context::Context;
pub use idea::Idea;
pub use relation::RelationKind;
pub use scenario::{Scenario, ScenarioParams};
