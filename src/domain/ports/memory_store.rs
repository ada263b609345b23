//! Memory store port: the property-graph persistence boundary.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Backtest, Context, Idea, RelationKind, Scenario};

/// The complete write set of one successful evaluation.
///
/// [`MemoryStore::record_evaluation`] applies it atomically: either the
/// backtest, context, scenario, all three relationships, and the idea
/// counter bump land together, or none of them do.
#[derive(Debug, Clone)]
pub struct EvaluationRecord {
    pub idea_id: String,
    pub backtest: Backtest,
    pub context: Context,
    pub scenario: Scenario,
    /// Composite score folded into the idea's `total_score`.
    pub score: f64,
}

/// Property-graph store for ideas, backtests, contexts, and scenarios.
///
/// The store is the sole owner of durable state. Implementations must make
/// `increment_idea_counters` a single atomic operation (never a
/// read-modify-write pair in application code) and `upsert_context`
/// idempotent on the deterministic context id, so concurrent loops against
/// the same store cannot lose updates or duplicate contexts.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Insert an idea, or update its description if the id already exists.
    /// Counters are never touched by upsert.
    async fn upsert_idea(&self, idea: &Idea) -> DomainResult<()>;

    async fn get_idea(&self, id: &str) -> DomainResult<Option<Idea>>;

    /// All ideas in stable order (`created_at`, then id). Selection relies
    /// on this order for deterministic tie-breaking.
    async fn list_ideas(&self) -> DomainResult<Vec<Idea>>;

    /// `Σ test_count` over all ideas.
    async fn sum_test_counts(&self) -> DomainResult<u64>;

    /// Atomically apply `test_count += 1; total_score += score` to one idea.
    async fn increment_idea_counters(&self, id: &str, score: f64) -> DomainResult<()>;

    /// Idempotent upsert keyed on [`Context::node_id`].
    async fn upsert_context(&self, context: &Context) -> DomainResult<()>;

    async fn insert_backtest(&self, backtest: &Backtest) -> DomainResult<()>;

    async fn insert_scenario(&self, scenario: &Scenario) -> DomainResult<()>;

    /// Create a directed, typed relationship between two existing nodes.
    async fn relate(&self, from_id: &str, kind: RelationKind, to_id: &str) -> DomainResult<()>;

    /// Apply one evaluation's full write set atomically.
    async fn record_evaluation(&self, record: &EvaluationRecord) -> DomainResult<()>;

    /// Backtests linked from an idea via `TESTED_IN`, oldest first.
    async fn backtests_for_idea(&self, idea_id: &str) -> DomainResult<Vec<Backtest>>;

    /// Distinct contexts currently present in the store.
    async fn list_contexts(&self) -> DomainResult<Vec<Context>>;
}
