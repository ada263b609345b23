//! In-memory implementation of the `MemoryStore` port.
//!
//! Adjacency maps behind a single mutex. Used by tests and by ephemeral
//! runs that don't need durable state; every mutation holds the lock for
//! its full extent, so the atomicity guarantees match the SQLite adapter.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Backtest, Context, Idea, RelationKind, Scenario};
use crate::domain::ports::{EvaluationRecord, MemoryStore};

#[derive(Debug, Default)]
struct Graph {
    ideas: HashMap<String, Idea>,
    contexts: HashMap<String, Context>,
    backtests: HashMap<String, Backtest>,
    scenarios: HashMap<String, Scenario>,
    edges: HashSet<(String, String, String)>,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    graph: Arc<Mutex<Graph>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> DomainResult<std::sync::MutexGuard<'_, Graph>> {
        self.graph
            .lock()
            .map_err(|_| DomainError::Store("store mutex poisoned".to_string()))
    }

    /// Whether a typed edge exists. Test support.
    pub fn has_edge(&self, from_id: &str, kind: RelationKind, to_id: &str) -> bool {
        self.graph.lock().is_ok_and(|g| {
            g.edges
                .contains(&(from_id.to_string(), kind.as_str().to_string(), to_id.to_string()))
        })
    }

    /// Outgoing `(relation, to_id)` pairs for a node. Test support.
    pub fn edges_from(&self, from_id: &str) -> Vec<(String, String)> {
        self.graph.lock().map_or_else(
            |_| Vec::new(),
            |g| {
                let mut edges: Vec<(String, String)> = g
                    .edges
                    .iter()
                    .filter(|(from, _, _)| from == from_id)
                    .map(|(_, rel, to)| (rel.clone(), to.clone()))
                    .collect();
                edges.sort();
                edges
            },
        )
    }

    /// Node counts `(ideas, backtests, contexts, scenarios)`. Test support.
    pub fn node_counts(&self) -> (usize, usize, usize, usize) {
        self.graph.lock().map_or((0, 0, 0, 0), |g| {
            (
                g.ideas.len(),
                g.backtests.len(),
                g.contexts.len(),
                g.scenarios.len(),
            )
        })
    }
}

#[async_trait]
impl MemoryStore for InMemoryStore {
    async fn upsert_idea(&self, idea: &Idea) -> DomainResult<()> {
        let mut graph = self.lock()?;
        graph
            .ideas
            .entry(idea.id.clone())
            .and_modify(|existing| existing.description = idea.description.clone())
            .or_insert_with(|| idea.clone());
        Ok(())
    }

    async fn get_idea(&self, id: &str) -> DomainResult<Option<Idea>> {
        Ok(self.lock()?.ideas.get(id).cloned())
    }

    async fn list_ideas(&self) -> DomainResult<Vec<Idea>> {
        let graph = self.lock()?;
        let mut ideas: Vec<Idea> = graph.ideas.values().cloned().collect();
        ideas.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(ideas)
    }

    async fn sum_test_counts(&self) -> DomainResult<u64> {
        Ok(self.lock()?.ideas.values().map(|i| i.test_count).sum())
    }

    async fn increment_idea_counters(&self, id: &str, score: f64) -> DomainResult<()> {
        let mut graph = self.lock()?;
        let idea = graph
            .ideas
            .get_mut(id)
            .ok_or_else(|| DomainError::IdeaNotFound(id.to_string()))?;
        idea.test_count += 1;
        idea.total_score += score;
        Ok(())
    }

    async fn upsert_context(&self, context: &Context) -> DomainResult<()> {
        self.lock()?
            .contexts
            .entry(context.node_id())
            .or_insert_with(|| context.clone());
        Ok(())
    }

    async fn insert_backtest(&self, backtest: &Backtest) -> DomainResult<()> {
        self.lock()?
            .backtests
            .insert(backtest.node_id(), backtest.clone());
        Ok(())
    }

    async fn insert_scenario(&self, scenario: &Scenario) -> DomainResult<()> {
        self.lock()?
            .scenarios
            .insert(scenario.node_id(), scenario.clone());
        Ok(())
    }

    async fn relate(&self, from_id: &str, kind: RelationKind, to_id: &str) -> DomainResult<()> {
        self.lock()?.edges.insert((
            from_id.to_string(),
            kind.as_str().to_string(),
            to_id.to_string(),
        ));
        Ok(())
    }

    async fn record_evaluation(&self, record: &EvaluationRecord) -> DomainResult<()> {
        // One lock hold for the full write set: all-or-nothing, and the
        // existence check precedes any mutation.
        let mut graph = self.lock()?;
        if !graph.ideas.contains_key(&record.idea_id) {
            return Err(DomainError::IdeaNotFound(record.idea_id.clone()));
        }

        let backtest_node = record.backtest.node_id();
        let context_node = record.context.node_id();
        let scenario_node = record.scenario.node_id();

        graph
            .backtests
            .insert(backtest_node.clone(), record.backtest.clone());
        graph
            .contexts
            .entry(context_node.clone())
            .or_insert_with(|| record.context.clone());
        graph
            .scenarios
            .insert(scenario_node.clone(), record.scenario.clone());

        graph.edges.insert((
            record.idea_id.clone(),
            RelationKind::TestedIn.as_str().to_string(),
            backtest_node.clone(),
        ));
        graph.edges.insert((
            backtest_node.clone(),
            RelationKind::ExecutedIn.as_str().to_string(),
            context_node,
        ));
        graph.edges.insert((
            backtest_node,
            RelationKind::AppliesTo.as_str().to_string(),
            scenario_node,
        ));

        let idea = graph
            .ideas
            .get_mut(&record.idea_id)
            .ok_or_else(|| DomainError::IdeaNotFound(record.idea_id.clone()))?;
        idea.test_count += 1;
        idea.total_score += record.score;
        Ok(())
    }

    async fn backtests_for_idea(&self, idea_id: &str) -> DomainResult<Vec<Backtest>> {
        let graph = self.lock()?;
        let mut backtests: Vec<Backtest> = graph
            .edges
            .iter()
            .filter(|(from, rel, _)| from == idea_id && rel == RelationKind::TestedIn.as_str())
            .filter_map(|(_, _, to)| graph.backtests.get(to).cloned())
            .collect();
        backtests.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(backtests)
    }

    async fn list_contexts(&self) -> DomainResult<Vec<Context>> {
        let graph = self.lock()?;
        let mut node_ids: Vec<&String> = graph.contexts.keys().collect();
        node_ids.sort();
        Ok(node_ids
            .into_iter()
            .filter_map(|id| graph.contexts.get(id).cloned())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{BacktestMetrics, ScenarioParams};

    fn sample_params() -> ScenarioParams {
        ScenarioParams {
            lookback: 20,
            threshold: 0.02,
            stop_loss: 0.01,
            take_profit: 0.05,
            position_size: 0.1,
        }
    }

    #[tokio::test]
    async fn test_upsert_idea_preserves_counters() {
        let store = InMemoryStore::new();
        let idea = Idea::with_id("idea:1", "mean reversion");
        store.upsert_idea(&idea).await.unwrap();
        store.increment_idea_counters("idea:1", 0.8).await.unwrap();

        // Re-upserting with a new description must not reset counters.
        let renamed = Idea::with_id("idea:1", "mean reversion v2");
        store.upsert_idea(&renamed).await.unwrap();

        let stored = store.get_idea("idea:1").await.unwrap().unwrap();
        assert_eq!(stored.description, "mean reversion v2");
        assert_eq!(stored.test_count, 1);
        assert!((stored.total_score - 0.8).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_context_upsert_is_idempotent() {
        let store = InMemoryStore::new();
        let ctx = Context::new("BTC-USD", "1h");
        store.upsert_context(&ctx).await.unwrap();
        store.upsert_context(&ctx).await.unwrap();
        assert_eq!(store.list_contexts().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_increments_lose_no_update() {
        let store = InMemoryStore::new();
        store
            .upsert_idea(&Idea::with_id("idea:1", "breakout"))
            .await
            .unwrap();

        let a = store.clone();
        let b = store.clone();
        let (ra, rb) = tokio::join!(
            tokio::spawn(async move { a.increment_idea_counters("idea:1", 0.5).await }),
            tokio::spawn(async move { b.increment_idea_counters("idea:1", 0.7).await }),
        );
        ra.unwrap().unwrap();
        rb.unwrap().unwrap();

        let idea = store.get_idea("idea:1").await.unwrap().unwrap();
        assert_eq!(idea.test_count, 2);
        assert!((idea.total_score - 1.2).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_record_evaluation_unknown_idea_writes_nothing() {
        let store = InMemoryStore::new();
        let record = EvaluationRecord {
            idea_id: "idea:missing".to_string(),
            backtest: Backtest::new(BacktestMetrics::default()),
            context: Context::new("BTC-USD", "1h"),
            scenario: Scenario::new(sample_params()),
            score: 1.0,
        };

        let err = store.record_evaluation(&record).await.unwrap_err();
        assert!(matches!(err, DomainError::IdeaNotFound(_)));
        assert_eq!(store.node_counts(), (0, 0, 0, 0));
    }
}
