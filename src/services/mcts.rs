//! Monte Carlo Tree Search over the idea graph.
//!
//! The tree is an arena of nodes addressed by index, with explicit parent
//! indices. It is an ephemeral, in-process cache: every run starts a fresh
//! tree rooted at a supplied idea id, and durable state stays in the store.
//!
//! Persisted idea counters move only for the directly simulated idea;
//! ancestor value updates during backpropagation stay in the tree. Direct
//! statistics and subtree statistics answer different questions, and the
//! store keeps only the former.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    Backtest, Config, Context, ContextConfig, Idea, ParamRanges, Scenario, ScenarioParams,
};
use crate::domain::ports::{EvaluationRecord, Evaluator, MemoryStore};
use crate::services::scoring::composite_score;

pub type NodeId = usize;

/// One node of the search tree.
#[derive(Debug, Clone)]
pub struct MctsNode {
    pub idea_id: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub visits: u64,
    pub total_reward: f64,
    pub context: Context,
    pub params: ScenarioParams,
    pub description: String,
}

impl MctsNode {
    /// Mean reward `Q = W/N`, zero while unvisited.
    pub fn q(&self) -> f64 {
        if self.visits == 0 {
            0.0
        } else {
            #[allow(clippy::cast_precision_loss)]
            let visits = self.visits as f64;
            self.total_reward / visits
        }
    }
}

/// Index-arena search tree; node 0 is the root.
#[derive(Debug)]
pub struct MctsTree {
    nodes: Vec<MctsNode>,
}

impl MctsTree {
    pub fn new(root: MctsNode) -> Self {
        Self { nodes: vec![root] }
    }

    pub const fn root(&self) -> NodeId {
        0
    }

    pub fn node(&self, id: NodeId) -> &MctsNode {
        &self.nodes[id]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Descend from the root via UCB until a childless node is reached.
    pub fn select_leaf(&self, exploration_constant: f64) -> NodeId {
        let mut current = self.root();
        while let Some(next) = self.best_child(current, exploration_constant) {
            current = next;
        }
        current
    }

    /// The child maximizing `Q + c*sqrt(ln(N_parent)/N_child)`, or `None`
    /// for a childless node. A zero-visit child has infinite priority and
    /// wins before any UCB comparison; ties go to the earliest child.
    pub fn best_child(&self, parent: NodeId, exploration_constant: f64) -> Option<NodeId> {
        let node = &self.nodes[parent];
        if node.children.is_empty() {
            return None;
        }

        if let Some(&unvisited) = node
            .children
            .iter()
            .find(|&&child| self.nodes[child].visits == 0)
        {
            return Some(unvisited);
        }

        #[allow(clippy::cast_precision_loss)]
        let parent_visits = node.visits.max(1) as f64;
        let mut best: Option<(NodeId, f64)> = None;
        for &child_id in &node.children {
            let child = &self.nodes[child_id];
            #[allow(clippy::cast_precision_loss)]
            let child_visits = child.visits as f64;
            let value =
                child.q() + exploration_constant * (parent_visits.ln() / child_visits).sqrt();
            match best {
                Some((_, best_value)) if value <= best_value => {}
                _ => best = Some((child_id, value)),
            }
        }
        best.map(|(id, _)| id)
    }

    /// Attach a new unvisited node under `parent`.
    pub fn add_child(&mut self, parent: NodeId, node: MctsNode) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(MctsNode {
            parent: Some(parent),
            ..node
        });
        self.nodes[parent].children.push(id);
        id
    }

    /// Walk from `from` to the root inclusive, adding one visit and the
    /// reward to every node on the path. In-memory only.
    pub fn backpropagate(&mut self, from: NodeId, reward: f64) {
        let mut current = Some(from);
        while let Some(id) = current {
            self.nodes[id].visits += 1;
            self.nodes[id].total_reward += reward;
            current = self.nodes[id].parent;
        }
    }
}

/// Outcome of one controller run.
#[derive(Debug, Clone, serde::Serialize)]
pub struct MctsSummary {
    pub iterations: u32,
    pub evaluation_failures: u32,
    pub nodes: usize,
    pub root_visits: u64,
    pub root_reward: f64,
    pub best: Option<BestNode>,
}

/// The most promising direct child of the root after the run.
#[derive(Debug, Clone, serde::Serialize)]
pub struct BestNode {
    pub idea_id: String,
    pub visits: u64,
    pub average_reward: f64,
}

/// Drives `selection -> expansion -> simulation -> backpropagation` for a
/// caller-supplied number of iterations from a caller-supplied root idea.
pub struct MctsController {
    store: Arc<dyn MemoryStore>,
    evaluator: Arc<dyn Evaluator>,
    contexts: Vec<ContextConfig>,
    ranges: ParamRanges,
    exploration_constant: f64,
    rng: StdRng,
}

impl MctsController {
    pub fn new(
        store: Arc<dyn MemoryStore>,
        evaluator: Arc<dyn Evaluator>,
        config: &Config,
    ) -> Self {
        Self::with_rng(store, evaluator, config, StdRng::from_entropy())
    }

    /// Constructor with an injected RNG for deterministic tests.
    pub fn with_rng(
        store: Arc<dyn MemoryStore>,
        evaluator: Arc<dyn Evaluator>,
        config: &Config,
        rng: StdRng,
    ) -> Self {
        Self {
            store,
            evaluator,
            contexts: config.contexts.clone(),
            ranges: config.parameters,
            exploration_constant: config.mcts.exploration_constant,
            rng,
        }
    }

    pub async fn run(&mut self, root_idea_id: &str, iterations: u32) -> DomainResult<MctsSummary> {
        let root_idea = self
            .store
            .get_idea(root_idea_id)
            .await?
            .ok_or_else(|| DomainError::IdeaNotFound(root_idea_id.to_string()))?;

        let root_context = self
            .contexts
            .first()
            .map_or_else(|| Context::new("BTC-USD", "1h"), |c| {
                Context::new(c.market.clone(), c.timeframe.clone())
            });
        let root_params = ScenarioParams::sample(&mut self.rng, &self.ranges);
        let mut tree = MctsTree::new(MctsNode {
            idea_id: root_idea.id.clone(),
            parent: None,
            children: Vec::new(),
            visits: 0,
            total_reward: 0.0,
            context: root_context,
            params: root_params,
            description: root_idea.description,
        });

        let mut evaluation_failures = 0u32;
        for iteration in 0..iterations {
            let leaf = tree.select_leaf(self.exploration_constant);
            let child = self.expand(&mut tree, leaf).await?;

            match self.simulate(&tree, child).await {
                Ok(score) => {
                    tree.backpropagate(child, score);
                    debug!(iteration, node = child, score, "simulation complete");
                }
                Err(DomainError::Evaluation(reason)) => {
                    let node = tree.node(child);
                    warn!(
                        iteration,
                        idea_id = %node.idea_id,
                        context = %node.context,
                        params = %node.params.describe(),
                        reason,
                        "evaluation failed; no statistics recorded"
                    );
                    evaluation_failures += 1;
                }
                Err(other) => return Err(other),
            }
        }

        let root = tree.node(tree.root());
        let best = root
            .children
            .iter()
            .map(|&child| tree.node(child))
            .filter(|child| child.visits > 0)
            .max_by(|a, b| a.q().partial_cmp(&b.q()).unwrap_or(std::cmp::Ordering::Equal))
            .map(|child| BestNode {
                idea_id: child.idea_id.clone(),
                visits: child.visits,
                average_reward: child.q(),
            });

        info!(
            iterations,
            evaluation_failures,
            nodes = tree.len(),
            "MCTS run finished"
        );

        Ok(MctsSummary {
            iterations,
            evaluation_failures,
            nodes: tree.len(),
            root_visits: root.visits,
            root_reward: root.total_reward,
            best,
        })
    }

    /// Materialize exactly one new child idea under the leaf: either a
    /// context variation or a single-parameter variation, both drawn
    /// uniformly. The idea is persisted untested before it joins the tree.
    async fn expand(&mut self, tree: &mut MctsTree, leaf: NodeId) -> DomainResult<NodeId> {
        let parent = tree.node(leaf).clone();

        let (context, params, note) = if self.rng.gen_bool(0.5) && !self.contexts.is_empty() {
            let pick = &self.contexts[self.rng.gen_range(0..self.contexts.len())];
            let context = Context::new(pick.market.clone(), pick.timeframe.clone());
            let note = format!("context {context}");
            (context, parent.params, note)
        } else {
            let (params, knob) = parent.params.vary_one(&mut self.rng, &self.ranges);
            (parent.context.clone(), params, format!("vary {knob}"))
        };

        let description = format!("{} [{note}]", parent.description);
        let idea = Idea::new(&description);
        self.store.upsert_idea(&idea).await?;
        debug!(parent = %parent.idea_id, child = %idea.id, note, "expanded new idea");

        Ok(tree.add_child(
            leaf,
            MctsNode {
                idea_id: idea.id,
                parent: Some(leaf),
                children: Vec::new(),
                visits: 0,
                total_reward: 0.0,
                context,
                params,
                description,
            },
        ))
    }

    /// Evaluate the node's idea and persist the full write set atomically.
    /// Returns the composite score for backpropagation.
    async fn simulate(&self, tree: &MctsTree, node_id: NodeId) -> DomainResult<f64> {
        let node = tree.node(node_id);
        let metrics = self
            .evaluator
            .evaluate(&node.description, &node.context, &node.params)
            .await?
            .normalized();
        let score = composite_score(&metrics);

        self.store
            .record_evaluation(&EvaluationRecord {
                idea_id: node.idea_id.clone(),
                backtest: Backtest::new(metrics),
                context: node.context.clone(),
                scenario: Scenario::new(node.params),
                score,
            })
            .await?;

        Ok(score)
    }
}
