//! The experiment loop: the driver that repeatedly selects an idea,
//! evaluates it, scores the result, and folds the outcome back into the
//! store.
//!
//! Iterations are strictly sequential within a process; the loop awaits
//! each evaluation to completion and never starts an iteration before the
//! previous one's writes have landed. Concurrent loops in other processes
//! are safe against the same store because counter updates and the
//! per-iteration write set are atomic at the store boundary.

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    Backtest, Config, Context, ContextConfig, ParamRanges, RetryConfig, Scenario, ScenarioParams,
};
use crate::domain::ports::{
    EvaluationRecord, Evaluator, MemoryStore, NullVariationSource, VariationSource,
};
use crate::services::scoring::composite_score;
use crate::services::selection::UcbSelector;

/// What one iteration amounted to.
enum IterationOutcome {
    /// Full write set applied for this idea.
    Evaluated { idea_id: String, score: f64 },
    /// Evaluator failed; counters untouched.
    EvaluationFailed,
    /// The store holds no ideas yet.
    NoIdea,
}

/// Counts reported after the loop terminates.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoopSummary {
    /// Iterations that applied a full write set.
    pub completed: u32,
    /// Iterations lost to evaluator failures.
    pub evaluation_failures: u32,
    /// Iterations with nothing to select.
    pub skipped: u32,
    /// Whether the loop stopped on an external shutdown signal.
    pub cancelled: bool,
}

pub struct ExperimentLoop {
    store: Arc<dyn MemoryStore>,
    evaluator: Arc<dyn Evaluator>,
    variations: Arc<dyn VariationSource>,
    selector: UcbSelector,
    iterations: u32,
    sleep_interval: Duration,
    retry: RetryConfig,
    contexts: Vec<ContextConfig>,
    ranges: ParamRanges,
}

impl ExperimentLoop {
    pub fn new(
        store: Arc<dyn MemoryStore>,
        evaluator: Arc<dyn Evaluator>,
        config: &Config,
    ) -> Self {
        Self {
            store,
            evaluator,
            variations: Arc::new(NullVariationSource),
            selector: UcbSelector::new(config.experiment.exploration_constant),
            iterations: config.experiment.iterations,
            sleep_interval: Duration::from_secs(config.experiment.sleep_interval_secs),
            retry: config.retry.clone(),
            contexts: config.contexts.clone(),
            ranges: config.parameters,
        }
    }

    /// Wire a variation collaborator; proposed ideas land untested and the
    /// untested-first rule picks them up in later iterations.
    #[must_use]
    pub fn with_variation_source(mut self, variations: Arc<dyn VariationSource>) -> Self {
        self.variations = variations;
        self
    }

    /// Run the configured number of iterations, sleeping between them and
    /// stopping early on the shutdown channel. The shutdown check happens
    /// only between iterations, never mid-evaluation.
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) -> DomainResult<LoopSummary> {
        let mut summary = LoopSummary::default();

        for iteration in 0..self.iterations {
            if shutdown.try_recv().is_ok() {
                info!(iteration, "shutdown requested; stopping experiment loop");
                summary.cancelled = true;
                break;
            }

            match self.run_iteration_with_retry(iteration).await? {
                IterationOutcome::Evaluated { idea_id, score } => {
                    info!(iteration, idea_id = %idea_id, score, "iteration complete");
                    summary.completed += 1;
                    self.propose_variations(&idea_id).await;
                }
                IterationOutcome::EvaluationFailed => summary.evaluation_failures += 1,
                IterationOutcome::NoIdea => {
                    warn!(iteration, "no idea available for selection");
                    summary.skipped += 1;
                }
            }

            if iteration + 1 < self.iterations {
                tokio::select! {
                    () = sleep(self.sleep_interval) => {}
                    _ = shutdown.recv() => {
                        info!(iteration, "shutdown requested during sleep; stopping");
                        summary.cancelled = true;
                        break;
                    }
                }
            }
        }

        info!(
            completed = summary.completed,
            evaluation_failures = summary.evaluation_failures,
            skipped = summary.skipped,
            "experiment loop finished"
        );
        Ok(summary)
    }

    /// Store failures abort and retry the whole iteration after backoff;
    /// a partial write set is never left behind because the write set is
    /// applied in one store transaction.
    async fn run_iteration_with_retry(&self, iteration: u32) -> DomainResult<IterationOutcome> {
        let mut attempt = 0u32;
        loop {
            match self.run_iteration().await {
                Ok(outcome) => return Ok(outcome),
                Err(err @ (DomainError::Store(_) | DomainError::NodeNotFound(_))) => {
                    if attempt >= self.retry.max_retries {
                        error!(iteration, attempt, error = %err, "store failure; retries exhausted");
                        return Err(err);
                    }
                    let backoff = self.retry.backoff_for_attempt(attempt);
                    let backoff_ms = u64::try_from(backoff.as_millis()).unwrap_or(u64::MAX);
                    error!(
                        iteration,
                        attempt,
                        backoff_ms,
                        error = %err,
                        "store failure; retrying iteration"
                    );
                    sleep(backoff).await;
                    attempt += 1;
                }
                Err(other) => return Err(other),
            }
        }
    }

    async fn run_iteration(&self) -> DomainResult<IterationOutcome> {
        let Some(idea_id) = self.selector.select_next(self.store.as_ref()).await? else {
            return Ok(IterationOutcome::NoIdea);
        };
        let idea = self
            .store
            .get_idea(&idea_id)
            .await?
            .ok_or_else(|| DomainError::IdeaNotFound(idea_id.clone()))?;

        let (context, params) = self.draw_environment();
        debug!(idea_id = %idea.id, context = %context, params = %params.describe(), "evaluating");

        let metrics = match self
            .evaluator
            .evaluate(&idea.description, &context, &params)
            .await
        {
            Ok(metrics) => metrics.normalized(),
            Err(err) => {
                // A failed evaluation is not evidence about the idea's
                // quality; counters stay untouched.
                warn!(
                    idea_id = %idea.id,
                    context = %context,
                    params = %params.describe(),
                    error = %err,
                    "evaluation failed; skipping counter update"
                );
                return Ok(IterationOutcome::EvaluationFailed);
            }
        };

        let score = composite_score(&metrics);
        self.store
            .record_evaluation(&EvaluationRecord {
                idea_id: idea.id.clone(),
                backtest: Backtest::new(metrics),
                context,
                scenario: Scenario::new(params),
                score,
            })
            .await?;

        Ok(IterationOutcome::Evaluated {
            idea_id: idea.id,
            score,
        })
    }

    /// One context uniformly at random from the candidate list plus fresh
    /// random scenario parameters within the configured ranges.
    fn draw_environment(&self) -> (Context, ScenarioParams) {
        let mut rng = StdRng::from_entropy();
        let context = if self.contexts.is_empty() {
            Context::new("BTC-USD", "1h")
        } else {
            let pick = &self.contexts[rng.gen_range(0..self.contexts.len())];
            Context::new(pick.market.clone(), pick.timeframe.clone())
        };
        (context, ScenarioParams::sample(&mut rng, &self.ranges))
    }

    /// Variation proposals are best-effort: a collaborator failure is
    /// logged and never disturbs the loop.
    async fn propose_variations(&self, idea_id: &str) {
        match self.variations.propose(idea_id).await {
            Ok(proposed) if proposed.is_empty() => {}
            Ok(proposed) => {
                debug!(idea_id = %idea_id, count = proposed.len(), "variation collaborator proposed ideas");
            }
            Err(err) => {
                warn!(idea_id = %idea_id, error = %err, "variation collaborator failed");
            }
        }
    }
}
