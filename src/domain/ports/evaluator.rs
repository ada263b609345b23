//! Evaluator port: the external strategy evaluation boundary.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{BacktestMetrics, Context, ScenarioParams};

/// External collaborator that turns an idea description into an executable
/// strategy and runs it to obtain performance numbers.
///
/// Evaluations may block for seconds to minutes; callers await completion
/// before doing any further work. Timeouts are the evaluator's concern and
/// surface as ordinary evaluation errors.
#[async_trait]
pub trait Evaluator: Send + Sync {
    async fn evaluate(
        &self,
        description: &str,
        context: &Context,
        params: &ScenarioParams,
    ) -> DomainResult<BacktestMetrics>;
}
