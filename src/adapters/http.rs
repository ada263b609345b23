//! HTTP implementation of the `Evaluator` port.
//!
//! Posts one JSON evaluation request per call to a configured endpoint and
//! decodes the metrics payload. Any transport, status, or decode problem
//! surfaces as an evaluation failure; the experiment loop treats those as
//! non-fatal and skips the iteration's counter update.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde::Serialize;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{BacktestMetrics, Context, EvaluatorConfig, ScenarioParams};
use crate::domain::ports::Evaluator;

#[derive(Debug, Serialize)]
struct EvaluationRequest<'a> {
    description: &'a str,
    context: &'a Context,
    params: &'a ScenarioParams,
}

pub struct HttpEvaluator {
    http_client: ReqwestClient,
    endpoint: String,
}

impl HttpEvaluator {
    pub fn new(config: &EvaluatorConfig) -> DomainResult<Self> {
        let http_client = ReqwestClient::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .tcp_nodelay(true)
            .build()
            .map_err(|e| DomainError::Evaluation(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            endpoint: config.endpoint.clone(),
        })
    }
}

#[async_trait]
impl Evaluator for HttpEvaluator {
    async fn evaluate(
        &self,
        description: &str,
        context: &Context,
        params: &ScenarioParams,
    ) -> DomainResult<BacktestMetrics> {
        let request = EvaluationRequest {
            description,
            context,
            params,
        };

        let response = self
            .http_client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| DomainError::Evaluation(format!("evaluator returned {e}")))?;

        // Missing metric fields decode as zeros via serde defaults.
        let metrics: BacktestMetrics = response.json().await?;
        Ok(metrics.normalized())
    }
}
