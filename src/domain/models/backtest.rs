//! Backtest domain model: one immutable evaluation record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fixed-field metrics record produced by the evaluator.
///
/// Every field carries a serde default so a metrics payload with missing
/// keys decodes with zeros instead of failing, and scoring proceeds on the
/// fields that are present.
///
/// `max_drawdown` is stored as a non-negative magnitude. Some metric
/// sources report drawdown pre-negated; [`BacktestMetrics::normalized`]
/// folds both conventions into the magnitude form on ingest.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BacktestMetrics {
    #[serde(default)]
    pub sharpe: f64,
    #[serde(default)]
    pub cagr: f64,
    #[serde(default)]
    pub max_drawdown: f64,
    #[serde(default)]
    pub win_rate: f64,
    #[serde(default)]
    pub total_trades: u64,
    #[serde(default)]
    pub profit_factor: f64,
}

impl BacktestMetrics {
    /// Canonical form: drawdown as a non-negative magnitude.
    pub fn normalized(mut self) -> Self {
        self.max_drawdown = self.max_drawdown.abs();
        self
    }
}

/// The immutable record of one evaluation run. Created exactly once per
/// evaluation, never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Backtest {
    pub id: Uuid,
    pub metrics: BacktestMetrics,
    pub created_at: DateTime<Utc>,
}

impl Backtest {
    pub fn new(metrics: BacktestMetrics) -> Self {
        Self {
            id: Uuid::new_v4(),
            metrics: metrics.normalized(),
            created_at: Utc::now(),
        }
    }

    /// Graph node id for relationship endpoints.
    pub fn node_id(&self) -> String {
        format!("backtest:{}", self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_metric_fields_default_to_zero() {
        let metrics: BacktestMetrics =
            serde_json::from_str(r#"{"sharpe": 1.5}"#).expect("partial payload must decode");
        assert!((metrics.sharpe - 1.5).abs() < f64::EPSILON);
        assert_eq!(metrics.cagr, 0.0);
        assert_eq!(metrics.total_trades, 0);
    }

    #[test]
    fn test_normalized_folds_negated_drawdown() {
        let metrics = BacktestMetrics {
            max_drawdown: -0.25,
            ..BacktestMetrics::default()
        };
        assert_eq!(metrics.normalized().max_drawdown, 0.25);
    }
}
