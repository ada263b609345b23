//! Composite scoring of backtest metrics.
//!
//! A single scalar reward drives both the bandit comparison and MCTS
//! backpropagation. Weights are a fixed design choice, not learned.

use crate::domain::models::BacktestMetrics;

pub const SHARPE_WEIGHT: f64 = 0.5;
pub const CAGR_WEIGHT: f64 = 0.3;
pub const DRAWDOWN_WEIGHT: f64 = 0.2;

/// `0.5 * sharpe + 0.3 * cagr - 0.2 * |max_drawdown|`.
///
/// Pure and total: missing metric fields arrive as zeros. Drawdown is
/// treated as magnitude-of-loss and always subtracted, regardless of the
/// sign convention the metric source used.
pub fn composite_score(metrics: &BacktestMetrics) -> f64 {
    SHARPE_WEIGHT * metrics.sharpe + CAGR_WEIGHT * metrics.cagr
        - DRAWDOWN_WEIGHT * metrics.max_drawdown.abs()
}
