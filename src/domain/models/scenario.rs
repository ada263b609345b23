//! Scenario domain model: the parameter set used for one evaluation.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::config::ParamRanges;

/// The numeric knobs a strategy evaluation runs with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ScenarioParams {
    pub lookback: u32,
    pub threshold: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub position_size: f64,
}

impl ScenarioParams {
    /// Draw a full parameter set uniformly from the configured ranges.
    pub fn sample<R: Rng + ?Sized>(rng: &mut R, ranges: &ParamRanges) -> Self {
        Self {
            lookback: rng.gen_range(ranges.lookback.min..=ranges.lookback.max),
            threshold: rng.gen_range(ranges.threshold.min..=ranges.threshold.max),
            stop_loss: rng.gen_range(ranges.stop_loss.min..=ranges.stop_loss.max),
            take_profit: rng.gen_range(ranges.take_profit.min..=ranges.take_profit.max),
            position_size: rng.gen_range(ranges.position_size.min..=ranges.position_size.max),
        }
    }

    /// Redraw exactly one knob, chosen uniformly, from its configured range.
    /// Used by MCTS expansion to derive a single-parameter variation.
    pub fn vary_one<R: Rng + ?Sized>(&self, rng: &mut R, ranges: &ParamRanges) -> (Self, &'static str) {
        let mut varied = *self;
        let which = rng.gen_range(0..5u8);
        let name = match which {
            0 => {
                varied.lookback = rng.gen_range(ranges.lookback.min..=ranges.lookback.max);
                "lookback"
            }
            1 => {
                varied.threshold = rng.gen_range(ranges.threshold.min..=ranges.threshold.max);
                "threshold"
            }
            2 => {
                varied.stop_loss = rng.gen_range(ranges.stop_loss.min..=ranges.stop_loss.max);
                "stop_loss"
            }
            3 => {
                varied.take_profit = rng.gen_range(ranges.take_profit.min..=ranges.take_profit.max);
                "take_profit"
            }
            _ => {
                varied.position_size =
                    rng.gen_range(ranges.position_size.min..=ranges.position_size.max);
                "position_size"
            }
        };
        (varied, name)
    }

    /// Human-readable summary, persisted as the scenario description.
    pub fn describe(&self) -> String {
        format!(
            "lookback={} threshold={:.4} stop_loss={:.4} take_profit={:.4} position_size={:.4}",
            self.lookback, self.threshold, self.stop_loss, self.take_profit, self.position_size
        )
    }
}

/// One evaluation's parameter set, keyed by a freshly generated id.
/// Ids are never reused, so scenario creation has no upsert race.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub id: Uuid,
    pub params: ScenarioParams,
    pub created_at: DateTime<Utc>,
}

impl Scenario {
    pub fn new(params: ScenarioParams) -> Self {
        Self {
            id: Uuid::new_v4(),
            params,
            created_at: Utc::now(),
        }
    }

    pub fn node_id(&self) -> String {
        format!("scenario:{}", self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_sample_respects_ranges() {
        let ranges = ParamRanges::default();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let p = ScenarioParams::sample(&mut rng, &ranges);
            assert!(p.lookback >= ranges.lookback.min && p.lookback <= ranges.lookback.max);
            assert!(p.threshold >= ranges.threshold.min && p.threshold <= ranges.threshold.max);
            assert!(
                p.position_size >= ranges.position_size.min
                    && p.position_size <= ranges.position_size.max
            );
        }
    }

    #[test]
    fn test_vary_one_changes_single_knob() {
        let ranges = ParamRanges::default();
        let mut rng = StdRng::seed_from_u64(42);
        let base = ScenarioParams::sample(&mut rng, &ranges);
        let (varied, name) = base.vary_one(&mut rng, &ranges);

        let mut changed = 0;
        if varied.lookback != base.lookback {
            changed += 1;
        }
        if (varied.threshold - base.threshold).abs() > f64::EPSILON {
            changed += 1;
        }
        if (varied.stop_loss - base.stop_loss).abs() > f64::EPSILON {
            changed += 1;
        }
        if (varied.take_profit - base.take_profit).abs() > f64::EPSILON {
            changed += 1;
        }
        if (varied.position_size - base.position_size).abs() > f64::EPSILON {
            changed += 1;
        }
        // A redraw can land on the same value; at most one knob moves.
        assert!(changed <= 1, "vary_one changed {changed} knobs ({name})");
    }
}
