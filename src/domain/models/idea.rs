//! Idea domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A candidate trading heuristic, the unit of exploration.
///
/// `test_count` and `total_score` are only ever mutated together, by the
/// experiment loop after a completed evaluation. Ideas are never deleted
/// in normal operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Idea {
    /// Stable unique id.
    pub id: String,
    /// Natural-language description of the heuristic.
    pub description: String,
    /// Number of completed evaluations of this exact idea.
    pub test_count: u64,
    /// Sum of composite scores over completed evaluations.
    pub total_score: f64,
    pub created_at: DateTime<Utc>,
}

impl Idea {
    /// Create a new untested idea with a generated id.
    pub fn new(description: impl Into<String>) -> Self {
        Self::with_id(format!("idea:{}", Uuid::new_v4()), description)
    }

    /// Create a new untested idea with a caller-supplied id.
    pub fn with_id(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            test_count: 0,
            total_score: 0.0,
            created_at: Utc::now(),
        }
    }

    /// Mean composite score, undefined until the idea has been tested.
    pub fn average_score(&self) -> Option<f64> {
        if self.test_count == 0 {
            None
        } else {
            #[allow(clippy::cast_precision_loss)]
            Some(self.total_score / self.test_count as f64)
        }
    }

    pub fn is_untested(&self) -> bool {
        self.test_count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_undefined_when_untested() {
        let idea = Idea::new("buy the dip on high volume");
        assert!(idea.is_untested());
        assert_eq!(idea.average_score(), None);
    }

    #[test]
    fn test_average_after_tests() {
        let mut idea = Idea::with_id("idea:1", "momentum crossover");
        idea.test_count = 4;
        idea.total_score = 2.0;
        assert_eq!(idea.average_score(), Some(0.5));
    }
}
