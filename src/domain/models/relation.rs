//! Typed relationship kinds between graph nodes.

use serde::{Deserialize, Serialize};

/// Directed, typed edges of the idea graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationKind {
    /// `Idea -> Backtest`: which idea an evaluation tested.
    TestedIn,
    /// `Backtest -> Context`: the environment the evaluation ran under.
    ExecutedIn,
    /// `Backtest -> Scenario`: the parameters the evaluation used.
    AppliesTo,
    /// `Idea -> Idea`: a derived variation of another idea.
    SubideaOf,
}

impl RelationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TestedIn => "TESTED_IN",
            Self::ExecutedIn => "EXECUTED_IN",
            Self::AppliesTo => "APPLIES_TO",
            Self::SubideaOf => "SUBIDEA_OF",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "TESTED_IN" => Some(Self::TestedIn),
            "EXECUTED_IN" => Some(Self::ExecutedIn),
            "APPLIES_TO" => Some(Self::AppliesTo),
            "SUBIDEA_OF" => Some(Self::SubideaOf),
            _ => None,
        }
    }
}

impl std::fmt::Display for RelationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relation_kind_round_trip() {
        for kind in [
            RelationKind::TestedIn,
            RelationKind::ExecutedIn,
            RelationKind::AppliesTo,
            RelationKind::SubideaOf,
        ] {
            assert_eq!(RelationKind::from_str(kind.as_str()), Some(kind));
        }
        assert_eq!(RelationKind::from_str("LINKED_TO"), None);
    }
}
