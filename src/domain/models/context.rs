//! Context domain model: the market/timeframe environment of an evaluation.

use serde::{Deserialize, Serialize};

/// An evaluation environment descriptor.
///
/// Identity derives deterministically from `(market, timeframe)` so
/// repeated use upserts into the same node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Context {
    pub market: String,
    pub timeframe: String,
}

impl Context {
    pub fn new(market: impl Into<String>, timeframe: impl Into<String>) -> Self {
        Self {
            market: market.into(),
            timeframe: timeframe.into(),
        }
    }

    /// Deterministic node id, the upsert key.
    pub fn node_id(&self) -> String {
        format!("ctx:{}:{}", self.market, self.timeframe)
    }
}

impl std::fmt::Display for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.market, self.timeframe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_is_deterministic() {
        let a = Context::new("BTC-USD", "1h");
        let b = Context::new("BTC-USD", "1h");
        assert_eq!(a.node_id(), b.node_id());
        assert_eq!(a.node_id(), "ctx:BTC-USD:1h");
    }
}
