//! UCB1 selection policy over persisted idea statistics.

use tracing::debug;

use crate::domain::errors::DomainResult;
use crate::domain::ports::MemoryStore;

/// The UCB1 exploration bonus plus exploitation term.
///
/// `avg + c * sqrt(ln(total_tests) / test_count)`. `total_tests` of zero is
/// treated as one to keep `ln` in its domain.
pub fn ucb1(average_score: f64, total_tests: u64, test_count: u64, exploration_constant: f64) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let n = total_tests.max(1) as f64;
    #[allow(clippy::cast_precision_loss)]
    let tests = test_count as f64;
    average_score + exploration_constant * (n.ln() / tests).sqrt()
}

/// Picks the next idea to evaluate: untested ideas first, then the tested
/// idea with the highest UCB1 value.
#[derive(Debug, Clone, Copy)]
pub struct UcbSelector {
    exploration_constant: f64,
}

impl Default for UcbSelector {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl UcbSelector {
    pub fn new(exploration_constant: f64) -> Self {
        Self {
            exploration_constant,
        }
    }

    /// Select the next idea id to evaluate, or `None` when the store holds
    /// no ideas at all.
    ///
    /// Deterministic for a fixed store state: untested ideas win outright
    /// (their bonus is effectively infinite), and UCB ties resolve to the
    /// first idea in the store's stable iteration order.
    pub async fn select_next(&self, store: &dyn MemoryStore) -> DomainResult<Option<String>> {
        let ideas = store.list_ideas().await?;
        if ideas.is_empty() {
            return Ok(None);
        }

        if let Some(untested) = ideas.iter().find(|idea| idea.is_untested()) {
            debug!(idea_id = %untested.id, "selecting untested idea");
            return Ok(Some(untested.id.clone()));
        }

        let total_tests = store.sum_test_counts().await?;
        let mut best: Option<(&str, f64)> = None;
        for idea in &ideas {
            // Every idea is tested here, so average_score is defined.
            let Some(avg) = idea.average_score() else {
                continue;
            };
            let value = ucb1(avg, total_tests, idea.test_count, self.exploration_constant);
            match best {
                Some((_, best_value)) if value <= best_value => {}
                _ => best = Some((&idea.id, value)),
            }
        }

        let selected = best.map(|(id, value)| {
            debug!(idea_id = %id, ucb = value, "selected idea by UCB1");
            id.to_string()
        });
        Ok(selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStore;
    use crate::domain::models::Idea;

    async fn seed_idea(store: &InMemoryStore, id: &str, test_count: u64, total_score: f64) {
        let mut idea = Idea::with_id(id, format!("idea {id}"));
        idea.test_count = test_count;
        idea.total_score = total_score;
        store.upsert_idea(&idea).await.unwrap();
    }

    #[tokio::test]
    async fn test_empty_store_selects_nothing() {
        let store = InMemoryStore::new();
        let selected = UcbSelector::default().select_next(&store).await.unwrap();
        assert_eq!(selected, None);
    }

    #[tokio::test]
    async fn test_untested_idea_wins_regardless_of_exploration_constant() {
        let store = InMemoryStore::new();
        seed_idea(&store, "idea:hot", 10, 50.0).await;
        seed_idea(&store, "idea:new", 0, 0.0).await;

        for c in [0.0, 1.0, 100.0] {
            let selected = UcbSelector::new(c).select_next(&store).await.unwrap();
            assert_eq!(selected.as_deref(), Some("idea:new"));
        }
    }

    #[tokio::test]
    async fn test_highest_ucb_wins_when_all_tested() {
        let store = InMemoryStore::new();
        // Same sample count, different averages: pure exploitation.
        seed_idea(&store, "idea:a", 5, 1.0).await;
        seed_idea(&store, "idea:b", 5, 4.0).await;

        let selected = UcbSelector::new(1.0).select_next(&store).await.unwrap();
        assert_eq!(selected.as_deref(), Some("idea:b"));
    }

    #[tokio::test]
    async fn test_exploration_bonus_favors_undersampled_idea() {
        let store = InMemoryStore::new();
        // Equal averages; the idea with fewer tests has the larger bonus.
        seed_idea(&store, "idea:heavy", 100, 50.0).await;
        seed_idea(&store, "idea:light", 2, 1.0).await;

        let selected = UcbSelector::new(1.0).select_next(&store).await.unwrap();
        assert_eq!(selected.as_deref(), Some("idea:light"));
    }

    #[tokio::test]
    async fn test_ties_resolve_to_first_in_stable_order() {
        let store = InMemoryStore::new();
        // Identical statistics; "idea:a" sorts first by (created_at, id).
        seed_idea(&store, "idea:b", 3, 1.5).await;
        seed_idea(&store, "idea:a", 3, 1.5).await;

        let ideas = store.list_ideas().await.unwrap();
        let first = ideas[0].id.clone();
        let selected = UcbSelector::new(1.0).select_next(&store).await.unwrap();
        assert_eq!(selected, Some(first));
    }

    #[test]
    fn test_ucb_total_of_zero_does_not_panic() {
        let value = ucb1(0.5, 0, 1, 1.0);
        // ln(1) == 0, so the bonus vanishes.
        assert!((value - 0.5).abs() < 1e-12);
    }
}
