use ideaforge::adapters::sqlite::{migrate, open_pool, open_test_pool, SqliteMemoryStore};
use ideaforge::domain::models::{Backtest, BacktestMetrics, Context, Idea, RelationKind, Scenario, ScenarioParams};
use ideaforge::domain::ports::{EvaluationRecord, MemoryStore};
use ideaforge::domain::DomainError;
use sqlx::SqlitePool;

async fn setup_store() -> (SqliteMemoryStore, SqlitePool) {
    let pool = open_test_pool().await.expect("failed to create test pool");
    migrate(&pool).await.expect("failed to run migrations");
    (SqliteMemoryStore::new(pool.clone()), pool)
}

fn sample_params() -> ScenarioParams {
    ScenarioParams {
        lookback: 30,
        threshold: 0.03,
        stop_loss: 0.02,
        take_profit: 0.06,
        position_size: 0.1,
    }
}

fn sample_record(idea_id: &str, score: f64) -> EvaluationRecord {
    EvaluationRecord {
        idea_id: idea_id.to_string(),
        backtest: Backtest::new(BacktestMetrics {
            sharpe: 2.0,
            cagr: 0.3,
            max_drawdown: 0.1,
            win_rate: 0.6,
            total_trades: 42,
            profit_factor: 1.8,
        }),
        context: Context::new("BTC-USD", "1h"),
        scenario: Scenario::new(sample_params()),
        score,
    }
}

#[tokio::test]
async fn test_idea_upsert_and_get() {
    let (store, _pool) = setup_store().await;

    let idea = Idea::with_id("idea:alpha", "volatility breakout");
    store.upsert_idea(&idea).await.expect("failed to upsert idea");

    let stored = store
        .get_idea("idea:alpha")
        .await
        .expect("failed to get idea")
        .expect("idea not found");
    assert_eq!(stored.id, "idea:alpha");
    assert_eq!(stored.description, "volatility breakout");
    assert_eq!(stored.test_count, 0);
    assert_eq!(stored.total_score, 0.0);

    assert!(store.get_idea("idea:missing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_upsert_does_not_reset_counters() {
    let (store, _pool) = setup_store().await;

    store
        .upsert_idea(&Idea::with_id("idea:alpha", "v1"))
        .await
        .unwrap();
    store.increment_idea_counters("idea:alpha", 0.9).await.unwrap();

    store
        .upsert_idea(&Idea::with_id("idea:alpha", "v2"))
        .await
        .unwrap();

    let stored = store.get_idea("idea:alpha").await.unwrap().unwrap();
    assert_eq!(stored.description, "v2");
    assert_eq!(stored.test_count, 1);
    assert!((stored.total_score - 0.9).abs() < 1e-12);
}

#[tokio::test]
async fn test_increment_unknown_idea_fails() {
    let (store, _pool) = setup_store().await;
    let err = store
        .increment_idea_counters("idea:ghost", 1.0)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::IdeaNotFound(_)));
}

#[tokio::test]
async fn test_concurrent_increments_lose_no_update() {
    let (store, _pool) = setup_store().await;
    store
        .upsert_idea(&Idea::with_id("idea:alpha", "breakout"))
        .await
        .unwrap();

    let a = store.clone();
    let b = store.clone();
    let (ra, rb) = tokio::join!(
        tokio::spawn(async move { a.increment_idea_counters("idea:alpha", 0.5).await }),
        tokio::spawn(async move { b.increment_idea_counters("idea:alpha", 0.7).await }),
    );
    ra.unwrap().unwrap();
    rb.unwrap().unwrap();

    let idea = store.get_idea("idea:alpha").await.unwrap().unwrap();
    assert_eq!(idea.test_count, 2);
    assert!((idea.total_score - 1.2).abs() < 1e-9);
}

#[tokio::test]
async fn test_list_ideas_is_stably_ordered() {
    let (store, _pool) = setup_store().await;
    for id in ["idea:c", "idea:a", "idea:b"] {
        store.upsert_idea(&Idea::with_id(id, id)).await.unwrap();
    }

    let first = store.list_ideas().await.unwrap();
    let second = store.list_ideas().await.unwrap();
    let ids: Vec<&str> = first.iter().map(|i| i.id.as_str()).collect();
    let ids_again: Vec<&str> = second.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, ids_again);
    assert_eq!(ids.len(), 3);
}

#[tokio::test]
async fn test_sum_test_counts_aggregates_all_ideas() {
    let (store, _pool) = setup_store().await;
    assert_eq!(store.sum_test_counts().await.unwrap(), 0);

    store.upsert_idea(&Idea::with_id("idea:a", "a")).await.unwrap();
    store.upsert_idea(&Idea::with_id("idea:b", "b")).await.unwrap();
    store.increment_idea_counters("idea:a", 0.1).await.unwrap();
    store.increment_idea_counters("idea:a", 0.2).await.unwrap();
    store.increment_idea_counters("idea:b", 0.3).await.unwrap();

    assert_eq!(store.sum_test_counts().await.unwrap(), 3);
}

#[tokio::test]
async fn test_record_evaluation_applies_full_write_set() {
    let (store, pool) = setup_store().await;
    store
        .upsert_idea(&Idea::with_id("idea:alpha", "momentum"))
        .await
        .unwrap();

    let record = sample_record("idea:alpha", 1.07);
    store.record_evaluation(&record).await.unwrap();

    let idea = store.get_idea("idea:alpha").await.unwrap().unwrap();
    assert_eq!(idea.test_count, 1);
    assert!((idea.total_score - 1.07).abs() < 1e-9);

    let backtests = store.backtests_for_idea("idea:alpha").await.unwrap();
    assert_eq!(backtests.len(), 1);
    assert_eq!(backtests[0].id, record.backtest.id);
    assert!((backtests[0].metrics.sharpe - 2.0).abs() < 1e-12);
    assert_eq!(backtests[0].metrics.total_trades, 42);

    // All three relationships landed.
    let (edges,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM edges")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(edges, 3);

    let (executed_in,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM edges WHERE relation = 'EXECUTED_IN' AND from_id = ? AND to_id = ?",
    )
    .bind(record.backtest.node_id())
    .bind(record.context.node_id())
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(executed_in, 1);

    let (applies_to,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM edges WHERE relation = 'APPLIES_TO' AND from_id = ? AND to_id = ?",
    )
    .bind(record.backtest.node_id())
    .bind(record.scenario.node_id())
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(applies_to, 1);
}

#[tokio::test]
async fn test_record_evaluation_unknown_idea_rolls_back() {
    let (store, pool) = setup_store().await;

    let err = store
        .record_evaluation(&sample_record("idea:ghost", 1.0))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::IdeaNotFound(_)));

    // Nothing from the write set may remain.
    for table in ["backtests", "contexts", "scenarios", "edges"] {
        let (count,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0, "table {table} must be empty after rollback");
    }
}

#[tokio::test]
async fn test_context_upsert_is_idempotent_across_evaluations() {
    let (store, _pool) = setup_store().await;
    store
        .upsert_idea(&Idea::with_id("idea:alpha", "momentum"))
        .await
        .unwrap();

    // Two evaluations in the same (market, timeframe).
    let first = sample_record("idea:alpha", 0.5);
    let second = sample_record("idea:alpha", 0.6);
    store.record_evaluation(&first).await.unwrap();
    store.record_evaluation(&second).await.unwrap();

    let contexts = store.list_contexts().await.unwrap();
    assert_eq!(contexts.len(), 1);
    assert_eq!(contexts[0], Context::new("BTC-USD", "1h"));

    // Both backtests link from the idea.
    let backtests = store.backtests_for_idea("idea:alpha").await.unwrap();
    assert_eq!(backtests.len(), 2);
}

#[tokio::test]
async fn test_file_backed_pool_bootstraps_directories() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let db_path = dir.path().join("nested/ideaforge.db");

    let db_config = ideaforge::domain::models::DatabaseConfig {
        path: db_path.to_string_lossy().to_string(),
        max_connections: 1,
    };
    let pool = open_pool(&db_config)
        .await
        .expect("failed to open file-backed pool");
    migrate(&pool).await.expect("failed to run migrations");

    let store = SqliteMemoryStore::new(pool);
    store.upsert_idea(&Idea::with_id("idea:disk", "persisted")).await.unwrap();
    assert!(db_path.exists());
    assert!(store.get_idea("idea:disk").await.unwrap().is_some());
}

#[tokio::test]
async fn test_subidea_relationship_round_trip() {
    let (store, pool) = setup_store().await;
    store.upsert_idea(&Idea::with_id("idea:parent", "base")).await.unwrap();
    store.upsert_idea(&Idea::with_id("idea:child", "variant")).await.unwrap();

    store
        .relate("idea:child", RelationKind::SubideaOf, "idea:parent")
        .await
        .unwrap();
    // Relating twice is a no-op.
    store
        .relate("idea:child", RelationKind::SubideaOf, "idea:parent")
        .await
        .unwrap();

    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM edges WHERE relation = 'SUBIDEA_OF'")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(count, 1);
}
