//! SQLite implementation of the `MemoryStore` port.
//!
//! Nodes live in typed tables; relationships live in a single `edges`
//! table keyed by `(from_id, relation, to_id)`. The counter bump is one
//! `UPDATE` statement, and `record_evaluation` wraps an iteration's full
//! write set in one transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Backtest, BacktestMetrics, Context, Idea, RelationKind, Scenario};
use crate::domain::ports::{EvaluationRecord, MemoryStore};

#[derive(Clone)]
pub struct SqliteMemoryStore {
    pool: SqlitePool,
}

impl SqliteMemoryStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct IdeaRow {
    id: String,
    description: String,
    test_count: i64,
    total_score: f64,
    created_at: String,
}

impl TryFrom<IdeaRow> for Idea {
    type Error = DomainError;

    fn try_from(row: IdeaRow) -> Result<Self, Self::Error> {
        Ok(Idea {
            id: row.id,
            description: row.description,
            #[allow(clippy::cast_sign_loss)]
            test_count: row.test_count.max(0) as u64,
            total_score: row.total_score,
            created_at: parse_timestamp(&row.created_at)?,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct BacktestRow {
    id: String,
    sharpe: f64,
    cagr: f64,
    max_drawdown: f64,
    win_rate: f64,
    total_trades: i64,
    profit_factor: f64,
    created_at: String,
}

impl TryFrom<BacktestRow> for Backtest {
    type Error = DomainError;

    fn try_from(row: BacktestRow) -> Result<Self, Self::Error> {
        Ok(Backtest {
            id: Uuid::parse_str(&row.id)?,
            metrics: BacktestMetrics {
                sharpe: row.sharpe,
                cagr: row.cagr,
                max_drawdown: row.max_drawdown,
                win_rate: row.win_rate,
                #[allow(clippy::cast_sign_loss)]
                total_trades: row.total_trades.max(0) as u64,
                profit_factor: row.profit_factor,
            },
            created_at: parse_timestamp(&row.created_at)?,
        })
    }
}

fn parse_timestamp(s: &str) -> DomainResult<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)?.with_timezone(&Utc))
}

#[async_trait]
impl MemoryStore for SqliteMemoryStore {
    async fn upsert_idea(&self, idea: &Idea) -> DomainResult<()> {
        sqlx::query(
            r"INSERT INTO ideas (id, description, test_count, total_score, created_at)
               VALUES (?, ?, ?, ?, ?)
               ON CONFLICT(id) DO UPDATE SET description = excluded.description",
        )
        .bind(&idea.id)
        .bind(&idea.description)
        .bind(i64::try_from(idea.test_count).unwrap_or(i64::MAX))
        .bind(idea.total_score)
        .bind(idea.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_idea(&self, id: &str) -> DomainResult<Option<Idea>> {
        let row: Option<IdeaRow> = sqlx::query_as("SELECT * FROM ideas WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(TryInto::try_into).transpose()
    }

    async fn list_ideas(&self) -> DomainResult<Vec<Idea>> {
        let rows: Vec<IdeaRow> = sqlx::query_as("SELECT * FROM ideas ORDER BY created_at, id")
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn sum_test_counts(&self) -> DomainResult<u64> {
        let (sum,): (i64,) = sqlx::query_as("SELECT COALESCE(SUM(test_count), 0) FROM ideas")
            .fetch_one(&self.pool)
            .await?;
        #[allow(clippy::cast_sign_loss)]
        let sum = sum.max(0) as u64;
        Ok(sum)
    }

    async fn increment_idea_counters(&self, id: &str, score: f64) -> DomainResult<()> {
        let result = sqlx::query(
            "UPDATE ideas SET test_count = test_count + 1, total_score = total_score + ? WHERE id = ?",
        )
        .bind(score)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::IdeaNotFound(id.to_string()));
        }
        Ok(())
    }

    async fn upsert_context(&self, context: &Context) -> DomainResult<()> {
        sqlx::query(
            "INSERT INTO contexts (id, market, timeframe) VALUES (?, ?, ?)
             ON CONFLICT(id) DO NOTHING",
        )
        .bind(context.node_id())
        .bind(&context.market)
        .bind(&context.timeframe)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert_backtest(&self, backtest: &Backtest) -> DomainResult<()> {
        sqlx::query(
            r"INSERT INTO backtests
               (id, sharpe, cagr, max_drawdown, win_rate, total_trades, profit_factor, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(backtest.id.to_string())
        .bind(backtest.metrics.sharpe)
        .bind(backtest.metrics.cagr)
        .bind(backtest.metrics.max_drawdown)
        .bind(backtest.metrics.win_rate)
        .bind(i64::try_from(backtest.metrics.total_trades).unwrap_or(i64::MAX))
        .bind(backtest.metrics.profit_factor)
        .bind(backtest.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert_scenario(&self, scenario: &Scenario) -> DomainResult<()> {
        sqlx::query(
            r"INSERT INTO scenarios
               (id, description, lookback, threshold, stop_loss, take_profit, position_size, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(scenario.id.to_string())
        .bind(scenario.params.describe())
        .bind(i64::from(scenario.params.lookback))
        .bind(scenario.params.threshold)
        .bind(scenario.params.stop_loss)
        .bind(scenario.params.take_profit)
        .bind(scenario.params.position_size)
        .bind(scenario.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn relate(&self, from_id: &str, kind: RelationKind, to_id: &str) -> DomainResult<()> {
        sqlx::query(
            "INSERT INTO edges (from_id, relation, to_id) VALUES (?, ?, ?)
             ON CONFLICT(from_id, relation, to_id) DO NOTHING",
        )
        .bind(from_id)
        .bind(kind.as_str())
        .bind(to_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn record_evaluation(&self, record: &EvaluationRecord) -> DomainResult<()> {
        let backtest = &record.backtest;
        let context = &record.context;
        let scenario = &record.scenario;

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r"INSERT INTO backtests
               (id, sharpe, cagr, max_drawdown, win_rate, total_trades, profit_factor, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(backtest.id.to_string())
        .bind(backtest.metrics.sharpe)
        .bind(backtest.metrics.cagr)
        .bind(backtest.metrics.max_drawdown)
        .bind(backtest.metrics.win_rate)
        .bind(i64::try_from(backtest.metrics.total_trades).unwrap_or(i64::MAX))
        .bind(backtest.metrics.profit_factor)
        .bind(backtest.created_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO contexts (id, market, timeframe) VALUES (?, ?, ?)
             ON CONFLICT(id) DO NOTHING",
        )
        .bind(context.node_id())
        .bind(&context.market)
        .bind(&context.timeframe)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"INSERT INTO scenarios
               (id, description, lookback, threshold, stop_loss, take_profit, position_size, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(scenario.id.to_string())
        .bind(scenario.params.describe())
        .bind(i64::from(scenario.params.lookback))
        .bind(scenario.params.threshold)
        .bind(scenario.params.stop_loss)
        .bind(scenario.params.take_profit)
        .bind(scenario.params.position_size)
        .bind(scenario.created_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        for (from, kind, to) in [
            (
                record.idea_id.clone(),
                RelationKind::TestedIn,
                backtest.node_id(),
            ),
            (
                backtest.node_id(),
                RelationKind::ExecutedIn,
                context.node_id(),
            ),
            (
                backtest.node_id(),
                RelationKind::AppliesTo,
                scenario.node_id(),
            ),
        ] {
            sqlx::query(
                "INSERT INTO edges (from_id, relation, to_id) VALUES (?, ?, ?)
                 ON CONFLICT(from_id, relation, to_id) DO NOTHING",
            )
            .bind(&from)
            .bind(kind.as_str())
            .bind(&to)
            .execute(&mut *tx)
            .await?;
        }

        let result = sqlx::query(
            "UPDATE ideas SET test_count = test_count + 1, total_score = total_score + ? WHERE id = ?",
        )
        .bind(record.score)
        .bind(&record.idea_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            // Dropping the transaction rolls back the partial write set.
            return Err(DomainError::IdeaNotFound(record.idea_id.clone()));
        }

        tx.commit().await?;
        Ok(())
    }

    async fn backtests_for_idea(&self, idea_id: &str) -> DomainResult<Vec<Backtest>> {
        let rows: Vec<BacktestRow> = sqlx::query_as(
            r"SELECT b.* FROM backtests b
               JOIN edges e ON e.to_id = 'backtest:' || b.id
               WHERE e.from_id = ? AND e.relation = 'TESTED_IN'
               ORDER BY b.created_at, b.id",
        )
        .bind(idea_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn list_contexts(&self) -> DomainResult<Vec<Context>> {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT market, timeframe FROM contexts ORDER BY id")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows
            .into_iter()
            .map(|(market, timeframe)| Context { market, timeframe })
            .collect())
    }
}
