use crate::domain::outcomes::RawOutcomeRow;
use crate::domain::repositories::OutcomeRepository;
use crate::infrastructure::persistence::database::Database;
use anyhow::{Context, Result};
use async_trait::async_trait;

pub struct SqliteOutcomeRepository {
    database: Database,
}

impl SqliteOutcomeRepository {
    pub fn new(database: Database) -> Self {
        Self { database }
    }
}

#[async_trait]
impl OutcomeRepository for SqliteOutcomeRepository {
    /// Closed predictions joined with their realized outcome, newest first.
    /// Rows with a null PnL are still open and never reach the pipeline.
    async fn load_closed_outcomes(&self) -> Result<Vec<RawOutcomeRow>> {
        type Row = (
            String,
            String,
            String,
            f64,
            i64,
            f64,
            i64,
            String,
            i64,
            f64,
            i64,
            i64,
        );

        let rows = sqlx::query_as::<_, Row>(
            r#"
            SELECT
                p.id,
                p.symbol,
                p.direction,
                p.score,
                p.indicator_count,
                p.confidence,
                p.estimated_run_ms,
                p.indicators_hit,
                p.card_count,
                po.pnl_percent,
                p.created_at,
                po.closed_at
            FROM predictions p
            JOIN prediction_outcomes po ON p.id = po.prediction_id
            WHERE po.pnl_percent IS NOT NULL
            ORDER BY p.created_at DESC
            "#,
        )
        .fetch_all(&self.database.pool)
        .await
        .context("Failed to load closed prediction outcomes")?;

        Ok(rows
            .into_iter()
            .map(
                |(
                    id,
                    symbol,
                    direction,
                    score,
                    indicator_count,
                    confidence,
                    estimated_run_ms,
                    indicators_hit,
                    card_count,
                    pnl_percent,
                    created_at,
                    closed_at,
                )| RawOutcomeRow {
                    id,
                    symbol,
                    direction,
                    score,
                    indicator_count,
                    confidence,
                    estimated_run_ms,
                    indicators_hit,
                    card_count,
                    pnl_percent,
                    created_at,
                    closed_at,
                },
            )
            .collect())
    }
}
