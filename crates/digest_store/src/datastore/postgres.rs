use anyhow::Context;
use sqlx::{migrate::Migrator, postgres::PgPoolOptions, PgPool};

use crate::{
    datastore::DataStore, CachedSummary, InsufficientCredits, RequestLog, UsageTransaction,
};

static MIGRATOR: Migrator = sqlx::migrate!();

#[derive(Debug, Clone)]
pub struct PgDataStore {
    pub pool: PgPool,
}

impl PgDataStore {
    /// Establish connection to database and run the ledger, cache
    /// and request log migrations
    pub async fn init(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .inspect_err(
                |e| tracing::error!(error = ?e, "Failed to establish connection to database"),
            )
            .context("Failed to connect to postgres database")?;

        MIGRATOR
            .run(&pool)
            .await
            .inspect_err(|e| tracing::error!(error = ?e, "Failed to run database migrations"))
            .context("Failed to run database migrations")?;

        Ok(PgDataStore { pool })
    }
}

impl DataStore for PgDataStore {
    async fn get_credits(&self, user_id: &str) -> anyhow::Result<Option<i64>> {
        let credits: Option<i64> =
            sqlx::query_scalar("SELECT credits FROM user_credits WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await
                .inspect_err(|e| {
                    tracing::error!(error = ?e, %user_id, "Failed to fetch credit balance");
                })
                .context("Failed to fetch credit balance")?;

        Ok(credits)
    }

    async fn deduct_credit(&self, transaction: &UsageTransaction) -> anyhow::Result<i64> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin credit transaction")?;

        let remaining: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE user_credits
            SET credits = credits - 1, updated_at = NOW()
            WHERE user_id = $1 AND credits >= 1
            RETURNING credits
            "#,
        )
        .bind(&transaction.user_id)
        .fetch_optional(&mut *tx)
        .await
        .inspect_err(|e| {
            tracing::error!(error = ?e, user_id = %transaction.user_id, "Failed to deduct credit")
        })
        .context("Failed to deduct credit")?;

        let Some(remaining) = remaining else {
            return Err(InsufficientCredits {
                user_id: transaction.user_id.clone(),
            }
            .into());
        };

        sqlx::query(
            r#"
            INSERT INTO credit_transactions (user_id, kind, credits, video_id, provider, transcript_length, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&transaction.user_id)
        .bind(UsageTransaction::KIND)
        .bind(UsageTransaction::CREDITS)
        .bind(&transaction.video_id)
        .bind(&transaction.provider)
        .bind(transaction.transcript_length)
        .bind(transaction.date)
        .execute(&mut *tx)
        .await
        .inspect_err(|e| {
            tracing::error!(
                error = ?e,
                user_id = %transaction.user_id,
                "Failed to record credit transaction"
            )
        })
        .context("Failed to record credit transaction")?;

        tx.commit()
            .await
            .context("Failed to commit credit transaction")?;

        Ok(remaining)
    }

    async fn get_cached_summary(&self, video_id: &str) -> anyhow::Result<Option<CachedSummary>> {
        let cached = sqlx::query_as::<_, CachedSummary>(
            r#"
            SELECT video_id, summary, provider, transcript_length, created_at
            FROM cached_summaries
            WHERE video_id = $1
            "#,
        )
        .bind(video_id)
        .fetch_optional(&self.pool)
        .await
        .inspect_err(|e| tracing::error!(error = ?e, %video_id, "Failed to fetch cached summary"))
        .context("Failed to fetch cached summary")?;

        Ok(cached)
    }

    async fn cache_summary(&self, cached: &CachedSummary) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO cached_summaries (video_id, summary, provider, transcript_length, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (video_id) DO UPDATE
            SET summary = EXCLUDED.summary,
                provider = EXCLUDED.provider,
                transcript_length = EXCLUDED.transcript_length,
                created_at = EXCLUDED.created_at
            "#,
        )
        .bind(&cached.video_id)
        .bind(&cached.summary)
        .bind(&cached.provider)
        .bind(cached.transcript_length)
        .bind(cached.created_at)
        .execute(&self.pool)
        .await
        .inspect_err(|err| {
            tracing::error!(
                error = ?err,
                video_id = %cached.video_id,
                "Failed to cache summary"
            )
        })
        .context("Failed to cache summary")?;

        Ok(())
    }

    async fn record_request(&self, log: &RequestLog) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO request_logs (user_id, video_id, transcript_length, status, cache_hit, provider, error_kind, error_message, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(&log.user_id)
        .bind(&log.video_id)
        .bind(log.transcript_length)
        .bind(log.status.as_str())
        .bind(log.cache_hit)
        .bind(&log.provider)
        .bind(&log.error_kind)
        .bind(&log.error_message)
        .bind(log.created_at)
        .execute(&self.pool)
        .await
        .inspect_err(|e| {
            tracing::error!(error = ?e, user_id = %log.user_id, "Failed to record request")
        })
        .context("Failed to record request")?;

        Ok(())
    }
}
