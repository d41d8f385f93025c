//! PostgreSQL-backed lock store.

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;

use super::{LockRecord, LockStore};
use crate::errors::BotError;

/// Advisory lock key serializing the schema bootstrap across cold starts.
const SCHEMA_LOCK_KEY: i64 = 0x6c6f_636b_7573_6572;

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS user_locks ( \
     chat_id BIGINT PRIMARY KEY, \
     locked_at TIMESTAMPTZ NOT NULL DEFAULT NOW() \
     )";

pub struct PgLockStore {
    pool: PgPool,
}

impl PgLockStore {
    /// Build a pool without connecting; connection failures surface on first
    /// use as `LockStoreUnavailable`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if `database_url` cannot be parsed.
    pub fn connect_lazy(database_url: &str) -> Result<Self, BotError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(5))
            .connect_lazy(database_url)
            .map_err(|e| BotError::InvalidConfiguration(format!("DATABASE_URL: {e}")))?;
        Ok(Self { pool })
    }

    #[must_use]
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LockStore for PgLockStore {
    async fn ensure_schema(&self) -> Result<(), BotError> {
        // Concurrent `CREATE TABLE IF NOT EXISTS` can still collide on the
        // catalog; the transaction-scoped advisory lock serializes it.
        let mut tx = self.pool.begin().await?;
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(SCHEMA_LOCK_KEY)
            .execute(&mut *tx)
            .await?;
        sqlx::query(CREATE_TABLE).execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn reap_stale(&self, threshold: Duration) -> Result<u64, BotError> {
        let secs = i64::try_from(threshold.as_secs()).unwrap_or(i64::MAX);
        let result = sqlx::query(
            "DELETE FROM user_locks \
             WHERE locked_at < NOW() - ($1::BIGINT * INTERVAL '1 second')",
        )
        .bind(secs)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn try_acquire(&self, chat_id: i64) -> Result<Option<LockRecord>, BotError> {
        let record = sqlx::query_as::<_, LockRecord>(
            "INSERT INTO user_locks (chat_id) VALUES ($1) \
             ON CONFLICT (chat_id) DO NOTHING \
             RETURNING chat_id, locked_at",
        )
        .bind(chat_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    async fn release(&self, chat_id: i64) -> Result<(), BotError> {
        sqlx::query("DELETE FROM user_locks WHERE chat_id = $1")
            .bind(chat_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn release_record(&self, record: &LockRecord) -> Result<bool, BotError> {
        let result =
            sqlx::query("DELETE FROM user_locks WHERE chat_id = $1 AND locked_at = $2")
                .bind(record.chat_id)
                .bind(record.locked_at)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn current(&self, chat_id: i64) -> Result<Option<LockRecord>, BotError> {
        let record = sqlx::query_as::<_, LockRecord>(
            "SELECT chat_id, locked_at FROM user_locks WHERE chat_id = $1",
        )
        .bind(chat_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }
}
