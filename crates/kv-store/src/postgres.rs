use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    Result,
    store::{KeyValueStore, ScriptCall, StoreScript, ensure_ttl},
};

/// PostgreSQL-backed key-value store implementation.
///
/// Expiry is evaluated against the database clock (`now()`), so every
/// process sharing the table agrees on which entries are live. Each script
/// maps onto a single conditional statement, which PostgreSQL executes
/// atomically.
#[derive(Clone)]
pub struct PostgresKeyValueStore {
    pool: PgPool,
}

impl PostgresKeyValueStore {
    /// Creates a new PostgreSQL key-value store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    /// Deletes expired rows. Returns the number of rows removed.
    #[tracing::instrument(skip(self))]
    pub async fn purge_expired(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM kv_entries WHERE expires_at <= now()")
            .execute(&self.pool)
            .await?;
        let purged = result.rows_affected();
        tracing::debug!(purged, "purged expired kv entries");
        Ok(purged)
    }
}

fn ttl_millis(ttl: Duration) -> i64 {
    i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX)
}

#[async_trait]
impl KeyValueStore for PostgresKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let value: Option<String> = sqlx::query_scalar(
            "SELECT value FROM kv_entries WHERE key = $1 AND expires_at > now()",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        ensure_ttl(key, ttl)?;
        sqlx::query(
            r#"
            INSERT INTO kv_entries (key, value, expires_at)
            VALUES ($1, $2, now() + $3::float8 * interval '1 millisecond')
            ON CONFLICT (key) DO UPDATE SET
                value = EXCLUDED.value,
                expires_at = EXCLUDED.expires_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(ttl_millis(ttl) as f64)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM kv_entries WHERE key = $1 AND expires_at > now()")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>> {
        let remaining_ms: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT GREATEST(EXTRACT(EPOCH FROM (expires_at - now())) * 1000, 0)::bigint
            FROM kv_entries
            WHERE key = $1 AND expires_at > now()
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(remaining_ms.map(|ms| Duration::from_millis(ms.max(0) as u64)))
    }

    async fn evaluate(&self, script: StoreScript, keys: &[&str], args: &[&str]) -> Result<i64> {
        let call = ScriptCall::parse(script, keys, args)?;

        let result = match call {
            ScriptCall::SetIfAbsent { key, value, ttl } => {
                // An expired row counts as absent and is taken over in place.
                sqlx::query(
                    r#"
                    INSERT INTO kv_entries (key, value, expires_at)
                    VALUES ($1, $2, now() + $3::float8 * interval '1 millisecond')
                    ON CONFLICT (key) DO UPDATE SET
                        value = EXCLUDED.value,
                        expires_at = EXCLUDED.expires_at
                    WHERE kv_entries.expires_at <= now()
                    "#,
                )
                .bind(key)
                .bind(value)
                .bind(ttl_millis(ttl) as f64)
                .execute(&self.pool)
                .await?
            }
            ScriptCall::CompareAndDelete { key, expected } => {
                sqlx::query(
                    "DELETE FROM kv_entries WHERE key = $1 AND value = $2 AND expires_at > now()",
                )
                .bind(key)
                .bind(expected)
                .execute(&self.pool)
                .await?
            }
            ScriptCall::CompareAndSet {
                key,
                expected,
                value,
                ttl,
            } => {
                sqlx::query(
                    r#"
                    UPDATE kv_entries
                    SET value = $3, expires_at = now() + $4::float8 * interval '1 millisecond'
                    WHERE key = $1 AND value = $2 AND expires_at > now()
                    "#,
                )
                .bind(key)
                .bind(expected)
                .bind(value)
                .bind(ttl_millis(ttl) as f64)
                .execute(&self.pool)
                .await?
            }
        };

        Ok(i64::from(result.rows_affected() == 1))
    }
}
