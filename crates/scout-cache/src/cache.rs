//! Key/value store with per-read freshness checks.
//!
//! The pool holds a single connection, so every statement is serialized
//! through it and an upsert is never observed half-applied.

use crate::error::{CacheError, Result};
use crate::migrations::run_migrations;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Durable cache shared by all module runs.
#[derive(Debug, Clone)]
pub struct Cache {
    pool: SqlitePool,
}

impl Cache {
    /// Open (or create) the cache database at `path`.
    ///
    /// # Errors
    /// Returns `CacheError` if the directory cannot be created, the database
    /// cannot be opened, or migrations fail.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let cache = Self::connect(options).await?;
        tracing::info!("Cache opened at {}", path.display());
        Ok(cache)
    }

    /// Cache backed by a private in-memory database.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| CacheError::Open(format!("invalid connection string: {e}")))?;
        Self::connect(options).await
    }

    async fn connect(options: SqliteConnectOptions) -> Result<Self> {
        // One long-lived connection: it serializes writers and keeps an
        // in-memory database alive for the lifetime of the pool.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| CacheError::Open(e.to_string()))?;

        run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    /// Upsert `value` under `key`, stamping it with the current time.
    pub async fn store(&self, key: &str, value: &[u8]) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO cache (key, value, timestamp)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                timestamp = excluded.timestamp
            ",
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now().timestamp_micros())
        .execute(&self.pool)
        .await?;

        tracing::debug!(key, bytes = value.len(), "Cache store");
        Ok(())
    }

    /// Value under `key` if it was written no longer than `max_age` ago.
    ///
    /// Missing and stale entries are both reported as `None`; stale rows are
    /// left in place until the next write replaces them.
    pub async fn fetch(&self, key: &str, max_age: Duration) -> Result<Option<Vec<u8>>> {
        let row: Option<(Vec<u8>, i64)> =
            sqlx::query_as("SELECT value, timestamp FROM cache WHERE key = ?")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        let Some((value, written_at)) = row else {
            tracing::debug!(key, "Cache miss");
            return Ok(None);
        };

        let age_micros = Utc::now().timestamp_micros().saturating_sub(written_at);
        let max_age_micros = i64::try_from(max_age.as_micros()).unwrap_or(i64::MAX);
        if age_micros <= max_age_micros {
            tracing::debug!(key, "Cache hit");
            Ok(Some(value))
        } else {
            tracing::debug!(key, age_micros, "Cache entry stale");
            Ok(None)
        }
    }

    /// Remove every entry, returning how many were deleted.
    pub async fn clear(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM cache").execute(&self.pool).await?;
        tracing::info!(removed = result.rows_affected(), "Cache cleared");
        Ok(result.rows_affected())
    }

    /// Number of stored entries, fresh or stale.
    pub async fn len(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM cache")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Whether the cache holds no entries.
    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Store `value` encoded as JSON.
    pub async fn store_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes =
            serde_json::to_vec(value).map_err(|e| CacheError::Serialization(e.to_string()))?;
        self.store(key, &bytes).await
    }

    /// Fetch and decode a JSON value written by [`store_json`](Self::store_json).
    ///
    /// # Errors
    /// Returns `CacheError::Serialization` if the stored bytes do not decode as `T`.
    pub async fn fetch_json<T: DeserializeOwned>(
        &self,
        key: &str,
        max_age: Duration,
    ) -> Result<Option<T>> {
        match self.fetch(key, max_age).await? {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| CacheError::Serialization(e.to_string())),
            None => Ok(None),
        }
    }

    /// Get a reference to the underlying `SQLx` pool.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the pool gracefully.
    pub async fn close(self) {
        self.pool.close().await;
        tracing::debug!("Cache closed");
    }
}
