// src/store/sqlite.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::info;

use super::KvStore;

#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

impl SqliteStore {
    pub async fn connect(database_path: &Path) -> Result<Self> {
        if let Some(parent) = database_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .context("Failed to create database directory")?;
        }

        let database_url = format!("sqlite:{}?mode=rwc", database_path.display());
        let pool = SqlitePool::connect(&database_url)
            .await
            .context("Failed to connect to SQLite database")?;

        info!("Database connection pool initialized: {}", database_url);
        Ok(Self { pool })
    }

    /// Private in-memory database, mostly for tests
    pub async fn in_memory() -> Result<Self> {
        // one connection, otherwise each pooled connection sees its own empty database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .context("Failed to open in-memory SQLite database")?;
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS kv_entries (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                expires_at INTEGER NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_kv_entries_expires_at
            ON kv_entries(expires_at);
            "#,
        )
        .execute(&self.pool)
        .await?;

        info!("Database migrations completed successfully");
        Ok(())
    }

    /// Delete every expired row, returning how many went
    pub async fn purge_expired(&self) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM kv_entries WHERE expires_at IS NOT NULL AND expires_at <= ?",
        )
        .bind(now_millis())
        .execute(&self.pool)
        .await
        .context("Failed to purge expired entries")?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl KvStore for SqliteStore {
    async fn put(&self, key: &str, value: Value, ttl: Option<Duration>) -> Result<()> {
        let expires_at = ttl.map(|ttl| now_millis() + ttl.as_millis() as i64);
        let value = serde_json::to_string(&value)?;

        sqlx::query(
            r#"
            INSERT INTO kv_entries (key, value, expires_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                expires_at = excluded.expires_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to store {}", key))?;

        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let row = sqlx::query_as::<_, (String, Option<i64>)>(
            "SELECT value, expires_at FROM kv_entries WHERE key = ?",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("Failed to read {}", key))?;

        let Some((value, expires_at)) = row else {
            return Ok(None);
        };

        if expires_at.is_some_and(|at| at <= now_millis()) {
            sqlx::query("DELETE FROM kv_entries WHERE key = ?")
                .bind(key)
                .execute(&self.pool)
                .await?;
            return Ok(None);
        }

        let value = serde_json::from_str(&value)
            .with_context(|| format!("Stored value for {} is not JSON", key))?;
        Ok(Some(value))
    }

    async fn remove(&self, key: &str) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM kv_entries WHERE key = ? AND (expires_at IS NULL OR expires_at > ?)",
        )
        .bind(key)
        .bind(now_millis())
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to remove {}", key))?;

        // expired leftovers go too, but do not count as removed
        sqlx::query("DELETE FROM kv_entries WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn store() -> SqliteStore {
        let store = SqliteStore::in_memory().await.unwrap();
        store.migrate().await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_round_trip_and_upsert() {
        let store = store().await;
        store.put("user:1", json!({"token": "a"}), None).await.unwrap();
        store.put("user:1", json!({"token": "b"}), None).await.unwrap();

        assert_eq!(store.get("user:1").await.unwrap(), Some(json!({"token": "b"})));
        assert_eq!(store.get("user:2").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_expired_rows_read_as_absent() {
        let store = store().await;
        store
            .put("short", json!(1), Some(Duration::from_millis(20)))
            .await
            .unwrap();
        store
            .put("long", json!(2), Some(Duration::from_secs(600)))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(60)).await;

        assert_eq!(store.get("short").await.unwrap(), None);
        assert_eq!(store.get("long").await.unwrap(), Some(json!(2)));
        assert!(!store.remove("short").await.unwrap());
        assert!(store.remove("long").await.unwrap());
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let store = store().await;
        store
            .put("a", json!(1), Some(Duration::from_millis(10)))
            .await
            .unwrap();
        store.put("b", json!(2), None).await.unwrap();

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(store.purge_expired().await.unwrap(), 1);
        assert_eq!(store.get("b").await.unwrap(), Some(json!(2)));
    }
}
