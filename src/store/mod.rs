// src/store/mod.rs
//! Key-value storage with per-entry expiry. Backs task status and OAuth tokens.

pub mod memory;
pub mod sqlite;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

#[async_trait]
pub trait KvStore: Send + Sync {
    /// Insert or replace. `None` means the entry never expires.
    async fn put(&self, key: &str, value: Value, ttl: Option<Duration>) -> Result<()>;

    /// Expired entries read as absent
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Returns whether a live entry was removed
    async fn remove(&self, key: &str) -> Result<bool>;
}

pub async fn put_json<T: Serialize + ?Sized>(
    store: &dyn KvStore,
    key: &str,
    value: &T,
    ttl: Option<Duration>,
) -> Result<()> {
    let value = serde_json::to_value(value).context("Failed to serialize store value")?;
    store.put(key, value, ttl).await
}

pub async fn get_json<T: DeserializeOwned>(store: &dyn KvStore, key: &str) -> Result<Option<T>> {
    match store.get(key).await? {
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .with_context(|| format!("Stored value for {} has an unexpected shape", key)),
        None => Ok(None),
    }
}
