use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::{
    Result, StoreError,
    store::{KeyValueStore, ScriptCall, StoreScript, ensure_ttl},
};

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn new(value: &str, ttl: Duration) -> Self {
        Self {
            value: value.to_string(),
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

/// In-memory key-value store implementation for testing.
///
/// Entries expire against the tokio clock, so tests running with a paused
/// runtime can advance time deterministically. Reads hide expired entries;
/// writes and [`purge_expired`](Self::purge_expired) evict them. Script evaluation
/// holds the write lock for the whole operation, which makes every script
/// atomic with respect to other callers sharing the same store.
#[derive(Clone, Default)]
pub struct InMemoryKeyValueStore {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryKeyValueStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent operation fail with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Returns the number of live entries.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .values()
            .filter(|e| e.is_live(now))
            .count()
    }

    /// Returns true if the store holds no live entries.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Removes all entries.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    /// Deletes expired entries. Returns the number of entries removed.
    pub async fn purge_expired(&self) -> Result<u64> {
        self.check_available()?;
        let mut entries = self.entries.write().await;
        Ok(evict_expired(&mut entries))
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "in-memory store switched off".to_string(),
            ));
        }
        Ok(())
    }
}

fn evict_expired(entries: &mut HashMap<String, Entry>) -> u64 {
    let now = Instant::now();
    let before = entries.len();
    entries.retain(|_, e| e.is_live(now));
    u64::try_from(before - entries.len()).unwrap_or(u64::MAX)
}

/// Returns the live value under `key`, evicting it if it has expired.
fn live_value<'a>(entries: &'a mut HashMap<String, Entry>, key: &str) -> Option<&'a str> {
    let now = Instant::now();
    if entries.get(key).is_some_and(|e| !e.is_live(now)) {
        entries.remove(key);
    }
    entries.get(key).map(|e| e.value.as_str())
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.check_available()?;
        let now = Instant::now();
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|e| e.is_live(now))
            .map(|e| e.value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        self.check_available()?;
        ensure_ttl(key, ttl)?;
        let mut entries = self.entries.write().await;
        evict_expired(&mut entries);
        entries.insert(key.to_string(), Entry::new(value, ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        self.check_available()?;
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        Ok(entries.remove(key).is_some_and(|e| e.is_live(now)))
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>> {
        self.check_available()?;
        let now = Instant::now();
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|e| e.is_live(now))
            .map(|e| e.expires_at - now))
    }

    async fn evaluate(&self, script: StoreScript, keys: &[&str], args: &[&str]) -> Result<i64> {
        self.check_available()?;
        let call = ScriptCall::parse(script, keys, args)?;

        let mut entries = self.entries.write().await;
        let applied = match call {
            ScriptCall::SetIfAbsent { key, value, ttl } => {
                if live_value(&mut entries, key).is_some() {
                    false
                } else {
                    entries.insert(key.to_string(), Entry::new(value, ttl));
                    true
                }
            }
            ScriptCall::CompareAndDelete { key, expected } => {
                if live_value(&mut entries, key) == Some(expected) {
                    entries.remove(key);
                    true
                } else {
                    false
                }
            }
            ScriptCall::CompareAndSet {
                key,
                expected,
                value,
                ttl,
            } => {
                if live_value(&mut entries, key) == Some(expected) {
                    entries.insert(key.to_string(), Entry::new(value, ttl));
                    true
                } else {
                    false
                }
            }
        };

        Ok(i64::from(applied))
    }
}
