//! Distributed lock trait and store-backed implementation.

use std::time::Duration;

use async_trait::async_trait;
use common::HolderToken;
use kv_store::{KeyValueStore, KeyValueStoreExt};
use tokio::time::Instant;

use crate::config::LockConfig;

/// Delay between attempts when an implementation doesn't override
/// [`DistributedLock::poll_interval`].
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Token-guarded, TTL-bounded mutual exclusion.
///
/// None of the operations return errors: a store failure is reported as a
/// failed acquisition (or a failed release), never as success.
#[async_trait]
pub trait DistributedLock: Send + Sync {
    /// Sets `key` to `holder` only if it is absent, expiring after `ttl`.
    async fn try_lock(&self, key: &str, holder: &HolderToken, ttl: Duration) -> bool;

    /// Deletes `key` only if it is still held by `holder`.
    async fn release_lock(&self, key: &str, holder: &HolderToken) -> bool;

    /// Delay between attempts in [`DistributedLock::try_lock_with_timeout`].
    fn poll_interval(&self) -> Duration {
        DEFAULT_POLL_INTERVAL
    }

    /// Polls [`DistributedLock::try_lock`] until it succeeds or `timeout`
    /// elapses.
    ///
    /// Dropping the returned future abandons the acquisition. A lock that was
    /// granted by the store just before the drop stays held until its TTL
    /// runs out.
    async fn try_lock_with_timeout(
        &self,
        key: &str,
        holder: &HolderToken,
        ttl: Duration,
        timeout: Duration,
    ) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if self.try_lock(key, holder, ttl).await {
                return true;
            }
            tokio::time::sleep(self.poll_interval()).await;
        }
        false
    }

    /// Makes one attempt plus up to `retries` re-attempts spaced by
    /// `interval`.
    async fn try_lock_with_retry(
        &self,
        key: &str,
        holder: &HolderToken,
        ttl: Duration,
        retries: u32,
        interval: Duration,
    ) -> bool {
        if self.try_lock(key, holder, ttl).await {
            return true;
        }
        for _ in 0..retries {
            tokio::time::sleep(interval).await;
            if self.try_lock(key, holder, ttl).await {
                return true;
            }
        }
        false
    }
}

/// Distributed lock backed by a [`KeyValueStore`].
///
/// Acquisition runs the store's set-if-absent script and release runs its
/// compare-and-delete script, so neither has a check-then-act window.
#[derive(Clone)]
pub struct StoreLock<S: KeyValueStore> {
    store: S,
    config: LockConfig,
}

impl<S: KeyValueStore> StoreLock<S> {
    /// Creates a lock over `store` with the default polling configuration.
    pub fn new(store: S) -> Self {
        Self::with_config(store, LockConfig::default())
    }

    /// Creates a lock over `store` with a custom polling configuration.
    pub fn with_config(store: S, config: LockConfig) -> Self {
        Self { store, config }
    }

    /// Returns the polling configuration.
    pub fn config(&self) -> &LockConfig {
        &self.config
    }

    /// Retries with the configured `retry_times` and `retry_interval`.
    pub async fn try_lock_with_default_retry(
        &self,
        key: &str,
        holder: &HolderToken,
        ttl: Duration,
    ) -> bool {
        self.try_lock_with_retry(
            key,
            holder,
            ttl,
            self.config.retry_times,
            self.config.retry_interval,
        )
        .await
    }
}

#[async_trait]
impl<S: KeyValueStore> DistributedLock for StoreLock<S> {
    async fn try_lock(&self, key: &str, holder: &HolderToken, ttl: Duration) -> bool {
        match self.store.set_if_absent(key, holder.as_str(), ttl).await {
            Ok(true) => {
                metrics::counter!("lock_acquire_total", "outcome" => "acquired").increment(1);
                tracing::trace!(key, holder = %holder, "lock acquired");
                true
            }
            Ok(false) => {
                metrics::counter!("lock_acquire_total", "outcome" => "contended").increment(1);
                false
            }
            Err(e) => {
                metrics::counter!("lock_acquire_total", "outcome" => "error").increment(1);
                tracing::warn!(key, error = %e, "lock acquisition failed on store error");
                false
            }
        }
    }

    async fn release_lock(&self, key: &str, holder: &HolderToken) -> bool {
        match self.store.compare_and_delete(key, holder.as_str()).await {
            Ok(released) => {
                if !released {
                    tracing::debug!(key, holder = %holder, "lock not held by caller");
                }
                released
            }
            Err(e) => {
                tracing::warn!(key, error = %e, "lock release failed on store error");
                false
            }
        }
    }

    fn poll_interval(&self) -> Duration {
        self.config.poll_interval
    }
}
