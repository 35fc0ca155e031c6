//! The persisted TCC transaction record.

use std::time::Duration;

use chrono::{DateTime, Utc};
use common::TransactionId;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::TtlPolicy;
use crate::status::TransactionStatus;

/// Smallest TTL written for a record past its deadline.
const MIN_TTL: Duration = Duration::from_millis(1);

/// One in-flight TCC saga, stored as JSON under `{prefix}:transaction:{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TccTransaction {
    pub transaction_id: TransactionId,
    pub transaction_type: String,
    /// Correlates the transaction with its business entity (e.g. an order number).
    pub business_key: String,
    pub status: TransactionStatus,
    pub retry_count: u32,
    pub max_retry_count: u32,
    pub create_time: DateTime<Utc>,
    pub last_update_time: DateTime<Utc>,
    /// Lifetime of the record in milliseconds.
    pub timeout_ms: u64,
    /// Business parameters as JSON.
    pub params: String,
}

impl TccTransaction {
    /// Creates a fresh `Trying` record.
    pub fn new(
        transaction_type: impl Into<String>,
        business_key: impl Into<String>,
        params: String,
        timeout: Duration,
        max_retry_count: u32,
    ) -> Self {
        let now = Utc::now();
        Self {
            transaction_id: TransactionId::new(),
            transaction_type: transaction_type.into(),
            business_key: business_key.into(),
            status: TransactionStatus::Trying,
            retry_count: 0,
            max_retry_count,
            create_time: now,
            last_update_time: now,
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            params,
        }
    }

    /// Decodes the business parameters.
    pub fn params<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_str(&self.params)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// The instant the record expires under [`TtlPolicy::FixedDeadline`].
    pub fn deadline(&self) -> DateTime<Utc> {
        i64::try_from(self.timeout_ms)
            .ok()
            .and_then(chrono::TimeDelta::try_milliseconds)
            .and_then(|timeout| self.create_time.checked_add_signed(timeout))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Returns true once confirm/cancel may not be attempted again.
    pub fn retries_exhausted(&self) -> bool {
        self.retry_count >= self.max_retry_count
    }

    /// TTL to write the record with at `now`.
    pub fn store_ttl(&self, policy: TtlPolicy, now: DateTime<Utc>) -> Duration {
        match policy {
            TtlPolicy::Rolling => self.timeout().max(MIN_TTL),
            TtlPolicy::FixedDeadline => (self.deadline() - now)
                .to_std()
                .unwrap_or(Duration::ZERO)
                .max(MIN_TTL),
        }
    }

    /// Moves to `status` and stamps the update time.
    pub(crate) fn transition(&mut self, status: TransactionStatus) {
        self.status = status;
        self.last_update_time = Utc::now();
    }

    /// Records one failed confirm/cancel attempt.
    pub(crate) fn record_failure(&mut self) {
        self.retry_count = self.retry_count.saturating_add(1);
        self.last_update_time = Utc::now();
    }
}
