//! Lock polling configuration.

use std::time::Duration;

/// Polling intervals used by the blocking acquisition helpers.
///
/// - `poll_interval`: delay between attempts in `try_lock_with_timeout`
///   (default: 100 ms)
/// - `retry_times`: re-attempts made by `try_lock_with_default_retry`
///   after the first failure (default: 3)
/// - `retry_interval`: delay between those re-attempts (default: 100 ms)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockConfig {
    pub poll_interval: Duration,
    pub retry_times: u32,
    pub retry_interval: Duration,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            retry_times: 3,
            retry_interval: Duration::from_millis(100),
        }
    }
}
