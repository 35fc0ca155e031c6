//! Transaction manager configuration loaded from environment variables.

use std::str::FromStr;
use std::time::Duration;

/// How the store TTL of a transaction record is set on each write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TtlPolicy {
    /// Every write expires at `create_time + timeout`, so retries never
    /// extend the record's lifetime.
    #[default]
    FixedDeadline,

    /// Every write re-arms the full `timeout`.
    Rolling,
}

impl FromStr for TtlPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fixed" | "fixed_deadline" => Ok(TtlPolicy::FixedDeadline),
            "rolling" => Ok(TtlPolicy::Rolling),
            other => Err(format!("unknown ttl policy: {other}")),
        }
    }
}

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

/// Transaction manager configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `TCC_KEY_PREFIX`: namespace of transaction and lock keys (default: `"tcc"`)
/// - `TCC_DEFAULT_TIMEOUT_MS`: timeout used by `begin_with_default_timeout` (default: `30000`)
/// - `TCC_LOCK_TTL_MS`: TTL of the per-transaction lock (default: `10000`)
/// - `TCC_MAX_RETRY_COUNT`: confirm/cancel failures before escalation (default: `3`)
/// - `TCC_TTL_POLICY`: `fixed` or `rolling` (default: `fixed`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `TCC_LOG_FORMAT`: `text` or `json` (default: `text`)
#[derive(Debug, Clone)]
pub struct TccConfig {
    pub key_prefix: String,
    pub default_timeout: Duration,
    pub lock_ttl: Duration,
    pub max_retry_count: u32,
    pub ttl_policy: TtlPolicy,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl TccConfig {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let millis = |name: &str, default: Duration| {
            lookup(name)
                .and_then(|v| v.parse::<u64>().ok())
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis)
                .unwrap_or(default)
        };

        Self {
            key_prefix: lookup("TCC_KEY_PREFIX")
                .filter(|p| !p.is_empty())
                .unwrap_or(defaults.key_prefix),
            default_timeout: millis("TCC_DEFAULT_TIMEOUT_MS", defaults.default_timeout),
            lock_ttl: millis("TCC_LOCK_TTL_MS", defaults.lock_ttl),
            max_retry_count: lookup("TCC_MAX_RETRY_COUNT")
                .and_then(|v| v.parse::<u32>().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.max_retry_count),
            ttl_policy: lookup("TCC_TTL_POLICY")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.ttl_policy),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: lookup("TCC_LOG_FORMAT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.log_format),
        }
    }

    /// Store key of a transaction record.
    pub fn transaction_key(&self, transaction_id: impl std::fmt::Display) -> String {
        format!("{}:transaction:{}", self.key_prefix, transaction_id)
    }

    /// Store key of a transaction's lock.
    pub fn lock_key(&self, transaction_id: impl std::fmt::Display) -> String {
        format!("{}:lock:{}", self.key_prefix, transaction_id)
    }
}

impl Default for TccConfig {
    fn default() -> Self {
        Self {
            key_prefix: "tcc".to_string(),
            default_timeout: Duration::from_millis(30_000),
            lock_ttl: Duration::from_millis(10_000),
            max_retry_count: 3,
            ttl_policy: TtlPolicy::FixedDeadline,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn test_default_values() {
        let config = TccConfig::default();
        assert_eq!(config.key_prefix, "tcc");
        assert_eq!(config.default_timeout, Duration::from_secs(30));
        assert_eq!(config.lock_ttl, Duration::from_secs(10));
        assert_eq!(config.max_retry_count, 3);
        assert_eq!(config.ttl_policy, TtlPolicy::FixedDeadline);
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn test_empty_environment_uses_defaults() {
        let config = TccConfig::from_lookup(lookup(&[]));
        assert_eq!(config.key_prefix, "tcc");
        assert_eq!(config.max_retry_count, 3);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_environment_overrides() {
        let config = TccConfig::from_lookup(lookup(&[
            ("TCC_KEY_PREFIX", "shop"),
            ("TCC_DEFAULT_TIMEOUT_MS", "5000"),
            ("TCC_LOCK_TTL_MS", "2000"),
            ("TCC_MAX_RETRY_COUNT", "5"),
            ("TCC_TTL_POLICY", "rolling"),
            ("RUST_LOG", "tcc=debug"),
            ("TCC_LOG_FORMAT", "JSON"),
        ]));

        assert_eq!(config.key_prefix, "shop");
        assert_eq!(config.default_timeout, Duration::from_secs(5));
        assert_eq!(config.lock_ttl, Duration::from_secs(2));
        assert_eq!(config.max_retry_count, 5);
        assert_eq!(config.ttl_policy, TtlPolicy::Rolling);
        assert_eq!(config.log_level, "tcc=debug");
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_unparsable_values_fall_back() {
        let config = TccConfig::from_lookup(lookup(&[
            ("TCC_DEFAULT_TIMEOUT_MS", "soon"),
            ("TCC_LOCK_TTL_MS", "0"),
            ("TCC_MAX_RETRY_COUNT", "-1"),
            ("TCC_TTL_POLICY", "forever"),
            ("TCC_KEY_PREFIX", ""),
        ]));

        assert_eq!(config.default_timeout, Duration::from_secs(30));
        assert_eq!(config.lock_ttl, Duration::from_secs(10));
        assert_eq!(config.max_retry_count, 3);
        assert_eq!(config.ttl_policy, TtlPolicy::FixedDeadline);
        assert_eq!(config.key_prefix, "tcc");
    }

    #[test]
    fn test_zero_retry_budget_falls_back() {
        let config = TccConfig::from_lookup(lookup(&[("TCC_MAX_RETRY_COUNT", "0")]));
        assert_eq!(config.max_retry_count, 3);
    }

    #[test]
    fn test_keys() {
        let config = TccConfig::default();
        assert_eq!(config.transaction_key("abc"), "tcc:transaction:abc");
        assert_eq!(config.lock_key("abc"), "tcc:lock:abc");
    }
}
