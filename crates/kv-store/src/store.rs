use std::time::Duration;

use async_trait::async_trait;

use crate::{Result, StoreError};

/// Atomic server-side scripts every store backend must support.
///
/// Each script carries the Lua source a script-capable server (e.g. Redis)
/// would run; backends without a script engine interpret the parsed
/// [`ScriptCall`] inside a single atomic operation instead.
///
/// Arguments are passed as strings, TTLs in decimal milliseconds:
///
/// | Script             | KEYS  | ARGV                          | Returns |
/// |--------------------|-------|-------------------------------|---------|
/// | `SetIfAbsent`      | `key` | `value, ttl_ms`               | 1 if set, else 0 |
/// | `CompareAndDelete` | `key` | `expected`                    | 1 if deleted, else 0 |
/// | `CompareAndSet`    | `key` | `expected, new_value, ttl_ms` | 1 if replaced, else 0 |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreScript {
    SetIfAbsent,
    CompareAndDelete,
    CompareAndSet,
}

impl StoreScript {
    /// Returns the script name used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            StoreScript::SetIfAbsent => "set_if_absent",
            StoreScript::CompareAndDelete => "compare_and_delete",
            StoreScript::CompareAndSet => "compare_and_set",
        }
    }

    /// Returns the Lua source for script-capable servers.
    pub fn source(&self) -> &'static str {
        match self {
            StoreScript::SetIfAbsent => {
                r#"
if redis.call('exists', KEYS[1]) == 0 then
    redis.call('set', KEYS[1], ARGV[1], 'PX', ARGV[2])
    return 1
end
return 0
"#
            }
            StoreScript::CompareAndDelete => {
                r#"
if redis.call('get', KEYS[1]) == ARGV[1] then
    return redis.call('del', KEYS[1])
end
return 0
"#
            }
            StoreScript::CompareAndSet => {
                r#"
if redis.call('get', KEYS[1]) == ARGV[1] then
    redis.call('set', KEYS[1], ARGV[2], 'PX', ARGV[3])
    return 1
end
return 0
"#
            }
        }
    }

    fn arity(&self) -> (usize, usize) {
        match self {
            StoreScript::SetIfAbsent => (1, 2),
            StoreScript::CompareAndDelete => (1, 1),
            StoreScript::CompareAndSet => (1, 3),
        }
    }
}

impl std::fmt::Display for StoreScript {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A script invocation with its keys and arguments validated and typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptCall<'a> {
    SetIfAbsent {
        key: &'a str,
        value: &'a str,
        ttl: Duration,
    },
    CompareAndDelete {
        key: &'a str,
        expected: &'a str,
    },
    CompareAndSet {
        key: &'a str,
        expected: &'a str,
        value: &'a str,
        ttl: Duration,
    },
}

impl<'a> ScriptCall<'a> {
    /// Validates raw `keys`/`args` against the script's calling convention.
    pub fn parse(script: StoreScript, keys: &[&'a str], args: &[&'a str]) -> Result<Self> {
        let (key_count, arg_count) = script.arity();
        if keys.len() != key_count || args.len() != arg_count {
            return Err(StoreError::InvalidScriptArguments {
                script: script.name(),
                reason: format!(
                    "expected {key_count} key(s) and {arg_count} arg(s), got {} and {}",
                    keys.len(),
                    args.len()
                ),
            });
        }

        let call = match script {
            StoreScript::SetIfAbsent => ScriptCall::SetIfAbsent {
                key: keys[0],
                value: args[0],
                ttl: parse_ttl_ms(script, args[1])?,
            },
            StoreScript::CompareAndDelete => ScriptCall::CompareAndDelete {
                key: keys[0],
                expected: args[0],
            },
            StoreScript::CompareAndSet => ScriptCall::CompareAndSet {
                key: keys[0],
                expected: args[0],
                value: args[1],
                ttl: parse_ttl_ms(script, args[2])?,
            },
        };
        Ok(call)
    }
}

fn parse_ttl_ms(script: StoreScript, raw: &str) -> Result<Duration> {
    match raw.parse::<u64>() {
        Ok(ms) if ms > 0 => Ok(Duration::from_millis(ms)),
        _ => Err(StoreError::InvalidScriptArguments {
            script: script.name(),
            reason: format!("TTL must be a positive millisecond count, got {raw:?}"),
        }),
    }
}

/// Rejects TTLs that round down to zero milliseconds.
pub(crate) fn ensure_ttl(key: &str, ttl: Duration) -> Result<()> {
    if ttl.as_millis() == 0 {
        return Err(StoreError::InvalidTtl {
            key: key.to_string(),
        });
    }
    Ok(())
}

/// Core trait for shared key-value store implementations.
///
/// Every entry carries an expiry; expired entries are invisible to all
/// operations. All implementations must be thread-safe (Send + Sync) and
/// safe to share between processes.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns the live value stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any existing entry and
    /// re-arming its expiry to `ttl`.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// Deletes `key`. Returns true if a live entry was removed.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Returns the remaining time to live of `key`, or None if absent.
    async fn ttl(&self, key: &str) -> Result<Option<Duration>>;

    /// Evaluates an atomic script. See [`StoreScript`] for conventions.
    async fn evaluate(&self, script: StoreScript, keys: &[&str], args: &[&str]) -> Result<i64>;
}

/// Extension trait providing typed wrappers over [`KeyValueStore::evaluate`].
#[async_trait]
pub trait KeyValueStoreExt: KeyValueStore {
    /// Sets `key` only if no live entry exists.
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool> {
        let ttl_ms = ttl.as_millis().to_string();
        let result = self
            .evaluate(StoreScript::SetIfAbsent, &[key], &[value, &ttl_ms])
            .await?;
        Ok(result == 1)
    }

    /// Deletes `key` only if its current value equals `expected`.
    async fn compare_and_delete(&self, key: &str, expected: &str) -> Result<bool> {
        let result = self
            .evaluate(StoreScript::CompareAndDelete, &[key], &[expected])
            .await?;
        Ok(result == 1)
    }

    /// Replaces `key` with `value` only if its current value equals `expected`.
    async fn compare_and_set(
        &self,
        key: &str,
        expected: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool> {
        let ttl_ms = ttl.as_millis().to_string();
        let result = self
            .evaluate(StoreScript::CompareAndSet, &[key], &[expected, value, &ttl_ms])
            .await?;
        Ok(result == 1)
    }

    /// Checks whether a live entry exists for `key`.
    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }
}

// Blanket implementation for all KeyValueStore implementations
impl<T: KeyValueStore + ?Sized> KeyValueStoreExt for T {}
