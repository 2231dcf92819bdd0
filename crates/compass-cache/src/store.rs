use async_trait::async_trait;
use std::time::Duration;

use compass_core::Result;

/// Key/value store with per-entry TTL.
///
/// Values are opaque serialized payloads; callers decide the encoding.
/// Implementations must keep single-key operations atomic — last write
/// wins per key, and no multi-key transactions are offered.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Fetches the value stored under `key`, if present and not expired.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key` for at most `ttl`.
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()>;

    /// Removes the entry under `key`. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Lists keys matching `pattern`.
    ///
    /// The pattern language is deliberately small: a literal key matches
    /// exactly, and a trailing `*` matches any suffix.
    async fn keys_matching(&self, pattern: &str) -> Result<Vec<String>>;

    /// Cheap liveness check.
    async fn ping(&self) -> Result<()>;
}

/// Returns whether `key` matches `pattern` under the store pattern language.
#[must_use]
pub fn pattern_matches(pattern: &str, key: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => key.starts_with(prefix),
        None => key == pattern,
    }
}
