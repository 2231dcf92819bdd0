//! Bounded in-process store used when the durable tier is unreachable.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use compass_core::{IgnorePoison as _, Result};

use crate::store::{pattern_matches, CacheStore};

/// A single stored value with its expiry deadline.
#[derive(Debug, Clone)]
struct LocalEntry {
    value: String,
    stored_at: Instant,
    expires_at: Instant,
}

impl LocalEntry {
    fn new(value: String, ttl: Duration) -> Self {
        let stored_at = Instant::now();
        Self {
            value,
            stored_at,
            expires_at: stored_at + ttl,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// In-process map with a maximum entry count.
///
/// Expired entries are dropped when read; every write sweeps expired
/// entries and then evicts oldest-first until the map fits the bound.
pub struct LocalStore {
    entries: RwLock<HashMap<String, LocalEntry>>,
    max_entries: usize,
}

impl LocalStore {
    /// Creates a store holding at most `max_entries` live entries.
    #[must_use]
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_entries: max_entries.max(1),
        }
    }

    /// Number of entries currently held, expired or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read_ignore_poison().len()
    }

    /// Returns whether the store holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read_ignore_poison().is_empty()
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.entries.write_ignore_poison().clear();
    }

    fn purge_expired(entries: &mut HashMap<String, LocalEntry>) {
        entries.retain(|_, entry| !entry.is_expired());
    }

    fn evict_oldest(entries: &mut HashMap<String, LocalEntry>) {
        if let Some(oldest) = entries
            .iter()
            .min_by_key(|(_, entry)| entry.stored_at)
            .map(|(key, _)| key.clone())
        {
            entries.remove(&oldest);
        }
    }
}

#[async_trait]
impl CacheStore for LocalStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let expired = {
            let entries = self.entries.read_ignore_poison();
            match entries.get(key) {
                Some(entry) if !entry.is_expired() => return Ok(Some(entry.value.clone())),
                Some(_) => true,
                None => false,
            }
        };

        if expired {
            self.entries.write_ignore_poison().remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        let mut entries = self.entries.write_ignore_poison();
        Self::purge_expired(&mut entries);
        entries.insert(key.to_owned(), LocalEntry::new(value, ttl));

        while entries.len() > self.max_entries {
            Self::evict_oldest(&mut entries);
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.write_ignore_poison().remove(key);
        Ok(())
    }

    async fn keys_matching(&self, pattern: &str) -> Result<Vec<String>> {
        let entries = self.entries.read_ignore_poison();
        let mut keys: Vec<String> = entries
            .iter()
            .filter(|(key, entry)| !entry.is_expired() && pattern_matches(pattern, key))
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort_unstable();
        Ok(keys)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

impl Default for LocalStore {
    fn default() -> Self {
        Self::new(1_000)
    }
}
