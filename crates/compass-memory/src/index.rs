//! Per-user entity indexes.
//!
//! Every memory kind keeps one index entry per user under
//! `index:{kind}:{user_id}`: a most-recent-first id list capped at a fixed
//! length so a user's memory footprint stays bounded.

use std::time::Duration;

use compass_cache::CacheService;

/// Indexes live as long as the longest-lived entity they point at.
pub(crate) const INDEX_TTL: Duration = Duration::from_secs(90 * 24 * 60 * 60);

pub(crate) struct UserIndex {
    kind: &'static str,
    cap: usize,
}

impl UserIndex {
    pub(crate) fn new(kind: &'static str, cap: usize) -> Self {
        Self {
            kind,
            cap: cap.max(1),
        }
    }

    fn key(&self, user_id: &str) -> String {
        format!("index:{}:{user_id}", self.kind)
    }

    /// Ids for `user_id`, most recent first.
    pub(crate) async fn ids(&self, cache: &CacheService, user_id: &str) -> Vec<String> {
        cache
            .get_json::<Vec<String>>(&self.key(user_id))
            .await
            .unwrap_or_default()
    }

    /// Moves `id` to the front of the user's index, deduplicating and
    /// dropping the oldest entries beyond the cap.
    pub(crate) async fn push_front(&self, cache: &CacheService, user_id: &str, id: &str) {
        let mut ids = self.ids(cache, user_id).await;
        ids.retain(|existing| existing != id);
        ids.insert(0, id.to_owned());
        ids.truncate(self.cap);
        cache.set_json(&self.key(user_id), &ids, INDEX_TTL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_push_front_dedupes_and_caps() {
        let cache = CacheService::local_only();
        let index = UserIndex::new("semantic", 3);

        index.push_front(&cache, "u1", "a").await;
        index.push_front(&cache, "u1", "b").await;
        index.push_front(&cache, "u1", "a").await;
        index.push_front(&cache, "u1", "c").await;
        index.push_front(&cache, "u1", "d").await;

        let ids = index.ids(&cache, "u1").await;
        assert_eq!(ids, vec!["d".to_owned(), "c".to_owned(), "a".to_owned()]);
    }

    #[tokio::test]
    async fn test_indexes_are_per_user() {
        let cache = CacheService::local_only();
        let index = UserIndex::new("episodic", 10);

        index.push_front(&cache, "u1", "a").await;
        assert!(index.ids(&cache, "u2").await.is_empty());
    }
}
