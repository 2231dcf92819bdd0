//! Durable facts and preferences about a user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use compass_cache::CacheService;

use crate::index::UserIndex;

/// Facts persist for three months without reinforcement.
const FACT_TTL: Duration = Duration::from_secs(90 * 24 * 60 * 60);

/// Confidence granted to a freshly inferred fact.
const INITIAL_CONFIDENCE: f64 = 0.6;

/// Confidence gained on each reinforcement.
const REINFORCEMENT_STEP: f64 = 0.1;

/// Kind of durable statement a fact records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactCategory {
    /// What the user likes or wants.
    Preference,
    /// What the user knows about.
    Knowledge,
    /// How the user tends to act.
    Behavior,
    /// Ambient context about the user's situation.
    Context,
}

/// A durable statement about a user, independent of any conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticFact {
    /// Unique fact id.
    pub id: String,
    /// Owning user.
    pub user_id: String,
    /// The statement itself.
    pub fact: String,
    /// Statement kind.
    pub category: FactCategory,
    /// Confidence in [0,1], grown by reinforcement.
    pub confidence: f64,
    /// Last creation or reinforcement time.
    pub last_updated: DateTime<Utc>,
    /// Where the fact was inferred from.
    pub sources: Vec<String>,
}

impl SemanticFact {
    /// Creates a fact with initial confidence.
    pub fn new<U: Into<String>, F: Into<String>>(
        user_id: U,
        fact: F,
        category: FactCategory,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            fact: fact.into(),
            category,
            confidence: INITIAL_CONFIDENCE,
            last_updated: Utc::now(),
            sources: Vec::new(),
        }
    }

    /// Adds a provenance note.
    #[must_use]
    pub fn with_source<S: Into<String>>(mut self, source: S) -> Self {
        self.sources.push(source.into());
        self
    }

    /// Strengthens the fact after it was observed again.
    pub fn reinforce(&mut self, source: &str) {
        self.confidence = (self.confidence + REINFORCEMENT_STEP).min(1.0);
        self.last_updated = Utc::now();
        if !self.sources.iter().any(|existing| existing == source) {
            self.sources.push(source.to_owned());
        }
    }
}

/// Per-user semantic fact collection.
pub struct SemanticMemory {
    cache: CacheService,
    index: UserIndex,
}

impl SemanticMemory {
    /// Creates the collection on top of the cache service.
    #[must_use]
    pub fn new(cache: CacheService, index_cap: usize) -> Self {
        Self {
            cache,
            index: UserIndex::new("semantic", index_cap),
        }
    }

    fn fact_key(user_id: &str, id: &str) -> String {
        format!("semantic:{user_id}:{id}")
    }

    /// Stores a fact and indexes it for its user.
    pub async fn store(&self, fact: &SemanticFact) {
        let key = Self::fact_key(&fact.user_id, &fact.id);
        self.cache.set_json(&key, fact, FACT_TTL).await;
        self.index
            .push_front(&self.cache, &fact.user_id, &fact.id)
            .await;
    }

    /// Facts for `user_id`, ranked by confidence descending, capped at
    /// `limit`.
    pub async fn facts(&self, user_id: &str, limit: usize) -> Vec<SemanticFact> {
        let ids = self.index.ids(&self.cache, user_id).await;

        let mut facts = Vec::with_capacity(ids.len());
        for id in ids {
            let key = Self::fact_key(user_id, &id);
            if let Some(fact) = self.cache.get_json::<SemanticFact>(&key).await {
                if fact.user_id == user_id {
                    facts.push(fact);
                }
            }
        }

        facts.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        facts.truncate(limit);
        facts
    }

    /// Creates the fact, or reinforces an existing fact with the same
    /// statement. Returns the stored fact.
    pub async fn upsert(
        &self,
        user_id: &str,
        statement: &str,
        category: FactCategory,
        source: &str,
    ) -> SemanticFact {
        let existing = self
            .facts(user_id, usize::MAX)
            .await
            .into_iter()
            .find(|fact| fact.fact.eq_ignore_ascii_case(statement));

        let fact = match existing {
            Some(mut fact) => {
                fact.reinforce(source);
                fact
            }
            None => SemanticFact::new(user_id, statement, category).with_source(source),
        };

        self.store(&fact).await;
        fact
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_and_rank_by_confidence() {
        let memory = SemanticMemory::new(CacheService::local_only(), 100);

        let mut strong = SemanticFact::new("u1", "prefers summaries", FactCategory::Preference);
        strong.confidence = 0.9;
        let weak = SemanticFact::new("u1", "works in procurement", FactCategory::Context);

        memory.store(&weak).await;
        memory.store(&strong).await;

        let facts = memory.facts("u1", 5).await;
        assert_eq!(facts.len(), 2);
        assert_eq!(facts[0].fact, "prefers summaries");
    }

    #[tokio::test]
    async fn test_limit_applies_after_ranking() {
        let memory = SemanticMemory::new(CacheService::local_only(), 100);
        for n in 0..4 {
            memory
                .store(&SemanticFact::new(
                    "u1",
                    format!("fact {n}"),
                    FactCategory::Knowledge,
                ))
                .await;
        }

        assert_eq!(memory.facts("u1", 2).await.len(), 2);
    }

    #[tokio::test]
    async fn test_no_cross_user_leakage() {
        let memory = SemanticMemory::new(CacheService::local_only(), 100);
        memory
            .store(&SemanticFact::new(
                "u1",
                "private fact",
                FactCategory::Context,
            ))
            .await;

        assert!(memory.facts("u2", 5).await.is_empty());
    }

    #[tokio::test]
    async fn test_upsert_reinforces_existing() {
        let memory = SemanticMemory::new(CacheService::local_only(), 100);

        let first = memory
            .upsert("u1", "prefers charts", FactCategory::Preference, "conv-1")
            .await;
        let second = memory
            .upsert("u1", "Prefers Charts", FactCategory::Preference, "conv-2")
            .await;

        assert_eq!(first.id, second.id);
        assert!(second.confidence > first.confidence);
        assert_eq!(second.sources.len(), 2);
        assert_eq!(memory.facts("u1", 10).await.len(), 1);
    }

    #[test]
    fn test_reinforce_caps_confidence() {
        let mut fact = SemanticFact::new("u1", "x", FactCategory::Behavior);
        for _ in 0..10 {
            fact.reinforce("again");
        }
        assert!(fact.confidence <= 1.0);
        assert_eq!(fact.sources.len(), 1);
    }
}
