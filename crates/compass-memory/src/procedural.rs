//! Condition/action patterns with empirically tracked success rates.
//!
//! The only memory entity with continuous-update semantics: every reuse
//! folds its outcome into a running success-rate mean.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use compass_cache::CacheService;

use crate::index::UserIndex;

/// Patterns persist for three months without reuse.
const PATTERN_TTL: Duration = Duration::from_secs(90 * 24 * 60 * 60);

/// A learned condition→action pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProceduralPattern {
    /// Unique pattern id.
    pub id: String,
    /// Owning user.
    pub user_id: String,
    /// Short label; one pattern exists per (user, label).
    pub label: String,
    /// When the pattern applies.
    pub condition: String,
    /// What worked.
    pub action: String,
    /// Running success mean in [0,1].
    pub success_rate: f64,
    /// How many outcomes have been folded in.
    pub usage_count: u64,
    /// Last time the pattern was exercised.
    pub last_used: DateTime<Utc>,
}

impl ProceduralPattern {
    /// Creates an unused pattern.
    pub fn new<U, L, C, A>(user_id: U, label: L, condition: C, action: A) -> Self
    where
        U: Into<String>,
        L: Into<String>,
        C: Into<String>,
        A: Into<String>,
    {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            label: label.into(),
            condition: condition.into(),
            action: action.into(),
            success_rate: 0.0,
            usage_count: 0,
            last_used: Utc::now(),
        }
    }

    /// Folds one outcome into the running mean:
    /// `new = success ? (old*n + 1)/(n+1) : (old*n)/(n+1)`.
    pub fn record_outcome(&mut self, success: bool) {
        let count = self.usage_count as f64;
        let numerator = self.success_rate * count + if success { 1.0 } else { 0.0 };
        self.success_rate = (numerator / (count + 1.0)).clamp(0.0, 1.0);
        self.usage_count += 1;
        self.last_used = Utc::now();
    }
}

/// Per-user pattern collection.
pub struct ProceduralMemory {
    cache: CacheService,
    index: UserIndex,
}

impl ProceduralMemory {
    /// Creates the collection on top of the cache service.
    #[must_use]
    pub fn new(cache: CacheService, index_cap: usize) -> Self {
        Self {
            cache,
            index: UserIndex::new("procedural", index_cap),
        }
    }

    // Patterns are keyed by label, not id: the label is the identity and
    // reuse must land on the same entry.
    fn pattern_key(user_id: &str, label: &str) -> String {
        format!("procedural:{user_id}:{label}")
    }

    /// Stores a pattern and indexes its label.
    pub async fn store(&self, pattern: &ProceduralPattern) {
        let key = Self::pattern_key(&pattern.user_id, &pattern.label);
        self.cache.set_json(&key, pattern, PATTERN_TTL).await;
        self.index
            .push_front(&self.cache, &pattern.user_id, &pattern.label)
            .await;
    }

    /// The pattern stored under `label` for this user, if any.
    pub async fn find(&self, user_id: &str, label: &str) -> Option<ProceduralPattern> {
        let pattern = self
            .cache
            .get_json::<ProceduralPattern>(&Self::pattern_key(user_id, label))
            .await?;
        (pattern.user_id == user_id).then_some(pattern)
    }

    /// All patterns for `user_id`, ranked by success rate descending.
    pub async fn patterns(&self, user_id: &str) -> Vec<ProceduralPattern> {
        let labels = self.index.ids(&self.cache, user_id).await;

        let mut patterns = Vec::with_capacity(labels.len());
        for label in labels {
            if let Some(pattern) = self.find(user_id, &label).await {
                patterns.push(pattern);
            }
        }

        patterns.sort_by(|a, b| {
            b.success_rate
                .partial_cmp(&a.success_rate)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        patterns
    }

    /// Records an outcome for `label`, creating the pattern on first
    /// observation. Returns the updated pattern.
    pub async fn record_outcome(
        &self,
        user_id: &str,
        label: &str,
        condition: &str,
        action: &str,
        success: bool,
    ) -> ProceduralPattern {
        let mut pattern = match self.find(user_id, label).await {
            Some(pattern) => pattern,
            None => ProceduralPattern::new(user_id, label, condition, action),
        };
        pattern.record_outcome(success);
        self.store(&pattern).await;
        pattern
    }
}
