//! Summaries of past conversations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use compass_cache::CacheService;
use compass_core::{AgentId, ComplexityTier};

use crate::index::UserIndex;

/// Episodes persist for two months.
const EPISODE_TTL: Duration = Duration::from_secs(60 * 24 * 60 * 60);

/// Record of one completed (or checkpointed) conversation.
///
/// Immutable once stored; a later checkpoint of the same conversation is a
/// new episode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationEpisode {
    /// Unique episode id.
    pub id: String,
    /// Owning user.
    pub user_id: String,
    /// Conversation this episode summarizes.
    pub conversation_id: String,
    /// When the conversation started.
    pub started_at: DateTime<Utc>,
    /// When it ended, if it has.
    pub ended_at: Option<DateTime<Utc>>,
    /// Representative message excerpts.
    pub messages: Vec<String>,
    /// One-paragraph summary.
    pub summary: String,
    /// Notable insights surfaced during the conversation.
    pub key_insights: Vec<String>,
    /// Topics the conversation covered.
    pub topics: Vec<String>,
    /// Overall complexity of the work done in the episode.
    pub complexity: ComplexityTier,
    /// Agents that contributed.
    pub agents_used: Vec<AgentId>,
}

impl ConversationEpisode {
    /// Creates an episode shell for the given conversation.
    pub fn new<U: Into<String>, C: Into<String>>(user_id: U, conversation_id: C) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            conversation_id: conversation_id.into(),
            started_at: Utc::now(),
            ended_at: None,
            messages: Vec::new(),
            summary: String::new(),
            key_insights: Vec::new(),
            topics: Vec::new(),
            complexity: ComplexityTier::Moderate,
            agents_used: Vec::new(),
        }
    }

    /// Sets the summary text.
    #[must_use]
    pub fn with_summary<S: Into<String>>(mut self, summary: S) -> Self {
        self.summary = summary.into();
        self
    }

    /// Sets the key insights.
    #[must_use]
    pub fn with_insights(mut self, insights: Vec<String>) -> Self {
        self.key_insights = insights;
        self
    }

    /// Sets the topics.
    #[must_use]
    pub fn with_topics(mut self, topics: Vec<String>) -> Self {
        self.topics = topics;
        self
    }

    /// Sets the episode complexity.
    #[must_use]
    pub fn with_complexity(mut self, complexity: ComplexityTier) -> Self {
        self.complexity = complexity;
        self
    }

    /// Sets the contributing agents.
    #[must_use]
    pub fn with_agents(mut self, agents: Vec<AgentId>) -> Self {
        self.agents_used = agents;
        self
    }

    /// Sets the message excerpts.
    #[must_use]
    pub fn with_messages(mut self, messages: Vec<String>) -> Self {
        self.messages = messages;
        self
    }

    /// Marks the conversation as ended now.
    #[must_use]
    pub fn finished(mut self) -> Self {
        self.ended_at = Some(Utc::now());
        self
    }
}

/// Per-user episode collection.
pub struct EpisodicMemory {
    cache: CacheService,
    index: UserIndex,
}

impl EpisodicMemory {
    /// Creates the collection on top of the cache service.
    #[must_use]
    pub fn new(cache: CacheService, index_cap: usize) -> Self {
        Self {
            cache,
            index: UserIndex::new("episodic", index_cap),
        }
    }

    fn episode_key(user_id: &str, id: &str) -> String {
        format!("episodic:{user_id}:{id}")
    }

    /// Stores an episode and indexes it for its user.
    pub async fn store(&self, episode: &ConversationEpisode) {
        let key = Self::episode_key(&episode.user_id, &episode.id);
        self.cache.set_json(&key, episode, EPISODE_TTL).await;
        self.index
            .push_front(&self.cache, &episode.user_id, &episode.id)
            .await;
    }

    /// Episodes for `user_id`, most recent first, capped at `limit`.
    pub async fn recent(&self, user_id: &str, limit: usize) -> Vec<ConversationEpisode> {
        let ids = self.index.ids(&self.cache, user_id).await;

        let mut episodes = Vec::with_capacity(ids.len());
        for id in ids {
            let key = Self::episode_key(user_id, &id);
            if let Some(episode) = self.cache.get_json::<ConversationEpisode>(&key).await {
                if episode.user_id == user_id {
                    episodes.push(episode);
                }
            }
        }

        episodes.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        episodes.truncate(limit);
        episodes
    }
}
