//! Aggregation of the three memory kinds into one context per user.

use chrono::Utc;
use regex::Regex;
use serde_json::{json, Map as JsonMap, Value as JsonValue};
use std::sync::OnceLock;

use compass_cache::CacheService;
use compass_core::{AgentId, ComplexityTier, MemoryConfig};

use crate::episodic::{ConversationEpisode, EpisodicMemory};
use crate::procedural::{ProceduralMemory, ProceduralPattern};
use crate::semantic::{FactCategory, SemanticFact, SemanticMemory};

/// Maximum focus topics kept in the per-conversation context.
const MAX_FOCUS_TOPICS: usize = 5;

/// Everything memory knows that is relevant to one query.
#[derive(Debug, Clone)]
pub struct MemoryContext {
    /// Highest-confidence facts, capped by configuration.
    pub facts: Vec<SemanticFact>,
    /// Most recent episodes, capped by configuration.
    pub episodes: Vec<ConversationEpisode>,
    /// All patterns, ranked by success rate.
    pub patterns: Vec<ProceduralPattern>,
    /// Human-readable one-line digest of the above.
    pub summary: String,
}

/// Outcome of one completed interaction, written back into memory.
#[derive(Debug, Clone)]
pub struct InteractionOutcome {
    /// The query that was answered.
    pub query: String,
    /// The generated answer text.
    pub response_text: String,
    /// Whether the interaction succeeded from the user's perspective.
    pub success: bool,
    /// Insights extracted from the answer.
    pub insights: Vec<String>,
    /// Agents that produced the answer.
    pub agents_used: Vec<AgentId>,
    /// Complexity of the handled query.
    pub complexity: ComplexityTier,
    /// Conversation the interaction belongs to, if any.
    pub conversation_id: Option<String>,
}

/// Facade over semantic, episodic, and procedural memory.
pub struct MemoryCoordinator {
    cache: CacheService,
    semantic: SemanticMemory,
    episodic: EpisodicMemory,
    procedural: ProceduralMemory,
    config: MemoryConfig,
}

impl MemoryCoordinator {
    /// Creates the coordinator on top of a cache service.
    #[must_use]
    pub fn new(cache: CacheService, config: MemoryConfig) -> Self {
        Self {
            semantic: SemanticMemory::new(cache.clone(), config.index_cap),
            episodic: EpisodicMemory::new(cache.clone(), config.index_cap),
            procedural: ProceduralMemory::new(cache.clone(), config.index_cap),
            cache,
            config,
        }
    }

    /// Assembles the full memory context for one query.
    ///
    /// Retrieval failures inside the cache surface as empty lists; routing
    /// treats "no prior context" and "memory down" identically.
    pub async fn comprehensive_context(&self, user_id: &str, query: &str) -> MemoryContext {
        let facts = self.semantic.facts(user_id, self.config.max_facts).await;
        let episodes = self.episodic.recent(user_id, self.config.max_episodes).await;
        let patterns = self.procedural.patterns(user_id).await;

        let category = query_category(query);
        let summary = summarize(&facts, &episodes, &patterns, category);

        MemoryContext {
            facts,
            episodes,
            patterns,
            summary,
        }
    }

    /// Writes the outcome of one interaction back into memory: preference
    /// facts from the response language, and a running-mean update of the
    /// pattern for the query's coarse category.
    pub async fn store_interaction(&self, user_id: &str, outcome: &InteractionOutcome) {
        let source = outcome
            .conversation_id
            .clone()
            .unwrap_or_else(|| "interaction".to_owned());

        for statement in preference_statements(&outcome.response_text, &outcome.insights) {
            self.semantic
                .upsert(user_id, &statement, FactCategory::Preference, &source)
                .await;
        }

        let category = query_category(&outcome.query);
        let primary = outcome
            .agents_used
            .first()
            .copied()
            .unwrap_or(AgentId::GeneralAnalyst);
        let pattern = self
            .procedural
            .record_outcome(
                user_id,
                category,
                &format!("query about {category}"),
                &format!("route to {primary}"),
                outcome.success,
            )
            .await;

        tracing::debug!(
            "pattern {category} for {user_id} now at {:.2} over {} uses",
            pattern.success_rate,
            pattern.usage_count
        );
    }

    /// Stores a completed or checkpointed conversation episode.
    pub async fn checkpoint_episode(&self, episode: &ConversationEpisode) {
        self.episodic.store(episode).await;
    }

    /// Episodes for `user_id`, most recent first.
    pub async fn recent_episodes(&self, user_id: &str, limit: usize) -> Vec<ConversationEpisode> {
        self.episodic.recent(user_id, limit).await
    }

    /// Highest-confidence facts for `user_id`.
    pub async fn facts(&self, user_id: &str, limit: usize) -> Vec<SemanticFact> {
        self.semantic.facts(user_id, limit).await
    }

    /// All patterns for `user_id`, ranked by success rate.
    pub async fn patterns(&self, user_id: &str) -> Vec<ProceduralPattern> {
        self.procedural.patterns(user_id).await
    }

    /// The stored context object of one conversation.
    pub async fn conversation_context(
        &self,
        user_id: &str,
        conversation_id: &str,
    ) -> Option<JsonValue> {
        self.cache
            .get_conversation_context(user_id, conversation_id)
            .await
    }

    /// Notes that a query was routed: refreshes the conversation context's
    /// last-query time and folds the query's topics into the focus list.
    pub async fn note_routing(
        &self,
        user_id: &str,
        conversation_id: Option<&str>,
        topics: &[String],
    ) {
        let Some(conversation_id) = conversation_id else {
            return;
        };

        let existing = self
            .conversation_context(user_id, conversation_id)
            .await
            .unwrap_or_else(|| json!({}));

        let mut focus: Vec<String> = existing
            .get("focus_topics")
            .and_then(|value| serde_json::from_value(value.clone()).ok())
            .unwrap_or_default();
        for topic in topics {
            if !focus.contains(topic) {
                focus.insert(0, topic.clone());
            }
        }
        focus.truncate(MAX_FOCUS_TOPICS);

        let query_count = existing
            .get("query_count")
            .and_then(JsonValue::as_u64)
            .unwrap_or(0)
            + 1;

        let mut updates = JsonMap::new();
        updates.insert("last_query_at".to_owned(), json!(Utc::now()));
        updates.insert("focus_topics".to_owned(), json!(focus));
        updates.insert("query_count".to_owned(), json!(query_count));

        self.cache
            .update_conversation_context(user_id, conversation_id, updates)
            .await;
    }
}

/// Coarse query category used as the procedural-pattern key.
#[must_use]
pub fn query_category(query: &str) -> &'static str {
    let lower = query.to_lowercase();
    if lower.contains("variance") || lower.contains("deviation") {
        "variance"
    } else if lower.contains("trend") || lower.contains("over time") || lower.contains("forecast") {
        "trend"
    } else if lower.contains("supplier") || lower.contains("vendor") {
        "supplier"
    } else if lower.contains("cost") || lower.contains("spend") || lower.contains("price") {
        "cost"
    } else {
        "general"
    }
}

// Static pattern, compiles or the crate is broken.
#[allow(clippy::unwrap_used)]
fn preference_regex() -> &'static Regex {
    static PREFERENCE_RE: OnceLock<Regex> = OnceLock::new();
    PREFERENCE_RE.get_or_init(|| {
        Regex::new(r"(?i)\b(prefers?|preferred|always|usually|typically|likes?|favorite)\b")
            .unwrap()
    })
}

/// Sentences in the response or insights that state a durable preference.
fn preference_statements(response_text: &str, insights: &[String]) -> Vec<String> {
    let mut statements = Vec::new();

    let sentences = response_text
        .split(['.', '!', '\n'])
        .map(str::trim)
        .filter(|sentence| !sentence.is_empty());
    for sentence in sentences.chain(insights.iter().map(String::as_str)) {
        if preference_regex().is_match(sentence) && sentence.len() <= 200 {
            let statement = sentence.to_owned();
            if !statements.contains(&statement) {
                statements.push(statement);
            }
        }
    }
    statements
}

fn summarize(
    facts: &[SemanticFact],
    episodes: &[ConversationEpisode],
    patterns: &[ProceduralPattern],
    category: &str,
) -> String {
    let mut parts = vec![format!(
        "{} fact(s), {} episode(s), {} pattern(s)",
        facts.len(),
        episodes.len(),
        patterns.len()
    )];

    if let Some(best) = patterns.first() {
        parts.push(format!(
            "best pattern '{}' at {:.0}% over {} uses",
            best.label,
            best.success_rate * 100.0,
            best.usage_count
        ));
    }
    parts.push(format!("current query category '{category}'"));
    parts.join("; ")
}
