//! Per-user context profiles derived from memory.

use std::collections::HashMap;
use std::sync::Arc;

use compass_core::{AgentId, ComplexityTier, ExpertiseTier, Role, SessionContext};
use compass_memory::{ConversationEpisode, MemoryCoordinator};

use crate::types::{PerformanceSummary, RecentContext, UserProfile};

/// Episodes examined for the expertise heuristic.
const EXPERTISE_WINDOW: usize = 10;

/// Topics kept in the common-topics summary.
const MAX_COMMON_TOPICS: usize = 5;

/// Builds a [`UserProfile`] for each routing call.
///
/// Everything here degrades gracefully: a user without history (or with
/// memory unavailable, which looks identical) gets the beginner/role-driven
/// profile and routing proceeds.
pub struct ProfileBuilder {
    memory: Arc<MemoryCoordinator>,
}

impl ProfileBuilder {
    /// Creates a builder over the memory coordinator.
    #[must_use]
    pub fn new(memory: Arc<MemoryCoordinator>) -> Self {
        Self { memory }
    }

    /// Derives the profile for `user_id`.
    pub async fn build(
        &self,
        user_id: &str,
        role: Role,
        session: Option<&SessionContext>,
    ) -> UserProfile {
        let episodes = self
            .memory
            .recent_episodes(user_id, EXPERTISE_WINDOW)
            .await;
        let patterns = self.memory.patterns(user_id).await;

        let expertise = expertise_from_episodes(&episodes);
        let performance = summarize_performance(&episodes, &patterns);
        let recent = self.recent_context(user_id, session).await;

        UserProfile {
            user_id: user_id.to_owned(),
            expertise,
            role,
            preferred_depth: UserProfile::depth_for_role(role),
            performance,
            recent,
        }
    }

    async fn recent_context(
        &self,
        user_id: &str,
        session: Option<&SessionContext>,
    ) -> RecentContext {
        let mut recent = RecentContext {
            session_queries: session.map_or(0, |session| u64::from(session.messages_in_session)),
            ..RecentContext::default()
        };

        let Some(conversation_id) = session.and_then(|session| session.conversation_id.as_deref())
        else {
            return recent;
        };
        let Some(context) = self
            .memory
            .conversation_context(user_id, conversation_id)
            .await
        else {
            return recent;
        };

        recent.last_query_at = context
            .get("last_query_at")
            .and_then(|value| serde_json::from_value(value.clone()).ok());
        if let Some(count) = context.get("query_count").and_then(|value| value.as_u64()) {
            recent.session_queries = recent.session_queries.max(count);
        }
        recent.focus_topics = context
            .get("focus_topics")
            .and_then(|value| serde_json::from_value(value.clone()).ok())
            .unwrap_or_default();

        recent
    }
}

/// Expertise heuristic: under three episodes means beginner; otherwise the
/// share of complex-or-harder episodes decides (>0.7 expert, >0.4
/// intermediate).
fn expertise_from_episodes(episodes: &[ConversationEpisode]) -> ExpertiseTier {
    if episodes.len() < 3 {
        return ExpertiseTier::Beginner;
    }

    let complex = episodes
        .iter()
        .filter(|episode| episode.complexity >= ComplexityTier::Complex)
        .count();
    let ratio = complex as f64 / episodes.len() as f64;

    if ratio > 0.7 {
        ExpertiseTier::Expert
    } else if ratio > 0.4 {
        ExpertiseTier::Intermediate
    } else {
        ExpertiseTier::Beginner
    }
}

fn summarize_performance(
    episodes: &[ConversationEpisode],
    patterns: &[compass_memory::ProceduralPattern],
) -> PerformanceSummary {
    let successful_queries = patterns
        .iter()
        .map(|pattern| (pattern.success_rate * pattern.usage_count as f64).round() as u64)
        .sum();

    let average_complexity = if episodes.is_empty() {
        0.0
    } else {
        let total: usize = episodes
            .iter()
            .map(|episode| episode.complexity as usize)
            .sum();
        total as f64 / episodes.len() as f64
    };

    PerformanceSummary {
        successful_queries,
        average_complexity,
        preferred_agents: rank_agents(episodes),
        common_topics: rank_topics(episodes),
    }
}

/// Agents ranked by how often the user's episodes involved them.
fn rank_agents(episodes: &[ConversationEpisode]) -> Vec<AgentId> {
    let mut counts: HashMap<AgentId, usize> = HashMap::new();
    for episode in episodes {
        for agent in &episode.agents_used {
            *counts.entry(*agent).or_insert(0) += 1;
        }
    }

    let mut ranked: Vec<(AgentId, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.wire_id().cmp(b.0.wire_id())));
    ranked.into_iter().map(|(agent, _)| agent).collect()
}

fn rank_topics(episodes: &[ConversationEpisode]) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for episode in episodes {
        for topic in &episode.topics {
            *counts.entry(topic.as_str()).or_insert(0) += 1;
        }
    }

    let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked
        .into_iter()
        .take(MAX_COMMON_TOPICS)
        .map(|(topic, _)| topic.to_owned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use compass_cache::CacheService;
    use compass_core::{AnalysisDepth, MemoryConfig};

    fn builder() -> (ProfileBuilder, Arc<MemoryCoordinator>) {
        let memory = Arc::new(MemoryCoordinator::new(
            CacheService::local_only(),
            MemoryConfig::default(),
        ));
        (ProfileBuilder::new(Arc::clone(&memory)), memory)
    }

    fn episode(user: &str, n: usize, complexity: ComplexityTier) -> ConversationEpisode {
        ConversationEpisode::new(user, format!("conv-{n}"))
            .with_complexity(complexity)
            .with_agents(vec![AgentId::ProcurementSpecialist])
            .with_topics(vec!["suppliers".to_owned()])
    }

    #[tokio::test]
    async fn test_no_history_yields_beginner() {
        let (builder, _memory) = builder();
        let profile = builder.build("u1", Role::Analyst, None).await;

        assert_eq!(profile.expertise, ExpertiseTier::Beginner);
        assert_eq!(profile.preferred_depth, AnalysisDepth::Detailed);
        assert!(profile.performance.preferred_agents.is_empty());
    }

    #[tokio::test]
    async fn test_mostly_complex_history_yields_expert() {
        let (builder, memory) = builder();
        for n in 0..4 {
            let tier = if n == 0 {
                ComplexityTier::Simple
            } else {
                ComplexityTier::Expert
            };
            memory.checkpoint_episode(&episode("u1", n, tier)).await;
        }

        let profile = builder.build("u1", Role::Specialist, None).await;
        assert_eq!(profile.expertise, ExpertiseTier::Expert);
        assert_eq!(profile.preferred_depth, AnalysisDepth::Comprehensive);
        assert_eq!(
            profile.performance.preferred_agents,
            vec![AgentId::ProcurementSpecialist]
        );
        assert_eq!(profile.performance.common_topics, vec!["suppliers".to_owned()]);
    }

    #[tokio::test]
    async fn test_mixed_history_yields_intermediate() {
        let (builder, memory) = builder();
        for n in 0..4 {
            let tier = if n < 2 {
                ComplexityTier::Complex
            } else {
                ComplexityTier::Simple
            };
            memory.checkpoint_episode(&episode("u1", n, tier)).await;
        }

        let profile = builder.build("u1", Role::General, None).await;
        assert_eq!(profile.expertise, ExpertiseTier::Intermediate);
    }

    #[tokio::test]
    async fn test_executive_role_prefers_summaries() {
        let (builder, _memory) = builder();
        let profile = builder.build("u1", Role::Executive, None).await;
        assert_eq!(profile.preferred_depth, AnalysisDepth::Summary);
    }

    #[tokio::test]
    async fn test_recent_context_from_conversation() {
        let (builder, memory) = builder();
        memory
            .note_routing("u1", Some("conv-1"), &["procurement".to_owned()])
            .await;

        let session = SessionContext::for_conversation("conv-1");
        let profile = builder.build("u1", Role::Analyst, Some(&session)).await;

        assert_eq!(profile.recent.focus_topics, vec!["procurement".to_owned()]);
        assert_eq!(profile.recent.session_queries, 1);
        assert!(profile.recent.last_query_at.is_some());
    }
}
