//! The query router: one call in, one usable decision out.

use std::sync::Arc;

use compass_cache::CacheService;
use compass_core::{CompassConfig, QueryRequest};
use compass_memory::{InteractionOutcome, MemoryCoordinator};

use crate::analyzer::ComplexityAnalyzer;
use crate::error::Result;
use crate::profile::ProfileBuilder;
use crate::registry::CapabilityRegistry;
use crate::strategy::{AlternativeGenerator, StrategyGenerator, StrategyOptimizer};
use crate::types::{ComplexityAnalysis, RoutingDecision, UserProfile};

/// High-level router coordinating analysis, profiling, strategy
/// generation, optimization, and persistence.
///
/// Every collaborator is injected; nothing is global. `route_query` is the
/// single external entry point and always returns a usable decision — the
/// worst case is the hard-coded single-agent fallback.
pub struct QueryRouter {
    analyzer: Arc<ComplexityAnalyzer>,
    profile_builder: ProfileBuilder,
    registry: Arc<CapabilityRegistry>,
    generator: StrategyGenerator,
    optimizer: StrategyOptimizer,
    alternatives: AlternativeGenerator,
    memory: Arc<MemoryCoordinator>,
    cache: CacheService,
}

impl QueryRouter {
    /// Creates a router with default components for the given configuration.
    #[must_use]
    pub fn new(config: &CompassConfig, cache: CacheService, memory: Arc<MemoryCoordinator>) -> Self {
        Self {
            analyzer: Arc::new(ComplexityAnalyzer::default()),
            profile_builder: ProfileBuilder::new(Arc::clone(&memory)),
            registry: Arc::new(CapabilityRegistry::new(cache.clone(), &config.router)),
            generator: StrategyGenerator,
            optimizer: StrategyOptimizer::new(&config.router),
            alternatives: AlternativeGenerator::new(config.router.max_alternatives),
            memory,
            cache,
        }
    }

    /// Replaces the complexity analyzer (e.g. to use a provider-backed
    /// scorer).
    #[must_use]
    pub fn with_analyzer(mut self, analyzer: Arc<ComplexityAnalyzer>) -> Self {
        self.analyzer = analyzer;
        self
    }

    /// Replaces the capability registry.
    #[must_use]
    pub fn with_registry(mut self, registry: Arc<CapabilityRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// The capability registry in use.
    #[must_use]
    pub fn registry(&self) -> &Arc<CapabilityRegistry> {
        &self.registry
    }

    /// Routes one query.
    ///
    /// Identical repeated queries are served from the route cache while its
    /// TTL holds. Analysis and profile building run concurrently; decision
    /// persistence happens off the caller's path.
    pub async fn route_query(&self, request: &QueryRequest) -> RoutingDecision {
        let role = request.role.to_string();
        if let Some(cached) = self
            .cache
            .get_route::<RoutingDecision>(&request.user_id, &role, &request.query)
            .await
        {
            tracing::debug!("route cache hit for user {}", request.user_id);
            return cached;
        }

        let (analysis, profile) = tokio::join!(
            self.analyzer
                .analyze(&request.query, request.data_source_hint.as_deref()),
            self.profile_builder.build(
                &request.user_id,
                request.role,
                request.session.as_ref()
            ),
        );

        let capabilities = self.registry.snapshot().await;

        let decision = match self.build_decision(&analysis, &profile, &capabilities) {
            Ok(decision) => {
                // Only genuine decisions are cached; a fallback must not
                // mask recovery for the whole route TTL.
                self.cache
                    .cache_route(&request.user_id, &role, &request.query, &decision)
                    .await;
                decision
            }
            Err(error) => {
                tracing::error!("routing pipeline failed ({error}), issuing fallback decision");
                RoutingDecision::fallback()
            }
        };

        tracing::info!(
            "routed '{}' for {} -> {} ({}, confidence {:.2})",
            request.query,
            request.user_id,
            decision.strategy.primary,
            decision.strategy.collaboration,
            decision.strategy.confidence,
        );

        self.persist_routing(request, &analysis);

        decision
    }

    fn build_decision(
        &self,
        analysis: &ComplexityAnalysis,
        profile: &UserProfile,
        capabilities: &std::collections::HashMap<
            compass_core::AgentId,
            crate::types::AgentCapability,
        >,
    ) -> Result<RoutingDecision> {
        let candidate = self.generator.generate(analysis, profile, capabilities)?;
        let (strategy, optimizations) =
            self.optimizer
                .optimize(candidate, analysis, profile, capabilities);
        let alternatives = self.alternatives.generate(&strategy, capabilities);

        let reasoning = build_reasoning(analysis, &strategy);
        let context_factors = build_context_factors(profile);

        Ok(RoutingDecision {
            strategy,
            reasoning,
            alternatives,
            context_factors,
            optimizations,
        })
    }

    /// Persists routing traces to memory off the caller's path.
    fn persist_routing(&self, request: &QueryRequest, analysis: &ComplexityAnalysis) {
        let memory = Arc::clone(&self.memory);
        let user_id = request.user_id.clone();
        let conversation_id = request
            .session
            .as_ref()
            .and_then(|session| session.conversation_id.clone());
        let topics: Vec<String> = analysis
            .specializations
            .iter()
            .map(ToString::to_string)
            .collect();

        tokio::spawn(async move {
            memory
                .note_routing(&user_id, conversation_id.as_deref(), &topics)
                .await;
        });
    }

    /// Reports how an interaction went: agent statistics fold the outcome
    /// into their running means, and memory learns facts and patterns.
    pub async fn complete_interaction(
        &self,
        request: &QueryRequest,
        decision: &RoutingDecision,
        success: bool,
        response_text: &str,
        insights: Vec<String>,
        response_ms: u64,
    ) {
        let mut agents_used = vec![decision.strategy.primary];
        agents_used.extend(decision.strategy.supporting.iter().copied());

        for agent in &agents_used {
            self.registry
                .record_result(*agent, success, response_ms, None);
        }

        // Complexity is re-derived; the analyzer is deterministic and the
        // decision does not carry its analysis.
        let analysis = self
            .analyzer
            .analyze(&request.query, request.data_source_hint.as_deref())
            .await;

        let outcome = InteractionOutcome {
            query: request.query.clone(),
            response_text: response_text.to_owned(),
            success,
            insights,
            agents_used,
            complexity: analysis.overall,
            conversation_id: request
                .session
                .as_ref()
                .and_then(|session| session.conversation_id.clone()),
        };
        self.memory.store_interaction(&request.user_id, &outcome).await;
    }
}

fn build_reasoning(
    analysis: &ComplexityAnalysis,
    strategy: &crate::types::RoutingStrategy,
) -> Vec<String> {
    let tags = analysis
        .specializations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");

    vec![
        format!(
            "query scored {} (dimension mean {:.2})",
            analysis.overall,
            analysis.dimensions.mean()
        ),
        format!("required specializations: {tags}"),
        format!("primary agent: {}", strategy.primary),
        format!(
            "collaboration {} with {} supporting agent(s)",
            strategy.collaboration,
            strategy.supporting.len()
        ),
        format!(
            "expected confidence {:.2}, estimated {:.0}s",
            strategy.confidence, strategy.estimated_secs
        ),
    ]
}

fn build_context_factors(profile: &UserProfile) -> Vec<String> {
    let mut factors = vec![
        format!("expertise: {}", profile.expertise),
        format!("role: {}", profile.role),
    ];

    if !profile.recent.focus_topics.is_empty() {
        factors.push(format!(
            "recent focus: {}",
            profile.recent.focus_topics.join(", ")
        ));
    }
    if profile.recent.session_queries > 0 {
        factors.push(format!(
            "queries this session: {}",
            profile.recent.session_queries
        ));
    }
    if let Some(preferred) = profile.performance.preferred_agents.first() {
        factors.push(format!("historically preferred agent: {preferred}"));
    }

    factors
}
