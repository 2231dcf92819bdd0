use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use compass_core::{
    AgentId, AnalysisDepth, CollaborationLevel, ComplexityTier, ExpertiseTier, Role,
    Specialization,
};

/// Six independent complexity scores, each in [0,1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComplexityDimensions {
    /// Linguistic and conceptual density of the request.
    pub semantic: f64,
    /// Data-engineering depth (schemas, joins, pipelines).
    pub technical: f64,
    /// Statistical and investigative depth.
    pub analytical: f64,
    /// How much the request benefits from multiple perspectives.
    pub collaborative: f64,
    /// Time-series and historical framing.
    pub temporal: f64,
    /// Ranking and benchmarking framing.
    pub comparative: f64,
}

impl ComplexityDimensions {
    /// A uniform score across all six dimensions.
    #[must_use]
    pub const fn uniform(score: f64) -> Self {
        Self {
            semantic: score,
            technical: score,
            analytical: score,
            collaborative: score,
            temporal: score,
            comparative: score,
        }
    }

    /// Arithmetic mean of the six dimensions.
    #[must_use]
    pub fn mean(&self) -> f64 {
        (self.semantic
            + self.technical
            + self.analytical
            + self.collaborative
            + self.temporal
            + self.comparative)
            / 6.0
    }

    /// Whether every dimension already sits in [0,1].
    #[must_use]
    pub fn in_unit_range(&self) -> bool {
        [
            self.semantic,
            self.technical,
            self.analytical,
            self.collaborative,
            self.temporal,
            self.comparative,
        ]
        .iter()
        .all(|score| (0.0..=1.0).contains(score))
    }

    /// A copy with every dimension clamped into [0,1].
    #[must_use]
    pub fn clamped(&self) -> Self {
        Self {
            semantic: self.semantic.clamp(0.0, 1.0),
            technical: self.technical.clamp(0.0, 1.0),
            analytical: self.analytical.clamp(0.0, 1.0),
            collaborative: self.collaborative.clamp(0.0, 1.0),
            temporal: self.temporal.clamp(0.0, 1.0),
            comparative: self.comparative.clamp(0.0, 1.0),
        }
    }
}

/// Immutable result of scoring one query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplexityAnalysis {
    /// The six dimension scores.
    pub dimensions: ComplexityDimensions,
    /// Tier derived from the dimension mean.
    pub overall: ComplexityTier,
    /// Specializations the query calls for.
    pub specializations: Vec<Specialization>,
    /// Base processing-time estimate in seconds.
    pub estimated_secs: f64,
    /// Confidence of the scoring itself.
    pub confidence: f64,
}

impl ComplexityAnalysis {
    /// Base processing seconds for a tier, before collaboration scaling.
    #[must_use]
    pub const fn base_secs(tier: ComplexityTier) -> f64 {
        match tier {
            ComplexityTier::Simple => 5.0,
            ComplexityTier::Moderate => 15.0,
            ComplexityTier::Complex => 40.0,
            ComplexityTier::Expert => 90.0,
        }
    }

    /// Builds the analysis for a set of in-range dimensions.
    #[must_use]
    pub fn from_dimensions(
        dimensions: ComplexityDimensions,
        specializations: Vec<Specialization>,
        confidence: f64,
    ) -> Self {
        let overall = ComplexityTier::from_score(dimensions.mean());
        Self {
            dimensions,
            overall,
            specializations,
            estimated_secs: Self::base_secs(overall),
            confidence,
        }
    }

    /// The fixed analysis used when the scorer is unavailable or returns
    /// malformed output.
    #[must_use]
    pub fn fallback(specializations: Vec<Specialization>) -> Self {
        let dimensions = ComplexityDimensions {
            semantic: 0.4,
            technical: 0.35,
            analytical: 0.45,
            collaborative: 0.3,
            temporal: 0.3,
            comparative: 0.35,
        };
        Self {
            dimensions,
            overall: ComplexityTier::Moderate,
            specializations,
            estimated_secs: Self::base_secs(ComplexityTier::Moderate),
            confidence: 0.6,
        }
    }
}

/// Rolling summary of a user's routing history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PerformanceSummary {
    /// Successful interactions observed so far.
    pub successful_queries: u64,
    /// Mean handled complexity on a 0–3 tier scale.
    pub average_complexity: f64,
    /// Agents the user's queries most often landed on, most used first.
    pub preferred_agents: Vec<AgentId>,
    /// Topics the user keeps returning to.
    pub common_topics: Vec<String>,
}

/// Snapshot of what the user is doing right now.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecentContext {
    /// When the user last issued a query.
    pub last_query_at: Option<DateTime<Utc>>,
    /// Queries issued in the current session.
    pub session_queries: u64,
    /// Topics in focus in the current conversation.
    pub focus_topics: Vec<String>,
}

/// Per-user context profile, rebuilt on every routing call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    /// Owning user.
    pub user_id: String,
    /// Inferred expertise tier.
    pub expertise: ExpertiseTier,
    /// Caller role.
    pub role: Role,
    /// Depth the user should receive.
    pub preferred_depth: AnalysisDepth,
    /// Historical performance summary.
    pub performance: PerformanceSummary,
    /// Current-session snapshot.
    pub recent: RecentContext,
}

impl UserProfile {
    /// Depth implied by a role alone.
    #[must_use]
    pub const fn depth_for_role(role: Role) -> AnalysisDepth {
        match role {
            Role::Executive => AnalysisDepth::Summary,
            Role::Specialist => AnalysisDepth::Comprehensive,
            Role::Analyst | Role::General => AnalysisDepth::Detailed,
        }
    }

    /// The neutral profile used when no history is available.
    #[must_use]
    pub fn neutral(user_id: &str, role: Role) -> Self {
        Self {
            user_id: user_id.to_owned(),
            expertise: ExpertiseTier::Intermediate,
            role,
            preferred_depth: Self::depth_for_role(role),
            performance: PerformanceSummary::default(),
            recent: RecentContext::default(),
        }
    }
}

/// Relative processing speed of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingSpeed {
    Fast,
    Standard,
    Thorough,
}

/// Live performance statistics of one agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentPerformance {
    /// Mean response time in milliseconds.
    pub avg_response_ms: f64,
    /// Fraction of successful responses.
    pub success_rate: f64,
    /// Mean user-satisfaction score in [0,1].
    pub satisfaction: f64,
    /// Outcomes folded into the means so far.
    pub samples: u64,
}

impl AgentPerformance {
    /// Seeds the statistics with priors; later outcomes fold in as running
    /// means and are never rolled back.
    #[must_use]
    pub const fn seeded(avg_response_ms: f64, success_rate: f64, satisfaction: f64) -> Self {
        Self {
            avg_response_ms,
            success_rate,
            satisfaction,
            samples: 10,
        }
    }

    /// Folds one observed outcome into the running means.
    pub fn record(&mut self, success: bool, response_ms: u64, satisfaction: Option<f64>) {
        let count = self.samples as f64;
        let next = count + 1.0;

        self.avg_response_ms = (self.avg_response_ms * count + response_ms as f64) / next;
        let outcome = if success { 1.0 } else { 0.0 };
        self.success_rate = ((self.success_rate * count + outcome) / next).clamp(0.0, 1.0);
        if let Some(score) = satisfaction {
            self.satisfaction = ((self.satisfaction * count + score) / next).clamp(0.0, 1.0);
        }
        self.samples += 1;
    }
}

/// Capability record for one specialist agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentCapability {
    /// The agent this record describes.
    pub agent: AgentId,
    /// Highest complexity tier the agent is suited for.
    pub tier: ComplexityTier,
    /// Domains the agent covers.
    pub domains: Vec<Specialization>,
    /// Relative processing speed.
    pub speed: ProcessingSpeed,
    /// Historical answer accuracy in [0,1].
    pub accuracy: f64,
    /// How well the agent works alongside others, in [0,1].
    pub collaboration_affinity: f64,
    /// Current load in [0,1].
    pub current_load: f64,
    /// Live performance statistics.
    pub performance: AgentPerformance,
}

impl AgentCapability {
    /// Whether this agent can handle queries of `tier`.
    #[must_use]
    pub fn suits(&self, tier: ComplexityTier) -> bool {
        self.tier >= tier
    }
}

/// The routing decision's strategy component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingStrategy {
    /// Agent that owns the answer.
    pub primary: AgentId,
    /// Agents assisting the primary; never contains the primary, never
    /// contains duplicates.
    pub supporting: Vec<AgentId>,
    /// How the agents cooperate.
    pub collaboration: CollaborationLevel,
    /// Expected answer confidence in [0,1].
    pub confidence: f64,
    /// Expected wall-clock seconds.
    pub estimated_secs: f64,
    /// Agents to try if the primary fails, best first.
    pub fallbacks: Vec<AgentId>,
}

impl RoutingStrategy {
    /// A single-agent strategy shell.
    #[must_use]
    pub fn solo(primary: AgentId) -> Self {
        Self {
            primary,
            supporting: Vec::new(),
            collaboration: CollaborationLevel::None,
            confidence: 0.7,
            estimated_secs: ComplexityAnalysis::base_secs(ComplexityTier::Moderate),
            fallbacks: Vec::new(),
        }
    }

    /// Adds a supporting agent, skipping the primary and duplicates.
    pub fn push_supporting(&mut self, agent: AgentId) {
        if agent != self.primary && !self.supporting.contains(&agent) {
            self.supporting.push(agent);
        }
    }

    /// Re-establishes the supporting-set invariant after a primary swap.
    pub fn drop_primary_from_lists(&mut self) {
        let primary = self.primary;
        self.supporting.retain(|agent| *agent != primary);
        self.fallbacks.retain(|agent| *agent != primary);
    }
}

/// The unit returned to the caller and persisted to memory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingDecision {
    /// The chosen strategy.
    pub strategy: RoutingStrategy,
    /// Ordered, human-readable justifications.
    pub reasoning: Vec<String>,
    /// Bounded alternative strategies, informational only.
    pub alternatives: Vec<RoutingStrategy>,
    /// Context that influenced the decision.
    pub context_factors: Vec<String>,
    /// Optimizations that were applied.
    pub optimizations: Vec<String>,
}

impl RoutingDecision {
    /// The hard-coded decision used when strategy generation fails: the
    /// general-purpose agent, alone, at fixed confidence.
    #[must_use]
    pub fn fallback() -> Self {
        let strategy = RoutingStrategy::solo(AgentId::GeneralAnalyst);
        Self {
            strategy,
            reasoning: vec![
                "routing pipeline unavailable, using general-purpose agent".to_owned()
            ],
            alternatives: Vec::new(),
            context_factors: Vec::new(),
            optimizations: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_range() {
        let dims = ComplexityDimensions::uniform(0.5);
        assert!((dims.mean() - 0.5).abs() < f64::EPSILON);
        assert!(dims.in_unit_range());

        let out_of_range = ComplexityDimensions {
            semantic: 1.2,
            ..ComplexityDimensions::uniform(0.5)
        };
        assert!(!out_of_range.in_unit_range());
        assert!(out_of_range.clamped().in_unit_range());
    }

    #[test]
    fn test_overall_tier_follows_mean() {
        let analysis = ComplexityAnalysis::from_dimensions(
            ComplexityDimensions::uniform(0.85),
            Vec::new(),
            0.9,
        );
        assert_eq!(analysis.overall, ComplexityTier::Expert);
        assert!((analysis.estimated_secs - 90.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_fallback_analysis_shape() {
        let analysis = ComplexityAnalysis::fallback(Vec::new());
        assert_eq!(analysis.overall, ComplexityTier::Moderate);
        assert!((analysis.confidence - 0.6).abs() < f64::EPSILON);
        assert!(analysis.dimensions.in_unit_range());
        let dims = analysis.dimensions;
        for score in [
            dims.semantic,
            dims.technical,
            dims.analytical,
            dims.collaborative,
            dims.temporal,
            dims.comparative,
        ] {
            assert!((0.3..=0.5).contains(&score));
        }
    }

    #[test]
    fn test_push_supporting_keeps_invariant() {
        let mut strategy = RoutingStrategy::solo(AgentId::ProcurementSpecialist);
        strategy.push_supporting(AgentId::ProcurementSpecialist);
        strategy.push_supporting(AgentId::RiskAnalyst);
        strategy.push_supporting(AgentId::RiskAnalyst);

        assert_eq!(strategy.supporting, vec![AgentId::RiskAnalyst]);
    }

    #[test]
    fn test_drop_primary_after_swap() {
        let mut strategy = RoutingStrategy::solo(AgentId::GeneralAnalyst);
        strategy.push_supporting(AgentId::RiskAnalyst);
        strategy.fallbacks = vec![AgentId::RiskAnalyst, AgentId::DataScientist];

        strategy.primary = AgentId::RiskAnalyst;
        strategy.drop_primary_from_lists();

        assert!(!strategy.supporting.contains(&AgentId::RiskAnalyst));
        assert_eq!(strategy.fallbacks, vec![AgentId::DataScientist]);
    }

    #[test]
    fn test_performance_running_mean() {
        let mut performance = AgentPerformance::seeded(1_000.0, 0.8, 0.8);
        performance.samples = 4;

        performance.record(true, 1_000, None);
        assert!((performance.success_rate - 0.84).abs() < 1e-9);
        assert_eq!(performance.samples, 5);

        let mut failing = AgentPerformance::seeded(1_000.0, 0.8, 0.8);
        failing.samples = 4;
        failing.record(false, 1_000, None);
        assert!((failing.success_rate - 0.64).abs() < 1e-9);
    }

    #[test]
    fn test_fallback_decision_shape() {
        let decision = RoutingDecision::fallback();
        assert_eq!(decision.strategy.primary, AgentId::GeneralAnalyst);
        assert_eq!(decision.strategy.collaboration, CollaborationLevel::None);
        assert!((decision.strategy.confidence - 0.7).abs() < f64::EPSILON);
        assert!(decision.alternatives.is_empty());
    }

    #[test]
    fn test_depth_for_role() {
        assert_eq!(
            UserProfile::depth_for_role(Role::Executive),
            AnalysisDepth::Summary
        );
        assert_eq!(
            UserProfile::depth_for_role(Role::Specialist),
            AnalysisDepth::Comprehensive
        );
        assert_eq!(
            UserProfile::depth_for_role(Role::Analyst),
            AnalysisDepth::Detailed
        );
    }
}
