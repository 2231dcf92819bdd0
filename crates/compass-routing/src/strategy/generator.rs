//! The deterministic rule cascade that produces a candidate strategy.

use std::collections::HashMap;

use compass_core::{AgentId, CollaborationLevel, ComplexityTier, Role, Specialization};

use crate::error::{Result, RoutingError};
use crate::types::{AgentCapability, ComplexityAnalysis, RoutingStrategy, UserProfile};

/// Confidence bounds for generated strategies.
const CONFIDENCE_FLOOR: f64 = 0.5;
const CONFIDENCE_CEIL: f64 = 0.95;

/// Suitability bonus when the primary agent's rated tier covers the query.
const SUITABILITY_BONUS: f64 = 0.1;
/// Confidence added per supporting agent.
const SUPPORT_BONUS: f64 = 0.05;

/// Time multipliers per collaboration level.
const REVIEW_FACTOR: f64 = 1.3;
const FULL_COLLABORATION_FACTOR: f64 = 1.8;
/// Seconds of coordination overhead per supporting agent.
const SUPPORT_OVERHEAD_SECS: f64 = 6.0;
/// No estimate drops below this.
const MIN_ESTIMATE_SECS: f64 = 3.0;

/// Padding order when full collaboration needs more supporting agents.
const SPECIALIST_ORDER: [AgentId; 4] = [
    AgentId::RiskAnalyst,
    AgentId::DataScientist,
    AgentId::ExecutiveAdvisor,
    AgentId::ProcurementSpecialist,
];

/// Minimum supporting agents once collaboration escalates to full.
const MIN_FULL_SUPPORT: usize = 2;

/// Number of fallback agents attached to a strategy.
const FALLBACK_COUNT: usize = 2;

/// Produces a [`RoutingStrategy`] from the analysis, profile, and a
/// capability snapshot via a fixed rule cascade.
#[derive(Default)]
pub struct StrategyGenerator;

impl StrategyGenerator {
    /// Runs the cascade.
    ///
    /// # Errors
    ///
    /// Returns an error if the capability snapshot is empty; the router's
    /// top-level boundary converts that into the fallback decision.
    pub fn generate(
        &self,
        analysis: &ComplexityAnalysis,
        profile: &UserProfile,
        capabilities: &HashMap<AgentId, AgentCapability>,
    ) -> Result<RoutingStrategy> {
        if capabilities.is_empty() {
            return Err(RoutingError::EmptyRegistry);
        }

        let primary = Self::select_primary(analysis, profile);
        let mut strategy = RoutingStrategy::solo(primary);

        Self::assign_collaboration(&mut strategy, analysis, profile, capabilities);
        strategy.confidence = Self::expected_confidence(&strategy, analysis, capabilities);
        strategy.estimated_secs = Self::estimate_secs(&strategy, analysis);
        strategy.fallbacks = Self::fallbacks(&strategy, capabilities);

        Ok(strategy)
    }

    /// Primary selection. The caller's executive role outranks every
    /// specialization tag; tags outrank the analytical-score rule.
    fn select_primary(analysis: &ComplexityAnalysis, profile: &UserProfile) -> AgentId {
        let tags = &analysis.specializations;

        if profile.role == Role::Executive {
            AgentId::ExecutiveAdvisor
        } else if tags.contains(&Specialization::Procurement) {
            AgentId::ProcurementSpecialist
        } else if tags.contains(&Specialization::Risk) {
            AgentId::RiskAnalyst
        } else if tags.contains(&Specialization::Executive) {
            AgentId::ExecutiveAdvisor
        } else if analysis.dimensions.analytical > 0.7
            || tags.contains(&Specialization::DataScience)
            || tags.contains(&Specialization::Forecasting)
        {
            AgentId::DataScientist
        } else {
            AgentId::GeneralAnalyst
        }
    }

    fn assign_collaboration(
        strategy: &mut RoutingStrategy,
        analysis: &ComplexityAnalysis,
        profile: &UserProfile,
        capabilities: &HashMap<AgentId, AgentCapability>,
    ) {
        let dims = &analysis.dimensions;

        if dims.collaborative > 0.6 || analysis.overall >= ComplexityTier::Complex {
            strategy.collaboration = CollaborationLevel::Review;

            if dims.technical > 0.7 && capabilities.contains_key(&AgentId::RiskAnalyst) {
                strategy.push_supporting(AgentId::RiskAnalyst);
            }
            if dims.analytical > 0.6 && capabilities.contains_key(&AgentId::DataScientist) {
                strategy.push_supporting(AgentId::DataScientist);
            }
            if profile.role == Role::Executive
                && capabilities.contains_key(&AgentId::ExecutiveAdvisor)
            {
                strategy.push_supporting(AgentId::ExecutiveAdvisor);
            }
        }

        if analysis.overall == ComplexityTier::Expert || dims.collaborative > 0.8 {
            strategy.collaboration = CollaborationLevel::FullCollaboration;

            // Full collaboration needs a real panel behind the primary.
            for agent in SPECIALIST_ORDER {
                if strategy.supporting.len() >= MIN_FULL_SUPPORT {
                    break;
                }
                if capabilities.contains_key(&agent) {
                    strategy.push_supporting(agent);
                }
            }
        }
    }

    fn expected_confidence(
        strategy: &RoutingStrategy,
        analysis: &ComplexityAnalysis,
        capabilities: &HashMap<AgentId, AgentCapability>,
    ) -> f64 {
        let capability = capabilities.get(&strategy.primary);
        let mut confidence = capability.map_or(0.7, |capability| capability.accuracy);

        if capability.is_some_and(|capability| capability.suits(analysis.overall)) {
            confidence += SUITABILITY_BONUS;
        }
        confidence += SUPPORT_BONUS * strategy.supporting.len() as f64;

        confidence.clamp(CONFIDENCE_FLOOR, CONFIDENCE_CEIL)
    }

    fn estimate_secs(strategy: &RoutingStrategy, analysis: &ComplexityAnalysis) -> f64 {
        let mut secs = analysis.estimated_secs;
        match strategy.collaboration {
            CollaborationLevel::None => {}
            CollaborationLevel::Review => secs *= REVIEW_FACTOR,
            CollaborationLevel::FullCollaboration => secs *= FULL_COLLABORATION_FACTOR,
        }
        secs += SUPPORT_OVERHEAD_SECS * strategy.supporting.len() as f64;
        secs.max(MIN_ESTIMATE_SECS)
    }

    /// Remaining agents ranked by historical success rate, best two.
    fn fallbacks(
        strategy: &RoutingStrategy,
        capabilities: &HashMap<AgentId, AgentCapability>,
    ) -> Vec<AgentId> {
        let mut remaining: Vec<&AgentCapability> = capabilities
            .values()
            .filter(|capability| {
                capability.agent != strategy.primary
                    && !strategy.supporting.contains(&capability.agent)
            })
            .collect();

        remaining.sort_by(|a, b| {
            b.performance
                .success_rate
                .partial_cmp(&a.performance.success_rate)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.agent.wire_id().cmp(b.agent.wire_id()))
        });

        remaining
            .into_iter()
            .take(FALLBACK_COUNT)
            .map(|capability| capability.agent)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::CapabilityRegistry;
    use crate::types::ComplexityDimensions;
    use compass_core::Role;

    fn capabilities() -> HashMap<AgentId, AgentCapability> {
        CapabilityRegistry::default_capabilities()
            .into_iter()
            .map(|capability| (capability.agent, capability))
            .collect()
    }

    fn analysis(dims: ComplexityDimensions, tags: Vec<Specialization>) -> ComplexityAnalysis {
        ComplexityAnalysis::from_dimensions(dims, tags, 0.85)
    }

    fn profile(role: Role) -> UserProfile {
        UserProfile::neutral("u1", role)
    }

    #[test]
    fn test_procurement_tag_selects_specialist() {
        let analysis = analysis(
            ComplexityDimensions::uniform(0.2),
            vec![Specialization::Procurement],
        );
        let strategy =
            match StrategyGenerator.generate(&analysis, &profile(Role::Analyst), &capabilities()) {
                Ok(strategy) => strategy,
                Err(error) => panic!("generate failed: {error}"),
            };

        assert_eq!(strategy.primary, AgentId::ProcurementSpecialist);
        assert_eq!(strategy.collaboration, CollaborationLevel::None);
        assert!(strategy.confidence >= 0.7);
    }

    #[test]
    fn test_executive_role_overrides_tags() {
        let analysis = analysis(
            ComplexityDimensions::uniform(0.2),
            vec![Specialization::Procurement],
        );
        let strategy = match StrategyGenerator.generate(
            &analysis,
            &profile(Role::Executive),
            &capabilities(),
        ) {
            Ok(strategy) => strategy,
            Err(error) => panic!("generate failed: {error}"),
        };

        assert_eq!(strategy.primary, AgentId::ExecutiveAdvisor);
    }

    #[test]
    fn test_high_analytical_selects_data_scientist() {
        let dims = ComplexityDimensions {
            analytical: 0.75,
            ..ComplexityDimensions::uniform(0.2)
        };
        let strategy = match StrategyGenerator.generate(
            &analysis(dims, vec![Specialization::General]),
            &profile(Role::Analyst),
            &capabilities(),
        ) {
            Ok(strategy) => strategy,
            Err(error) => panic!("generate failed: {error}"),
        };

        assert_eq!(strategy.primary, AgentId::DataScientist);
    }

    #[test]
    fn test_expert_collaborative_query_escalates_to_full() {
        let dims = ComplexityDimensions::uniform(0.85);
        let strategy = match StrategyGenerator.generate(
            &analysis(dims, vec![Specialization::General]),
            &profile(Role::Analyst),
            &capabilities(),
        ) {
            Ok(strategy) => strategy,
            Err(error) => panic!("generate failed: {error}"),
        };

        assert_eq!(
            strategy.collaboration,
            CollaborationLevel::FullCollaboration
        );
        assert!(strategy.supporting.len() >= 2);
        assert!(!strategy.supporting.contains(&strategy.primary));
    }

    #[test]
    fn test_review_level_for_complex_tier() {
        let dims = ComplexityDimensions::uniform(0.65);
        let strategy = match StrategyGenerator.generate(
            &analysis(dims, vec![Specialization::General]),
            &profile(Role::Analyst),
            &capabilities(),
        ) {
            Ok(strategy) => strategy,
            Err(error) => panic!("generate failed: {error}"),
        };

        assert_eq!(strategy.collaboration, CollaborationLevel::Review);
    }

    #[test]
    fn test_confidence_clamped_to_ceiling() {
        let dims = ComplexityDimensions::uniform(0.85);
        let strategy = match StrategyGenerator.generate(
            &analysis(dims, vec![Specialization::General]),
            &profile(Role::Analyst),
            &capabilities(),
        ) {
            Ok(strategy) => strategy,
            Err(error) => panic!("generate failed: {error}"),
        };

        assert!(strategy.confidence <= 0.95);
        assert!(strategy.confidence >= 0.5);
    }

    #[test]
    fn test_collaboration_scales_estimate() {
        let solo = match StrategyGenerator.generate(
            &analysis(ComplexityDimensions::uniform(0.2), vec![]),
            &profile(Role::Analyst),
            &capabilities(),
        ) {
            Ok(strategy) => strategy,
            Err(error) => panic!("generate failed: {error}"),
        };
        let collaborative = match StrategyGenerator.generate(
            &analysis(ComplexityDimensions::uniform(0.85), vec![]),
            &profile(Role::Analyst),
            &capabilities(),
        ) {
            Ok(strategy) => strategy,
            Err(error) => panic!("generate failed: {error}"),
        };

        assert!(collaborative.estimated_secs > solo.estimated_secs);
        assert!(solo.estimated_secs >= 3.0);
    }

    #[test]
    fn test_fallbacks_exclude_primary_and_supporting() {
        let dims = ComplexityDimensions::uniform(0.85);
        let strategy = match StrategyGenerator.generate(
            &analysis(dims, vec![Specialization::General]),
            &profile(Role::Analyst),
            &capabilities(),
        ) {
            Ok(strategy) => strategy,
            Err(error) => panic!("generate failed: {error}"),
        };

        assert!(strategy.fallbacks.len() <= 2);
        for fallback in &strategy.fallbacks {
            assert_ne!(*fallback, strategy.primary);
            assert!(!strategy.supporting.contains(fallback));
        }
    }

    #[test]
    fn test_empty_registry_is_an_error() {
        let result = StrategyGenerator.generate(
            &analysis(ComplexityDimensions::uniform(0.2), vec![]),
            &profile(Role::Analyst),
            &HashMap::new(),
        );
        assert!(matches!(result, Err(RoutingError::EmptyRegistry)));
    }
}
