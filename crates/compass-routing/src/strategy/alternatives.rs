//! Bounded alternative strategies.
//!
//! Alternatives are informational: the caller may retry with one when the
//! chosen strategy's primary agent fails, but nothing here is executed
//! automatically.

use std::collections::HashMap;

use compass_core::{AgentId, CollaborationLevel};

use crate::types::{AgentCapability, RoutingStrategy};

/// Specialist pool for the full-collaboration variant.
const SPECIALIST_POOL: [AgentId; 4] = [
    AgentId::ProcurementSpecialist,
    AgentId::RiskAnalyst,
    AgentId::ExecutiveAdvisor,
    AgentId::DataScientist,
];

/// Supporting agents in the full-collaboration variant.
const FULL_PANEL_SIZE: usize = 3;

/// Produces up to three variant strategies around the optimized one.
pub struct AlternativeGenerator {
    max_alternatives: usize,
}

impl AlternativeGenerator {
    /// Creates a generator bounded at `max_alternatives`.
    #[must_use]
    pub fn new(max_alternatives: usize) -> Self {
        Self { max_alternatives }
    }

    /// Builds the variants for `strategy`.
    #[must_use]
    pub fn generate(
        &self,
        strategy: &RoutingStrategy,
        capabilities: &HashMap<AgentId, AgentCapability>,
    ) -> Vec<RoutingStrategy> {
        let mut alternatives = Vec::new();

        if strategy.collaboration != CollaborationLevel::None {
            alternatives.push(Self::single_agent(strategy));
        }
        if strategy.collaboration != CollaborationLevel::FullCollaboration {
            alternatives.push(Self::full_collaboration(strategy, capabilities));
        }
        if let Some(alternative) = Self::different_primary(strategy) {
            alternatives.push(alternative);
        }

        alternatives.truncate(self.max_alternatives);
        alternatives
    }

    /// Faster, cheaper, less certain: the primary works alone.
    fn single_agent(strategy: &RoutingStrategy) -> RoutingStrategy {
        RoutingStrategy {
            primary: strategy.primary,
            supporting: Vec::new(),
            collaboration: CollaborationLevel::None,
            confidence: (strategy.confidence * 0.8).clamp(0.0, 1.0),
            estimated_secs: strategy.estimated_secs * 0.6,
            fallbacks: strategy.fallbacks.clone(),
        }
    }

    /// Slower, more certain: every non-primary specialist weighs in.
    fn full_collaboration(
        strategy: &RoutingStrategy,
        capabilities: &HashMap<AgentId, AgentCapability>,
    ) -> RoutingStrategy {
        let supporting: Vec<AgentId> = SPECIALIST_POOL
            .into_iter()
            .filter(|agent| *agent != strategy.primary && capabilities.contains_key(agent))
            .take(FULL_PANEL_SIZE)
            .collect();

        RoutingStrategy {
            primary: strategy.primary,
            supporting,
            collaboration: CollaborationLevel::FullCollaboration,
            confidence: (strategy.confidence * 1.1).min(0.95),
            estimated_secs: strategy.estimated_secs * 1.5,
            fallbacks: strategy.fallbacks.clone(),
        }
    }

    /// Same shape, different owner: the best fallback takes over.
    fn different_primary(strategy: &RoutingStrategy) -> Option<RoutingStrategy> {
        let new_primary = *strategy.fallbacks.first()?;

        let mut alternative = RoutingStrategy {
            primary: new_primary,
            supporting: strategy.supporting.clone(),
            collaboration: strategy.collaboration,
            confidence: (strategy.confidence * 0.9).clamp(0.0, 1.0),
            estimated_secs: strategy.estimated_secs * 1.1,
            fallbacks: strategy
                .fallbacks
                .iter()
                .copied()
                .filter(|agent| *agent != new_primary)
                .chain(std::iter::once(strategy.primary))
                .collect(),
        };
        alternative.drop_primary_from_lists();
        Some(alternative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::CapabilityRegistry;

    fn capabilities() -> HashMap<AgentId, AgentCapability> {
        CapabilityRegistry::default_capabilities()
            .into_iter()
            .map(|capability| (capability.agent, capability))
            .collect()
    }

    fn collaborative_strategy() -> RoutingStrategy {
        let mut strategy = RoutingStrategy::solo(AgentId::ProcurementSpecialist);
        strategy.collaboration = CollaborationLevel::Review;
        strategy.push_supporting(AgentId::RiskAnalyst);
        strategy.confidence = 0.9;
        strategy.estimated_secs = 20.0;
        strategy.fallbacks = vec![AgentId::DataScientist, AgentId::GeneralAnalyst];
        strategy
    }

    #[test]
    fn test_collaborative_strategy_gets_all_three_variants() {
        let generator = AlternativeGenerator::new(3);
        let alternatives = generator.generate(&collaborative_strategy(), &capabilities());

        assert_eq!(alternatives.len(), 3);
        assert_eq!(alternatives[0].collaboration, CollaborationLevel::None);
        assert_eq!(
            alternatives[1].collaboration,
            CollaborationLevel::FullCollaboration
        );
        assert_eq!(alternatives[2].primary, AgentId::DataScientist);
    }

    #[test]
    fn test_single_agent_variant_scales_confidence_and_time() {
        let generator = AlternativeGenerator::new(3);
        let alternatives = generator.generate(&collaborative_strategy(), &capabilities());

        let solo = &alternatives[0];
        assert!((solo.confidence - 0.72).abs() < 1e-9);
        assert!((solo.estimated_secs - 12.0).abs() < 1e-9);
        assert!(solo.supporting.is_empty());
    }

    #[test]
    fn test_full_variant_fields_a_panel_of_three() {
        let generator = AlternativeGenerator::new(3);
        let alternatives = generator.generate(&collaborative_strategy(), &capabilities());

        let full = &alternatives[1];
        assert_eq!(full.supporting.len(), 3);
        assert!(!full.supporting.contains(&full.primary));
        assert!(full.confidence <= 0.95);
    }

    #[test]
    fn test_different_primary_keeps_invariant() {
        let generator = AlternativeGenerator::new(3);
        let alternatives = generator.generate(&collaborative_strategy(), &capabilities());

        let swapped = &alternatives[2];
        assert!(!swapped.supporting.contains(&swapped.primary));
        assert!(!swapped.fallbacks.contains(&swapped.primary));
        assert!(swapped.fallbacks.contains(&AgentId::ProcurementSpecialist));
    }

    #[test]
    fn test_solo_strategy_without_fallbacks_gets_one_variant() {
        let strategy = RoutingStrategy::solo(AgentId::GeneralAnalyst);
        let generator = AlternativeGenerator::new(3);
        let alternatives = generator.generate(&strategy, &capabilities());

        // No collaboration to strip, no fallback to promote.
        assert_eq!(alternatives.len(), 1);
        assert_eq!(
            alternatives[0].collaboration,
            CollaborationLevel::FullCollaboration
        );
    }

    #[test]
    fn test_bound_respected() {
        let generator = AlternativeGenerator::new(1);
        let alternatives = generator.generate(&collaborative_strategy(), &capabilities());
        assert_eq!(alternatives.len(), 1);
    }
}
