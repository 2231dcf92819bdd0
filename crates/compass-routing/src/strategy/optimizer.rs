//! Post-generation strategy adjustments.
//!
//! Three independent passes run in order: load balancing, user preference,
//! and expertise shaping. Each pass that changes the strategy records an
//! optimization label so the final decision can report what happened.

use std::collections::HashMap;

use compass_core::{
    AgentId, CollaborationLevel, ComplexityTier, ExpertiseTier, RouterConfig,
};

use crate::types::{AgentCapability, ComplexityAnalysis, RoutingStrategy, UserProfile};

/// Applies load, preference, and expertise adjustments to a strategy.
pub struct StrategyOptimizer {
    high_load_threshold: f64,
    low_load_threshold: f64,
}

impl StrategyOptimizer {
    /// Creates an optimizer from the routing thresholds.
    #[must_use]
    pub fn new(config: &RouterConfig) -> Self {
        Self {
            high_load_threshold: config.high_load_threshold,
            low_load_threshold: config.low_load_threshold,
        }
    }

    /// Runs all three passes. Returns the adjusted strategy and the labels
    /// of the optimizations that fired.
    #[must_use]
    pub fn optimize(
        &self,
        mut strategy: RoutingStrategy,
        analysis: &ComplexityAnalysis,
        profile: &UserProfile,
        capabilities: &HashMap<AgentId, AgentCapability>,
    ) -> (RoutingStrategy, Vec<String>) {
        let mut applied = Vec::new();

        if let Some(label) = self.balance_load(&mut strategy, capabilities) {
            applied.push(label);
        }
        if let Some(label) = Self::prefer_user_agent(&mut strategy, analysis, profile, capabilities)
        {
            applied.push(label);
        }
        if let Some(label) = Self::shape_for_expertise(&mut strategy, analysis, profile, capabilities)
        {
            applied.push(label);
        }

        (strategy, applied)
    }

    /// Swaps an overloaded primary for its least-loaded fallback, provided
    /// that fallback is genuinely idle.
    fn balance_load(
        &self,
        strategy: &mut RoutingStrategy,
        capabilities: &HashMap<AgentId, AgentCapability>,
    ) -> Option<String> {
        let primary_load = capabilities.get(&strategy.primary)?.current_load;
        if primary_load <= self.high_load_threshold {
            return None;
        }

        let replacement = strategy
            .fallbacks
            .iter()
            .filter_map(|agent| capabilities.get(agent))
            .min_by(|a, b| {
                a.current_load
                    .partial_cmp(&b.current_load)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })?;

        if replacement.current_load >= self.low_load_threshold {
            return None;
        }

        let overloaded = strategy.primary;
        strategy.primary = replacement.agent;
        strategy.drop_primary_from_lists();
        strategy.fallbacks.insert(0, overloaded);

        Some(format!(
            "load_balance: {overloaded} at {primary_load:.2} replaced by {}",
            strategy.primary
        ))
    }

    /// Promotes the user's historically preferred agent when it is suited
    /// for this query's tier.
    fn prefer_user_agent(
        strategy: &mut RoutingStrategy,
        analysis: &ComplexityAnalysis,
        profile: &UserProfile,
        capabilities: &HashMap<AgentId, AgentCapability>,
    ) -> Option<String> {
        let preferred = *profile.performance.preferred_agents.first()?;
        if preferred == strategy.primary {
            return None;
        }
        if !capabilities
            .get(&preferred)
            .is_some_and(|capability| capability.suits(analysis.overall))
        {
            return None;
        }

        let displaced = strategy.primary;
        strategy.primary = preferred;
        strategy.drop_primary_from_lists();
        if !strategy.fallbacks.contains(&displaced) {
            strategy.fallbacks.insert(0, displaced);
        }

        Some(format!("user_preference: promoted {preferred}"))
    }

    /// Expert users skip collaboration on simple queries; beginners facing
    /// complex queries get the full panel plus an advisory agent for
    /// plain-language framing.
    fn shape_for_expertise(
        strategy: &mut RoutingStrategy,
        analysis: &ComplexityAnalysis,
        profile: &UserProfile,
        capabilities: &HashMap<AgentId, AgentCapability>,
    ) -> Option<String> {
        if profile.expertise == ExpertiseTier::Expert && analysis.overall == ComplexityTier::Simple
        {
            strategy.collaboration = CollaborationLevel::None;
            strategy.supporting.clear();
            return Some("expert_direct: stripped collaboration".to_owned());
        }

        if profile.expertise == ExpertiseTier::Beginner
            && analysis.overall >= ComplexityTier::Complex
        {
            strategy.collaboration = CollaborationLevel::FullCollaboration;
            if strategy.primary != AgentId::ExecutiveAdvisor
                && capabilities.contains_key(&AgentId::ExecutiveAdvisor)
            {
                strategy.push_supporting(AgentId::ExecutiveAdvisor);
            }
            return Some("beginner_support: full collaboration with advisory framing".to_owned());
        }

        None
    }
}
