//! Intelligent query routing for a multi-agent analytics assistant.
//!
//! Given a natural-language request, this crate decides which specialist
//! agent should own the answer, how much collaboration the answer warrants,
//! and what to try if the first choice fails. Complexity analysis, the
//! user's memory-derived profile, and live agent capabilities all feed the
//! decision; the caller always receives a usable [`RoutingDecision`].

/// Query complexity analysis.
pub mod analyzer;
/// Routing error types.
pub mod error;
/// User context profiles.
pub mod profile;
/// Agent capability registry.
pub mod registry;
/// The router orchestrator.
pub mod router;
/// Strategy generation, optimization, and alternatives.
pub mod strategy;
/// Routing data types.
pub mod types;

pub use analyzer::{
    required_specializations, ComplexityAnalyzer, ComplexityScorer, KeywordScorer, ProviderScorer,
};
pub use error::{Result, RoutingError};
pub use profile::ProfileBuilder;
pub use registry::CapabilityRegistry;
pub use router::QueryRouter;
pub use strategy::{AlternativeGenerator, StrategyGenerator, StrategyOptimizer};
pub use types::{
    AgentCapability, AgentPerformance, ComplexityAnalysis, ComplexityDimensions,
    PerformanceSummary, ProcessingSpeed, RecentContext, RoutingDecision, RoutingStrategy,
    UserProfile,
};
