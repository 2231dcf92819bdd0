//! Registry of specialist-agent capabilities.
//!
//! The canonical capability set lives here; load and performance are the
//! only mutable fields and are folded forward, never rolled back. Snapshots
//! are served through the cache on a short TTL so concurrent routing calls
//! reuse one view instead of recomputing.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use compass_cache::CacheService;
use compass_core::{AgentId, ComplexityTier, IgnorePoison as _, RouterConfig, Specialization};

use crate::types::{AgentCapability, AgentPerformance, ProcessingSpeed};

/// Key under which the capability snapshot is cached.
const SNAPSHOT_KEY: &str = "registry:snapshot";

/// Holds the capability records for every specialist agent.
pub struct CapabilityRegistry {
    capabilities: RwLock<HashMap<AgentId, AgentCapability>>,
    cache: CacheService,
    snapshot_ttl: Duration,
}

impl CapabilityRegistry {
    /// Creates a registry with the default capability set.
    #[must_use]
    pub fn new(cache: CacheService, config: &RouterConfig) -> Self {
        let capabilities = Self::default_capabilities()
            .into_iter()
            .map(|capability| (capability.agent, capability))
            .collect();

        Self {
            capabilities: RwLock::new(capabilities),
            cache,
            snapshot_ttl: Duration::from_secs(config.registry_snapshot_ttl_secs),
        }
    }

    /// Creates a registry with an explicit capability set (used by tests).
    #[must_use]
    pub fn with_capabilities(
        cache: CacheService,
        config: &RouterConfig,
        capabilities: Vec<AgentCapability>,
    ) -> Self {
        let capabilities = capabilities
            .into_iter()
            .map(|capability| (capability.agent, capability))
            .collect();

        Self {
            capabilities: RwLock::new(capabilities),
            cache,
            snapshot_ttl: Duration::from_secs(config.registry_snapshot_ttl_secs),
        }
    }

    /// The initial capability set for the five specialists.
    #[must_use]
    pub fn default_capabilities() -> Vec<AgentCapability> {
        vec![
            AgentCapability {
                agent: AgentId::GeneralAnalyst,
                tier: ComplexityTier::Moderate,
                domains: vec![Specialization::General],
                speed: ProcessingSpeed::Fast,
                accuracy: 0.82,
                collaboration_affinity: 0.6,
                current_load: 0.3,
                performance: AgentPerformance::seeded(900.0, 0.86, 0.8),
            },
            AgentCapability {
                agent: AgentId::ProcurementSpecialist,
                tier: ComplexityTier::Complex,
                domains: vec![Specialization::Procurement],
                speed: ProcessingSpeed::Standard,
                accuracy: 0.88,
                collaboration_affinity: 0.7,
                current_load: 0.25,
                performance: AgentPerformance::seeded(1_400.0, 0.9, 0.84),
            },
            AgentCapability {
                agent: AgentId::RiskAnalyst,
                tier: ComplexityTier::Complex,
                domains: vec![Specialization::Risk],
                speed: ProcessingSpeed::Standard,
                accuracy: 0.87,
                collaboration_affinity: 0.75,
                current_load: 0.2,
                performance: AgentPerformance::seeded(1_600.0, 0.88, 0.82),
            },
            AgentCapability {
                agent: AgentId::ExecutiveAdvisor,
                tier: ComplexityTier::Expert,
                domains: vec![Specialization::Executive],
                speed: ProcessingSpeed::Thorough,
                accuracy: 0.9,
                collaboration_affinity: 0.85,
                current_load: 0.15,
                performance: AgentPerformance::seeded(2_000.0, 0.92, 0.88),
            },
            AgentCapability {
                agent: AgentId::DataScientist,
                tier: ComplexityTier::Expert,
                domains: vec![Specialization::DataScience, Specialization::Forecasting],
                speed: ProcessingSpeed::Thorough,
                accuracy: 0.91,
                collaboration_affinity: 0.8,
                current_load: 0.35,
                performance: AgentPerformance::seeded(2_400.0, 0.93, 0.86),
            },
        ]
    }

    /// A snapshot of every capability record, served from the cache while
    /// the snapshot TTL holds, so concurrent routing calls share one view.
    pub async fn snapshot(&self) -> HashMap<AgentId, AgentCapability> {
        if let Some(snapshot) = self
            .cache
            .get_json::<HashMap<AgentId, AgentCapability>>(SNAPSHOT_KEY)
            .await
        {
            return snapshot;
        }

        let snapshot = self.capabilities.read_ignore_poison().clone();
        self.cache
            .set_json(SNAPSHOT_KEY, &snapshot, self.snapshot_ttl)
            .await;
        snapshot
    }

    /// The live capability record for one agent.
    #[must_use]
    pub fn capability(&self, agent: AgentId) -> Option<AgentCapability> {
        self.capabilities.read_ignore_poison().get(&agent).cloned()
    }

    /// Whether `agent` is rated for queries of `tier`: its suited tier must
    /// be at or above the query's on the ordinal scale.
    #[must_use]
    pub fn is_suitable(&self, agent: AgentId, tier: ComplexityTier) -> bool {
        self.capability(agent)
            .is_some_and(|capability| capability.suits(tier))
    }

    /// Overwrites the agent's current load, clamped to [0,1].
    pub fn set_load(&self, agent: AgentId, load: f64) {
        let mut capabilities = self.capabilities.write_ignore_poison();
        if let Some(capability) = capabilities.get_mut(&agent) {
            capability.current_load = load.clamp(0.0, 1.0);
        }
    }

    /// Folds one observed outcome into the agent's running performance.
    pub fn record_result(
        &self,
        agent: AgentId,
        success: bool,
        response_ms: u64,
        satisfaction: Option<f64>,
    ) {
        let mut capabilities = self.capabilities.write_ignore_poison();
        if let Some(capability) = capabilities.get_mut(&agent) {
            capability.performance.record(success, response_ms, satisfaction);
        }
    }

    /// Number of registered agents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.capabilities.read_ignore_poison().len()
    }

    /// Whether no agents are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.capabilities.read_ignore_poison().is_empty()
    }
}
