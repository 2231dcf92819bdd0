//! Core types and traits for the compass query-routing layer.
//!
//! This crate provides the shared vocabulary (complexity tiers, collaboration
//! levels, specialist agent identifiers), error handling, and configuration
//! used across the routing, cache, and memory crates.

/// Workspace configuration loaded from TOML.
pub mod config;
/// Error types and result definitions.
pub mod error;
/// Lock-poisoning helpers.
pub mod sync;
/// Trait definitions for specialist analysis providers.
pub mod traits;
/// Shared data types for queries, tiers, and agents.
pub mod types;

pub use config::{ApiKeys, CacheConfig, CompassConfig, MemoryConfig, RouterConfig};
pub use error::{Error, Result};
pub use sync::IgnorePoison;
pub use traits::SpecialistProvider;
pub use types::{
    AgentId, AnalysisDepth, AnalysisResponse, CollaborationLevel, ComplexityTier, ExpertiseTier,
    QueryRequest, Role, SessionContext, Specialization,
};
