//! Strategy construction: generate, optimize, diversify.

/// Bounded alternative strategies.
pub mod alternatives;
/// The deterministic rule cascade.
pub mod generator;
/// Load, preference, and expertise adjustments.
pub mod optimizer;

pub use alternatives::AlternativeGenerator;
pub use generator::StrategyGenerator;
pub use optimizer::StrategyOptimizer;
